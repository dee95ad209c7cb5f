//! Namespace prefix declarations.

use std::collections::BTreeMap;

const DEFAULT_PREFIXES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
];

/// Ordered prefix -> namespace IRI table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMap {
    entries: Vec<(String, String)>,
}

impl Default for PrefixMap {
    fn default() -> Self {
        DEFAULT_PREFIXES
            .iter()
            .fold(Self::empty(), |map, (prefix, iri)| map.with(*prefix, *iri))
    }
}

impl PrefixMap {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Default prefixes overlaid with the `[prefixes]` config section.
    pub fn from_config(prefixes: &BTreeMap<String, String>) -> Self {
        prefixes
            .iter()
            .fold(Self::default(), |map, (prefix, iri)| {
                map.with(prefix.clone(), iri.clone())
            })
    }

    /// Add a prefix, replacing the IRI in place if the prefix already exists.
    pub fn with(mut self, prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        let (prefix, iri) = (prefix.into(), iri.into());
        match self.entries.iter_mut().find(|(p, _)| *p == prefix) {
            Some(entry) => entry.1 = iri,
            None => self.entries.push((prefix, iri)),
        }
        self
    }

    /// `prefix p: <iri>` lines for a SPARQL query.
    pub fn sparql_prologue(&self) -> String {
        self.join("prefix", "")
    }

    /// `@prefix p: <iri> .` lines for a Turtle document.
    pub fn turtle_prologue(&self) -> String {
        self.join("@prefix", " .")
    }

    fn join(&self, token: &str, terminator: &str) -> String {
        self.entries
            .iter()
            .map(|(prefix, iri)| format!("{token} {prefix}: <{iri}>{terminator}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
