//! Configuration components
//!
//! One struct per section of the config file. Every section has defaults so a
//! partial (or empty) file is valid.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OplConfig {
    /// Log level filter used by the CLI when no flag is given (e.g. "info", "debug")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// SPARQL endpoint settings
    pub sparql: SparqlConfig,

    /// Template preprocessing settings
    pub template: TemplateConfig,

    /// Namespace prefixes prepended to every submitted query (prefix -> IRI)
    pub prefixes: BTreeMap<String, String>,

    /// Graph pattern groups (group -> pattern name -> pattern body)
    pub patterns: BTreeMap<String, BTreeMap<String, String>>,
}

/// SPARQL endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SparqlConfig {
    /// Full URL (with port and path) of the SPARQL endpoint
    pub endpoint: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Value sent as the `infer` request parameter
    pub infer: bool,

    /// Value sent as the `sameAs` request parameter
    pub same_as: bool,
}

impl Default for SparqlConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 30,
            infer: false,
            same_as: false,
        }
    }
}

/// Template preprocessing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TemplateConfig {
    /// Treat undefined, unterminated and duplicate mixins as errors
    pub strict_mixins: bool,

    /// Shared mixins available to every template (name -> body)
    pub mixins: BTreeMap<String, String>,
}

impl OplConfig {
    /// Look up a pattern group by name
    pub fn pattern_group(&self, group: &str) -> Option<&BTreeMap<String, String>> {
        self.patterns.get(group)
    }

    /// Apply a CLI endpoint override
    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        if endpoint.is_some() {
            self.sparql.endpoint = endpoint;
        }
        self
    }
}
