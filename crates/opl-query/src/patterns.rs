//! Graph pattern definitions for pattern-query backends.
//!
//! Patterns are kept as `name -> body` maps. A body may carry its own
//! `pattern <name>(...)` header or just the parameter list and block, in which
//! case the header is generated from the map key.

use crate::error::{PatternError, PatternResult};
use once_cell::sync::Lazy;
use opl_config::OplConfig;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Optional modifiers, the `pattern` keyword and the declared name.
static PATTERN_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:private\s+)?(?:search\s+|incremental\s+)?pattern\s+([^\s(]+)\s*\(").unwrap()
});

/// Pattern bodies keyed by pattern name.
pub type PatternSet = BTreeMap<String, String>;

const ATTRIBUTE_STRING_VALUE: &str = "
    (owner, attrName, value) {
        Class.ownedAttribute(owner, property);
        Property.name(property, attrName);
        Property.defaultValue(property, defaultValue);
        LiteralString.value(defaultValue, value);
    }
";

const ATTRIBUTE_STRING_ARRAY: &str = "
    (owner, attrName, value) {
        Class.ownedAttribute(owner, property);
        Property.name(property, attrName);
        Property.defaultValue(property, defaultValue);
        Expression.operand(defaultValue, expr);
        LiteralString.value(expr, value);
    }
";

const PREDICATE_TARGET: &str = "
    (element : Class, target : Class, predicate : Property, predicateName : String, elementName : String, targetName : String) {
        Class.name(element, elementName);
        Class.ownedAttribute(element, predicate);
        Property.name(predicate, predicateName);
        Property.type(predicate, target);
        Class.name(target, targetName);
    }
";

/// Named groups of pattern definitions.
///
/// Built by the caller (usually from config) and passed where needed; there is
/// no process-wide table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternLibrary {
    groups: BTreeMap<String, PatternSet>,
}

impl PatternLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library with the `basic` group of attribute and relationship patterns.
    pub fn builtin() -> Self {
        let basic: PatternSet = [
            ("attributeStringValue", ATTRIBUTE_STRING_VALUE),
            ("attributeStringArray", ATTRIBUTE_STRING_ARRAY),
            ("predicateTarget", PREDICATE_TARGET),
        ]
        .into_iter()
        .map(|(name, body)| (name.to_string(), body.to_string()))
        .collect();

        Self::new().with_group("basic", basic)
    }

    /// Built-in groups overlaid with the `[patterns.*]` config sections.
    pub fn from_config(config: &OplConfig) -> Self {
        config
            .patterns
            .iter()
            .fold(Self::builtin(), |library, (group, patterns)| {
                library.with_group(group.clone(), patterns.clone())
            })
    }

    /// Add a group; patterns of an existing group with the same name are overridden.
    pub fn with_group(mut self, group: impl Into<String>, patterns: PatternSet) -> Self {
        let group = group.into();
        let merged = match self.groups.get(&group) {
            Some(existing) => merge(existing, &patterns),
            None => patterns,
        };
        self.groups.insert(group, merged);
        self
    }

    pub fn group(&self, name: &str) -> Option<&PatternSet> {
        self.groups.get(name)
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }
}

/// `defaults` overlaid with `overrides` (call-specific patterns win).
pub fn merge(defaults: &PatternSet, overrides: &PatternSet) -> PatternSet {
    let mut merged = defaults.clone();
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Turn a pattern map into complete pattern definitions.
///
/// Bodies without a header get `pattern <name>` prepended. A body whose header
/// declares a different name than its key is rejected.
pub fn query_definitions(patterns: &PatternSet) -> PatternResult<Vec<String>> {
    patterns
        .iter()
        .map(|(name, body)| match PATTERN_HEADER_RE.captures(body) {
            None => Ok(format!("pattern {name}{body}")),
            Some(caps) if &caps[1] == name.as_str() => Ok(body.clone()),
            Some(caps) => Err(PatternError::NameMismatch {
                expected: name.clone(),
                found: caps[1].to_string(),
            }),
        })
        .collect()
}

/// A single parameter binding as expected by pattern execution APIs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterBinding {
    pub parameter: String,
    pub value: Value,
}

pub fn parameter_bindings(bindings: &BTreeMap<String, Value>) -> Vec<ParameterBinding> {
    bindings
        .iter()
        .map(|(parameter, value)| ParameterBinding {
            parameter: parameter.clone(),
            value: value.clone(),
        })
        .collect()
}
