//! Error types for template preprocessing and pattern definitions.

use thiserror::Error;

/// Errors raised while preprocessing a query template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A `<$name>` placeholder has no value in the variable map.
    #[error("query template requires a value for the variable \"{name}\"")]
    MissingVariable { name: String },

    /// A variable value cannot be written as an IRI reference.
    #[error("value {value:?} for variable \"{name}\" is not a valid IRI")]
    InvalidIri { name: String, value: String },

    /// `# @mixin` references a name that was never defined (strict policy only).
    ///
    /// `line` is the 1-based line of the directive in the template as written.
    #[error("line {line}: mixin \"{name}\" is not defined")]
    UndefinedMixin { name: String, line: usize },

    /// `# @def` without a matching `# @end` (strict policy only).
    #[error("line {line}: mixin \"{name}\" is missing its closing `# @end`")]
    UnterminatedMixin { name: String, line: usize },

    /// The same mixin name is defined twice in one template (strict policy only).
    #[error("mixin \"{name}\" is defined more than once")]
    DuplicateMixin { name: String },
}

/// Errors raised while preparing graph pattern definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The pattern header names a different pattern than its map key.
    #[error("pattern definition for \"{expected}\" must have identical pattern name, instead found \"{found}\"")]
    NameMismatch { expected: String, found: String },
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Result type for pattern operations
pub type PatternResult<T> = Result<T, PatternError>;
