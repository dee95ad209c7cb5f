//! Query template preprocessing for SPARQL and graph-pattern backends.
//!
//! Templates are plain query text with a handful of comment directives:
//!
//! ```text
//! # @def typed
//!     ?s a <$type> .
//! # @end
//!
//! SELECT ?s WHERE {
//!     # @mixin typed
//!     # @inject $filter
//! }
//! ```
//!
//! [`Preprocessor::load`] runs the pipeline extract -> expand -> inject ->
//! substitute and returns the final query string.

pub mod error;
pub mod patterns;
pub mod template;

pub use error::{PatternError, PatternResult, TemplateError, TemplateResult};
pub use patterns::{
    merge, parameter_bindings, query_definitions, ParameterBinding, PatternLibrary, PatternSet,
};
pub use template::{
    apply_injections, expand_mixins, extract_mixins, load, substitute_variables, Injections,
    Mixin, MixinMap, MixinPolicy, Preprocessor, Variables,
};
