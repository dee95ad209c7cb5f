//! Template preprocessing pipeline.
//!
//! Four pure stages, each taking an immutable string and returning a new one:
//!
//! 1. [`extract_mixins`] removes `# @def <name>` ... `# @end` blocks and records them
//! 2. [`expand_mixins`] replaces `# @mixin <name>` lines with the re-indented body
//! 3. [`apply_injections`] replaces `# @inject $<label>` lines with caller text
//! 4. [`substitute_variables`] replaces `<$name>` placeholders with IRI literals
//!
//! Expanded mixin bodies are visible to stages 3 and 4, and injected text is
//! visible to stage 4.

mod inject;
mod mixin;
mod variable;

pub use inject::apply_injections;
pub use mixin::{expand_mixins, extract_mixins, Mixin, MixinMap};
pub use variable::substitute_variables;

use crate::error::TemplateResult;
use opl_config::TemplateConfig;
use std::collections::HashMap;
use tracing::trace;

/// Variable values keyed by placeholder name (`<$name>`).
pub type Variables = HashMap<String, String>;

/// Injection text keyed by label (`# @inject $label`).
pub type Injections = HashMap<String, String>;

/// What to do with mixin directives that cannot be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MixinPolicy {
    /// Leave unresolved directives in the output untouched.
    #[default]
    Permissive,
    /// Fail on undefined, unterminated or duplicate mixins.
    Strict,
}

impl MixinPolicy {
    pub fn is_strict(self) -> bool {
        self == MixinPolicy::Strict
    }
}

/// Builds the line-anchored pattern for a `# <keyword> <arg>` directive.
///
/// The directive must sit alone on its line, optionally indented. With
/// `capture_indent` the leading whitespace becomes capture group 1.
pub(crate) fn directive(keyword: &str, arg: &str, capture_indent: bool) -> String {
    let indent = if capture_indent { r"([ \t]*)" } else { r"[ \t]*" };
    format!(r"(?m)^{indent}#[ \t]*{keyword}{arg}[ \t]*\r?$")
}

/// Line terminator to carry over when a directive line is replaced.
pub(crate) fn carriage_return(matched: &str) -> &'static str {
    if matched.ends_with('\r') {
        "\r"
    } else {
        ""
    }
}

/// 1-based line number of a byte offset.
pub(crate) fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

/// Template preprocessor.
///
/// Holds the mixin policy and a library of shared mixins. Immutable once built,
/// so one instance can serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    policy: MixinPolicy,
    library: MixinMap,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a preprocessor from the `[template]` config section
    pub fn from_config(config: &TemplateConfig) -> Self {
        let policy = if config.strict_mixins {
            MixinPolicy::Strict
        } else {
            MixinPolicy::Permissive
        };
        config
            .mixins
            .iter()
            .fold(Self::new().with_policy(policy), |pre, (name, body)| {
                pre.with_mixin(name, body)
            })
    }

    pub fn with_policy(mut self, policy: MixinPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Register a shared mixin. Definitions inside a template shadow it.
    pub fn with_mixin(mut self, name: impl Into<String>, body: &str) -> Self {
        let name = name.into();
        let mixin = Mixin::new(&name, body);
        self.library.insert(name, mixin);
        self
    }

    pub fn policy(&self) -> MixinPolicy {
        self.policy
    }

    /// Apply mixins, injections and variable substitutions to a template.
    pub fn load(
        &self,
        template: &str,
        variables: &Variables,
        injections: &Injections,
    ) -> TemplateResult<String> {
        let extracted = mixin::extract(template, self.policy)?;
        let locate = |offset: usize| line_of(template, extracted.source_offset(offset));

        let expanded = if self.library.is_empty() {
            mixin::expand(&extracted.stripped, &extracted.mixins, self.policy, locate)?
        } else {
            let mut mixins = self.library.clone();
            mixins.extend(extracted.mixins.clone());
            mixin::expand(&extracted.stripped, &mixins, self.policy, locate)?
        };
        trace!(query = %expanded, "expanded mixins");

        let injected = apply_injections(&expanded, injections);
        let query = substitute_variables(&injected, variables)?;

        Ok(query.trim().to_string())
    }
}

/// Preprocess a template with the default (permissive, empty library) settings.
pub fn load(template: &str, variables: &Variables, injections: &Injections) -> TemplateResult<String> {
    Preprocessor::default().load(template, variables, injections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_plain_template_is_unchanged() {
        let template = "  SELECT ?s WHERE { ?s ?p ?o }\n";
        let out = load(template, &Variables::new(), &Injections::new()).unwrap();
        assert_eq!(out, "SELECT ?s WHERE { ?s ?p ?o }");
    }

    #[test]
    fn test_mixin_round_trip() {
        let template = "# @def m\nX\nY\n# @end\nSELECT * WHERE {\n    # @mixin m\n}";
        let out = load(template, &Variables::new(), &Injections::new()).unwrap();

        assert!(out.contains("    X\n    Y"));
        assert!(!out.contains("@def"));
        assert!(!out.contains("@end"));
        assert_eq!(out, "SELECT * WHERE {\n    X\n    Y\n}");
    }

    #[test]
    fn test_same_mixin_at_two_indentation_levels() {
        let template = "\
# @def pair
    ?a ?b ?c .
    ?c ?d ?e .
# @end
SELECT * WHERE {
  # @mixin pair
  OPTIONAL {
      # @mixin pair
  }
}";
        let out = load(template, &Variables::new(), &Injections::new()).unwrap();
        assert_eq!(
            out,
            "SELECT * WHERE {\n  ?a ?b ?c .\n  ?c ?d ?e .\n  OPTIONAL {\n      ?a ?b ?c .\n      ?c ?d ?e .\n  }\n}"
        );
    }

    #[test]
    fn test_definition_after_invocation() {
        let template = "SELECT * WHERE {\n  # @mixin late\n}\n# @def late\n  ?s ?p ?o .\n# @end\n";
        let out = load(template, &Variables::new(), &Injections::new()).unwrap();
        assert_eq!(out, "SELECT * WHERE {\n  ?s ?p ?o .\n}");
    }

    #[test]
    fn test_missing_variable_fails_then_succeeds() {
        let template = "SELECT * WHERE { ?s a <$type> }";

        let err = load(template, &Variables::new(), &Injections::new()).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingVariable {
                name: "type".to_string()
            }
        );
        assert!(err.to_string().contains("\"type\""));

        let out = load(
            template,
            &vars(&[("type", "http://example.org/Foo")]),
            &Injections::new(),
        )
        .unwrap();
        assert_eq!(out, "SELECT * WHERE { ?s a <http://example.org/Foo> }");
    }

    #[test]
    fn test_mixin_body_feeds_injection_and_variables() {
        let template = "\
# @def scoped
    ?s a <$type> .
    # @inject $extra
# @end
SELECT ?s WHERE {
    # @mixin scoped
}";
        let injections = vars(&[("extra", "?s <$pred> ?o .")]);
        let variables = vars(&[
            ("type", "http://example.org/Block"),
            ("pred", "http://example.org/owns"),
        ]);

        let out = load(template, &variables, &injections).unwrap();
        insta::assert_snapshot!(out, @r"
        SELECT ?s WHERE {
            ?s a <http://example.org/Block> .
            ?s <http://example.org/owns> ?o .
        }
        ");
    }

    #[test]
    fn test_library_mixin_and_template_shadowing() {
        let pre = Preprocessor::new()
            .with_mixin("typed", "?s a ?type .")
            .with_mixin("named", "?s ?label ?name .");
        let template = "# @def named\n  ?s <http://x/name> ?name .\n# @end\n# @mixin typed\n# @mixin named";

        let out = pre.load(template, &Variables::new(), &Injections::new()).unwrap();
        assert_eq!(out, "?s a ?type .\n?s <http://x/name> ?name .");
    }

    #[test]
    fn test_strict_policy_rejects_undefined_mixin() {
        let template = "SELECT * WHERE {\n  # @mixin nope\n}";

        let permissive = Preprocessor::new()
            .load(template, &Variables::new(), &Injections::new())
            .unwrap();
        assert_eq!(permissive, template);

        let strict = Preprocessor::new()
            .with_policy(MixinPolicy::Strict)
            .load(template, &Variables::new(), &Injections::new());
        assert_eq!(
            strict,
            Err(TemplateError::UndefinedMixin {
                name: "nope".to_string(),
                line: 2
            })
        );
    }

    #[test]
    fn test_undefined_mixin_line_counts_removed_definitions() {
        let template = "# @def a\n  x\n# @end\nSELECT * WHERE {\n  # @mixin a\n  # @mixin b\n}";

        let err = Preprocessor::new()
            .with_policy(MixinPolicy::Strict)
            .load(template, &Variables::new(), &Injections::new())
            .unwrap_err();

        assert_eq!(
            err,
            TemplateError::UndefinedMixin {
                name: "b".to_string(),
                line: 6
            }
        );
    }

    #[test]
    fn test_from_config() {
        let mut config = TemplateConfig {
            strict_mixins: true,
            ..Default::default()
        };
        config
            .mixins
            .insert("shared".to_string(), "    ?s ?p ?o .".to_string());

        let pre = Preprocessor::from_config(&config);
        assert_eq!(pre.policy(), MixinPolicy::Strict);

        let out = pre
            .load("  # @mixin shared", &Variables::new(), &Injections::new())
            .unwrap();
        assert_eq!(out, "?s ?p ?o .");
    }

    #[test]
    fn test_preprocessor_is_shareable_across_threads() {
        let pre = std::sync::Arc::new(Preprocessor::new().with_mixin("m", "?s a <$t> ."));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let pre = pre.clone();
                std::thread::spawn(move || {
                    let t = format!("http://example.org/T{i}");
                    pre.load("# @mixin m", &vars(&[("t", t.as_str())]), &Injections::new())
                        .unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(
                handle.join().unwrap(),
                format!("?s a <http://example.org/T{i}> .")
            );
        }
    }
}
