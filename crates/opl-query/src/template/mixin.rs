//! Mixin extraction and expansion.
//!
//! A mixin is defined once with
//!
//! ```text
//! # @def owned
//!     ?owner <ownedAttribute> ?property .
//! # @end
//! ```
//!
//! and used with `# @mixin owned`. The body is stored without its common
//! indentation and re-indented to the column of each invocation.

use super::{carriage_return, directive, line_of, MixinPolicy};
use crate::error::{TemplateError, TemplateResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;
use tracing::{debug, warn};

const NAME_ARG: &str = r"[ \t]+(\w+)";

/// Whole definition region: group 1 is the name, group 2 the raw body.
/// The line break after `# @end` belongs to the region.
static DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?s){}(.*?){}\n?",
        directive("@def", NAME_ARG, false),
        directive("@end", "", false)
    ))
    .unwrap()
});

/// Opening directive on its own, used to find unterminated definitions.
static DEF_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&directive("@def", NAME_ARG, false)).unwrap());

/// Invocation: group 1 is the indentation, group 2 the name.
static MIXIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&directive("@mixin", NAME_ARG, true)).unwrap());

/// Optional `ASK { ... }` envelope around a body.
static ASK_SHELL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^\s*ask\s*\{(.*)\}\s*$").unwrap());

/// Mixins keyed by name.
pub type MixinMap = HashMap<String, Mixin>;

/// A named query fragment with zero base indentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mixin {
    name: String,
    lines: Vec<String>,
}

impl Mixin {
    /// Normalise a raw body: drop an `ASK { }` shell, strip the common
    /// indentation and surrounding blank lines.
    pub fn new(name: impl Into<String>, raw: &str) -> Self {
        let raw = raw
            .strip_prefix("\r\n")
            .or_else(|| raw.strip_prefix('\n'))
            .unwrap_or(raw);

        let (head, rest) = match ASK_SHELL_RE.captures(raw).and_then(|c| c.get(1)) {
            Some(inner) => split_brace_line(inner.as_str()),
            None => (None, raw),
        };

        let dedented = textwrap::dedent(rest);
        let mut lines: Vec<String> = head
            .map(str::to_string)
            .into_iter()
            .chain(dedented.lines().map(|line| line.trim_end().to_string()))
            .collect();

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        let leading = lines.iter().take_while(|l| l.is_empty()).count();
        lines.drain(..leading);

        Self {
            name: name.into(),
            lines,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Body at zero indentation.
    pub fn body(&self) -> String {
        self.lines.join("\n")
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Body with `indent` in front of every non-blank line.
    pub fn render(&self, indent: &str) -> String {
        self.render_with(indent, "\n")
    }

    /// Like [`Mixin::render`], joining lines with `line_break`.
    pub fn render_with(&self, indent: &str, line_break: &str) -> String {
        self.lines
            .iter()
            .map(|line| {
                if line.is_empty() {
                    String::new()
                } else {
                    format!("{indent}{line}")
                }
            })
            .collect::<Vec<_>>()
            .join(line_break)
    }
}

/// Splits the inside of an `ASK { }` shell into the text sharing the line with
/// the opening brace (which has lost its indentation) and the remaining lines.
fn split_brace_line(inner: &str) -> (Option<&str>, &str) {
    let (first, rest) = inner.split_once('\n').unwrap_or((inner, ""));
    let first = first.trim();
    if first.is_empty() {
        (None, rest)
    } else {
        (Some(first), rest)
    }
}

/// Template with its definition blocks removed.
pub(crate) struct Extracted {
    pub(crate) stripped: String,
    pub(crate) mixins: MixinMap,
    /// Byte ranges of the removed blocks in the original template, ascending.
    regions: Vec<Range<usize>>,
}

impl Extracted {
    /// Offset in the original template of a byte offset in `stripped`.
    pub(crate) fn source_offset(&self, offset: usize) -> usize {
        let mut source = offset;
        for region in &self.regions {
            if region.start > source {
                break;
            }
            source += region.len();
        }
        source
    }
}

/// Remove every definition block from `template` and collect the mixins.
///
/// The first definition of a name wins. Under [`MixinPolicy::Strict`] a
/// duplicate or an `# @def` with no matching `# @end` is an error; otherwise
/// duplicates are dropped and unterminated directives stay in the output.
pub fn extract_mixins(template: &str, policy: MixinPolicy) -> TemplateResult<(String, MixinMap)> {
    let extracted = extract(template, policy)?;
    Ok((extracted.stripped, extracted.mixins))
}

pub(crate) fn extract(template: &str, policy: MixinPolicy) -> TemplateResult<Extracted> {
    let mut mixins = MixinMap::new();
    let mut regions: Vec<Range<usize>> = Vec::new();
    let mut stripped = String::with_capacity(template.len());
    let mut last = 0;

    for caps in DEF_RE.captures_iter(template) {
        let (Some(region), Some(name), Some(body)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };

        stripped.push_str(&template[last..region.start()]);
        last = region.end();
        regions.push(region.range());

        let name = name.as_str();

        // A second `# @def` before the `# @end` means this block was never closed.
        if let Some(nested) = DEF_LINE_RE.captures(body.as_str()) {
            let line = line_of(template, region.start());
            if policy.is_strict() {
                return Err(TemplateError::UnterminatedMixin {
                    name: name.to_string(),
                    line,
                });
            }
            warn!(
                mixin = name,
                line,
                nested = nested.get(1).map_or("", |m| m.as_str()),
                "mixin definition has no `# @end` before the next `# @def`"
            );
        }

        if mixins.contains_key(name) {
            if policy.is_strict() {
                return Err(TemplateError::DuplicateMixin {
                    name: name.to_string(),
                });
            }
            warn!(mixin = name, "ignoring duplicate mixin definition");
            continue;
        }

        let mixin = Mixin::new(name, body.as_str());
        debug!(mixin = mixin.name(), lines = mixin.line_count(), "extracted mixin");
        mixins.insert(name.to_string(), mixin);
    }
    stripped.push_str(&template[last..]);

    let unterminated = DEF_LINE_RE
        .captures_iter(template)
        .filter_map(|caps| Some((caps.get(0)?, caps.get(1)?)))
        .find(|(m, _)| !regions.iter().any(|r| r.contains(&m.start())));

    if let Some((m, name)) = unterminated {
        let line = line_of(template, m.start());
        if policy.is_strict() {
            return Err(TemplateError::UnterminatedMixin {
                name: name.as_str().to_string(),
                line,
            });
        }
        warn!(mixin = name.as_str(), line, "mixin definition has no `# @end`, leaving it in place");
    }

    Ok(Extracted {
        stripped,
        mixins,
        regions,
    })
}

/// Replace every `# @mixin <name>` line with the re-indented body.
///
/// One scan only: invocations that appear inside an expanded body are not
/// expanded again. Unknown names are left untouched unless the policy is strict.
pub fn expand_mixins(template: &str, mixins: &MixinMap, policy: MixinPolicy) -> TemplateResult<String> {
    expand(template, mixins, policy, |offset| line_of(template, offset))
}

/// Expansion with `locate` turning a byte offset of `template` into the line
/// number reported for an undefined mixin.
pub(crate) fn expand<F>(
    template: &str,
    mixins: &MixinMap,
    policy: MixinPolicy,
    locate: F,
) -> TemplateResult<String>
where
    F: Fn(usize) -> usize,
{
    let mut expanded = String::with_capacity(template.len());
    let mut last = 0;

    for caps in MIXIN_RE.captures_iter(template) {
        let (Some(site), Some(indent), Some(name)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };

        let Some(mixin) = mixins.get(name.as_str()) else {
            if policy.is_strict() {
                return Err(TemplateError::UndefinedMixin {
                    name: name.as_str().to_string(),
                    line: locate(site.start()),
                });
            }
            debug!(mixin = name.as_str(), "no definition for mixin, leaving directive");
            continue;
        };

        let cr = carriage_return(site.as_str());
        let line_break = if cr.is_empty() { "\n" } else { "\r\n" };

        expanded.push_str(&template[last..site.start()]);
        expanded.push_str(&mixin.render_with(indent.as_str(), line_break));
        expanded.push_str(cr);
        last = site.end();
    }
    expanded.push_str(&template[last..]);

    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn mixin_map(pairs: &[(&str, &str)]) -> MixinMap {
        pairs
            .iter()
            .map(|(name, body)| (name.to_string(), Mixin::new(*name, body)))
            .collect()
    }

    // =========================================================================
    // Normalisation
    // =========================================================================

    #[test]
    fn test_body_strips_common_indentation() {
        let mixin = Mixin::new("m", "\n    a\n      b\n    c\n");
        assert_eq!(mixin.body(), "a\n  b\nc");
    }

    #[test]
    fn test_body_without_indentation_is_kept() {
        let mixin = Mixin::new("m", "a\n  b\n");
        assert_eq!(mixin.body(), "a\n  b");
    }

    #[test]
    fn test_body_blank_lines_trimmed_at_edges_only() {
        let mixin = Mixin::new("m", "\n\n    a\n\n    b\n\n");
        assert_eq!(mixin.body(), "a\n\nb");
    }

    #[test]
    fn test_ask_shell_is_removed() {
        let raw = "\n    ASK {\n        ?s a ?t .\n        ?t ?p ?o .\n    }\n";
        assert_eq!(Mixin::new("m", raw).body(), "?s a ?t .\n?t ?p ?o .");
    }

    #[test]
    fn test_ask_shell_with_content_on_brace_line() {
        let raw = "\n    ask { ?s a ?t .\n        ?t ?p ?o .\n    }\n";
        assert_eq!(Mixin::new("m", raw).body(), "?s a ?t .\n?t ?p ?o .");
    }

    #[test]
    fn test_single_line_ask_shell() {
        assert_eq!(Mixin::new("m", "ASK { ?s ?p ?o }").body(), "?s ?p ?o");
    }

    #[test]
    fn test_render_round_trips_relative_indentation() {
        let mixin = Mixin::new("m", "\n\t\tFILTER(\n\t\t\t?x > 0\n\t\t)\n");
        assert_eq!(mixin.render("  "), "  FILTER(\n  \t?x > 0\n  )");
    }

    #[test]
    fn test_render_leaves_blank_lines_empty() {
        let mixin = Mixin::new("m", "a\n\nb");
        assert_eq!(mixin.render("    "), "    a\n\n    b");
    }

    // =========================================================================
    // Extraction
    // =========================================================================

    #[test_case("# @def m\n  x\n# @end\n" ; "canonical")]
    #[test_case("#@def m\n  x\n#@end\n" ; "no space after hash")]
    #[test_case("    #  @def   m  \n  x\n\t# @end \n" ; "indented with padding")]
    #[test_case("# @def m\r\n  x\r\n# @end\r\n" ; "crlf line endings")]
    fn test_extract_directive_forms(template: &str) {
        let (stripped, mixins) = extract_mixins(template, MixinPolicy::Strict).unwrap();
        assert_eq!(stripped, "");
        assert_eq!(mixins["m"].body(), "x");
    }

    #[test]
    fn test_extract_removes_region_and_keeps_surroundings() {
        let template = "A\n# @def m\n  x\n# @end\nB\n";
        let (stripped, mixins) = extract_mixins(template, MixinPolicy::Permissive).unwrap();
        assert_eq!(stripped, "A\nB\n");
        assert_eq!(mixins.len(), 1);
        assert_eq!(mixins["m"].name(), "m");
    }

    #[test]
    fn test_extract_multiple_definitions() {
        let template = "# @def a\n  1\n# @end\nQ\n# @def b\n  2\n# @end\n";
        let (stripped, mixins) = extract_mixins(template, MixinPolicy::Permissive).unwrap();
        assert_eq!(stripped, "Q\n");
        assert_eq!(mixins["a"].body(), "1");
        assert_eq!(mixins["b"].body(), "2");
    }

    #[test]
    fn test_extract_empty_definition() {
        let (stripped, mixins) =
            extract_mixins("# @def empty\n# @end\n", MixinPolicy::Permissive).unwrap();
        assert_eq!(stripped, "");
        assert_eq!(mixins["empty"].line_count(), 0);
    }

    #[test]
    fn test_directive_must_own_its_line() {
        let template = "x # @def m\n  y\n# @end\n";
        let (stripped, mixins) = extract_mixins(template, MixinPolicy::Permissive).unwrap();
        assert_eq!(stripped, template);
        assert!(mixins.is_empty());
    }

    #[test]
    fn test_duplicate_definition_first_wins() {
        let template = "# @def m\n  first\n# @end\n# @def m\n  second\n# @end\n";

        let (stripped, mixins) = extract_mixins(template, MixinPolicy::Permissive).unwrap();
        assert_eq!(stripped, "");
        assert_eq!(mixins["m"].body(), "first");

        let strict = extract_mixins(template, MixinPolicy::Strict);
        assert_eq!(
            strict,
            Err(TemplateError::DuplicateMixin {
                name: "m".to_string()
            })
        );
    }

    #[test]
    fn test_unterminated_definition() {
        let template = "SELECT *\n# @def broken\n  ?s ?p ?o .\n";

        let (stripped, mixins) = extract_mixins(template, MixinPolicy::Permissive).unwrap();
        assert_eq!(stripped, template);
        assert!(mixins.is_empty());

        let strict = extract_mixins(template, MixinPolicy::Strict);
        assert_eq!(
            strict,
            Err(TemplateError::UnterminatedMixin {
                name: "broken".to_string(),
                line: 2
            })
        );
    }

    #[test]
    fn test_definition_closed_only_by_a_later_definition() {
        let template = "# @def a\n  x\n# @def b\n  y\n# @end\n# @mixin a";

        assert!(extract_mixins(template, MixinPolicy::Permissive).is_ok());

        let strict = extract_mixins(template, MixinPolicy::Strict);
        assert_eq!(
            strict,
            Err(TemplateError::UnterminatedMixin {
                name: "a".to_string(),
                line: 1
            })
        );
    }

    #[test]
    fn test_source_offset_skips_removed_regions() {
        let template = "A\n# @def m\n  x\n# @end\nB\n# @def n\n  y\n# @end\nC";
        let extracted = extract(template, MixinPolicy::Strict).unwrap();

        assert_eq!(extracted.stripped, "A\nB\nC");
        assert_eq!(extracted.source_offset(0), 0);
        assert!(template[extracted.source_offset(2)..].starts_with("B\n# @def n"));
        assert_eq!(&template[extracted.source_offset(4)..], "C");
    }

    // =========================================================================
    // Expansion
    // =========================================================================

    #[test]
    fn test_expand_replaces_only_the_directive_line() {
        let mixins = mixin_map(&[("m", "X\nY")]);
        let out = expand_mixins("a\n    # @mixin m\nb", &mixins, MixinPolicy::Strict).unwrap();
        assert_eq!(out, "a\n    X\n    Y\nb");
    }

    #[test]
    fn test_expand_keeps_crlf() {
        let mixins = mixin_map(&[("m", "X")]);
        let out = expand_mixins("a\r\n  # @mixin m\r\nb", &mixins, MixinPolicy::Strict).unwrap();
        assert_eq!(out, "a\r\n  X\r\nb");
    }

    #[test]
    fn test_expand_multiline_body_into_crlf_template() {
        let mixins = mixin_map(&[("m", "x\ny")]);
        let out = expand_mixins("A\r\n  # @mixin m\r\nB", &mixins, MixinPolicy::Strict).unwrap();
        assert_eq!(out, "A\r\n  x\r\n  y\r\nB");
    }

    #[test]
    fn test_expand_unknown_mixin_permissive() {
        let mixins = mixin_map(&[("m", "X")]);
        let template = "# @mixin other\n# @mixin m";
        let out = expand_mixins(template, &mixins, MixinPolicy::Permissive).unwrap();
        assert_eq!(out, "# @mixin other\nX");
    }

    #[test]
    fn test_expand_unknown_mixin_strict() {
        let mixins = mixin_map(&[("m", "X")]);
        let result = expand_mixins("# @mixin m\n  # @mixin other", &mixins, MixinPolicy::Strict);
        assert_eq!(
            result,
            Err(TemplateError::UndefinedMixin {
                name: "other".to_string(),
                line: 2
            })
        );
    }

    #[test]
    fn test_expand_is_not_recursive() {
        let mixins = mixin_map(&[("outer", "# @mixin inner\n?s ?p ?o ."), ("inner", "?x ?y ?z .")]);
        let out = expand_mixins("  # @mixin outer", &mixins, MixinPolicy::Strict).unwrap();
        assert_eq!(out, "  # @mixin inner\n  ?s ?p ?o .");
    }
}
