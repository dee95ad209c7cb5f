//! IRI variable placeholders: `<$name>`.

use super::Variables;
use crate::error::{TemplateError, TemplateResult};
use once_cell::sync::Lazy;
use regex::Regex;

static VARIABLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<\$(\w+)>").unwrap());

/// Characters that may not appear in an IRI reference written as `<...>`.
fn is_forbidden(c: char) -> bool {
    matches!(c, '<' | '>' | '"' | ' ' | '{' | '}' | '|' | '\\' | '^' | '`') || c.is_control()
}

/// Format `value` as an IRI literal in angle-bracket syntax.
pub(crate) fn iri_literal(name: &str, value: &str) -> TemplateResult<String> {
    if value.chars().any(is_forbidden) {
        return Err(TemplateError::InvalidIri {
            name: name.to_string(),
            value: value.to_string(),
        });
    }
    Ok(format!("<{value}>"))
}

/// Replace every `<$name>` placeholder with the IRI literal of its value.
///
/// Fails on the first placeholder (in document order) that has no value or
/// whose value is not a valid IRI.
pub fn substitute_variables(template: &str, variables: &Variables) -> TemplateResult<String> {
    let mut output = String::with_capacity(template.len());
    let mut last = 0;

    for caps in VARIABLE_RE.captures_iter(template) {
        let (Some(placeholder), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let name = name.as_str();
        let value = variables
            .get(name)
            .ok_or_else(|| TemplateError::MissingVariable {
                name: name.to_string(),
            })?;

        output.push_str(&template[last..placeholder.start()]);
        output.push_str(&iri_literal(name, value)?);
        last = placeholder.end();
    }
    output.push_str(&template[last..]);

    Ok(output)
}
