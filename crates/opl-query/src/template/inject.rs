//! Optional injection points: `# @inject $label`.

use super::{carriage_return, directive, Injections};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::trace;

/// Group 1 is the indentation, group 2 the label.
static INJECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&directive("@inject", r"[ \t]+\$(\w+)", true)).unwrap());

/// Replace each injection directive whose label has a value with
/// `indentation + value`. Directives without a value are left as they are.
pub fn apply_injections(template: &str, injections: &Injections) -> String {
    INJECT_RE
        .replace_all(template, |caps: &Captures| {
            let label = &caps[2];
            match injections.get(label) {
                Some(value) => {
                    trace!(label, "applying injection");
                    format!("{}{}{}", &caps[1], value, carriage_return(&caps[0]))
                }
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
