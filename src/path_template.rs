//! Extraction of path parameters from HTTP URL templates.

use once_cell::sync::Lazy;
use regex::Regex;

// TODO: expand `=pattern/*` and `=pattern/**` captures instead of substituting the bare field
// value, e.g. `/v1/{name=shelves/*/books/*}:publish`.
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-zA-Z0-9_.]+?)(=[^{}]+)?\}").unwrap());

/// The marker substituted for each placeholder in [`PathTemplate::format`].
pub const POSITIONAL_MARKER: &str = "%v";

/// A URL template split into a positional format string and its parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathTemplate {
    /// The template with each placeholder replaced by [`POSITIONAL_MARKER`]. Literal `%`
    /// characters are doubled.
    pub format: String,
    /// Dotted field paths of the placeholders, in template order.
    pub params: Vec<String>,
}

impl PathTemplate {
    pub fn parse(template: &str) -> PathTemplate {
        let escaped = template.replace('%', "%%");
        let format = PLACEHOLDER
            .replace_all(&escaped, POSITIONAL_MARKER)
            .into_owned();
        let params = PLACEHOLDER
            .captures_iter(template)
            .map(|captures| captures[1].to_owned())
            .collect();
        PathTemplate { format, params }
    }
}
