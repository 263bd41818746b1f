//! Free-text fuzzification.
//!
//! Decorates each whitespace-delimited token with wildcards (`*term*`) or a
//! fuzzy marker (`term~`). Text that already uses `*`, `~` or `:` is taken to
//! be an advanced query and left alone.

use serde::{Deserialize, Serialize};

/// Characters that mark text as an advanced query.
const ADVANCED_SYNTAX: [char; 3] = ['*', '~', ':'];

/// Fuzzification policy for free-text queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fuzzify {
    /// Pass text through unchanged.
    #[default]
    #[serde(rename = "none", alias = "off")]
    Off,
    /// Surround each token with `*`.
    #[serde(rename = "*")]
    Wildcard,
    /// Append `~` to each token.
    #[serde(rename = "~")]
    Fuzzy,
}

/// Applies the fuzzify policy to free text.
///
/// Tokens are re-joined with single spaces.
///
/// # Examples
///
/// ```
/// use facet_query::{Fuzzify, fuzzify};
///
/// assert_eq!(fuzzify("einstein", Fuzzify::Wildcard), "*einstein*");
/// assert_eq!(fuzzify("einstein*", Fuzzify::Wildcard), "einstein*");
/// assert_eq!(fuzzify("albert einstein", Fuzzify::Fuzzy), "albert~ einstein~");
/// ```
pub fn fuzzify(text: &str, mode: Fuzzify) -> String {
    if mode == Fuzzify::Off || text.contains(ADVANCED_SYNTAX) {
        return text.to_string();
    }

    text.split_whitespace()
        .map(|token| match mode {
            Fuzzify::Wildcard => format!("*{token}*"),
            Fuzzify::Fuzzy => format!("{token}~"),
            Fuzzify::Off => token.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
