// ABOUTME: Field normalizer that cleans raw text fragments into a single value.
// ABOUTME: Drops blank fragments, trims the rest and joins them in document order.

//! Text fragment normalization.
//!
//! Every extracted field passes through here. A fragment is one raw text
//! value returned by a single selector match; fragments that are empty or
//! whitespace-only are discarded, the rest are trimmed and joined.

/// Separator used when a field does not configure its own.
pub const DEFAULT_SEPARATOR: &str = " ";

/// Joins the non-blank fragments, each trimmed, with `separator`.
///
/// Order is preserved. An empty or all-blank input yields an empty string.
pub fn normalize<S: AsRef<str>>(fragments: &[S], separator: &str) -> String {
    fragments
        .iter()
        .map(|f| f.as_ref().trim())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Returns the first non-blank fragment, trimmed.
pub fn take_first<S: AsRef<str>>(fragments: &[S]) -> Option<String> {
    fragments
        .iter()
        .map(|f| f.as_ref().trim())
        .find(|f| !f.is_empty())
        .map(str::to_string)
}

/// A configured join, carrying the separator for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedJoin {
    separator: String,
}

impl NormalizedJoin {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Joins fragments into a single string.
    pub fn join<S: AsRef<str>>(&self, fragments: &[S]) -> String {
        normalize(fragments, &self.separator)
    }

    /// Joins fragments into a one-element list, for multi-value fields.
    ///
    /// Returns an empty list when nothing survives normalization.
    pub fn join_list<S: AsRef<str>>(&self, fragments: &[S]) -> Vec<String> {
        let joined = self.join(fragments);
        if joined.is_empty() {
            Vec::new()
        } else {
            vec![joined]
        }
    }
}

impl Default for NormalizedJoin {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}
