// ABOUTME: Derives the stable per-posting job identifier from a detail-page URL.
// ABOUTME: Handles bare trailing segments and segments decorated with a query string.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ExtractError;

static LEADING_DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+").unwrap());

/// Derives the job identifier from the final path segment of `source_url`.
///
/// - `http://site/jobs/12345` gives `12345` (segment used verbatim).
/// - `http://site/jobs/12345?ref=abc` gives `12345` (leading digit run).
///
/// A query-decorated segment without leading digits, or an empty final
/// segment, is an `Identifier` error.
pub fn derive_id(source_url: &str) -> Result<String, ExtractError> {
    let candidate = source_url.rsplit('/').next().unwrap_or_default();

    if candidate.contains('?') {
        return LEADING_DIGITS_RE
            .find(candidate)
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                ExtractError::identifier(
                    source_url,
                    "DeriveId",
                    Some(anyhow::anyhow!(
                        "query-decorated segment {:?} has no leading digits",
                        candidate
                    )),
                )
            });
    }

    if candidate.is_empty() {
        return Err(ExtractError::identifier(
            source_url,
            "DeriveId",
            Some(anyhow::anyhow!("empty trailing path segment")),
        ));
    }

    Ok(candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_trailing_segment() {
        assert_eq!(derive_id("http://site/jobs/12345").unwrap(), "12345");
    }

    #[test]
    fn query_decorated_segment() {
        assert_eq!(derive_id("http://site/jobs/12345?ref=abc").unwrap(), "12345");
        assert_eq!(
            derive_id("http://www.simplylawjobs.com/job/987?utm_source=x&page=2").unwrap(),
            "987"
        );
    }

    #[test]
    fn non_numeric_segment_is_kept_verbatim() {
        assert_eq!(
            derive_id("http://site/job/commercial-solicitor-leeds").unwrap(),
            "commercial-solicitor-leeds"
        );
    }

    #[test]
    fn query_without_leading_digits_fails() {
        let err = derive_id("http://site/jobs/abc?ref=1").unwrap_err();
        assert!(err.is_identifier());
        assert_eq!(err.url, "http://site/jobs/abc?ref=1");
    }

    #[test]
    fn empty_trailing_segment_fails() {
        assert!(derive_id("http://site/jobs/").unwrap_err().is_identifier());
        assert!(derive_id("").unwrap_err().is_identifier());
    }

    #[test]
    fn only_ascii_digits_count() {
        assert!(derive_id("http://site/jobs/\u{661}\u{662}\u{663}?ref=x")
            .unwrap_err()
            .is_identifier());
        assert_eq!(derive_id("http://site/jobs/42\u{663}?ref=x").unwrap(), "42");
    }

    #[test]
    fn deterministic() {
        let url = "http://site/jobs/4242?ref=feed";
        assert_eq!(derive_id(url).unwrap(), derive_id(url).unwrap());
    }
}
