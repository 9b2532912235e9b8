// ABOUTME: Document selector layer returning raw text or attribute fragments for a selector.
// ABOUTME: Evaluates ordered FieldRules, stopping at the first rule with a non-empty normalized value.

//! Selector-based fragment extraction.
//!
//! Key behaviors:
//! - Fragments are returned raw, in document order; cleaning belongs to the normalizer.
//! - `Text` yields only the direct child text nodes of each match, so nested
//!   markup (e.g. a `<span>` inside a `<p>`) is not folded into the parent.
//! - Invalid selectors yield no fragments.
//! - Rules are tried in order; the first that returns any fragment wins and
//!   later rules are never evaluated, even when its fragments are blank.

use scraper::{Html, Selector};

use crate::rules::{FieldRules, SelectorSpec};

/// Extracts the raw fragments a single selector spec yields.
pub fn select_fragments(doc: &Html, spec: &SelectorSpec) -> Vec<String> {
    match spec {
        SelectorSpec::Text(css) => own_text(doc, css),
        SelectorSpec::DeepText(css) => deep_text(doc, css),
        SelectorSpec::Attr(parts) => match parts.as_slice() {
            [css, attr, ..] => attr_values(doc, css, attr),
            // Single-element Attr falls back to text extraction
            [css] => own_text(doc, css),
            [] => vec![],
        },
    }
}

/// Evaluates `rules` in priority order and returns the normalized value of
/// the first rule that matches anything.
///
/// Later rules are never tried once one matches, so a match made only of
/// whitespace normalizes to nothing and yields `None`.
pub fn extract_normalized(doc: &Html, rules: &FieldRules) -> Option<String> {
    let fragments = extract_fragments(doc, rules)?;
    let joined = rules.joiner().join(&fragments);
    (!joined.is_empty()).then_some(joined)
}

/// Returns the raw fragments of the first rule that matches anything.
pub fn extract_fragments(doc: &Html, rules: &FieldRules) -> Option<Vec<String>> {
    rules.selectors.iter().find_map(|spec| {
        let fragments = select_fragments(doc, spec);
        (!fragments.is_empty()).then_some(fragments)
    })
}

fn parse_selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn own_text(doc: &Html, css: &str) -> Vec<String> {
    let Some(sel) = parse_selector(css) else {
        return vec![];
    };

    doc.select(&sel)
        .flat_map(|el| {
            el.children()
                .filter_map(|child| child.value().as_text().map(|t| t.to_string()))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn deep_text(doc: &Html, css: &str) -> Vec<String> {
    let Some(sel) = parse_selector(css) else {
        return vec![];
    };

    doc.select(&sel)
        .flat_map(|el| el.text().map(str::to_string).collect::<Vec<_>>())
        .collect()
}

fn attr_values(doc: &Html, css: &str, attr: &str) -> Vec<String> {
    let Some(sel) = parse_selector(css) else {
        return vec![];
    };

    doc.select(&sel)
        .filter_map(|el| el.value().attr(attr).map(str::to_string))
        .collect()
}
