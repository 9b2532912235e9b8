// ABOUTME: Listing-page discovery: the range of result pages and the job links on each page.
// ABOUTME: Pagination numbers are read from the pagination container's markup.

//! Listing discovery.
//!
//! The index page carries a pagination block whose link texts are page
//! numbers. Every page from the smallest to the largest number is visited,
//! and each listing page yields the detail-page links of its postings.

use std::collections::HashSet;

use dom_query::Document;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::compiled::get_or_compile;
use crate::rules::ListingRules;

/// Purely numeric text between two tags, e.g. `<a href="..">3</a>`.
static PAGE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r">\s*([0-9]+)\s*<").unwrap());

/// Returns the listing page URLs to visit, in page order, at most `limit`
/// of them when set.
///
/// Falls back to just `start_url` when the index has no pagination numbers.
pub fn discover_pages(
    index_html: &str,
    start_url: &str,
    rules: &ListingRules,
    limit: Option<usize>,
) -> Vec<String> {
    let numbers = pagination_numbers(index_html, &rules.pagination);
    let (Some(&min), Some(&max)) = (numbers.iter().min(), numbers.iter().max()) else {
        return vec![start_url.to_string()];
    };
    let Ok(base) = Url::parse(start_url) else {
        return vec![start_url.to_string()];
    };

    (min..=max)
        .take(limit.unwrap_or(usize::MAX))
        .filter_map(|page| base.join(&format!("{}{}", rules.page_query, page)).ok())
        .map(String::from)
        .collect()
}

fn pagination_numbers(html: &str, container: &str) -> Vec<u32> {
    let Some(matcher) = get_or_compile(container) else {
        return vec![];
    };
    let doc = Document::from(html);
    let containers = doc.select_matcher(&matcher);

    let numbers = containers
        .iter()
        .flat_map(|el| {
            let markup = el.html().to_string();
            PAGE_NUMBER_RE
                .captures_iter(&markup)
                .filter_map(|cap| cap[1].parse::<u32>().ok())
                .collect::<Vec<_>>()
        })
        .collect();
    numbers
}

/// Returns the absolute detail-page URLs linked from a listing page,
/// de-duplicated in document order.
pub fn discover_job_links(listing_html: &str, page_url: &str, rules: &ListingRules) -> Vec<String> {
    let Some(matcher) = get_or_compile(&rules.job_link) else {
        return vec![];
    };
    let Ok(base) = Url::parse(page_url) else {
        return vec![];
    };
    let doc = Document::from(listing_html);
    let anchors = doc.select_matcher(&matcher);

    let mut seen = HashSet::new();
    let links = anchors
        .iter()
        .filter_map(|el| el.attr("href").map(|href| href.trim().to_string()))
        .filter(|href| !href.is_empty())
        .filter_map(|href| base.join(&href).ok())
        .map(String::from)
        .filter(|url| seen.insert(url.clone()))
        .collect();
    links
}

/// True when `url`'s host is one of `allowed`, or when `allowed` is empty.
pub fn is_allowed(url: &str, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .map(|host| allowed.iter().any(|d| d.eq_ignore_ascii_case(&host)))
        .unwrap_or(false)
}
