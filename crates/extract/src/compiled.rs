// ABOUTME: Pre-compiled CSS matcher cache for listing-page queries.
// ABOUTME: Every listing page reuses the same few selectors, so each is compiled once.

use std::collections::HashMap;
use std::sync::RwLock;

use dom_query::Matcher;
use once_cell::sync::Lazy;

/// Thread-safe cache of compiled CSS selectors; invalid selectors cache as `None`.
static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Option<Matcher>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Gets or compiles a CSS selector, caching the result.
///
/// Returns `None` if the selector is invalid. A poisoned cache lock falls
/// back to compiling without caching.
pub fn get_or_compile(css: &str) -> Option<Matcher> {
    if let Ok(cache) = SELECTOR_CACHE.read() {
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
    }

    let compiled = Matcher::new(css).ok();
    if let Ok(mut cache) = SELECTOR_CACHE.write() {
        // Another thread may have inserted while we compiled
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
        cache.insert(css.to_string(), compiled.clone());
    }
    compiled
}
