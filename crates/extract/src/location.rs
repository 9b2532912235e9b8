// ABOUTME: Best-effort location enrichment: geocode the raw text, fall back to it on any failure.
// ABOUTME: Composes "<raw>, <locality>, <region>, <country>" from the geocoder's trailing components.

//! Location enrichment.
//!
//! Two states: attempt and fallback. The attempt geocodes the raw location
//! text under a bounded timeout and, given an address with at least three
//! comma-separated components, appends the last three to the raw text.
//! Every failure resolves to the trimmed raw text; nothing is propagated.

use std::time::Duration;

use tracing::debug;

use crate::geocode::{GeocodeError, Geocoder};

/// Default bound on a single geocoding call.
pub const DEFAULT_GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of an enrichment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment {
    /// Raw text extended with geocoder components.
    Enriched(String),
    /// Raw text, trimmed, because enrichment did not succeed.
    Raw(String),
}

impl Enrichment {
    pub fn is_enriched(&self) -> bool {
        matches!(self, Enrichment::Enriched(_))
    }

    pub fn into_string(self) -> String {
        match self {
            Enrichment::Enriched(s) | Enrichment::Raw(s) => s,
        }
    }
}

/// Builds the composite location from the raw text and a geocoder address.
///
/// Returns `None` when the address has fewer than three non-empty components.
pub fn compose_location(raw: &str, address: &str) -> Option<String> {
    let components: Vec<&str> = address
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();

    let tail = components.len().checked_sub(3).map(|start| &components[start..])?;
    let mut parts = Vec::with_capacity(4);
    parts.push(raw.trim());
    parts.extend_from_slice(tail);
    Some(parts.join(", "))
}

/// Attempts enrichment and reports which state it ended in.
pub async fn attempt_enrichment(
    geocoder: &dyn Geocoder,
    raw: &str,
    timeout: Duration,
) -> Enrichment {
    let raw = raw.trim();
    if raw.is_empty() {
        return Enrichment::Raw(String::new());
    }

    let answer = match tokio::time::timeout(timeout, geocoder.geocode(raw)).await {
        Ok(answer) => answer,
        Err(_) => Err(GeocodeError::Timeout),
    };

    match answer {
        Ok(Some(result)) => match compose_location(raw, &result.address) {
            Some(composite) => Enrichment::Enriched(composite),
            None => {
                debug!(location = raw, address = %result.address, "geocoder address too short, keeping raw location");
                Enrichment::Raw(raw.to_string())
            }
        },
        Ok(None) => {
            debug!(location = raw, "no geocoder match, keeping raw location");
            Enrichment::Raw(raw.to_string())
        }
        Err(err) => {
            debug!(location = raw, error = %err, "geocoding failed, keeping raw location");
            Enrichment::Raw(raw.to_string())
        }
    }
}

/// Enriches `raw` into a composite location string, or returns it trimmed.
pub async fn enrich_location(geocoder: &dyn Geocoder, raw: &str, timeout: Duration) -> String {
    attempt_enrichment(geocoder, raw, timeout).await.into_string()
}
