// ABOUTME: Geocoding capability consumed by location enrichment, plus a Nominatim client.
// ABOUTME: The Geocoder trait is the narrow seam that tests replace with in-memory stubs.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Public Nominatim instance.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// A successful geocoder answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeResult {
    /// Comma-separated address, most specific component first.
    pub address: String,
}

/// Errors that can occur while geocoding. Never surfaced past enrichment.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The request could not be sent or the response body not read.
    #[error("geocoder request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The geocoder answered with a non-success status.
    #[error("geocoder returned HTTP status {0}")]
    Status(u16),

    /// The response body was not the expected shape.
    #[error("malformed geocoder response: {0}")]
    Decode(String),

    /// The call did not finish within the allotted time.
    #[error("geocoder timed out")]
    Timeout,
}

/// Resolves a free-text location to an address.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Returns `Ok(None)` when the query matched nothing.
    async fn geocode(&self, query: &str) -> Result<Option<GeocodeResult>, GeocodeError>;
}

/// A geocoder that never finds anything, used when enrichment is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGeocoder;

#[async_trait]
impl Geocoder for DisabledGeocoder {
    async fn geocode(&self, _query: &str) -> Result<Option<GeocodeResult>, GeocodeError> {
        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: String,
}

/// Geocoder backed by a Nominatim-compatible `/search` endpoint.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
}

impl NominatimGeocoder {
    /// Builds a geocoder with its own HTTP client. Nominatim rejects
    /// anonymous clients, so a user agent is required.
    pub fn new(endpoint: impl Into<String>, user_agent: &str) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodeResult>, GeocodeError> {
        let response = self
            .client
            .get(self.search_url())
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let places: Vec<NominatimPlace> =
            serde_json::from_slice(&body).map_err(|e| GeocodeError::Decode(e.to_string()))?;

        Ok(places.into_iter().next().map(|p| GeocodeResult {
            address: p.display_name,
        }))
    }
}
