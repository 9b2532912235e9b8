// ABOUTME: Main library entry point for the lawjobs extractor.
// ABOUTME: Re-exports the public API: Crawler, CrawlerBuilder, RecordBuilder, JobRecord, ExtractError and sinks.

//! Structured job-posting extraction for simplylawjobs.com.
//!
//! The crate walks the board's listing pages, reads each job detail page
//! with ordered selector rules, derives a stable job id from the page URL
//! and enriches the location through a geocoder when one is reachable.
//! Only records with every required field populated are emitted.
//!
//! # Example
//!
//! ```no_run
//! use lawjobs_extract::{Crawler, ExtractError, JsonLinesSink};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ExtractError> {
//!     let crawler = Crawler::builder().max_pages(1).build()?;
//!     let mut sink = JsonLinesSink::new(std::io::stdout());
//!     let stats = crawler.run(&mut sink).await?;
//!     eprintln!("emitted {} records", stats.emitted);
//!     Ok(())
//! }
//! ```

pub mod builder;
mod compiled;
pub mod crawl;
pub mod error;
pub mod geocode;
pub mod identifier;
pub mod listing;
pub mod location;
pub mod normalize;
pub mod options;
pub mod record;
pub mod resource;
pub mod rules;
pub mod select;
pub mod sink;

pub use crate::builder::{BuildOutcome, ExtractedFields, RecordBuilder};
pub use crate::crawl::{CrawlStats, Crawler};
pub use crate::error::{ErrorCode, ExtractError};
pub use crate::geocode::{
    DisabledGeocoder, GeocodeError, GeocodeResult, Geocoder, NominatimGeocoder,
    DEFAULT_NOMINATIM_URL,
};
pub use crate::identifier::derive_id;
pub use crate::location::{enrich_location, Enrichment};
pub use crate::normalize::{normalize, take_first, NormalizedJoin};
pub use crate::options::{CrawlOptions, CrawlerBuilder, DEFAULT_START_URL};
pub use crate::record::JobRecord;
pub use crate::resource::{Fetcher, HttpFetcher};
pub use crate::rules::{load_builtin_rules, FieldRules, ListingRules, SelectorSpec, SiteRules};
pub use crate::sink::{JsonLinesSink, RecordSink};
