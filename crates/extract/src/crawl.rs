// ABOUTME: Crawl orchestrator: walks listing pages, fetches detail pages and emits complete records.
// ABOUTME: Per-page failures are logged and counted in CrawlStats; they never stop the crawl.

//! Crawling.
//!
//! One run proceeds in three phases:
//!
//! 1. Fetch the index page and read the pagination range from it.
//! 2. Fetch every listing page and collect the detail-page links,
//!    skipping links whose job id is already queued and hosts outside
//!    the allowed domains.
//! 3. Fetch and build detail pages concurrently, handing complete
//!    records to the sink as they finish.

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::builder::{BuildOutcome, RecordBuilder};
use crate::error::ExtractError;
use crate::geocode::Geocoder;
use crate::identifier::derive_id;
use crate::listing::{discover_job_links, discover_pages, is_allowed};
use crate::options::{CrawlOptions, CrawlerBuilder};
use crate::resource::Fetcher;
use crate::rules::load_builtin_rules;
use crate::sink::RecordSink;

/// Counters for one crawl run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Listing pages fetched successfully.
    pub listing_pages: usize,
    pub listing_failures: usize,
    /// Detail pages attempted.
    pub detail_pages: usize,
    /// Records handed to the sink.
    pub emitted: usize,
    /// Detail pages that yielded no id or an incomplete record.
    pub rejected: usize,
    /// Detail pages that could not be fetched.
    pub fetch_failures: usize,
}

/// Walks a job board and emits its postings.
pub struct Crawler {
    opts: CrawlOptions,
    fetcher: Arc<dyn Fetcher>,
    builder: RecordBuilder,
    allowed: Vec<String>,
}

enum DetailResult {
    Built(BuildOutcome),
    FetchFailed,
    Rejected,
}

impl Crawler {
    /// Create a builder for configuring a Crawler.
    pub fn builder() -> CrawlerBuilder {
        CrawlerBuilder::new()
    }

    pub(crate) fn new(
        mut opts: CrawlOptions,
        fetcher: Arc<dyn Fetcher>,
        geocoder: Arc<dyn Geocoder>,
        allowed: Vec<String>,
    ) -> Self {
        let rules = opts.rules.take().unwrap_or_else(load_builtin_rules);
        let builder = RecordBuilder::new(rules, geocoder).geocode_timeout(opts.geocode_timeout);
        Self {
            opts,
            fetcher,
            builder,
            allowed,
        }
    }

    /// The builder used for detail pages, also usable on saved HTML.
    pub fn record_builder(&self) -> &RecordBuilder {
        &self.builder
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.opts
    }

    /// Hosts detail pages are restricted to; empty means any host.
    pub fn allowed_domains(&self) -> &[String] {
        &self.allowed
    }

    /// Runs the crawl, handing every complete record to `sink`.
    ///
    /// Fails only when the index page cannot be fetched or the sink
    /// rejects a record.
    pub async fn run<S>(&self, sink: &mut S) -> Result<CrawlStats, ExtractError>
    where
        S: RecordSink + ?Sized,
    {
        let mut stats = CrawlStats::default();
        let start_url = self.opts.start_url.as_str();
        let listing = &self.builder.rules().listing;

        let index = self.fetcher.fetch(start_url).await?;
        let pages = discover_pages(&index, start_url, listing, self.opts.max_pages);
        info!(url = start_url, pages = pages.len(), "discovered listing pages");

        let detail_urls = self.collect_detail_urls(&index, &pages, &mut stats).await;
        info!(jobs = detail_urls.len(), "discovered job links");

        let mut results = stream::iter(detail_urls)
            .map(|url| async move {
                let result = self.process_detail(&url).await;
                (url, result)
            })
            .buffer_unordered(self.opts.concurrency.max(1));

        while let Some((url, result)) = results.next().await {
            stats.detail_pages += 1;
            match result {
                DetailResult::FetchFailed => stats.fetch_failures += 1,
                DetailResult::Rejected => stats.rejected += 1,
                DetailResult::Built(outcome) => match outcome.into_record() {
                    Ok(record) => {
                        info!(url = %url, job_id = %record.job_id, "emitting record");
                        sink.emit(record).map_err(|e| {
                            ExtractError::sink(&url, "Emit", Some(anyhow::Error::new(e)))
                        })?;
                        stats.emitted += 1;
                    }
                    Err(e) => {
                        warn!(url = %url, error = %e, "dropping incomplete record");
                        stats.rejected += 1;
                    }
                },
            }
        }

        info!(
            listing_pages = stats.listing_pages,
            listing_failures = stats.listing_failures,
            detail_pages = stats.detail_pages,
            emitted = stats.emitted,
            rejected = stats.rejected,
            fetch_failures = stats.fetch_failures,
            "crawl finished"
        );
        Ok(stats)
    }

    /// Fetches listing pages in page order and returns the allowed detail
    /// links, one per job id.
    ///
    /// A page equal to the start URL reuses the already fetched index.
    async fn collect_detail_urls(
        &self,
        index: &str,
        pages: &[String],
        stats: &mut CrawlStats,
    ) -> Vec<String> {
        let listing = &self.builder.rules().listing;
        let start_url = self.opts.start_url.as_str();
        let mut fetched = stream::iter(pages)
            .map(|page| async move {
                if page == start_url {
                    return (page, Ok(index.to_string()));
                }
                (page, self.fetcher.fetch(page).await)
            })
            .buffered(self.opts.concurrency.max(1));

        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        while let Some((page, result)) = fetched.next().await {
            let html = match result {
                Ok(html) => html,
                Err(e) => {
                    warn!(url = %page, error = %e, "listing page failed");
                    stats.listing_failures += 1;
                    continue;
                }
            };
            stats.listing_pages += 1;

            for link in discover_job_links(&html, page, listing) {
                if !is_allowed(&link, &self.allowed) {
                    debug!(url = %link, "skipping link outside allowed domains");
                    continue;
                }
                // Links differing only in a query string share a job id
                let key = derive_id(&link).unwrap_or_else(|_| link.clone());
                if seen.insert(key) {
                    urls.push(link);
                } else {
                    debug!(url = %link, "skipping link to an already queued job");
                }
            }
        }
        urls
    }

    async fn process_detail(&self, url: &str) -> DetailResult {
        let html = match self.fetcher.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url, error = %e, "detail page failed");
                return DetailResult::FetchFailed;
            }
        };

        match self.builder.build(&html, url).await {
            Ok(outcome) => DetailResult::Built(outcome),
            Err(e) => {
                warn!(url, error = %e, "rejecting detail page");
                DetailResult::Rejected
            }
        }
    }
}
