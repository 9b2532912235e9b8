// ABOUTME: Crawl configuration (CrawlOptions) and the fluent CrawlerBuilder.
// ABOUTME: The builder wires the HTTP client, fetcher, geocoder and site rules into a Crawler.

use std::sync::Arc;
use std::time::Duration;

use crate::crawl::Crawler;
use crate::error::ExtractError;
use crate::geocode::{DisabledGeocoder, Geocoder, NominatimGeocoder, DEFAULT_NOMINATIM_URL};
use crate::location::DEFAULT_GEOCODE_TIMEOUT;
use crate::resource::{Fetcher, HttpFetcher};
use crate::rules::SiteRules;

/// Listing index crawled when no start URL is given.
pub const DEFAULT_START_URL: &str = "http://www.simplylawjobs.com/jobs";

/// Configuration options for a crawl.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub start_url: String,
    /// Hosts detail pages may live on. `None` derives them from the start
    /// URL and the site rules; an empty list disables the filter.
    pub allowed_domains: Option<Vec<String>>,
    pub max_pages: Option<usize>,
    pub concurrency: usize,
    pub timeout: Duration,
    pub geocode_timeout: Duration,
    pub user_agent: String,
    pub geocoding: bool,
    pub geocoder_url: String,
    pub rules: Option<SiteRules>,
    pub http_client: Option<reqwest::Client>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            allowed_domains: None,
            max_pages: None,
            concurrency: 8,
            timeout: Duration::from_secs(30),
            geocode_timeout: DEFAULT_GEOCODE_TIMEOUT,
            user_agent: "lawjobs/0.1".to_string(),
            geocoding: true,
            geocoder_url: DEFAULT_NOMINATIM_URL.to_string(),
            rules: None,
            http_client: None,
        }
    }
}

/// Builder for constructing a [`Crawler`].
#[derive(Clone, Default)]
pub struct CrawlerBuilder {
    opts: CrawlOptions,
    fetcher: Option<Arc<dyn Fetcher>>,
    geocoder: Option<Arc<dyn Geocoder>>,
}

impl CrawlerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listing index the crawl starts from.
    pub fn start_url(mut self, url: impl Into<String>) -> Self {
        self.opts.start_url = url.into();
        self
    }

    /// Restrict detail pages to these hosts. An empty list allows any host.
    pub fn allowed_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opts.allowed_domains = Some(domains.into_iter().map(Into::into).collect());
        self
    }

    /// Visit at most this many listing pages.
    pub fn max_pages(mut self, max: usize) -> Self {
        self.opts.max_pages = Some(max);
        self
    }

    /// Number of detail pages processed at once (at least one).
    pub fn concurrency(mut self, n: usize) -> Self {
        self.opts.concurrency = n.max(1);
        self
    }

    /// Set the HTTP request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the bound on each geocoding call.
    pub fn geocode_timeout(mut self, timeout: Duration) -> Self {
        self.opts.geocode_timeout = timeout;
        self
    }

    /// Set the User-Agent header, shared by page fetches and geocoding.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Turn location enrichment on or off.
    pub fn geocoding(mut self, enabled: bool) -> Self {
        self.opts.geocoding = enabled;
        self
    }

    /// Point the Nominatim client at another endpoint.
    pub fn geocoder_url(mut self, url: impl Into<String>) -> Self {
        self.opts.geocoder_url = url.into();
        self
    }

    /// Replace the builtin site rules.
    pub fn rules(mut self, rules: SiteRules) -> Self {
        self.opts.rules = Some(rules);
        self
    }

    /// Use a custom HTTP client for page fetches.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Use a custom page fetcher instead of HTTP.
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Use a custom geocoder. Takes precedence over `geocoding(true)`.
    pub fn geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn options(&self) -> &CrawlOptions {
        &self.opts
    }

    /// Build the Crawler with the configured options.
    pub fn build(self) -> Result<Crawler, ExtractError> {
        let CrawlerBuilder {
            opts,
            fetcher,
            geocoder,
        } = self;

        let start = url::Url::parse(&opts.start_url).map_err(|e| {
            ExtractError::invalid_url(
                &opts.start_url,
                "Build",
                Some(anyhow::anyhow!("invalid start URL: {}", e)),
            )
        })?;

        let fetcher: Arc<dyn Fetcher> = match fetcher {
            Some(fetcher) => fetcher,
            None => {
                let client = match &opts.http_client {
                    Some(client) => client.clone(),
                    None => build_http_client(&opts)?,
                };
                Arc::new(HttpFetcher::new(client))
            }
        };

        let geocoder: Arc<dyn Geocoder> = match geocoder {
            Some(geocoder) => geocoder,
            None if opts.geocoding => Arc::new(
                NominatimGeocoder::new(opts.geocoder_url.clone(), &opts.user_agent).map_err(
                    |e| ExtractError::config("BuildGeocoder", Some(anyhow::Error::new(e))),
                )?,
            ),
            None => Arc::new(DisabledGeocoder),
        };

        let allowed = match &opts.allowed_domains {
            Some(domains) => domains.iter().map(|d| d.to_lowercase()).collect(),
            None => default_allowed_domains(&start, opts.rules.as_ref()),
        };

        Ok(Crawler::new(opts, fetcher, geocoder, allowed))
    }
}

fn build_http_client(opts: &CrawlOptions) -> Result<reqwest::Client, ExtractError> {
    reqwest::Client::builder()
        .user_agent(opts.user_agent.clone())
        .timeout(opts.timeout)
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
        .map_err(|e| ExtractError::config("BuildClient", Some(anyhow::Error::new(e))))
}

/// The start URL's host plus every host the site rules name.
fn default_allowed_domains(start: &url::Url, rules: Option<&SiteRules>) -> Vec<String> {
    let builtin;
    let rules = match rules {
        Some(rules) => rules,
        None => {
            builtin = crate::rules::load_builtin_rules();
            &builtin
        }
    };

    let mut domains: Vec<String> = Vec::new();
    let hosts = start
        .host_str()
        .into_iter()
        .chain(rules.domains())
        .map(str::to_lowercase);
    for host in hosts {
        if !domains.contains(&host) {
            domains.push(host);
        }
    }
    domains
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let opts = CrawlOptions::default();
        assert_eq!(opts.start_url, DEFAULT_START_URL);
        assert_eq!(opts.concurrency, 8);
        assert_eq!(opts.timeout, Duration::from_secs(30));
        assert_eq!(opts.geocode_timeout, Duration::from_secs(10));
        assert!(opts.geocoding);
        assert!(opts.max_pages.is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let builder = CrawlerBuilder::new()
            .start_url("http://localhost:8080/jobs")
            .max_pages(3)
            .concurrency(0)
            .timeout(Duration::from_secs(5))
            .geocoding(false)
            .user_agent("test-agent");
        let opts = builder.options();
        assert_eq!(opts.start_url, "http://localhost:8080/jobs");
        assert_eq!(opts.max_pages, Some(3));
        assert_eq!(opts.concurrency, 1);
        assert_eq!(opts.timeout, Duration::from_secs(5));
        assert!(!opts.geocoding);
        assert_eq!(opts.user_agent, "test-agent");
    }

    #[test]
    fn invalid_start_url_is_rejected() {
        let err = CrawlerBuilder::new()
            .start_url("not a url")
            .geocoding(false)
            .build()
            .err()
            .expect("build should fail");
        assert!(err.is_invalid_url());
    }

    #[test]
    fn default_allowed_domains_cover_start_host_and_rules() {
        let start = url::Url::parse("http://127.0.0.1:9000/jobs").unwrap();
        assert_eq!(
            default_allowed_domains(&start, None),
            vec!["127.0.0.1", "www.simplylawjobs.com", "simplylawjobs.com"]
        );
    }

    #[test]
    fn explicit_allowed_domains_win() {
        let crawler = CrawlerBuilder::new()
            .allowed_domains(["Jobs.Example.com"])
            .geocoding(false)
            .build()
            .unwrap();
        assert_eq!(crawler.allowed_domains(), &["jobs.example.com".to_string()]);
    }
}
