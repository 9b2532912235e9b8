// ABOUTME: CLI binary for the lawjobs extractor.
// ABOUTME: Crawls the board into JSON Lines, or extracts one saved detail page with --html/--url.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use lawjobs_extract::{Crawler, CrawlerBuilder, JsonLinesSink, SiteRules, DEFAULT_START_URL};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lawjobs")]
#[command(about = "Extract structured job postings from simplylawjobs.com")]
struct Args {
    /// Listing index to start from
    #[arg(default_value = DEFAULT_START_URL)]
    start_url: String,

    /// Visit at most this many listing pages
    #[arg(long = "max-pages")]
    max_pages: Option<usize>,

    /// Detail pages processed at once
    #[arg(long = "concurrency", default_value_t = 8)]
    concurrency: usize,

    /// HTTP request timeout in seconds
    #[arg(long = "timeout-secs", default_value_t = 30)]
    timeout_secs: u64,

    /// Nominatim-compatible geocoder endpoint
    #[arg(long = "geocoder-url")]
    geocoder_url: Option<String>,

    /// Keep locations as they appear on the page
    #[arg(long = "no-geocode")]
    no_geocode: bool,

    /// JSON file replacing the builtin site rules
    #[arg(long = "rules")]
    rules: Option<PathBuf>,

    /// Saved detail page to extract (requires --url)
    #[arg(long = "html")]
    html: Option<PathBuf>,

    /// URL the saved page was served from (required with --html)
    #[arg(long = "url")]
    url: Option<String>,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long = "log-level", default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_rules(path: &Path) -> Result<SiteRules> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading rules file {}", path.display()))?;
    Ok(SiteRules::from_json(&json)?)
}

fn crawler_from_args(args: &Args) -> Result<Crawler> {
    let mut builder = CrawlerBuilder::new()
        .start_url(args.start_url.clone())
        .concurrency(args.concurrency)
        .timeout(Duration::from_secs(args.timeout_secs))
        .geocoding(!args.no_geocode);

    if let Some(max) = args.max_pages {
        builder = builder.max_pages(max);
    }
    if let Some(url) = &args.geocoder_url {
        builder = builder.geocoder_url(url.clone());
    }
    if let Some(path) = &args.rules {
        builder = builder.rules(load_rules(path)?);
    }
    Ok(builder.build()?)
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

/// Extracts one saved page. Returns false when the record is incomplete.
async fn extract_saved_page(args: &Args, html_path: &Path, url: &str) -> Result<bool> {
    let crawler = crawler_from_args(args)?;
    let html = fs::read_to_string(html_path)
        .with_context(|| format!("reading {}", html_path.display()))?;

    let outcome = crawler.record_builder().build(&html, url).await?;
    if !outcome.is_complete() {
        warn!(url, missing = ?outcome.missing, "record is incomplete");
    }

    let mut out = open_output(args.output.as_deref())?;
    writeln!(out, "{}", serde_json::to_string_pretty(&outcome.record)?)?;
    out.flush()?;
    Ok(outcome.is_complete())
}

async fn crawl(args: &Args) -> Result<()> {
    let crawler = crawler_from_args(args)?;
    let mut sink = JsonLinesSink::new(open_output(args.output.as_deref())?);
    let stats = crawler.run(&mut sink).await?;
    info!(emitted = stats.emitted, rejected = stats.rejected, "done");
    Ok(())
}

async fn run(args: Args) -> Result<bool> {
    match (&args.html, &args.url) {
        (Some(html_path), Some(url)) => extract_saved_page(&args, html_path, url).await,
        (Some(_), None) => bail!("--url is required when using --html"),
        (None, Some(_)) => bail!("--url is only valid together with --html"),
        (None, None) => crawl(&args).await.map(|()| true),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
