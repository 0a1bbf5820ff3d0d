//! Crawler module for page fetching, extraction and crawl orchestration
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - HTML extraction of content, links and metadata
//! - The URL frontier, deduplication and concurrency limiting
//! - The per-page pipeline and the batch loop that drives it

mod context;
mod coordinator;
mod dedup;
mod fetcher;
mod limiter;
mod parser;
mod pipeline;
mod retry;
mod scheduler;

pub use context::CrawlContext;
pub use coordinator::{BatchSummary, Crawler};
pub use dedup::{content_digest, Deduplicator};
pub use fetcher::{
    build_http_client, FetchError, FetchedResource, Fetcher, HttpTransport, Transport,
};
pub use limiter::{Admission, Limiter};
pub use parser::{extract_page, ExtractOptions, PageMetadata, PageRecord};
pub use pipeline::{process_page, PipelineResult};
pub use retry::{retry, RetryPolicy};
pub use scheduler::{Frontier, FrontierEntry};

use crate::config::CrawlConfig;
use crate::output::CrawlReport;
use crate::ArchiverError;

/// Runs a complete crawl with the configured engine
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Create the output directories
/// 2. Build the HTTP client and start the rendering engine
/// 3. Crawl batches until the frontier empties, the page ceiling is hit,
///    or `shutdown` completes
/// 4. Write the JSON report
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `shutdown` - Completes when the run should stop early
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The run finished, possibly early
/// * `Err(ArchiverError)` - Startup failed before any page was crawled
pub async fn crawl<F>(config: CrawlConfig, shutdown: F) -> Result<CrawlReport, ArchiverError>
where
    F: std::future::Future<Output = ()>,
{
    let mut crawler = Crawler::from_config(config).await?;
    Ok(crawler.crawl_until(None, shutdown).await)
}
