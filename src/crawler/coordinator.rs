//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the batch loop that coordinates all aspects of
//! a crawl run, including:
//! - Seeding the frontier
//! - Running bounded batches of page pipelines concurrently
//! - Feeding discovered links back into the frontier
//! - Pacing batches and handling interrupts
//! - Producing the final report

use super::context::CrawlContext;
use super::fetcher::Fetcher;
use super::pipeline::process_page;
use super::scheduler::Frontier;
use crate::config::CrawlConfig;
use crate::output::{write_report, CrawlReport, OutputLayout};
use crate::render::{build_renderer, Renderer};
use crate::state::{CrawlPhase, StopReason};
use crate::ArchiverError;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::time::Duration;
use url::Url;

/// What one batch did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Entries taken from the frontier
    pub dispatched: usize,
    /// Pipelines that ran to completion
    pub completed: usize,
    /// New frontier entries from discovered links
    pub discovered: usize,
    pub interrupted: bool,
}

/// Main crawler structure
///
/// Owns everything one run needs: the shared context, the retrying fetcher,
/// the rendering engine and the frontier.
pub struct Crawler {
    ctx: CrawlContext,
    fetcher: Fetcher,
    renderer: Box<dyn Renderer>,
    frontier: Frontier,
    phase: CrawlPhase,
    batch_size: usize,
    base_url: Option<Url>,
    stop_reason: Option<StopReason>,
}

impl Crawler {
    /// Creates a crawler with a real HTTP client and the configured engine
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Output directories exist and the engine started
    /// * `Err(ArchiverError)` - Startup failed; nothing was crawled
    pub async fn from_config(config: CrawlConfig) -> Result<Self, ArchiverError> {
        let layout = OutputLayout::create(&config.output.output_dir)?;
        let fetcher = Fetcher::from_config(&config.crawler)?;
        let renderer = build_renderer(&config.render).await?;

        Ok(Self::assemble(config, layout, fetcher, renderer))
    }

    /// Creates a crawler around an existing fetcher and renderer
    pub fn with_components(
        config: CrawlConfig,
        fetcher: Fetcher,
        renderer: Box<dyn Renderer>,
    ) -> Result<Self, ArchiverError> {
        let layout = OutputLayout::create(&config.output.output_dir)?;
        Ok(Self::assemble(config, layout, fetcher, renderer))
    }

    fn assemble(
        config: CrawlConfig,
        layout: OutputLayout,
        fetcher: Fetcher,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        let frontier = Frontier::new(
            config.crawler.max_depth,
            config.crawler.max_pages,
            config.scope.tracking_params.clone(),
        );
        // Twice the concurrency, so a slow page does not idle the other slots
        let batch_size = (config.crawler.max_concurrent_requests.max(1) as usize) * 2;
        let base_url = Url::parse(&config.crawler.base_url).ok();

        Self {
            ctx: CrawlContext::new(config, layout),
            fetcher,
            renderer,
            frontier,
            phase: CrawlPhase::Idle,
            batch_size,
            base_url,
            stop_reason: None,
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn context(&self) -> &CrawlContext {
        &self.ctx
    }

    /// Why the last run stopped, once its batch loop has ended
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Runs a full crawl and returns its report
    ///
    /// # Arguments
    ///
    /// * `seeds` - Start URLs; `None` uses the configured seeds
    pub async fn crawl(&mut self, seeds: Option<Vec<String>>) -> CrawlReport {
        self.crawl_until(seeds, std::future::pending()).await
    }

    /// Runs a crawl that stops early when `shutdown` completes
    ///
    /// Whatever ends the run (exhausted frontier, page ceiling, shutdown
    /// signal or a failure inside the batch loop) the renderer is shut down
    /// and a report is produced.
    pub async fn crawl_until<F>(
        &mut self,
        seeds: Option<Vec<String>>,
        shutdown: F,
    ) -> CrawlReport
    where
        F: Future<Output = ()>,
    {
        tracing::info!("Starting campus crawl");
        tokio::pin!(shutdown);

        self.seed(seeds);

        let reason = match AssertUnwindSafe(self.run_batches(shutdown.as_mut()))
            .catch_unwind()
            .await
        {
            Ok(reason) => reason,
            Err(_) => {
                tracing::error!("Unexpected error in the batch loop");
                StopReason::Aborted
            }
        };

        match reason {
            StopReason::FrontierExhausted => tracing::info!("Frontier is empty, crawl complete"),
            StopReason::CeilingReached => tracing::warn!(
                "Reached maximum URL limit ({}), stopping crawl",
                self.ctx.config().crawler.max_pages
            ),
            StopReason::Interrupted | StopReason::Aborted => {}
        }
        if reason.is_partial() {
            tracing::warn!("Crawl {}, reporting partial results", reason);
        }
        self.stop_reason = Some(reason);

        self.finish().await
    }

    /// Queues the seed URLs and starts the clock
    ///
    /// # Returns
    ///
    /// The number of seeds that made it into the frontier
    pub fn seed(&mut self, seeds: Option<Vec<String>>) -> usize {
        self.transition(CrawlPhase::Seeding);
        self.ctx.stats().mark_started();

        let seeds = seeds.unwrap_or_else(|| self.ctx.config().crawler.effective_seeds());
        let added = self.frontier.seed(&seeds);

        tracing::info!("Seeded frontier with {} of {} URLs", added, seeds.len());
        added
    }

    /// Runs exactly one batch without a shutdown signal
    pub async fn step(&mut self) -> BatchSummary {
        let never = std::future::pending::<()>();
        tokio::pin!(never);
        self.run_batch(never.as_mut()).await
    }

    /// Moves to `Reporting`, releases the renderer, writes the report and
    /// finishes in `Done`
    ///
    /// A report that cannot be written is logged; the report is still returned.
    pub async fn finish(&mut self) -> CrawlReport {
        self.transition(CrawlPhase::Reporting);
        self.ctx.stats().mark_finished();

        self.renderer.shutdown().await;

        let mut report = self.ctx.build_report();
        if let Some(reason) = self.stop_reason {
            report = report.with_stop_reason(reason);
        }
        match write_report(&report, &self.ctx.layout().reports_dir()) {
            Ok(path) => tracing::info!("Report saved to: {}", path.display()),
            Err(e) => tracing::error!("Failed to write crawl report: {}", e),
        }

        self.transition(CrawlPhase::Done);
        report
    }

    async fn run_batches<F>(&mut self, mut shutdown: Pin<&mut F>) -> StopReason
    where
        F: Future<Output = ()>,
    {
        loop {
            if self.frontier.ceiling_reached() {
                return StopReason::CeilingReached;
            }
            if self.frontier.is_exhausted() {
                return StopReason::FrontierExhausted;
            }

            let batch = self.run_batch(shutdown.as_mut()).await;
            if batch.interrupted {
                return StopReason::Interrupted;
            }

            if self.frontier.is_exhausted() || self.frontier.ceiling_reached() {
                continue;
            }

            let delay = self.batch_delay().await;
            if delay.is_zero() {
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.as_mut() => return StopReason::Interrupted,
            }
        }
    }

    /// Runs one batch of pipelines, feeding links back as each one finishes
    async fn run_batch<F>(&mut self, mut shutdown: Pin<&mut F>) -> BatchSummary
    where
        F: Future<Output = ()>,
    {
        self.transition(CrawlPhase::CrawlingBatch);

        let batch = self.frontier.next_batch(self.batch_size);
        let mut summary = BatchSummary {
            dispatched: batch.len(),
            ..BatchSummary::default()
        };
        if batch.is_empty() {
            return summary;
        }

        tracing::info!("Processing batch of {} URLs", batch.len());

        let ctx = &self.ctx;
        let fetcher = &self.fetcher;
        let renderer: &dyn Renderer = &*self.renderer;
        let frontier = &mut self.frontier;

        let mut pipelines: FuturesUnordered<_> = batch
            .into_iter()
            .map(move |entry| process_page(ctx, fetcher, renderer, entry))
            .collect();

        loop {
            tokio::select! {
                biased;

                _ = shutdown.as_mut() => {
                    summary.interrupted = true;
                    break;
                }
                next = pipelines.next() => match next {
                    Some(result) => {
                        summary.completed += 1;
                        tracing::debug!("{} finished: {}", result.url, result.outcome);
                        if !result.links.is_empty() {
                            summary.discovered += frontier.enqueue_discovered(
                                &result.links,
                                result.depth,
                                ctx.dedup(),
                            );
                        }
                    }
                    None => break,
                },
            }
        }

        if summary.interrupted {
            ctx.limiter().close();
            tracing::warn!(
                "Shutdown requested, abandoning {} in-flight pipelines",
                pipelines.len()
            );
        }
        drop(pipelines);

        tracing::info!(
            "Progress: {} URLs processed, {} remaining",
            frontier.dispatched_count(),
            frontier.len()
        );

        summary
    }

    /// Pause between batches: the configured delay, raised to the base
    /// origin's robots.txt Crawl-delay
    async fn batch_delay(&self) -> Duration {
        let configured = self.ctx.config().crawler.delay();

        let robots_delay = match &self.base_url {
            Some(base) => self.ctx.robots().crawl_delay(&self.fetcher, base).await,
            None => None,
        };

        robots_delay.map_or(configured, |delay| delay.max(configured))
    }

    fn transition(&mut self, next: CrawlPhase) {
        if !self.phase.can_transition_to(next) {
            tracing::warn!("Unexpected crawl phase change: {} -> {}", self.phase, next);
        }
        tracing::debug!("Crawl phase: {} -> {}", self.phase, next);
        self.phase = next;
    }
}
