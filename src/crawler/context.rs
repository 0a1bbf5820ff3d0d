//! Shared state of one crawl run
//!
//! Everything concurrent pipelines read or mutate lives here and is passed
//! to them by reference. Mutable pieces carry their own lock or are atomic.

use super::dedup::Deduplicator;
use super::limiter::Limiter;
use super::parser::{ExtractOptions, PageRecord};
use crate::config::CrawlConfig;
use crate::output::{
    ContentSummaryEntry, CrawlReport, CrawlStats, FailedUrlRecord, OutputLayout,
};
use crate::robots::RobotsPolicy;
use crate::url::{CampusTag, ScopeValidator};
use std::collections::{BTreeMap, HashSet};
use std::fmt::Display;
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

#[derive(Debug, Default)]
struct RecordedPages {
    campus_counts: BTreeMap<CampusTag, u64>,
    summary: Vec<ContentSummaryEntry>,
}

/// Per-run crawl context
#[derive(Debug)]
pub struct CrawlContext {
    config: CrawlConfig,
    scope: ScopeValidator,
    dedup: Deduplicator,
    stats: CrawlStats,
    limiter: Limiter,
    robots: RobotsPolicy,
    layout: OutputLayout,
    extract_options: ExtractOptions,
    failures: Mutex<Vec<FailedUrlRecord>>,
    recorded: Mutex<RecordedPages>,
    claimed_pdfs: Mutex<HashSet<String>>,
}

impl CrawlContext {
    /// Creates a fresh context for one run
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `layout` - Output directories, already created
    pub fn new(config: CrawlConfig, layout: OutputLayout) -> Self {
        Self {
            scope: ScopeValidator::new(&config.scope),
            dedup: Deduplicator::new(),
            stats: CrawlStats::new(),
            limiter: Limiter::new(config.crawler.max_concurrent_requests as usize),
            robots: RobotsPolicy::new(
                &config.crawler.user_agent,
                config.crawler.respect_robots_txt,
            ),
            layout,
            extract_options: ExtractOptions {
                include_images: config.render.include_images,
            },
            failures: Mutex::new(Vec::new()),
            recorded: Mutex::new(RecordedPages::default()),
            claimed_pdfs: Mutex::new(HashSet::new()),
            config,
        }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub fn scope(&self) -> &ScopeValidator {
        &self.scope
    }

    pub fn dedup(&self) -> &Deduplicator {
        &self.dedup
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn limiter(&self) -> &Limiter {
        &self.limiter
    }

    pub fn robots(&self) -> &RobotsPolicy {
        &self.robots
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn extract_options(&self) -> &ExtractOptions {
        &self.extract_options
    }

    /// Appends a failure record and bumps the error counter
    pub fn record_failure(&self, url: &str, error: impl Display) {
        let error = error.to_string();
        tracing::error!("Error processing page {}: {}", url, error);

        lock(&self.failures).push(FailedUrlRecord::new(url, error));
        self.stats.record_error();
    }

    /// Counts a non-duplicate page toward its campus and, while there is
    /// room, adds it to the content summary
    pub fn record_page(&self, page: &PageRecord) {
        let limit = self.config.output.summary_size;
        let mut recorded = lock(&self.recorded);

        let campus = page.metadata.campus;
        *recorded.campus_counts.entry(campus).or_insert(0) += 1;
        if recorded.summary.len() < limit {
            recorded.summary.push(ContentSummaryEntry {
                url: page.url.to_string(),
                title: page.title.clone(),
                campus: page.metadata.campus,
                timestamp: page.captured_at,
            });
        }
    }

    /// Claims a PDF link for download
    ///
    /// # Returns
    ///
    /// `true` for the first claim of a URL in this run
    pub fn claim_pdf(&self, url: &Url) -> bool {
        lock(&self.claimed_pdfs).insert(url.to_string())
    }

    pub fn failures(&self) -> Vec<FailedUrlRecord> {
        lock(&self.failures).clone()
    }

    /// Recorded pages per campus
    pub fn campus_breakdown(&self) -> BTreeMap<CampusTag, u64> {
        lock(&self.recorded).campus_counts.clone()
    }

    /// Builds the report from the current state of the run
    pub fn build_report(&self) -> CrawlReport {
        let (campus_breakdown, content_summary) = {
            let recorded = lock(&self.recorded);
            (recorded.campus_counts.clone(), recorded.summary.clone())
        };

        CrawlReport::new(
            self.stats.snapshot(),
            campus_breakdown,
            self.failures(),
            content_summary,
        )
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::extract_page;
    use tempfile::TempDir;

    fn context(summary_size: usize) -> (TempDir, CrawlContext) {
        let temp = TempDir::new().unwrap();
        let mut config = CrawlConfig::default();
        config.output.summary_size = summary_size;
        let layout = OutputLayout::create(temp.path()).unwrap();
        (temp, CrawlContext::new(config, layout))
    }

    fn page(ctx: &CrawlContext, url: &str) -> PageRecord {
        let url = Url::parse(url).unwrap();
        extract_page(
            "<html><head><title>T</title></head><body>x</body></html>",
            &url,
            ctx.scope(),
            ctx.extract_options(),
        )
    }

    #[test]
    fn test_failures_are_recorded_and_counted() {
        let (_temp, ctx) = context(10);
        ctx.record_failure("https://btec.fpt.edu.vn/a", "timed out");

        let failures = ctx.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].error, "timed out");
        assert_eq!(ctx.stats().snapshot().errors, 1);
    }

    #[test]
    fn test_summary_is_bounded_but_tally_is_not() {
        let (_temp, ctx) = context(2);
        for path in ["hanoi/1", "hanoi/2", "hcm/1", "courses"] {
            let p = page(&ctx, &format!("https://btec.fpt.edu.vn/{}", path));
            ctx.record_page(&p);
        }

        let report = ctx.build_report();
        assert_eq!(report.content_summary.len(), 2);
        assert_eq!(report.campus_breakdown[&CampusTag::Hanoi], 2);
        assert_eq!(report.campus_breakdown[&CampusTag::Hcm], 1);
        assert_eq!(report.campus_breakdown[&CampusTag::General], 1);
        assert!(!report.campus_breakdown.contains_key(&CampusTag::Danang));
    }

    #[test]
    fn test_pdf_claimed_once() {
        let (_temp, ctx) = context(10);
        let url = Url::parse("https://btec.fpt.edu.vn/files/a.pdf").unwrap();
        assert!(ctx.claim_pdf(&url));
        assert!(!ctx.claim_pdf(&url));
    }
}
