//! Live crawl counters and the end-of-run console summary

use super::report::CrawlReport;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Counters updated concurrently by page pipelines
#[derive(Debug, Default)]
pub struct CrawlStats {
    pages_processed: AtomicU64,
    pdfs_rendered: AtomicU64,
    pdfs_downloaded: AtomicU64,
    errors: AtomicU64,
    start_time: Mutex<Option<DateTime<Utc>>>,
    end_time: Mutex<Option<DateTime<Utc>>>,
}

/// Point-in-time copy of [`CrawlStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Pages fetched with a success status (duplicates included)
    pub pages_processed: u64,
    pub pdfs_rendered: u64,
    pub pdfs_downloaded: u64,
    /// URLs that ended up in the failure list
    pub errors: u64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps the start time and clears any previous end time
    pub fn mark_started(&self) {
        *lock(&self.start_time) = Some(Utc::now());
        *lock(&self.end_time) = None;
    }

    pub fn mark_finished(&self) {
        *lock(&self.end_time) = Some(Utc::now());
    }

    pub fn record_page_processed(&self) {
        self.pages_processed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_pdf_rendered(&self) {
        self.pdfs_rendered.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_pdf_downloaded(&self) {
        self.pdfs_downloaded.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            pages_processed: self.pages_processed.load(Ordering::SeqCst),
            pdfs_rendered: self.pdfs_rendered.load(Ordering::SeqCst),
            pdfs_downloaded: self.pdfs_downloaded.load(Ordering::SeqCst),
            errors: self.errors.load(Ordering::SeqCst),
            start_time: *lock(&self.start_time),
            end_time: *lock(&self.end_time),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Prints a crawl report to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The report to display
pub fn print_report(report: &CrawlReport) {
    let summary = &report.summary;

    println!("=== Crawl Report ===\n");

    println!("Overview:");
    println!("  Pages crawled: {}", summary.total_pages_crawled);
    println!("  PDFs generated: {}", summary.total_pdfs_generated);
    println!("  PDFs downloaded: {}", summary.total_pdfs_downloaded);
    println!("  Errors: {}", summary.total_errors);
    println!(
        "  Duration: {}",
        summary.crawl_duration.as_deref().unwrap_or("N/A")
    );
    if let Some(reason) = summary.stop_reason {
        println!("  Stopped: {}", reason);
    }
    println!();

    if !report.campus_breakdown.is_empty() {
        println!("Campus Breakdown:");
        let total: u64 = report.campus_breakdown.values().sum();
        for (campus, count) in &report.campus_breakdown {
            let percentage = if total > 0 {
                (*count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} pages ({:.1}%)", campus, count, percentage);
        }
        println!();
    }

    if !report.failed_urls.is_empty() {
        println!("Failed URLs ({}):", report.failed_urls.len());
        for failure in &report.failed_urls {
            println!("  - {}: {}", failure.url, failure.error);
        }
        println!();
    }
}
