//! Crawl report document

use super::files::write_unique;
use super::stats::StatsSnapshot;
use crate::state::StopReason;
use crate::url::CampusTag;
use crate::ArchiverError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A URL whose pipeline ended in an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUrlRecord {
    pub url: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl FailedUrlRecord {
    pub fn new(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            error: error.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One recorded page in the report's content summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentSummaryEntry {
    pub url: String,
    pub title: String,
    pub campus: CampusTag,
    pub timestamp: DateTime<Utc>,
}

/// Headline numbers of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_pages_crawled: u64,
    pub total_pdfs_generated: u64,
    pub total_pdfs_downloaded: u64,
    pub total_errors: u64,
    /// `H:MM:SS.mmm`, or null when the run never started
    pub crawl_duration: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Why the batch loop stopped; null when it never ran
    pub stop_reason: Option<StopReason>,
}

/// Final report of a crawl run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlReport {
    pub summary: ReportSummary,
    /// Recorded pages per campus; campuses without pages are omitted
    pub campus_breakdown: BTreeMap<CampusTag, u64>,
    pub failed_urls: Vec<FailedUrlRecord>,
    pub content_summary: Vec<ContentSummaryEntry>,
}

impl CrawlReport {
    pub fn new(
        stats: StatsSnapshot,
        campus_breakdown: BTreeMap<CampusTag, u64>,
        failed_urls: Vec<FailedUrlRecord>,
        content_summary: Vec<ContentSummaryEntry>,
    ) -> Self {
        let crawl_duration = match (stats.start_time, stats.end_time) {
            (Some(start), Some(end)) => Some(format_duration(end - start)),
            _ => None,
        };

        Self {
            summary: ReportSummary {
                total_pages_crawled: stats.pages_processed,
                total_pdfs_generated: stats.pdfs_rendered,
                total_pdfs_downloaded: stats.pdfs_downloaded,
                total_errors: stats.errors,
                crawl_duration,
                start_time: stats.start_time,
                end_time: stats.end_time,
                stop_reason: None,
            },
            campus_breakdown,
            failed_urls,
            content_summary,
        }
    }

    pub fn with_stop_reason(mut self, reason: StopReason) -> Self {
        self.summary.stop_reason = Some(reason);
        self
    }

    /// Pretty-printed JSON; non-ASCII text is written as-is
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Formats a duration as `H:MM:SS.mmm`
pub fn format_duration(duration: chrono::Duration) -> String {
    let millis = duration.num_milliseconds().max(0);
    let (secs, millis) = (millis / 1000, millis % 1000);

    format!(
        "{}:{:02}:{:02}.{:03}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        millis
    )
}

/// Writes the report to `<dir>/crawl_report_<unix-seconds>.json`
///
/// # Returns
///
/// The path written
pub fn write_report(report: &CrawlReport, dir: &Path) -> Result<PathBuf, ArchiverError> {
    let json = report.to_json_pretty()?;
    let stem = format!("crawl_report_{}", Utc::now().timestamp());

    Ok(write_unique(dir, &stem, "json", json.as_bytes())?)
}
