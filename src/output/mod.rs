//! Output module for crawl artifacts and reports
//!
//! This module handles:
//! - The output directory layout and PDF file naming
//! - Live crawl counters
//! - Building, writing and printing the final crawl report

mod files;
mod report;
pub mod stats;

pub use files::{sanitize_filename, write_unique, OutputLayout};
pub use report::{
    format_duration, write_report, ContentSummaryEntry, CrawlReport, FailedUrlRecord,
    ReportSummary,
};
pub use stats::{print_report, CrawlStats, StatsSnapshot};
