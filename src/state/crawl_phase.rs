//! Lifecycle phases of a crawl run

use std::fmt;

/// Represents where a crawl run is in its lifecycle
///
/// ```text
/// Idle -> Seeding -> CrawlingBatch (repeats) -> Reporting -> Done
/// ```
///
/// Interrupts and batch-loop failures jump from `CrawlingBatch` straight to
/// `Reporting`; a run that seeds nothing goes from `Seeding` to `Reporting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Created, nothing queued yet
    Idle,

    /// Seed URLs are being queued
    Seeding,

    /// A batch of pipelines is running
    CrawlingBatch,

    /// Statistics are being turned into the report
    Reporting,

    /// The report has been produced
    Done,
}

impl CrawlPhase {
    /// Returns true if the run may move from this phase to `next`
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        matches!(
            (self, next),
            (Idle, Seeding)
                | (Seeding, CrawlingBatch)
                | (Seeding, Reporting)
                | (CrawlingBatch, CrawlingBatch)
                | (CrawlingBatch, Reporting)
                | (Reporting, Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Seeding => "seeding",
            Self::CrawlingBatch => "crawling",
            Self::Reporting => "reporting",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
