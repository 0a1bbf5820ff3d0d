//! Outcomes of a single page pipeline

use std::fmt;

/// How one page's pipeline ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageOutcome {
    // ===== Processed =====
    /// Fetched, extracted and recorded (rendering may still have failed)
    Archived,

    /// Fetched, but its text matched an earlier page
    DuplicateContent,

    // ===== Dropped before or after fetching =====
    /// Out of scope, already visited, disallowed by robots.txt or turned
    /// away by a closed limiter
    Skipped,

    /// Server answered with a non-2xx status
    NonSuccessStatus,

    // ===== Errors =====
    /// Recorded in the failure list
    Failed,
}

impl PageOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Archived => "archived",
            Self::DuplicateContent => "duplicate_content",
            Self::Skipped => "skipped",
            Self::NonSuccessStatus => "non_success_status",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
