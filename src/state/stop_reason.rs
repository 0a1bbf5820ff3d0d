//! Why a crawl run stopped

use serde::Serialize;
use std::fmt;

/// Why the batch loop stopped; carried into the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No URLs left to crawl
    FrontierExhausted,
    /// The page ceiling was reached
    CeilingReached,
    /// The shutdown signal fired
    Interrupted,
    /// The batch loop itself failed
    Aborted,
}

impl StopReason {
    /// Returns true when the run ended before its work was done
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Interrupted | Self::Aborted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FrontierExhausted => "frontier_exhausted",
            Self::CeilingReached => "ceiling_reached",
            Self::Interrupted => "interrupted",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
