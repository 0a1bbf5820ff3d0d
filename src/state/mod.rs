//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: Lifecycle of one crawl run (idle, seeding, batches, reporting, done)
//! - `PageOutcome`: How a single page pipeline ended
//! - `StopReason`: Why the batch loop stopped

mod crawl_phase;
mod page_outcome;
mod stop_reason;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use page_outcome::PageOutcome;
pub use stop_reason::StopReason;
