//! Crawl frontier
//!
//! This module handles:
//! - FIFO queue of pending URLs with their link depth
//! - The per-run dispatched set, so no URL is handed out twice
//! - Depth limiting of discovered links
//! - The ceiling on total dispatched URLs

use super::dedup::Deduplicator;
use crate::url::normalize_url_with;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Normalized URL to fetch
    pub url: Url,

    /// Canonical deduplication key
    pub key: String,

    /// Link distance from the seeds (seeds are depth 0)
    pub depth: u32,
}

/// Pending-URL queue of one crawl run
///
/// A URL leaves the queue at most once: `next_batch` records it as
/// dispatched, and dispatched or visited URLs are never queued again.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    queued: HashSet<String>,
    dispatched: HashSet<String>,
    max_depth: u32,
    max_pages: usize,
    tracking_params: Vec<String>,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `max_depth` - Entries deeper than this are dropped
    /// * `max_pages` - Ceiling on the number of URLs ever dispatched
    /// * `tracking_params` - Query parameters ignored when building keys
    pub fn new(max_depth: u32, max_pages: usize, tracking_params: Vec<String>) -> Self {
        Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            dispatched: HashSet::new(),
            max_depth,
            max_pages,
            tracking_params,
        }
    }

    /// Queues seed URLs at depth 0
    ///
    /// Malformed seeds are logged and skipped.
    ///
    /// # Returns
    ///
    /// The number of seeds queued
    pub fn seed(&mut self, urls: &[String]) -> usize {
        let mut added = 0;

        for raw in urls {
            match normalize_url_with(raw, &self.tracking_params) {
                Ok(url) => {
                    if self.push(url, 0, None) {
                        added += 1;
                    }
                }
                Err(e) => tracing::warn!("Skipping seed {}: {}", raw, e),
            }
        }

        added
    }

    /// Queues links discovered on a page at `parent_depth + 1`
    ///
    /// URLs that are too deep, malformed, already queued, already dispatched
    /// or already visited are dropped silently.
    ///
    /// # Returns
    ///
    /// The number of URLs added to the queue
    pub fn enqueue_discovered(
        &mut self,
        urls: &[Url],
        parent_depth: u32,
        dedup: &Deduplicator,
    ) -> usize {
        let depth = parent_depth.saturating_add(1);
        if depth > self.max_depth {
            tracing::trace!(
                "Dropping {} links beyond max depth {}",
                urls.len(),
                self.max_depth
            );
            return 0;
        }

        let mut added = 0;
        for url in urls {
            if let Ok(normalized) = normalize_url_with(url.as_str(), &self.tracking_params) {
                if self.push(normalized, depth, Some(dedup)) {
                    added += 1;
                }
            }
        }

        added
    }

    fn push(&mut self, url: Url, depth: u32, dedup: Option<&Deduplicator>) -> bool {
        if depth > self.max_depth {
            return false;
        }

        let key = url.to_string();
        if self.queued.contains(&key)
            || self.dispatched.contains(&key)
            || dedup.is_some_and(|d| d.is_visited(&key))
        {
            return false;
        }

        self.queued.insert(key.clone());
        self.queue.push_back(FrontierEntry { url, key, depth });
        true
    }

    /// Dequeues up to `max` entries in FIFO order and marks them dispatched
    ///
    /// Never hands out more entries than the remaining page ceiling allows.
    pub fn next_batch(&mut self, max: usize) -> Vec<FrontierEntry> {
        let room = max.min(self.remaining());
        let mut batch = Vec::with_capacity(room);

        while batch.len() < room {
            let Some(entry) = self.queue.pop_front() else {
                break;
            };
            self.queued.remove(&entry.key);

            if entry.depth > self.max_depth || !self.dispatched.insert(entry.key.clone()) {
                continue;
            }

            batch.push(entry);
        }

        batch
    }

    /// URLs that may still be dispatched before the ceiling is hit
    pub fn remaining(&self) -> usize {
        self.max_pages.saturating_sub(self.dispatched.len())
    }

    pub fn ceiling_reached(&self) -> bool {
        self.remaining() == 0
    }

    /// True when nothing is queued
    pub fn is_exhausted(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn dispatched_count(&self) -> usize {
        self.dispatched.len()
    }

    /// Canonical keys of every queued entry, front to back
    pub fn pending_keys(&self) -> Vec<String> {
        self.queue.iter().map(|e| e.key.clone()).collect()
    }
}
