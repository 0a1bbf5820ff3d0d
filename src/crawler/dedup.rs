//! URL and content deduplication shared by concurrent pipelines

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Visited-URL set and content-digest set for one crawl run
///
/// Each set sits behind its own mutex; every operation is a single
/// check-and-insert under that lock.
#[derive(Debug, Default)]
pub struct Deduplicator {
    visited: Mutex<HashSet<String>>,
    digests: Mutex<HashSet<String>>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a canonical URL key as visited
    ///
    /// # Returns
    ///
    /// `true` for exactly one caller per key; every later (or concurrent)
    /// caller gets `false` and must skip the URL.
    pub fn mark_visited_if_new(&self, key: &str) -> bool {
        lock(&self.visited).insert(key.to_string())
    }

    /// Returns true if the key has already been marked visited
    pub fn is_visited(&self, key: &str) -> bool {
        lock(&self.visited).contains(key)
    }

    /// Records the digest of a page's plain text
    ///
    /// # Returns
    ///
    /// `true` if identical text was already seen this run
    pub fn is_duplicate_content(&self, text: &str) -> bool {
        let digest = content_digest(text);
        !lock(&self.digests).insert(digest)
    }
}

/// Hex-encoded SHA-256 of the text
pub fn content_digest(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

// A panicking pipeline cannot leave a set half-updated, so a poisoned lock is still usable
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
