//! URL handling module for Campus-Archiver
//!
//! This module provides URL normalization, crawl-scope validation and the
//! campus classification of pages.

mod normalize;
mod scope;

use serde::Serialize;
use std::fmt;

// Re-export main functions
pub use normalize::{canonical_key, normalize_url, normalize_url_with, DEFAULT_TRACKING_PARAMS};
pub use scope::{matches_domain, ScopeValidator};

/// Campus a page belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CampusTag {
    Hanoi,
    Hcm,
    Danang,
    /// No campus marker found in the URL
    General,
}

impl CampusTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hanoi => "hanoi",
            Self::Hcm => "hcm",
            Self::Danang => "danang",
            Self::General => "general",
        }
    }

    /// Output subfolder holding this campus's rendered pages
    pub fn folder_name(&self) -> String {
        format!("campus_{}", self.as_str())
    }

    pub fn all() -> [Self; 4] {
        [Self::Hanoi, Self::Hcm, Self::Danang, Self::General]
    }
}

impl fmt::Display for CampusTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a URL by campus using substring markers
///
/// Markers are checked in a fixed order (Hanoi, then Ho Chi Minh City, then
/// Da Nang) against the lowercased URL; the first hit wins.
///
/// # Examples
///
/// ```
/// use campus_archiver::url::{classify_campus, CampusTag};
///
/// assert_eq!(classify_campus("https://btec.fpt.edu.vn/hanoi/tuyen-sinh"), CampusTag::Hanoi);
/// assert_eq!(classify_campus("https://btec.fpt.edu.vn/HoChiMinh"), CampusTag::Hcm);
/// assert_eq!(classify_campus("https://btec.fpt.edu.vn/courses"), CampusTag::General);
/// ```
pub fn classify_campus(url: &str) -> CampusTag {
    let url = url.to_lowercase();

    if url.contains("hanoi") || url.contains("hn") {
        CampusTag::Hanoi
    } else if url.contains("hcm") || url.contains("hochiminh") {
        CampusTag::Hcm
    } else if url.contains("danang") || url.contains("dn") {
        CampusTag::Danang
    } else {
        CampusTag::General
    }
}
