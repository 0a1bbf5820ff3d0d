//! On-disk output layout and PDF file naming

use crate::url::CampusTag;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use url::Url;

/// Longest file stem kept after sanitization, in bytes
const MAX_STEM_BYTES: usize = 200;

const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Directory tree under the configured output root
///
/// ```text
/// <root>/
///   pages_pdf/
///   downloaded_pdfs/
///   campus_hanoi/  campus_hcm/  campus_danang/  campus_general/
///   reports/
/// ```
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Creates the layout, making every directory that does not exist yet
    pub fn create(root: impl Into<PathBuf>) -> io::Result<Self> {
        let layout = Self { root: root.into() };

        fs::create_dir_all(layout.pages_dir())?;
        fs::create_dir_all(layout.downloads_dir())?;
        for campus in CampusTag::all() {
            fs::create_dir_all(layout.campus_dir(campus))?;
        }
        fs::create_dir_all(layout.reports_dir())?;

        Ok(layout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.root.join("pages_pdf")
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.root.join("downloaded_pdfs")
    }

    pub fn campus_dir(&self, campus: CampusTag) -> PathBuf {
        self.root.join(campus.folder_name())
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("reports")
    }

    /// Saves a rendered page as `<title>_<unix>.pdf`
    ///
    /// The file goes to the campus folder when a campus is given and to
    /// `pages_pdf/` otherwise. The title is shortened so the timestamp
    /// always survives the length cap.
    pub fn save_page_pdf(
        &self,
        campus: Option<CampusTag>,
        title: &str,
        unix_seconds: i64,
        bytes: &[u8],
    ) -> io::Result<PathBuf> {
        let suffix = format!("_{}", unix_seconds);
        let title = sanitize_filename(title);
        let stem = format!(
            "{}{}",
            truncate_to_bytes(&title, MAX_STEM_BYTES - suffix.len()),
            suffix
        );

        let dir = match campus {
            Some(campus) => self.campus_dir(campus),
            None => self.pages_dir(),
        };
        write_unique(&dir, &stem, "pdf", bytes)
    }

    /// Saves a downloaded PDF named after the last segment of its URL
    pub fn save_downloaded_pdf(&self, url: &Url, bytes: &[u8]) -> io::Result<PathBuf> {
        let last = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .unwrap_or("document");
        let stem = match last.len().checked_sub(4) {
            Some(cut) if last.is_char_boundary(cut) && last[cut..].eq_ignore_ascii_case(".pdf") => {
                &last[..cut]
            }
            _ => last,
        };

        write_unique(
            &self.downloads_dir(),
            &sanitize_filename(stem),
            "pdf",
            bytes,
        )
    }
}

/// Makes a string safe to use as a file stem
///
/// Reserved characters (`<>:"/\|?*`) and control characters become `_`,
/// and the result is cut to at most 200 bytes on a character boundary. An
/// empty name becomes "untitled".
///
/// # Examples
///
/// ```
/// use campus_archiver::output::sanitize_filename;
///
/// assert_eq!(sanitize_filename("Tuyển sinh: 2024/2025?"), "Tuyển sinh_ 2024_2025_");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if RESERVED_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let capped = truncate_to_bytes(&cleaned, MAX_STEM_BYTES);
    if capped.trim().is_empty() {
        "untitled".to_string()
    } else {
        capped.to_string()
    }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a character
fn truncate_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }

    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Writes `bytes` to `<dir>/<stem>.<ext>`, or `<stem>_1.<ext>`, `<stem>_2.<ext>`…
/// when the name is taken
///
/// Files are created with `create_new`, so two concurrent writers never
/// share a path.
pub fn write_unique(dir: &Path, stem: &str, ext: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    let mut counter = 0u32;

    loop {
        let file_name = if counter == 0 {
            format!("{}.{}", stem, ext)
        } else {
            format!("{}_{}.{}", stem, counter, ext)
        };
        let path = dir.join(file_name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(bytes)?;
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => counter += 1,
            Err(e) => return Err(e),
        }
    }
}
