//! Content extraction from fetched HTML
//!
//! This module turns a fetched HTML document into a [`PageRecord`]:
//! - Page title (falls back to the URL path)
//! - Sanitized HTML snapshot and plain text of the main content area
//! - In-scope links to follow, linked PDF documents and images
//! - Description, keywords, language and campus metadata

use crate::url::{classify_campus, CampusTag, ScopeValidator};
use chrono::{DateTime, Utc};
use ego_tree::iter::Edge;
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Candidate containers for the main content, most specific first
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    ".content",
    ".main-content",
    ".page-content",
    "#content",
    "#main",
    "article",
    ".article",
];

/// Elements whose subtrees never reach the archive
const STRIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript"];

/// Embedded or interactive elements dropped from the snapshot with their subtrees
const UNSAFE_ELEMENTS: &[&str] = &[
    "iframe", "frame", "frameset", "object", "embed", "applet", "button", "input", "select",
    "textarea", "dialog",
];

/// Elements whose tags are dropped from the snapshot while their children stay
const UNWRAPPED_ELEMENTS: &[&str] = &["form"];

const URL_ATTRIBUTES: &[&str] = &[
    "href",
    "src",
    "action",
    "formaction",
    "poster",
    "background",
    "data",
    "cite",
];

const UNSAFE_URL_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:text/html"];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const DEFAULT_LANGUAGE: &str = "vi";

/// Extraction switches taken from the render configuration
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Keep `<img>` in the snapshot and collect image URLs
    pub include_images: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            include_images: true,
        }
    }
}

/// Descriptive metadata of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMetadata {
    pub description: String,
    pub keywords: String,
    pub language: String,
    pub campus: CampusTag,
}

/// Everything extracted from one fetched page
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub url: Url,
    pub title: String,
    /// Sanitized HTML of the main content area
    pub content: String,
    /// Whitespace-collapsed plain text of the main content area
    pub text: String,
    /// In-scope links, deduplicated, in document order
    pub links: Vec<Url>,
    pub pdf_links: Vec<Url>,
    pub images: Vec<Url>,
    pub metadata: PageMetadata,
    pub captured_at: DateTime<Utc>,
}

/// Extracts a page record from HTML content
///
/// Missing optional elements never cause a failure; they fall back to
/// empty strings or defaults.
///
/// # Link Extraction Rules
///
/// - Every `<a href>` is resolved against the page URL
/// - `javascript:`, `mailto:`, `tel:`, `data:` and fragment-only links are skipped
/// - Links whose path ends in `.pdf` are collected as PDF links regardless of scope
/// - Other links are kept only when the scope validator accepts them
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `url` - The page URL, used as the base for relative links
/// * `scope` - Decides which links are crawl targets
/// * `options` - Extraction switches
///
/// # Example
///
/// ```
/// use campus_archiver::config::ScopeConfig;
/// use campus_archiver::crawler::{extract_page, ExtractOptions};
/// use campus_archiver::url::ScopeValidator;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head>
///     <body><a href="/page">Link</a></body></html>"#;
/// let url = Url::parse("https://btec.fpt.edu.vn/").unwrap();
/// let scope = ScopeValidator::new(&ScopeConfig::default());
/// let page = extract_page(html, &url, &scope, &ExtractOptions::default());
/// assert_eq!(page.title, "Test");
/// assert_eq!(page.links[0].as_str(), "https://btec.fpt.edu.vn/page");
/// ```
pub fn extract_page(
    html: &str,
    url: &Url,
    scope: &ScopeValidator,
    options: &ExtractOptions,
) -> PageRecord {
    let document = Html::parse_document(html);
    let root = main_content(&document);

    let mut snapshot_skip = STRIPPED_ELEMENTS.to_vec();
    if !options.include_images {
        snapshot_skip.push("img");
    }

    let mut content = String::new();
    write_snapshot(root, &snapshot_skip, &mut content);

    let mut text = String::new();
    collect_text(root, &mut text);

    let (links, pdf_links) = extract_links(&document, url, scope);
    let images = if options.include_images {
        extract_images(&document, url)
    } else {
        Vec::new()
    };

    PageRecord {
        url: url.clone(),
        title: extract_title(&document).unwrap_or_else(|| url.path().to_string()),
        content,
        text,
        links,
        pdf_links,
        images,
        metadata: PageMetadata {
            description: meta_content(&document, "description"),
            keywords: meta_content(&document, "keywords"),
            language: extract_language(&document),
            campus: classify_campus(url.as_str()),
        },
        captured_at: Utc::now(),
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = selector("title")?;

    document
        .select(&title_selector)
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .find(|s| !s.is_empty())
}

fn main_content(document: &Html) -> ElementRef<'_> {
    CONTENT_SELECTORS
        .iter()
        .filter_map(|css| selector(css))
        .find_map(|sel| document.select(&sel).next())
        .or_else(|| selector("body").and_then(|sel| document.select(&sel).next()))
        .unwrap_or_else(|| document.root_element())
}

/// Serializes an element, leaving out skipped and unsafe subtrees
///
/// Walks the tree iteratively so arbitrarily deep markup cannot exhaust the
/// stack. Event handler attributes and script URLs are dropped on the way.
fn write_snapshot(root: ElementRef<'_>, skip: &[&str], out: &mut String) {
    let mut skipping: Option<NodeId> = None;

    for edge in root.traverse() {
        match edge {
            Edge::Open(node) => {
                if skipping.is_some() {
                    continue;
                }
                match node.value() {
                    Node::Element(el) => {
                        let name = el.name();
                        if skip.contains(&name) || UNSAFE_ELEMENTS.contains(&name) {
                            skipping = Some(node.id());
                            continue;
                        }
                        if UNWRAPPED_ELEMENTS.contains(&name) {
                            continue;
                        }

                        out.push('<');
                        out.push_str(name);
                        for (attr, value) in el.attrs() {
                            if !is_safe_attribute(attr, value) {
                                continue;
                            }
                            out.push(' ');
                            out.push_str(attr);
                            out.push_str("=\"");
                            out.push_str(&html_escape::encode_double_quoted_attribute(value));
                            out.push('"');
                        }
                        out.push('>');
                    }
                    Node::Text(text) => out.push_str(&html_escape::encode_text(&**text)),
                    _ => {}
                }
            }
            Edge::Close(node) => {
                if let Some(id) = skipping {
                    if id == node.id() {
                        skipping = None;
                    }
                    continue;
                }
                if let Node::Element(el) = node.value() {
                    let name = el.name();
                    if VOID_ELEMENTS.contains(&name) || UNWRAPPED_ELEMENTS.contains(&name) {
                        continue;
                    }
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                }
            }
        }
    }
}

/// Whether an attribute may be kept in the snapshot
fn is_safe_attribute(name: &str, value: &str) -> bool {
    let name = name.to_ascii_lowercase();
    if (name.starts_with("on") && name != "open") || name == "srcdoc" {
        return false;
    }

    if URL_ATTRIBUTES.contains(&name.as_str()) {
        let value: String = value
            .chars()
            .filter(|c| !c.is_whitespace() && !c.is_control())
            .collect::<String>()
            .to_ascii_lowercase();
        return !UNSAFE_URL_SCHEMES
            .iter()
            .any(|scheme| value.starts_with(scheme));
    }

    true
}

/// Appends the element's visible text, one space between words
fn collect_text(root: ElementRef<'_>, out: &mut String) {
    let mut skipping: Option<NodeId> = None;

    for edge in root.traverse() {
        match edge {
            Edge::Open(node) => {
                if skipping.is_some() {
                    continue;
                }
                match node.value() {
                    Node::Element(el) if STRIPPED_ELEMENTS.contains(&el.name()) => {
                        skipping = Some(node.id());
                    }
                    Node::Text(text) => {
                        for word in text.split_whitespace() {
                            if !out.is_empty() {
                                out.push(' ');
                            }
                            out.push_str(word);
                        }
                    }
                    _ => {}
                }
            }
            Edge::Close(node) => {
                if skipping == Some(node.id()) {
                    skipping = None;
                }
            }
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns (crawlable links, PDF links), each deduplicated in document order
fn extract_links(document: &Html, base_url: &Url, scope: &ScopeValidator) -> (Vec<Url>, Vec<Url>) {
    let mut links = Vec::new();
    let mut pdf_links = Vec::new();
    let mut seen = HashSet::new();

    let Some(a_selector) = selector("a[href]") else {
        return (links, pdf_links);
    };

    for element in document.select(&a_selector) {
        let Some(resolved) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, base_url))
        else {
            continue;
        };

        if !seen.insert(resolved.to_string()) {
            continue;
        }

        if resolved.path().to_lowercase().ends_with(".pdf") {
            pdf_links.push(resolved);
        } else if scope.is_valid_url(&resolved) {
            links.push(resolved);
        }
    }

    (links, pdf_links)
}

fn extract_images(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut images = Vec::new();
    let mut seen = HashSet::new();

    if let Some(img_selector) = selector("img[src]") {
        for element in document.select(&img_selector) {
            if let Some(src) = element
                .value()
                .attr("src")
                .and_then(|src| resolve_link(src, base_url))
            {
                if seen.insert(src.to_string()) {
                    images.push(src);
                }
            }
        }
    }

    images
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None for special schemes, fragment-only links and anything that
/// fails to resolve.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    base_url
        .join(href)
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}

fn meta_content(document: &Html, name: &str) -> String {
    let Some(meta_selector) = selector("meta[name]") else {
        return String::new();
    };

    document
        .select(&meta_selector)
        .find(|el| {
            el.value()
                .attr("name")
                .is_some_and(|n| n.trim().eq_ignore_ascii_case(name))
        })
        .and_then(|el| el.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default()
}

fn extract_language(document: &Html) -> String {
    document
        .root_element()
        .value()
        .attr("lang")
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .unwrap_or(DEFAULT_LANGUAGE)
        .to_string()
}
