use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Campus-Archiver
///
/// Every section falls back to its defaults, so an empty file (or no file at
/// all) yields a usable configuration that command-line flags can override.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub crawler: CrawlerConfig,
    pub scope: ScopeConfig,
    pub render: RenderConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Root of the site; also the origin of the default seeds
    pub base_url: String,

    /// Explicit seed URLs (empty means derive them from `base_url`)
    pub seed_urls: Vec<String>,

    /// Maximum number of pipelines in flight at once
    pub max_concurrent_requests: u32,

    /// Pause between batches (seconds)
    pub delay_between_requests: f64,

    /// Maximum fetch attempts per URL
    pub max_retries: u32,

    /// First backoff interval between fetch attempts (milliseconds)
    pub retry_min_backoff_ms: u64,

    /// Upper bound on the backoff interval (milliseconds)
    pub retry_max_backoff_ms: u64,

    /// Per-request timeout (seconds)
    pub timeout: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Maximum link depth from the seeds
    pub max_depth: u32,

    /// Ceiling on unique URLs dispatched in one run
    pub max_pages: usize,

    /// Honor robots.txt disallow rules and crawl delays
    pub respect_robots_txt: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://btec.fpt.edu.vn/".to_string(),
            seed_urls: Vec::new(),
            max_concurrent_requests: 5,
            delay_between_requests: 1.0,
            max_retries: 3,
            retry_min_backoff_ms: 4_000,
            retry_max_backoff_ms: 10_000,
            timeout: 30,
            user_agent: "BTEC-FPT-Crawler/1.0 (Educational Purpose)".to_string(),
            max_depth: 10,
            max_pages: 1_000,
            respect_robots_txt: true,
        }
    }
}

impl CrawlerConfig {
    /// Seeds to start from: the explicit list, or the base URL plus its
    /// well-known section pages
    pub fn effective_seeds(&self) -> Vec<String> {
        if !self.seed_urls.is_empty() {
            return self.seed_urls.clone();
        }

        let base = if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        };

        vec![base.clone(), format!("{}courses", base), format!("{}site", base)]
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(self.delay_between_requests.max(0.0))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Which URLs belong to the crawl, and how they are canonicalized
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScopeConfig {
    /// Domain patterns (e.g., "example.com" or "*.example.com")
    pub in_scope_domains: Vec<String>,

    /// Query parameters removed during normalization
    pub tracking_params: Vec<String>,

    /// Path suffixes that never hold page content
    pub skip_extensions: Vec<String>,

    /// Path substrings that mark authentication pages
    pub skip_patterns: Vec<String>,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            in_scope_domains: vec!["btec.fpt.edu.vn".to_string()],
            tracking_params: [
                "sessionid",
                "utm_source",
                "utm_medium",
                "utm_campaign",
                "utm_term",
                "utm_content",
                "ref",
                "fbclid",
                "gclid",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            skip_extensions: [
                ".jpg", ".jpeg", ".png", ".gif", ".css", ".js", ".ico", ".xml", ".rss",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            skip_patterns: ["login", "admin", "logout", "auth", "signin", "signup"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Available PDF rendering engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RenderEngine {
    /// Pipe templated HTML through a wkhtmltopdf-compatible executable
    HtmlToPdf,
    /// Print the templated HTML from a headless Chromium instance
    BrowserPrint,
}

/// Rendering configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderConfig {
    pub engine: RenderEngine,

    /// Keep <img> elements in the archived content and collect image URLs
    pub include_images: bool,

    /// Executable used by the html-to-pdf engine
    pub wkhtmltopdf_path: String,

    /// Paper size name (A4, Letter, ...)
    pub page_size: String,

    /// Page margin, CSS length (e.g., "1in", "20mm")
    pub margin: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            engine: RenderEngine::HtmlToPdf,
            include_images: true,
            wkhtmltopdf_path: "wkhtmltopdf".to_string(),
            page_size: "A4".to_string(),
            margin: "1in".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Root directory for PDFs and reports
    pub output_dir: PathBuf,

    /// Download PDF files linked from crawled pages
    pub download_existing_pdfs: bool,

    /// Number of pages listed in the report's content summary
    pub summary_size: usize,

    /// Save page PDFs under per-campus folders instead of `pages_pdf/`
    pub group_by_campus: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./btec_crawl_output"),
            download_existing_pdfs: true,
            summary_size: 10,
            group_by_campus: true,
        }
    }
}
