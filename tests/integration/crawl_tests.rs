//! Integration tests for the crawler
//!
//! Most tests drive the full crawl cycle against a scripted in-memory site;
//! the robots.txt, redirect and PDF download tests go over real HTTP with
//! wiremock.

use async_trait::async_trait;
use campus_archiver::config::CrawlConfig;
use campus_archiver::crawler::{
    Crawler, FetchError, FetchedResource, Fetcher, PageRecord, RetryPolicy, Transport,
};
use campus_archiver::render::{RenderError, Renderer};
use campus_archiver::state::StopReason;
use campus_archiver::{CampusTag, CrawlPhase};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SITE: &str = "https://campus.test";

/// In-memory site: known URLs answer with their page, unknown ones with 404
#[derive(Default)]
struct SiteTransport {
    pages: HashMap<String, (u16, String)>,
    redirects: HashMap<String, String>,
    failing: HashSet<String>,
    crashing: HashSet<String>,
    delays: HashMap<String, Duration>,
    latency: Duration,
    calls: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SiteTransport {
    fn new() -> Self {
        Self::default()
    }

    fn page(self, path: &str, html: impl Into<String>) -> Self {
        self.page_at(&site_url(path), html)
    }

    fn page_at(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), (200, html.into()));
        self
    }

    /// Requests for `path` end up at `target`, as if the client followed a 301
    fn redirect(mut self, path: &str, target: &str) -> Self {
        self.redirects.insert(site_url(path), target.to_string());
        self
    }

    fn status(mut self, path: &str, status: u16) -> Self {
        self.pages.insert(site_url(path), (status, String::new()));
        self
    }

    /// Every request for `path` times out
    fn failing(mut self, path: &str) -> Self {
        self.failing.insert(site_url(path));
        self
    }

    /// Every request for `path` panics inside the transport
    fn crashing(mut self, path: &str) -> Self {
        self.crashing.insert(site_url(path));
        self
    }

    fn slow(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(site_url(path), delay);
        self
    }

    fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn calls(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&site_url(path))
            .copied()
            .unwrap_or(0)
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for SiteTransport {
    async fn get(&self, url: &Url) -> Result<FetchedResource, FetchError> {
        {
            let mut calls = self.calls.lock().unwrap();
            *calls.entry(url.to_string()).or_insert(0) += 1;
        }

        if self.crashing.contains(url.as_str()) {
            panic!("transport crashed on {}", url);
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .delays
            .get(url.as_str())
            .copied()
            .unwrap_or(self.latency);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(url.as_str()) {
            return Err(FetchError::Timeout {
                url: url.to_string(),
            });
        }

        let final_url = match self.redirects.get(url.as_str()) {
            Some(target) => Url::parse(target).unwrap(),
            None => url.clone(),
        };
        let (status, body) = self
            .pages
            .get(final_url.as_str())
            .cloned()
            .unwrap_or((404, String::new()));

        Ok(FetchedResource {
            final_url,
            status,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: body.into_bytes(),
        })
    }
}

#[derive(Clone, Copy)]
enum RenderMode {
    Succeed,
    Fail,
    Panic,
}

struct StubRenderer {
    renders: Arc<AtomicUsize>,
    mode: RenderMode,
}

impl StubRenderer {
    fn new(mode: RenderMode) -> (Self, Arc<AtomicUsize>) {
        let renders = Arc::new(AtomicUsize::new(0));
        (
            Self {
                renders: Arc::clone(&renders),
                mode,
            },
            renders,
        )
    }
}

#[async_trait]
impl Renderer for StubRenderer {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn render(&self, page: &PageRecord) -> Result<Vec<u8>, RenderError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            RenderMode::Succeed => Ok(b"%PDF-1.4\n% stub\n%%EOF\n".to_vec()),
            RenderMode::Fail => Err(RenderError::Engine("exit status 1".to_string())),
            RenderMode::Panic => panic!("renderer crashed on {}", page.url),
        }
    }
}

fn site_url(path: &str) -> String {
    format!("{}{}", SITE, path)
}

fn html(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body><main>{}</main></body></html>",
        title, body
    )
}

/// Creates a test configuration for a crawl of `base_url` restricted to `domain`
fn create_test_config(output: &Path, base_url: &str, domain: &str) -> CrawlConfig {
    let mut config = CrawlConfig::default();

    config.crawler.base_url = base_url.to_string();
    config.crawler.max_concurrent_requests = 2;
    config.crawler.delay_between_requests = 0.0;
    config.crawler.max_retries = 3;
    config.crawler.retry_min_backoff_ms = 1;
    config.crawler.retry_max_backoff_ms = 5;
    config.crawler.timeout = 5;
    config.crawler.user_agent = "CampusBot/1.0 (integration tests)".to_string();
    config.crawler.max_depth = 3;
    config.crawler.max_pages = 100;
    config.crawler.respect_robots_txt = false;
    config.scope.in_scope_domains = vec![domain.to_string()];
    config.output.output_dir = output.to_path_buf();

    config
}

fn site_config(output: &Path) -> CrawlConfig {
    create_test_config(output, &site_url("/"), "campus.test")
}

fn site_crawler(
    config: CrawlConfig,
    transport: &Arc<SiteTransport>,
    mode: RenderMode,
) -> (Crawler, Arc<AtomicUsize>) {
    let fetcher = Fetcher::new(transport.clone(), RetryPolicy::from_config(&config.crawler));
    let (renderer, renders) = StubRenderer::new(mode);
    let crawler = Crawler::with_components(config, fetcher, Box::new(renderer))
        .expect("Failed to create crawler");
    (crawler, renders)
}

fn host_of(base_url: &str) -> String {
    Url::parse(base_url)
        .expect("Failed to parse base URL")
        .host_str()
        .expect("Failed to extract host")
        .to_string()
}

fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

fn seeds(paths: &[&str]) -> Option<Vec<String>> {
    Some(paths.iter().map(|p| site_url(p)).collect())
}

#[tokio::test]
async fn test_in_scope_links_are_queued_after_one_batch() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(SiteTransport::new().page(
        "/",
        html(
            "Home",
            r#"<a href="/a">A</a>
               <a href="/b#top">B</a>
               <a href="https://facebook.com/btec">Facebook</a>
               <a href="mailto:info@campus.test">Mail</a>"#,
        ),
    ));
    let (mut crawler, _) = site_crawler(site_config(temp.path()), &transport, RenderMode::Succeed);

    assert_eq!(crawler.seed(seeds(&["/"])), 1);
    let batch = crawler.step().await;

    assert_eq!(batch.dispatched, 1);
    assert_eq!(batch.completed, 1);
    assert_eq!(batch.discovered, 2);
    assert_eq!(
        crawler.frontier().pending_keys(),
        vec![site_url("/a"), site_url("/b")]
    );
    assert_eq!(crawler.phase(), CrawlPhase::CrawlingBatch);
}

#[tokio::test]
async fn test_full_crawl_with_campus_breakdown_and_report_file() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(
        SiteTransport::new()
            .page(
                "/",
                html(
                    "Home",
                    r#"<a href="/hanoi/news">Hanoi</a>
                       <a href="/danang/events">Da Nang</a>
                       <a href="/courses">Courses</a>"#,
                ),
            )
            .page(
                "/hanoi/news",
                html("Hanoi news", "<p>Graduation in Hanoi</p>"),
            )
            .page(
                "/danang/events",
                html("Da Nang events", "<p>Open day by the sea</p>"),
            )
            .page("/courses", html("Courses", "<p>Business and computing</p>")),
    );
    let (mut crawler, renders) =
        site_crawler(site_config(temp.path()), &transport, RenderMode::Succeed);

    let report = crawler.crawl(seeds(&["/"])).await;

    assert_eq!(crawler.phase(), CrawlPhase::Done);
    assert_eq!(crawler.stop_reason(), Some(StopReason::FrontierExhausted));
    assert_eq!(report.summary.total_pages_crawled, 4);
    assert_eq!(report.summary.total_pdfs_generated, 4);
    assert_eq!(report.summary.total_errors, 0);
    assert_eq!(renders.load(Ordering::SeqCst), 4);
    assert!(report.summary.start_time.is_some());
    assert!(report.summary.end_time.is_some());
    assert!(report.summary.crawl_duration.is_some());

    assert_eq!(report.campus_breakdown.get(&CampusTag::Hanoi), Some(&1));
    assert_eq!(report.campus_breakdown.get(&CampusTag::Danang), Some(&1));
    assert_eq!(report.campus_breakdown.get(&CampusTag::General), Some(&2));
    assert_eq!(report.campus_breakdown.get(&CampusTag::Hcm), None);
    assert_eq!(report.content_summary.len(), 4);

    let layout = crawler.context().layout();
    assert_eq!(file_count(&layout.campus_dir(CampusTag::Hanoi)), 1);
    assert_eq!(file_count(&layout.campus_dir(CampusTag::General)), 2);
    assert_eq!(file_count(&layout.pages_dir()), 0);

    let reports: Vec<_> = std::fs::read_dir(layout.reports_dir())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(reports.len(), 1);
    let name = reports[0]
        .file_name()
        .unwrap()
        .to_string_lossy()
        .to_string();
    assert!(name.starts_with("crawl_report_") && name.ends_with(".json"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&reports[0]).unwrap()).unwrap();
    assert_eq!(json["summary"]["totalPagesCrawled"], 4);
    assert_eq!(json["summary"]["stopReason"], "frontier_exhausted");
    assert_eq!(json["campusBreakdown"]["hanoi"], 1);
    assert!(json["failedUrls"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_ungrouped_pdfs_go_to_pages_folder() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(
        SiteTransport::new()
            .page("/", html("Home", r#"<a href="/hanoi/news">Hanoi</a>"#))
            .page(
                "/hanoi/news",
                html("Hanoi news", "<p>Graduation in Hanoi</p>"),
            ),
    );

    let mut config = site_config(temp.path());
    config.output.group_by_campus = false;
    let (mut crawler, _) = site_crawler(config, &transport, RenderMode::Succeed);

    let report = crawler.crawl(seeds(&["/"])).await;

    let layout = crawler.context().layout();
    assert_eq!(report.summary.total_pdfs_generated, 2);
    assert_eq!(file_count(&layout.pages_dir()), 2);
    assert_eq!(file_count(&layout.campus_dir(CampusTag::Hanoi)), 0);
    assert_eq!(file_count(&layout.campus_dir(CampusTag::General)), 0);
    // Pages are still classified
    assert_eq!(report.campus_breakdown.get(&CampusTag::Hanoi), Some(&1));
}

#[tokio::test]
async fn test_duplicate_content_is_counted_but_not_rendered() {
    let temp = TempDir::new().unwrap();
    let body = "<p>Tuyển sinh 2024: the same announcement on two URLs</p>";
    let transport = Arc::new(
        SiteTransport::new()
            .page("/news/a", html("Announcement", body))
            .page("/news/b", html("Announcement", body)),
    );
    let (mut crawler, renders) =
        site_crawler(site_config(temp.path()), &transport, RenderMode::Succeed);

    let report = crawler.crawl(seeds(&["/news/a", "/news/b"])).await;

    assert_eq!(report.summary.total_pages_crawled, 2);
    assert_eq!(report.summary.total_pdfs_generated, 1);
    assert_eq!(renders.load(Ordering::SeqCst), 1);
    assert_eq!(report.content_summary.len(), 1);
    assert_eq!(report.campus_breakdown.values().sum::<u64>(), 1);
}

#[tokio::test]
async fn test_page_ceiling_stops_the_crawl() {
    let temp = TempDir::new().unwrap();
    let links: String = (1..=9)
        .map(|i| format!(r#"<a href="/p{}">Page {}</a>"#, i, i))
        .collect();

    let mut site = SiteTransport::new().page("/", html("Home", &links));
    for i in 1..=9 {
        site = site.page(
            &format!("/p{}", i),
            html(
                &format!("Page {}", i),
                &format!("<p>Unique content {}</p>", i),
            ),
        );
    }
    let transport = Arc::new(site);

    let mut config = site_config(temp.path());
    config.crawler.max_pages = 5;
    let (mut crawler, _) = site_crawler(config, &transport, RenderMode::Succeed);

    let report = crawler.crawl(seeds(&["/"])).await;

    assert_eq!(report.summary.stop_reason, Some(StopReason::CeilingReached));
    assert_eq!(crawler.frontier().dispatched_count(), 5);
    assert_eq!(report.summary.total_pages_crawled, 5);
    let fetched: usize = (1..=9).map(|i| transport.calls(&format!("/p{}", i))).sum();
    assert_eq!(fetched, 4);
}

#[tokio::test]
async fn test_transient_failures_are_retried_then_recorded() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(
        SiteTransport::new()
            .page("/", html("Home", "<p>Welcome</p>"))
            .failing("/flaky"),
    );
    let (mut crawler, _) = site_crawler(site_config(temp.path()), &transport, RenderMode::Succeed);

    let report = crawler.crawl(seeds(&["/", "/flaky"])).await;

    assert_eq!(transport.calls("/flaky"), 3);
    assert_eq!(report.summary.total_errors, 1);
    assert_eq!(report.summary.total_pages_crawled, 1);
    assert_eq!(report.failed_urls.len(), 1);
    assert_eq!(report.failed_urls[0].url, site_url("/flaky"));
    assert!(report.failed_urls[0].error.contains("timed out"));
}

#[tokio::test]
async fn test_non_success_status_is_neither_counted_nor_failed() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(
        SiteTransport::new()
            .page("/", html("Home", r#"<a href="/gone">Old page</a>"#))
            .status("/gone", 404),
    );
    let (mut crawler, _) = site_crawler(site_config(temp.path()), &transport, RenderMode::Succeed);

    let report = crawler.crawl(seeds(&["/"])).await;

    assert_eq!(transport.calls("/gone"), 1);
    assert_eq!(report.summary.total_pages_crawled, 1);
    assert_eq!(report.summary.total_errors, 0);
    assert!(report.failed_urls.is_empty());
}

#[tokio::test]
async fn test_concurrency_never_exceeds_limit() {
    let temp = TempDir::new().unwrap();
    let mut site = SiteTransport::new().with_latency(Duration::from_millis(30));
    let mut paths = Vec::new();
    for i in 0..12 {
        let path = format!("/section-{}", i);
        site = site.page(
            &path,
            html(&format!("Section {}", i), &format!("<p>Body {}</p>", i)),
        );
        paths.push(path);
    }
    let transport = Arc::new(site);

    let mut config = site_config(temp.path());
    config.crawler.max_concurrent_requests = 3;
    let (mut crawler, _) = site_crawler(config, &transport, RenderMode::Succeed);

    let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    let report = crawler.crawl(seeds(&path_refs)).await;

    assert_eq!(report.summary.total_pages_crawled, 12);
    assert!(transport.peak() >= 1);
    assert!(transport.peak() <= 3, "peak was {}", transport.peak());
    assert!(crawler.context().limiter().peak() <= 3);
}

#[tokio::test]
async fn test_links_beyond_max_depth_are_never_fetched() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(
        SiteTransport::new()
            .page("/", html("Home", r#"<a href="/level-1">Down</a>"#))
            .page("/level-1", html("Level 1", r#"<a href="/level-2">Further</a>"#))
            .page("/level-2", html("Level 2", "<p>Too deep</p>")),
    );

    let mut config = site_config(temp.path());
    config.crawler.max_depth = 1;
    let (mut crawler, _) = site_crawler(config, &transport, RenderMode::Succeed);

    let report = crawler.crawl(seeds(&["/"])).await;

    assert_eq!(transport.calls("/level-1"), 1);
    assert_eq!(transport.calls("/level-2"), 0);
    assert_eq!(report.summary.total_pages_crawled, 2);
}

#[tokio::test]
async fn test_interrupt_still_produces_a_report() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(
        SiteTransport::new()
            .page("/", html("Home", "<p>Fast page</p>"))
            .page("/slow", html("Slow", "<p>Slow page</p>"))
            .slow("/slow", Duration::from_secs(30)),
    );
    let (mut crawler, _) = site_crawler(site_config(temp.path()), &transport, RenderMode::Succeed);

    let started = Instant::now();
    let report = crawler
        .crawl_until(
            seeds(&["/", "/slow"]),
            tokio::time::sleep(Duration::from_millis(300)),
        )
        .await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(crawler.phase(), CrawlPhase::Done);
    assert!(crawler.context().limiter().is_closed());
    assert_eq!(report.summary.stop_reason, Some(StopReason::Interrupted));
    assert_eq!(report.summary.total_pages_crawled, 1);
    assert_eq!(report.summary.total_pdfs_generated, 1);
    assert!(report.summary.end_time.is_some());
    assert!(report.summary.crawl_duration.is_some());

    let reports = std::fs::read_dir(crawler.context().layout().reports_dir())
        .unwrap()
        .count();
    assert_eq!(reports, 1);
}

#[tokio::test]
async fn test_render_failure_keeps_crawling() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(
        SiteTransport::new()
            .page("/", html("Home", r#"<a href="/about">About</a>"#))
            .page("/about", html("About", "<p>About the campus</p>")),
    );
    let (mut crawler, renders) =
        site_crawler(site_config(temp.path()), &transport, RenderMode::Fail);

    let report = crawler.crawl(seeds(&["/"])).await;

    assert_eq!(renders.load(Ordering::SeqCst), 2);
    assert_eq!(report.summary.total_pages_crawled, 2);
    assert_eq!(report.summary.total_pdfs_generated, 0);
    assert_eq!(report.summary.total_errors, 0);
    assert_eq!(report.campus_breakdown.get(&CampusTag::General), Some(&2));
}

#[tokio::test]
async fn test_pipeline_panic_is_recorded_as_failure() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(
        SiteTransport::new()
            .page("/", html("Home", r#"<a href="/about">About</a>"#))
            .page("/about", html("About", "<p>About the campus</p>")),
    );
    let (mut crawler, _) = site_crawler(site_config(temp.path()), &transport, RenderMode::Panic);

    let report = crawler.crawl(seeds(&["/"])).await;

    assert_eq!(crawler.phase(), CrawlPhase::Done);
    assert_eq!(report.failed_urls.len(), 1);
    assert_eq!(report.failed_urls[0].url, site_url("/"));
    assert!(report.failed_urls[0].error.contains("panicked"));
    assert_eq!(report.summary.total_errors, 1);
    // Links of a failed page are not followed
    assert_eq!(transport.calls("/about"), 0);
}

#[tokio::test]
async fn test_batch_loop_failure_still_reports_partial_results() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(
        SiteTransport::new()
            .page("/", html("Home", "<p>Welcome</p>"))
            .page("/a", html("A", "<p>Page A</p>"))
            .page("/b", html("B", "<p>Page B</p>"))
            .crashing("/robots.txt"),
    );

    // One slot gives batches of two, leaving /b for after the first pause
    let mut config = site_config(temp.path());
    config.crawler.max_concurrent_requests = 1;
    config.crawler.respect_robots_txt = true;
    let (mut crawler, renders) = site_crawler(config, &transport, RenderMode::Succeed);

    let report = crawler.crawl(seeds(&["/", "/a", "/b"])).await;

    // The pipelines contain their own crash; the pause before the next
    // batch hits robots.txt outside any pipeline and ends the loop
    assert_eq!(crawler.phase(), CrawlPhase::Done);
    assert_eq!(crawler.stop_reason(), Some(StopReason::Aborted));
    assert_eq!(report.summary.stop_reason, Some(StopReason::Aborted));
    assert_eq!(report.failed_urls.len(), 2);
    assert!(report.failed_urls[0].error.contains("panicked"));
    assert_eq!(report.summary.total_pages_crawled, 0);
    assert_eq!(renders.load(Ordering::SeqCst), 0);
    assert_eq!(transport.calls("/b"), 0);
    assert_eq!(transport.calls("/robots.txt"), 3);
    assert!(report.summary.end_time.is_some());

    let reports: Vec<_> = std::fs::read_dir(crawler.context().layout().reports_dir())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(reports.len(), 1);
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&reports[0]).unwrap()).unwrap();
    assert_eq!(json["summary"]["stopReason"], "aborted");
    assert_eq!(json["failedUrls"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_redirect_to_known_page_is_archived_once() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(
        SiteTransport::new()
            .page("/a", html("A", "<p>Admissions</p>"))
            .redirect("/old", &site_url("/a")),
    );
    let (mut crawler, renders) =
        site_crawler(site_config(temp.path()), &transport, RenderMode::Succeed);

    let report = crawler.crawl(seeds(&["/a", "/old"])).await;

    assert_eq!(transport.calls("/old"), 1);
    assert_eq!(report.summary.total_pages_crawled, 1);
    assert_eq!(report.summary.total_pdfs_generated, 1);
    assert_eq!(renders.load(Ordering::SeqCst), 1);
    assert_eq!(report.content_summary.len(), 1);
    assert!(report.failed_urls.is_empty());
}

#[tokio::test]
async fn test_redirect_out_of_scope_is_skipped() {
    let temp = TempDir::new().unwrap();
    let transport = Arc::new(
        SiteTransport::new()
            .page_at(
                "https://elsewhere.test/landing",
                html("Elsewhere", "<p>Not ours</p>"),
            )
            .redirect("/partner", "https://elsewhere.test/landing"),
    );
    let (mut crawler, renders) =
        site_crawler(site_config(temp.path()), &transport, RenderMode::Succeed);

    let report = crawler.crawl(seeds(&["/partner"])).await;

    assert_eq!(transport.calls("/partner"), 1);
    assert_eq!(report.summary.total_pages_crawled, 0);
    assert_eq!(renders.load(Ordering::SeqCst), 0);
    assert!(report.failed_urls.is_empty());
}

#[tokio::test]
async fn test_http_redirect_is_deduplicated_against_its_target() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let domain = host_of(&base_url);

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/a"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html("A", "<p>Admissions</p>"))
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let temp = TempDir::new().unwrap();
    let config = create_test_config(temp.path(), &format!("{}/", base_url), &domain);
    let fetcher = Fetcher::from_config(&config.crawler).expect("Failed to build fetcher");
    let (renderer, renders) = StubRenderer::new(RenderMode::Succeed);
    let mut crawler = Crawler::with_components(config, fetcher, Box::new(renderer))
        .expect("Failed to create crawler");

    let seeds = vec![format!("{}/a", base_url), format!("{}/old", base_url)];
    let report = crawler.crawl(Some(seeds)).await;

    assert_eq!(report.summary.total_pages_crawled, 1);
    assert_eq!(report.summary.total_pdfs_generated, 1);
    assert_eq!(renders.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_robots_txt_disallow_is_respected() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let domain = host_of(&base_url);

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html(
                    "Home",
                    r#"<a href="/private/records">Records</a><a href="/public">Public</a>"#,
                ))
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html("Public", "<p>Open to everyone</p>"))
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private/records"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html("Private", "<p>No</p>")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let temp = TempDir::new().unwrap();
    let mut config = create_test_config(temp.path(), &format!("{}/", base_url), &domain);
    config.crawler.respect_robots_txt = true;

    let fetcher = Fetcher::from_config(&config.crawler).expect("Failed to build fetcher");
    let (renderer, _) = StubRenderer::new(RenderMode::Succeed);
    let mut crawler = Crawler::with_components(config, fetcher, Box::new(renderer))
        .expect("Failed to create crawler");

    let report = crawler.crawl(None).await;

    // Default seeds are the base URL plus /courses and /site, both 404 here
    assert_eq!(report.summary.total_pages_crawled, 2);
    assert!(report.failed_urls.is_empty());
}

#[tokio::test]
async fn test_linked_pdfs_are_downloaded_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let domain = host_of(&base_url);

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html(
                    "Home",
                    r#"<a href="/files/brochure.pdf">Brochure</a><a href="/about">About</a>"#,
                ))
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html(
                    "About",
                    r#"<p>Same brochure again</p><a href="/files/brochure.pdf">Brochure</a>"#,
                ))
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/brochure.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"%PDF-1.4\n% brochure\n%%EOF\n".to_vec())
                .insert_header("content-type", "application/pdf"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let temp = TempDir::new().unwrap();
    let config = create_test_config(temp.path(), &format!("{}/", base_url), &domain);
    let fetcher = Fetcher::from_config(&config.crawler).expect("Failed to build fetcher");
    let (renderer, _) = StubRenderer::new(RenderMode::Succeed);
    let mut crawler = Crawler::with_components(config, fetcher, Box::new(renderer))
        .expect("Failed to create crawler");

    let report = crawler.crawl(Some(vec![format!("{}/", base_url)])).await;

    assert_eq!(report.summary.total_pdfs_downloaded, 1);
    assert_eq!(report.summary.total_pages_crawled, 2);

    let saved = crawler
        .context()
        .layout()
        .downloads_dir()
        .join("brochure.pdf");
    assert!(saved.exists());
    assert!(std::fs::read(saved).unwrap().starts_with(b"%PDF"));
}
