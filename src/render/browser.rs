//! Rendering through headless Chromium's print-to-PDF

use super::html_to_pdf::check_pdf;
use super::template::render_html;
use super::{RenderError, Renderer};
use crate::config::RenderConfig;
use crate::crawler::PageRecord;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// One Chromium instance shared by every page of the run
///
/// Each render opens a fresh tab, loads the templated HTML into it, prints
/// it and closes the tab again, whether printing succeeded or not.
pub struct BrowserPrintRenderer {
    browser: Mutex<Option<Browser>>,
    handler: std::sync::Mutex<Option<JoinHandle<()>>>,
    params: PrintToPdfParams,
}

impl BrowserPrintRenderer {
    /// Launches the browser and starts its CDP event loop
    pub async fn launch(config: &RenderConfig) -> Result<Self, RenderError> {
        tracing::info!("Launching headless browser for PDF rendering");

        let mut builder = BrowserConfig::builder()
            .request_timeout(Duration::from_secs(30))
            .arg("--disable-gpu")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions");
        if !config.include_images {
            builder = builder.arg("--blink-settings=imagesEnabled=false");
        }
        let browser_config = builder.build().map_err(RenderError::Browser)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| RenderError::Browser(format!("failed to launch browser: {}", e)))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {:?}", e);
                }
            }
        });

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            handler: std::sync::Mutex::new(Some(handler_task)),
            params: print_params(config),
        })
    }

    async fn print(&self, page: &Page, html: &str) -> Result<Vec<u8>, RenderError> {
        page.set_content(html)
            .await
            .map_err(|e| RenderError::Browser(format!("failed to load content: {}", e)))?;

        let bytes = page
            .pdf(self.params.clone())
            .await
            .map_err(|e| RenderError::Browser(format!("print to PDF failed: {}", e)))?;

        check_pdf(bytes)
    }

    fn abort_handler(&self) {
        let handle = self
            .handler
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

#[async_trait]
impl Renderer for BrowserPrintRenderer {
    fn name(&self) -> &'static str {
        "browser-print"
    }

    async fn render(&self, page_record: &PageRecord) -> Result<Vec<u8>, RenderError> {
        let html = render_html(page_record);

        let page = {
            let guard = self.browser.lock().await;
            let browser = guard
                .as_ref()
                .ok_or_else(|| RenderError::Browser("browser already shut down".into()))?;
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| RenderError::Browser(format!("failed to open page: {}", e)))?
        };

        let result = self.print(&page, &html).await;

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page for {}: {}", page_record.url, e);
        }

        result
    }

    async fn shutdown(&self) {
        let browser = self.browser.lock().await.take();

        if let Some(mut browser) = browser {
            tracing::info!("Closing headless browser");
            if let Err(e) = browser.close().await {
                tracing::warn!("Failed to close browser cleanly: {}", e);
            }
            if let Err(e) = browser.wait().await {
                tracing::warn!("Failed to wait for browser exit: {}", e);
            }
        }

        self.abort_handler();
    }
}

impl Drop for BrowserPrintRenderer {
    fn drop(&mut self) {
        // Dropping the Browser kills the process; the event loop must stop too
        self.abort_handler();
    }
}

/// Print settings derived from the render configuration
fn print_params(config: &RenderConfig) -> PrintToPdfParams {
    let (width, height) = paper_size_inches(&config.page_size).unwrap_or_else(|| {
        tracing::warn!("Unknown page size {:?}, using A4", config.page_size);
        (8.27, 11.69)
    });
    let margin = margin_inches(&config.margin).unwrap_or_else(|| {
        tracing::warn!("Unparseable margin {:?}, using 1in", config.margin);
        1.0
    });

    PrintToPdfParams {
        print_background: Some(true),
        paper_width: Some(width),
        paper_height: Some(height),
        margin_top: Some(margin),
        margin_bottom: Some(margin),
        margin_left: Some(margin),
        margin_right: Some(margin),
        ..Default::default()
    }
}

/// Paper dimensions (width, height) in inches for common size names
pub fn paper_size_inches(name: &str) -> Option<(f64, f64)> {
    match name.trim().to_ascii_lowercase().as_str() {
        "a3" => Some((11.69, 16.54)),
        "a4" => Some((8.27, 11.69)),
        "a5" => Some((5.83, 8.27)),
        "letter" => Some((8.5, 11.0)),
        "legal" => Some((8.5, 14.0)),
        _ => None,
    }
}

/// Converts a CSS length (`in`, `cm`, `mm`, `px`) to inches
pub fn margin_inches(css: &str) -> Option<f64> {
    let css = css.trim().to_ascii_lowercase();
    let split = css
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(css.len());
    let (number, unit) = css.split_at(split);
    let value: f64 = number.trim().parse().ok()?;

    let inches = match unit {
        "in" | "" => value,
        "cm" => value / 2.54,
        "mm" => value / 25.4,
        "px" => value / 96.0,
        _ => return None,
    };

    (inches.is_finite() && inches >= 0.0).then_some(inches)
}
