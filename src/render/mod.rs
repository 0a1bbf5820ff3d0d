//! PDF rendering module
//!
//! Every engine turns a [`PageRecord`] into PDF bytes from the same
//! templated HTML. The engine is picked once at startup from the
//! configuration and used for the whole run.

mod browser;
mod html_to_pdf;
pub mod template;

pub use browser::{margin_inches, paper_size_inches, BrowserPrintRenderer};
pub use html_to_pdf::HtmlToPdfRenderer;
pub use template::render_html;

use crate::config::{RenderConfig, RenderEngine};
use crate::crawler::PageRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while rendering a page
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Rendering engine failed: {0}")]
    Engine(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Rendering engine produced no output")]
    Empty,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A PDF rendering engine
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Engine name as written in the configuration
    fn name(&self) -> &'static str;

    /// Renders one page to PDF bytes
    async fn render(&self, page: &PageRecord) -> Result<Vec<u8>, RenderError>;

    /// Releases engine resources; the renderer is unusable afterwards
    async fn shutdown(&self) {}
}

/// Constructs the configured engine
///
/// Fails when the engine cannot start (missing executable, browser that
/// does not launch), so a broken setup is reported before any crawling.
pub async fn build_renderer(config: &RenderConfig) -> Result<Box<dyn Renderer>, RenderError> {
    let renderer: Box<dyn Renderer> = match config.engine {
        RenderEngine::HtmlToPdf => Box::new(HtmlToPdfRenderer::launch_checked(config).await?),
        RenderEngine::BrowserPrint => Box::new(BrowserPrintRenderer::launch(config).await?),
    };

    tracing::info!("Rendering engine: {}", renderer.name());
    Ok(renderer)
}
