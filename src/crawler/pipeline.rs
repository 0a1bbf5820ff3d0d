//! Per-page pipeline
//!
//! gate (scope, visited set) -> admission -> robots.txt -> fetch -> extract
//! -> content dedup -> render -> linked PDF downloads
//!
//! A pipeline never returns an error: failures become entries in the
//! context's failure list, and a panic is caught at this boundary.

use super::context::CrawlContext;
use super::fetcher::Fetcher;
use super::parser::{extract_page, PageRecord};
use super::scheduler::FrontierEntry;
use crate::render::Renderer;
use crate::state::PageOutcome;
use crate::ArchiverError;
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use url::Url;

/// What a finished pipeline hands back to the coordinator
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub url: Url,
    pub depth: u32,
    pub outcome: PageOutcome,
    /// In-scope links found on the page (empty unless archived)
    pub links: Vec<Url>,
}

/// Runs the pipeline for one frontier entry
///
/// Errors and panics are recorded as failed URLs; the crawl carries on.
pub async fn process_page(
    ctx: &CrawlContext,
    fetcher: &Fetcher,
    renderer: &dyn Renderer,
    entry: FrontierEntry,
) -> PipelineResult {
    let guarded = AssertUnwindSafe(run_pipeline(ctx, fetcher, renderer, &entry)).catch_unwind();

    let (outcome, links) = match guarded.await {
        Ok(Ok(done)) => done,
        Ok(Err(e)) => {
            ctx.record_failure(entry.url.as_str(), &e);
            (PageOutcome::Failed, Vec::new())
        }
        Err(panic) => {
            ctx.record_failure(
                entry.url.as_str(),
                format!("pipeline panicked: {}", panic_message(&*panic)),
            );
            (PageOutcome::Failed, Vec::new())
        }
    };

    PipelineResult {
        url: entry.url,
        depth: entry.depth,
        outcome,
        links,
    }
}

async fn run_pipeline(
    ctx: &CrawlContext,
    fetcher: &Fetcher,
    renderer: &dyn Renderer,
    entry: &FrontierEntry,
) -> Result<(PageOutcome, Vec<Url>), ArchiverError> {
    let url = &entry.url;

    if !ctx.scope().is_valid_url(url) {
        tracing::trace!("Out of scope: {}", url);
        return Ok((PageOutcome::Skipped, Vec::new()));
    }

    if !ctx.dedup().mark_visited_if_new(&entry.key) {
        tracing::trace!("Already visited: {}", url);
        return Ok((PageOutcome::Skipped, Vec::new()));
    }

    // Held until the pipeline ends, so fetch and render share one slot
    let Some(_admission) = ctx.limiter().admit().await else {
        tracing::debug!("Limiter closed, dropping {}", url);
        return Ok((PageOutcome::Skipped, Vec::new()));
    };

    if !ctx.robots().is_allowed(fetcher, url).await {
        tracing::debug!("Disallowed by robots.txt: {}", url);
        return Ok((PageOutcome::Skipped, Vec::new()));
    }

    let resource = fetcher.fetch(url).await?;

    if !resource.is_success() {
        tracing::warn!("Non-success status for {}: {}", url, resource.status);
        return Ok((PageOutcome::NonSuccessStatus, Vec::new()));
    }

    if resource.final_url != *url && !accept_redirect(ctx, entry, &resource.final_url) {
        return Ok((PageOutcome::Skipped, Vec::new()));
    }

    let page = extract_page(
        &resource.text(),
        &resource.final_url,
        ctx.scope(),
        ctx.extract_options(),
    );
    ctx.stats().record_page_processed();

    if ctx.dedup().is_duplicate_content(&page.text) {
        tracing::info!("Duplicate content detected for {}", url);
        return Ok((PageOutcome::DuplicateContent, Vec::new()));
    }

    ctx.record_page(&page);
    render_page(ctx, renderer, &page).await;

    if ctx.config().output.download_existing_pdfs {
        for pdf_url in &page.pdf_links {
            if ctx.claim_pdf(pdf_url) {
                download_pdf(ctx, fetcher, pdf_url).await;
            }
        }
    }

    Ok((PageOutcome::Archived, page.links))
}

/// Checks where a redirect landed before its content is archived
///
/// The target must be in scope, and its canonical key is claimed in the
/// visited set so a page reached both directly and through a redirect is
/// archived once.
fn accept_redirect(ctx: &CrawlContext, entry: &FrontierEntry, final_url: &Url) -> bool {
    if !ctx.scope().is_valid_url(final_url) {
        tracing::debug!("Redirect left scope: {} -> {}", entry.url, final_url);
        return false;
    }

    let tracking = &ctx.config().scope.tracking_params;
    let Some(key) = crate::url::canonical_key(final_url.as_str(), tracking) else {
        return true;
    };

    if key != entry.key && !ctx.dedup().mark_visited_if_new(&key) {
        tracing::debug!(
            "Redirect target already visited: {} -> {}",
            entry.url,
            final_url
        );
        return false;
    }

    true
}

/// Renders and saves one page; failures are logged only
async fn render_page(ctx: &CrawlContext, renderer: &dyn Renderer, page: &PageRecord) {
    let bytes = match renderer.render(page).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("Failed to generate PDF for {}: {}", page.url, e);
            return;
        }
    };

    let campus = ctx
        .config()
        .output
        .group_by_campus
        .then_some(page.metadata.campus);

    match ctx.layout().save_page_pdf(
        campus,
        &page.title,
        Utc::now().timestamp(),
        &bytes,
    ) {
        Ok(path) => {
            ctx.stats().record_pdf_rendered();
            tracing::info!("Generated PDF: {} -> {}", page.url, path.display());
        }
        Err(e) => tracing::error!("Failed to save PDF for {}: {}", page.url, e),
    }
}

/// Downloads a linked PDF into `downloaded_pdfs/`; failures are warnings
async fn download_pdf(ctx: &CrawlContext, fetcher: &Fetcher, url: &Url) {
    let resource = match fetcher.fetch(url).await {
        Ok(resource) => resource,
        Err(e) => {
            tracing::warn!("Error downloading PDF {}: {}", url, e);
            return;
        }
    };

    if resource.status != 200 {
        tracing::warn!("Failed to download PDF {}: HTTP {}", url, resource.status);
        return;
    }

    match ctx.layout().save_downloaded_pdf(url, &resource.body) {
        Ok(path) => {
            ctx.stats().record_pdf_downloaded();
            tracing::info!("Downloaded PDF: {} -> {}", url, path.display());
        }
        Err(e) => tracing::warn!("Failed to save downloaded PDF {}: {}", url, e),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
