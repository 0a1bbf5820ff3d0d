//! Rendering through an external wkhtmltopdf-compatible executable

use super::template::render_html;
use super::{RenderError, Renderer};
use crate::config::RenderConfig;
use crate::crawler::PageRecord;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Pipes the templated page through `wkhtmltopdf - -` (stdin to stdout)
#[derive(Debug, Clone)]
pub struct HtmlToPdfRenderer {
    program: String,
    page_size: String,
    margin: String,
    include_images: bool,
}

impl HtmlToPdfRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            program: config.wkhtmltopdf_path.clone(),
            page_size: config.page_size.clone(),
            margin: config.margin.clone(),
            include_images: config.include_images,
        }
    }

    /// Creates the renderer and checks that the executable runs
    ///
    /// # Returns
    ///
    /// * `Ok(HtmlToPdfRenderer)` - `<program> --version` exited successfully
    /// * `Err(RenderError)` - The executable is missing or broken
    pub async fn launch_checked(config: &RenderConfig) -> Result<Self, RenderError> {
        let renderer = Self::new(config);

        let output = Command::new(&renderer.program)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| RenderError::Spawn {
                program: renderer.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RenderError::Engine(format!(
                "{} --version exited with {}",
                renderer.program, output.status
            )));
        }

        tracing::info!(
            "Using {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(renderer)
    }

    fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "--quiet".into(),
            "--encoding".into(),
            "utf-8".into(),
            "--page-size".into(),
            self.page_size.clone(),
        ];

        for side in ["--margin-top", "--margin-right", "--margin-bottom", "--margin-left"] {
            args.push(side.into());
            args.push(self.margin.clone());
        }

        if !self.include_images {
            args.push("--no-images".into());
        }

        // Read HTML from stdin, write PDF to stdout
        args.push("-".into());
        args.push("-".into());
        args
    }
}

#[async_trait]
impl Renderer for HtmlToPdfRenderer {
    fn name(&self) -> &'static str {
        "html-to-pdf"
    }

    async fn render(&self, page: &PageRecord) -> Result<Vec<u8>, RenderError> {
        let html = render_html(page);

        let mut child = Command::new(&self.program)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RenderError::Engine("stdin of the renderer was not captured".into()))?;

        // Feed stdin while draining stdout so neither pipe fills up
        let feed = async move {
            stdin.write_all(html.as_bytes()).await?;
            stdin.shutdown().await
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            return Err(RenderError::Engine(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        fed?;

        check_pdf(output.stdout)
    }
}

/// Accepts only output that looks like a PDF document
pub(crate) fn check_pdf(bytes: Vec<u8>) -> Result<Vec<u8>, RenderError> {
    if bytes.starts_with(b"%PDF") {
        Ok(bytes)
    } else if bytes.is_empty() {
        Err(RenderError::Empty)
    } else {
        Err(RenderError::Engine("output is not a PDF document".into()))
    }
}
