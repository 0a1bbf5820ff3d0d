//! Printable HTML page shared by every rendering engine

use crate::crawler::PageRecord;
use html_escape::{encode_double_quoted_attribute, encode_text};

const STYLESHEET: &str = r#"
    body {
        font-family: 'Arial', sans-serif;
        line-height: 1.6;
        margin: 0;
        padding: 20px;
        color: #333;
    }
    .header {
        border-bottom: 2px solid #0066cc;
        padding-bottom: 10px;
        margin-bottom: 20px;
    }
    .title {
        color: #0066cc;
        font-size: 24px;
        font-weight: bold;
        margin: 0;
    }
    .url {
        color: #666;
        font-size: 12px;
        margin: 5px 0;
    }
    .content {
        max-width: 100%;
        overflow-wrap: break-word;
    }
    .content img {
        max-width: 100%;
        height: auto;
    }
    .footer {
        margin-top: 30px;
        padding-top: 10px;
        border-top: 1px solid #ccc;
        font-size: 10px;
        color: #666;
    }
"#;

/// Wraps a page's sanitized content in the archive template
///
/// The header carries the title, source URL and capture time; the footer
/// carries the campus tag. Title and URL are HTML-escaped; the content is
/// already sanitized by the extractor and is inserted as-is. A `<base>`
/// element keeps relative image and link URLs pointing at the source site.
pub fn render_html(page: &PageRecord) -> String {
    let title = encode_text(&page.title);
    let url = page.url.as_str();

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<base href="{base}">
<title>{title}</title>
<style>{style}</style>
</head>
<body>
<div class="header">
<h1 class="title">{title}</h1>
<p class="url">URL: {url_text}</p>
<p class="url">Crawled: {captured}</p>
</div>
<div class="content">
{content}
</div>
<div class="footer">
<p>Generated by BTEC FPT Crawler | Campus: {campus}</p>
</div>
</body>
</html>
"#,
        lang = encode_double_quoted_attribute(&page.metadata.language),
        base = encode_double_quoted_attribute(url),
        title = title,
        style = STYLESHEET,
        url_text = encode_text(url),
        captured = page.captured_at.format("%Y-%m-%d %H:%M:%S"),
        content = page.content,
        campus = page.metadata.campus,
    )
}
