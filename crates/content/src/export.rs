//! Standalone HTML export of a guide.
//!
//! The exported file is a single self-contained document: the stylesheet and the copy-to-clipboard
//! script are embedded, so it reads correctly offline. Syntax highlighting is linked from a CDN
//! only when [`ExportOptions::highlight`] is set, and only ever enhances already-readable output.
//!
//! Body markup mirrors the page view block for block, including the `section-{index}` anchors,
//! so an exported file navigates exactly like the interactive page.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::block::{Block, Document, ListStyle};
use crate::html::{escape_attr, escape_text};
use crate::toc::{anchor_id, derive_toc, TocEntry, TocStats};
use crate::view::EMPTY_PLACEHOLDER;

const PRISM_VERSION: &str = "1.29.0";

/// A tag badge shown under the title.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTag {
    pub name: String,
    /// `#rrggbb`
    pub color: String,
}

/// Everything the export needs to know about a guide.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportGuide {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub tags: Vec<ExportTag>,
    /// Normalised content.
    pub document: Document,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Date printed in the footer.
    pub exported_at: DateTime<Utc>,
    /// Link Prism for syntax highlighting.
    pub highlight: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            exported_at: Utc::now(),
            highlight: true,
        }
    }
}

/// Download filename for an export: the slug, or the id when the slug is empty.
pub fn export_filename(slug: &str, id: &str) -> String {
    let stem = if slug.trim().is_empty() { id } else { slug };
    format!("{stem}.html")
}

/// Renders a complete HTML document for `guide`.
///
/// # Arguments
///
/// * `guide` - The guide, with content already normalised.
/// * `options` - Export date and highlighting switch.
///
/// # Returns
///
/// The exported document as a string. Never fails.
pub fn render_export(guide: &ExportGuide, options: &ExportOptions) -> String {
    let blocks = &guide.document.blocks;
    let toc = derive_toc(blocks);
    let stats = TocStats::of(blocks);

    let mut out = String::with_capacity(STYLESHEET.len() + 4096);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("<meta charset=\"UTF-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    let _ = writeln!(out, "<title>{} - Guidebook</title>", escape_text(&guide.title));
    if options.highlight {
        write_prism_links(&mut out);
    }
    let _ = writeln!(out, "<style>{STYLESHEET}</style>");
    out.push_str("</head>\n<body>\n<div class=\"container\">\n");

    if !toc.is_empty() {
        write_toc(&mut out, &toc, stats);
    }

    out.push_str("<div class=\"main-content\">\n<header>\n");
    let _ = writeln!(out, "<h1>{}</h1>", escape_text(&guide.title));
    if let Some(description) = guide.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "<p class=\"description\">{}</p>", escape_text(description));
    }
    out.push_str("<div class=\"tags\">");
    for tag in &guide.tags {
        let color = escape_attr(&tag.color);
        let _ = write!(
            out,
            "<span class=\"tag\" style=\"background-color: {color}20; color: {color};\">{}</span>",
            escape_text(&tag.name)
        );
    }
    out.push_str("</div>\n</header>\n<main>\n");

    if blocks.is_empty() {
        let _ = writeln!(out, "<p class=\"empty\">{EMPTY_PLACEHOLDER}</p>");
    }
    for (index, block) in blocks.iter().enumerate() {
        write_block(&mut out, index, block);
    }

    out.push_str("</main>\n");
    let _ = writeln!(
        out,
        "<div class=\"footer\"><p>Exported from Guidebook on {}</p></div>",
        options.exported_at.format("%Y-%m-%d")
    );
    out.push_str("</div>\n</div>\n");
    let _ = writeln!(out, "<script>{COPY_SCRIPT}</script>");
    out.push_str("</body>\n</html>\n");
    out
}

fn write_prism_links(out: &mut String) {
    let base = format!("https://cdnjs.cloudflare.com/ajax/libs/prism/{PRISM_VERSION}");
    let _ = writeln!(
        out,
        "<link href=\"{base}/themes/prism-tomorrow.min.css\" rel=\"stylesheet\">"
    );
    let _ = writeln!(
        out,
        "<script src=\"{base}/components/prism-core.min.js\" defer></script>"
    );
    let _ = writeln!(
        out,
        "<script src=\"{base}/plugins/autoloader/prism-autoloader.min.js\" defer></script>"
    );
}

fn write_toc(out: &mut String, toc: &[TocEntry], stats: TocStats) {
    out.push_str("<div class=\"toc-container\">\n<h2>Table of Contents</h2>\n<nav class=\"toc-nav\">\n");
    for entry in toc {
        let _ = writeln!(
            out,
            "<a href=\"#{}\" class=\"toc-link\" style=\"padding-left: {}rem;\">{}</a>",
            entry.anchor_id,
            entry.indent_rem(),
            escape_text(&entry.text)
        );
    }
    out.push_str("</nav>\n");
    let _ = writeln!(
        out,
        "<div class=\"toc-stats\">\
         <div class=\"stat\"><span>Total sections:</span><span>{}</span></div>\
         <div class=\"stat\"><span>Total blocks:</span><span>{}</span></div></div>",
        stats.sections, stats.blocks
    );
    out.push_str("</div>\n");
}

fn write_block(out: &mut String, index: usize, block: &Block) {
    let _ = match block {
        Block::Header { data, .. } => {
            let level = data.level.get();
            writeln!(
                out,
                "<h{level} id=\"{}\">{}</h{level}>",
                anchor_id(index),
                data.text
            )
        }
        Block::Paragraph { data, .. } => writeln!(out, "<p>{}</p>", data.text),
        Block::Code { data, .. } => {
            let language_class = data
                .language
                .as_deref()
                .map(|l| format!(" class=\"language-{}\"", escape_attr(l)))
                .unwrap_or_default();
            writeln!(
                out,
                "<div class=\"code-block\"><div class=\"code-header\">\
                 <span class=\"code-language\">{label}</span>\
                 <button class=\"copy-btn\" onclick=\"copyCode('code-{index}', this)\" title=\"Copy code\">{COPY_ICON}Copy</button>\
                 </div><pre><code id=\"code-{index}\"{language_class}>{code}</code></pre></div>",
                label = escape_text(data.label()),
                code = escape_text(&data.code),
            )
        }
        Block::List { data, .. } => {
            let tag = match data.style {
                ListStyle::Ordered => "ol",
                ListStyle::Unordered => "ul",
            };
            let _ = write!(out, "<{tag}>");
            for item in &data.items {
                let _ = write!(out, "<li>{}</li>", escape_text(item));
            }
            writeln!(out, "</{tag}>")
        }
        Block::Image { data, .. } => match data.display_url() {
            Some(src) => {
                let caption = data.caption.as_deref();
                let _ = write!(
                    out,
                    "<figure><img src=\"{}\" alt=\"{}\">",
                    escape_attr(src),
                    escape_attr(caption.unwrap_or_default())
                );
                if let Some(caption) = caption {
                    let _ = write!(out, "<figcaption>{}</figcaption>", escape_text(caption));
                }
                writeln!(out, "</figure>")
            }
            None => write_unknown(out, block.type_name()),
        },
        Block::Callout { data, .. } => writeln!(
            out,
            "<aside class=\"callout callout-{severity}\"><span class=\"callout-icon\">{glyph}</span><div>{text}</div></aside>",
            severity = data.severity.as_str(),
            glyph = callout_glyph(data.severity.as_str()),
            text = data.text,
        ),
        Block::Unknown { type_name, .. } => write_unknown(out, type_name),
    };
}

fn write_unknown(out: &mut String, type_name: &str) -> std::fmt::Result {
    writeln!(
        out,
        "<div class=\"unknown-block\"><p>Unknown block type: {}</p></div>",
        escape_text(type_name)
    )
}

fn callout_glyph(severity: &str) -> &'static str {
    match severity {
        "warning" => "&#9888;",
        "info" => "&#8505;",
        _ => "&#9998;",
    }
}

// ============================================================================
// EMBEDDED ASSETS
// ============================================================================

const COPY_ICON: &str = r#"<svg width="16" height="16" viewBox="0 0 24 24" fill="none" xmlns="http://www.w3.org/2000/svg"><path d="M16 1H4C2.9 1 2 1.9 2 3V17H4V3H16V1ZM19 5H8C6.9 5 6 5.9 6 7V21C6 22.1 6.9 23 8 23H19C20.1 23 21 22.1 21 21V7C21 5.9 20.1 5 19 5ZM19 21H8V7H19V21Z" fill="currentColor"/></svg>"#;

const COPY_SCRIPT: &str = r#"
function copyCode(codeId, button) {
    var codeElement = document.getElementById(codeId);
    if (!codeElement) { return; }
    navigator.clipboard.writeText(codeElement.textContent).then(function () {
        var original = button.innerHTML;
        button.innerHTML = 'Copied!';
        button.classList.add('copy-success');
        setTimeout(function () {
            button.innerHTML = original;
            button.classList.remove('copy-success');
        }, 2000);
    });
}
"#;

const STYLESHEET: &str = r#"
* { box-sizing: border-box; }
html { scroll-behavior: smooth; }
body {
    background-color: hsl(220 13% 5%);
    color: hsl(213 31% 81%);
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    line-height: 1.7;
    margin: 0;
    padding: 0;
}
.container { display: flex; max-width: 1400px; margin: 0 auto; }
.toc-container {
    width: 300px;
    background-color: hsl(217 19% 11%);
    border-right: 1px solid hsl(217 19% 19%);
    padding: 2rem;
    height: 100vh;
    overflow-y: auto;
    position: sticky;
    top: 0;
}
.toc-container h2 { font-size: 1.125rem; font-weight: 600; margin-bottom: 1rem; }
.toc-nav { display: flex; flex-direction: column; gap: 0.25rem; }
.toc-link {
    display: block;
    padding: 0.5rem 0.75rem;
    font-size: 0.875rem;
    color: hsl(213 20% 63%);
    text-decoration: none;
    border-radius: 0.375rem;
}
.toc-link:hover { color: hsl(213 31% 81%); background-color: hsl(217 19% 19%); }
.toc-stats { margin-top: 2rem; padding-top: 1.5rem; border-top: 1px solid hsl(217 19% 19%); }
.stat { display: flex; justify-content: space-between; font-size: 0.75rem; color: hsl(213 20% 63%); }
.main-content { flex: 1; padding: 2rem; min-width: 0; }
h1, h2, h3, h4, h5, h6 { color: hsl(217 91% 68%); margin-top: 2rem; margin-bottom: 1rem; line-height: 1.2; }
h1 { font-size: 2.25rem; }
h2 { font-size: 1.875rem; }
h3 { font-size: 1.5rem; }
h4 { font-size: 1.25rem; }
h5 { font-size: 1.125rem; }
h6 { font-size: 1rem; }
.description { color: hsl(213 20% 63%); font-size: 1.125rem; }
.tags { margin-bottom: 2rem; display: flex; gap: 0.5rem; flex-wrap: wrap; }
.tag { padding: 0.25rem 0.5rem; border-radius: 9999px; font-size: 0.75rem; }
.code-block {
    margin: 1.5rem 0;
    border-radius: 0.5rem;
    overflow: hidden;
    background-color: hsl(217 19% 11%);
    border: 1px solid hsl(217 19% 19%);
}
.code-header {
    display: flex;
    justify-content: space-between;
    align-items: center;
    padding: 0.5rem 1rem;
    background-color: hsl(217 19% 19%);
}
.code-language { font-size: 0.75rem; color: hsl(213 20% 63%); font-weight: 500; }
.copy-btn {
    display: flex;
    align-items: center;
    gap: 0.25rem;
    padding: 0.25rem 0.5rem;
    background: transparent;
    color: hsl(213 31% 81%);
    border: none;
    border-radius: 0.25rem;
    cursor: pointer;
    font-size: 0.75rem;
}
.copy-btn:hover { background-color: hsl(217 19% 11%); }
.copy-btn svg { width: 12px; height: 12px; }
.copy-success { color: hsl(142 71% 45%) !important; }
pre { margin: 0; padding: 1rem; background-color: hsl(217 19% 11%) !important; overflow-x: auto; }
code { font-family: 'Monaco', 'Menlo', 'Ubuntu Mono', monospace; font-size: 0.875rem; }
figure { margin: 2rem 0; }
img { max-width: 100%; height: auto; border-radius: 0.5rem; border: 1px solid hsl(217 19% 19%); }
figcaption { text-align: center; color: hsl(213 20% 63%); font-size: 0.875rem; margin-top: 0.5rem; font-style: italic; }
ol, ul { margin: 1rem 0; padding-left: 1.5rem; }
li { margin: 0.25rem 0; }
p { margin: 1rem 0; }
.callout { display: flex; gap: 0.75rem; border-left: 4px solid; border-radius: 0.5rem; padding: 1rem; margin: 1.5rem 0; }
.callout-note { background-color: hsl(217 91% 68% / 0.1); border-color: hsl(217 91% 68%); }
.callout-info { background-color: hsl(199 89% 48% / 0.1); border-color: hsl(199 89% 48%); }
.callout-warning { background-color: hsl(38 92% 50% / 0.1); border-color: hsl(38 92% 50%); }
.unknown-block { padding: 1rem; border: 1px dashed hsl(217 19% 19%); border-radius: 0.5rem; color: hsl(213 20% 63%); }
.empty { color: hsl(213 20% 63%); text-align: center; padding: 4rem 0; }
.footer {
    margin-top: 4rem;
    padding-top: 2rem;
    border-top: 1px solid hsl(217 19% 19%);
    color: hsl(213 20% 63%);
    font-size: 0.875rem;
}
@media (max-width: 1024px) {
    .container { flex-direction: column; }
    .toc-container { width: 100%; height: auto; position: relative; border-right: none; }
}
"#;
