//! The interactive page rendering.
//!
//! [`render_view`] maps a normalised block sequence to a view model, one [`ViewBlock`] per block
//! carrying its index, and [`PageView::to_html`] turns that into markup for the guide page.
//! Element hooks follow the `data-testid="{kind}-{index}"` convention so the page and its tests
//! address blocks by the same anchor index as the TOC.

use std::fmt::Write;

use serde::Serialize;

use crate::block::{Block, CalloutSeverity, ListStyle};
use crate::html::{escape_attr, escape_text};
use crate::toc::{anchor_id, derive_toc, TocEntry, TocStats};

/// Shown in place of the body when a guide has no blocks.
pub const EMPTY_PLACEHOLDER: &str = "This guide has no content yet.";

/// A block prepared for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViewBlock {
    #[serde(rename_all = "camelCase")]
    Heading {
        index: usize,
        anchor_id: String,
        level: u8,
        /// Sanitised inline markup.
        html: String,
    },
    Paragraph { index: usize, html: String },
    Code {
        index: usize,
        label: String,
        code: String,
    },
    List {
        index: usize,
        ordered: bool,
        items: Vec<String>,
    },
    Figure {
        index: usize,
        src: String,
        caption: Option<String>,
    },
    Callout {
        index: usize,
        severity: CalloutSeverity,
        icon: &'static str,
        html: String,
    },
    #[serde(rename_all = "camelCase")]
    Unknown { index: usize, type_name: String },
}

impl ViewBlock {
    pub fn index(&self) -> usize {
        match self {
            ViewBlock::Heading { index, .. }
            | ViewBlock::Paragraph { index, .. }
            | ViewBlock::Code { index, .. }
            | ViewBlock::List { index, .. }
            | ViewBlock::Figure { index, .. }
            | ViewBlock::Callout { index, .. }
            | ViewBlock::Unknown { index, .. } => *index,
        }
    }
}

/// The whole page: body blocks plus the TOC sidebar that navigates them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub blocks: Vec<ViewBlock>,
    pub toc: Vec<TocEntry>,
    pub stats: TocStats,
}

/// Builds the page view of a normalised block sequence. Never fails.
pub fn render_view(blocks: &[Block]) -> PageView {
    PageView {
        blocks: blocks
            .iter()
            .enumerate()
            .map(|(index, block)| view_block(index, block))
            .collect(),
        toc: derive_toc(blocks),
        stats: TocStats::of(blocks),
    }
}

fn view_block(index: usize, block: &Block) -> ViewBlock {
    match block {
        Block::Header { data, .. } => ViewBlock::Heading {
            index,
            anchor_id: anchor_id(index),
            level: data.level.get(),
            html: data.text.clone(),
        },
        Block::Paragraph { data, .. } => ViewBlock::Paragraph {
            index,
            html: data.text.clone(),
        },
        Block::Code { data, .. } => ViewBlock::Code {
            index,
            label: data.label().to_owned(),
            code: data.code.clone(),
        },
        Block::List { data, .. } => ViewBlock::List {
            index,
            ordered: data.style == ListStyle::Ordered,
            items: data.items.clone(),
        },
        Block::Image { data, .. } => match data.display_url() {
            Some(src) => ViewBlock::Figure {
                index,
                src: src.to_owned(),
                caption: data.caption.clone(),
            },
            None => ViewBlock::Unknown {
                index,
                type_name: block.type_name().to_owned(),
            },
        },
        Block::Callout { data, .. } => ViewBlock::Callout {
            index,
            severity: data.severity,
            icon: data.severity.icon(),
            html: data.text.clone(),
        },
        Block::Unknown { type_name, .. } => ViewBlock::Unknown {
            index,
            type_name: type_name.clone(),
        },
    }
}

// ============================================================================
// MARKUP
// ============================================================================

impl PageView {
    /// Renders the page as an HTML fragment: TOC sidebar followed by the guide body.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_toc(&mut out);
        self.write_body(&mut out);
        out
    }

    fn write_toc(&self, out: &mut String) {
        out.push_str("<aside class=\"toc\">\n<h2 data-testid=\"toc-title\">Table of Contents</h2>\n<nav>\n");
        if self.toc.is_empty() {
            out.push_str("<div class=\"toc-empty\">No sections available</div>\n");
        }
        for entry in &self.toc {
            let _ = writeln!(
                out,
                "<a href=\"#{anchor}\" style=\"padding-left: {indent}rem\" data-testid=\"toc-link-{index}\">{text}</a>",
                anchor = entry.anchor_id,
                indent = entry.indent_rem(),
                index = entry.source_index,
                text = escape_text(&entry.text),
            );
        }
        out.push_str("</nav>\n");
        if self.stats.blocks > 0 {
            let _ = writeln!(
                out,
                "<div class=\"toc-stats\"><span>Total sections: {}</span><span>Total blocks: {}</span></div>",
                self.stats.sections, self.stats.blocks
            );
        }
        out.push_str("</aside>\n");
    }

    fn write_body(&self, out: &mut String) {
        out.push_str("<main class=\"guide-body\">\n");
        if self.blocks.is_empty() {
            let _ = writeln!(out, "<p class=\"empty\">{EMPTY_PLACEHOLDER}</p>");
        }
        for block in &self.blocks {
            write_block(out, block);
        }
        out.push_str("</main>\n");
    }
}

fn write_block(out: &mut String, block: &ViewBlock) {
    let _ = match block {
        ViewBlock::Heading {
            index,
            anchor_id,
            level,
            html,
        } => writeln!(
            out,
            "<h{level} id=\"{anchor_id}\" class=\"heading heading-{level}\" data-testid=\"header-{index}\">{html}</h{level}>"
        ),
        ViewBlock::Paragraph { index, html } => {
            writeln!(out, "<p data-testid=\"paragraph-{index}\">{html}</p>")
        }
        ViewBlock::Code { index, label, code } => writeln!(
            out,
            "<div class=\"code-block\" data-testid=\"code-{index}\">\
             <div class=\"code-header\"><span class=\"code-label\">{label}</span>\
             <button class=\"copy-button\" data-testid=\"button-copy-{index}\">Copy</button></div>\
             <pre><code>{code}</code></pre></div>",
            label = escape_text(label),
            code = escape_text(code),
        ),
        ViewBlock::List {
            index,
            ordered,
            items,
        } => {
            let tag = if *ordered { "ol" } else { "ul" };
            let _ = write!(out, "<{tag} data-testid=\"list-{index}\">");
            for item in items {
                let _ = write!(out, "<li>{}</li>", escape_text(item));
            }
            writeln!(out, "</{tag}>")
        }
        ViewBlock::Figure {
            index,
            src,
            caption,
        } => {
            let _ = write!(
                out,
                "<figure data-testid=\"image-{index}\"><img src=\"{}\" alt=\"{}\">",
                escape_attr(src),
                escape_attr(caption.as_deref().unwrap_or_default()),
            );
            if let Some(caption) = caption {
                let _ = write!(out, "<figcaption>{}</figcaption>", escape_text(caption));
            }
            writeln!(out, "</figure>")
        }
        ViewBlock::Callout {
            index,
            severity,
            icon,
            html,
        } => writeln!(
            out,
            "<div class=\"callout callout-{severity}\" data-testid=\"callout-{index}\">\
             <span class=\"icon\" data-icon=\"{icon}\"></span><div class=\"callout-text\">{html}</div></div>",
            severity = severity.as_str(),
        ),
        ViewBlock::Unknown { index, type_name } => writeln!(
            out,
            "<div class=\"unknown-block\" data-testid=\"unknown-{index}\"><p>Unknown block type: {}</p></div>",
            escape_text(type_name)
        ),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalise::normalise_at;
    use serde_json::json;

    fn page(raw: serde_json::Value) -> PageView {
        render_view(&normalise_at(&raw, 0).blocks)
    }

    #[test]
    fn empty_document_renders_placeholder() {
        let view = page(json!({"blocks": []}));
        assert!(view.blocks.is_empty());
        let html = view.to_html();
        assert!(html.contains(EMPTY_PLACEHOLDER));
        assert!(html.contains("No sections available"));
        assert!(!html.contains("Total blocks"));
    }

    #[test]
    fn heading_anchor_matches_toc() {
        let view = page(json!({"blocks": [
            {"type": "paragraph", "data": {"text": "intro"}},
            {"type": "header", "data": {"text": "Setup", "level": 2}}
        ]}));

        assert_eq!(view.toc[0].anchor_id, "section-1");
        let html = view.to_html();
        assert!(html.contains(r#"<h2 id="section-1" class="heading heading-2" data-testid="header-1">Setup</h2>"#));
        assert!(html.contains(r##"href="#section-1""##));
        assert!(html.contains(r#"data-testid="toc-link-1""#));
    }

    #[test]
    fn code_is_labelled_and_escaped() {
        let view = page(json!({"blocks": [
            {"type": "code", "data": {"code": "<div>&</div>"}}
        ]}));
        let html = view.to_html();
        assert!(html.contains(r#"<span class="code-label">code</span>"#));
        assert!(html.contains("&lt;div&gt;&amp;&lt;/div&gt;"));
        assert!(html.contains(r#"data-testid="button-copy-0""#));
    }

    #[test]
    fn list_items_render_as_plain_text() {
        let view = page(json!({"blocks": [
            {"type": "list", "data": {"style": "ordered", "items": ["<b>x</b>"]}}
        ]}));
        let html = view.to_html();
        assert!(html.contains(r#"<ol data-testid="list-0"><li>&lt;b&gt;x&lt;/b&gt;</li></ol>"#));
    }

    #[test]
    fn callout_carries_severity_icon_and_inline_markup() {
        let view = page(json!({"blocks": [
            {"type": "callout", "data": {"text": "<b>Careful</b>", "type": "warning"}}
        ]}));
        assert_eq!(
            view.blocks[0],
            ViewBlock::Callout {
                index: 0,
                severity: CalloutSeverity::Warning,
                icon: "alert-triangle",
                html: "<b>Careful</b>".into(),
            }
        );
        assert!(view.to_html().contains("callout-warning"));
    }

    #[test]
    fn image_prefers_external_url_and_escapes_attributes() {
        let view = page(json!({"blocks": [
            {"type": "image", "data": {"file": {"url": "/a.png", "externalUrl": "https://x/\"b\".png"}, "caption": "A & B"}}
        ]}));
        let html = view.to_html();
        assert!(html.contains(r#"src="https://x/&quot;b&quot;.png""#));
        assert!(html.contains("<figcaption>A &amp; B</figcaption>"));
    }

    #[test]
    fn unknown_and_urlless_blocks_render_placeholder() {
        let view = page(json!({"blocks": [
            {"type": "embed", "data": {}},
            {"type": "image", "data": {}}
        ]}));
        let html = view.to_html();
        assert!(html.contains(r#"data-testid="unknown-0"><p>Unknown block type: embed</p>"#));
        assert!(html.contains(r#"data-testid="unknown-1"><p>Unknown block type: image</p>"#));
        assert_eq!(view.blocks[1].index(), 1);
    }
}
