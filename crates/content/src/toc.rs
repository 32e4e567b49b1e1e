//! Table-of-contents derivation.
//!
//! Entries are flat and in document order. Nesting is expressed only through [`TocEntry::level`],
//! which renderers turn into indentation; a level-1 entry never owns the entries after it.

use serde::Serialize;

use crate::block::Block;
use crate::inline::to_plain_text;

/// Indentation per heading level below 1, in `rem`.
const INDENT_STEP_REM: f32 = 0.75;

/// Anchor id shared by the page view, the export and the TOC for the block at `index`.
pub fn anchor_id(index: usize) -> String {
    format!("section-{index}")
}

/// One header of a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
    pub anchor_id: String,
    /// Plain display text (inline markup stripped).
    pub text: String,
    pub level: u8,
    /// Position of the header in the normalised block sequence.
    pub source_index: usize,
}

impl TocEntry {
    /// Visual indentation for this entry, in `rem`.
    pub fn indent_rem(&self) -> f32 {
        f32::from(self.level.saturating_sub(1)) * INDENT_STEP_REM
    }
}

/// Summary figures shown beneath the TOC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TocStats {
    /// Number of header blocks.
    pub sections: usize,
    /// Number of blocks of any type.
    pub blocks: usize,
}

impl TocStats {
    pub fn of(blocks: &[Block]) -> Self {
        Self {
            sections: blocks
                .iter()
                .filter(|b| matches!(b, Block::Header { .. }))
                .count(),
            blocks: blocks.len(),
        }
    }
}

/// Derives the TOC of a normalised block sequence.
///
/// # Arguments
///
/// * `blocks` - Normalised blocks. Indices are taken from this slice, so callers holding raw
///   content must normalise first or anchors will not match the rendered page.
///
/// # Returns
///
/// One entry per header block, in document order.
pub fn derive_toc(blocks: &[Block]) -> Vec<TocEntry> {
    blocks
        .iter()
        .enumerate()
        .filter_map(|(index, block)| match block {
            Block::Header { data, .. } => Some(TocEntry {
                anchor_id: anchor_id(index),
                text: to_plain_text(&data.text),
                level: data.level.get(),
                source_index: index,
            }),
            _ => None,
        })
        .collect()
}

/// Case-insensitive section search over TOC text. An empty query keeps every entry.
pub fn filter_toc<'a>(entries: &'a [TocEntry], query: &str) -> Vec<&'a TocEntry> {
    let needle = query.trim().to_lowercase();
    entries
        .iter()
        .filter(|entry| needle.is_empty() || entry.text.to_lowercase().contains(&needle))
        .collect()
}
