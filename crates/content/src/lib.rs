//! # Guidebook Content
//!
//! The block-content model of a guide and every transformation over it:
//!
//! - [`block`]: the closed set of block variants and the [`Document`] that orders them
//! - [`inline`]: the allow-listed inline HTML subset used by text-bearing blocks
//! - [`normalise`]: repair of persisted or externally supplied JSON into a canonical `Document`
//! - [`toc`]: table-of-contents derivation
//! - [`view`]: the interactive page rendering
//! - [`export`]: the standalone HTML export
//!
//! Every operation here is pure and total. Malformed input degrades to defaults or to an
//! explicit "unknown block" placeholder; nothing in this crate returns an error.
//!
//! Anchors (`section-{index}`) are always derived from the block's position in the
//! **normalised** sequence, so TOC links, page anchors and exported anchors agree.
//!
//! **No storage or HTTP concerns**: persistence lives in `guidebook-core`, transport in
//! `api-rest`.

pub mod block;
pub mod export;
mod html;
pub mod inline;
pub mod normalise;
pub mod toc;
pub mod view;

pub use block::{
    Block, CalloutData, CalloutSeverity, CodeData, Document, HeaderData, HeadingLevel, ImageData,
    ImageFile, ListData, ListStyle, ParagraphData, DEFAULT_FORMAT_VERSION,
};
pub use export::{export_filename, render_export, ExportGuide, ExportOptions, ExportTag};
pub use normalise::{normalise, normalise_at};
pub use toc::{anchor_id, derive_toc, filter_toc, TocEntry, TocStats};
pub use view::{render_view, PageView, ViewBlock};
