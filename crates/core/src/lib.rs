//! # Guidebook Core
//!
//! Core business logic for the Guidebook guide store.
//!
//! This crate contains pure data operations and file/folder management:
//! - Guide and tag CRUD with sharded JSON storage under the data directory
//! - Guide search and tag filtering
//! - Tag association and cascade on tag deletion
//! - Startup configuration resolution
//!
//! Content normalisation, TOC derivation and HTML rendering live in `guidebook-content`; this
//! crate only stores editor documents opaquely and hands them over.
//!
//! **No API concerns**: HTTP servers and wire types belong in `api-rest` and `api-shared`.

pub mod config;
pub mod constants;
pub mod error;
pub mod id;
pub mod repositories;
pub mod slug;

pub use config::{
    data_dir_from_env_value, export_highlight_from_env_value, max_upload_bytes_from_env_value,
    rest_addr_from_env_value, CoreConfig,
};
pub use constants::{DEFAULT_DATA_DIR, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_REST_ADDR};
pub use error::{GuideError, GuideResult};
pub use id::RecordId;
pub use repositories::guides::{GuideFilter, GuidePatch, GuideService, GuideWithTags, NewGuide};
pub use repositories::tags::{NewTag, Tag, TagPatch, TagService};
pub use repositories::Store;
pub use slug::derive_slug;
