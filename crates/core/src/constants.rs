//! Constants used throughout the Guidebook core crate.
//!
//! This module contains all path and filename constants to ensure
//! consistency across the codebase and make maintenance easier.

/// Default directory for guide data storage when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "guide_data";

/// Directory name for guide records.
pub const GUIDES_DIR_NAME: &str = "guides";

/// Directory name for tag records.
pub const TAGS_DIR_NAME: &str = "tags";

/// Directory name for uploaded files, served under `/uploads`.
pub const UPLOADS_DIR_NAME: &str = "uploads";

/// Filename for guide JSON files.
pub const GUIDE_JSON_FILENAME: &str = "guide.json";

/// Filename for tag JSON files.
pub const TAG_JSON_FILENAME: &str = "tag.json";

/// Default cap on a single image upload (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Default REST listen address.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Slug used when a title has no ASCII alphanumerics.
pub const FALLBACK_SLUG: &str = "untitled";
