//! Guidebook Image Storage
//!
//! This crate stores images uploaded from the guide editor so that image blocks can reference
//! them by a durable URL.
//!
//! ## Design Principles
//!
//! - Image bytes live outside guide records; blocks only hold a URL
//! - Storage is content-addressed by SHA-256, so identical uploads are stored once
//! - Stored files are immutable once written
//! - The media type is sniffed from the bytes, never trusted from the client
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/uploads/
//! └── images/
//!     └── ab/                 # first two hex characters of the hash
//!         └── ab3f9e….png     # full hash plus sniffed extension
//! ```
//!
//! The `uploads/` directory is served verbatim under the `/uploads` URL prefix.
//!
//! ## Example Usage
//!
//! ```no_run
//! use guidebook_files::ImageStore;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ImageStore::new(Path::new("guide_data/uploads"), 5 * 1024 * 1024)?;
//! let stored = store.store(&std::fs::read("diagram.png")?)?;
//! println!("{}", stored.url);
//! # Ok(())
//! # }
//! ```

mod constants;
mod images;

pub use constants::{IMAGES_FOLDER_NAME, UPLOADS_FOLDER_NAME, UPLOADS_URL_PREFIX};
pub use images::{ImageStore, StoredImage};

/// Errors that can occur during image storage
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Uploads root exists but is not a directory, or cannot be resolved
    #[error("Invalid uploads directory: {0}")]
    InvalidRootDirectory(String),

    /// Upload carried no bytes
    #[error("Uploaded file is empty")]
    Empty,

    /// Upload exceeds the configured size cap
    #[error("Uploaded file is {size} bytes, larger than the {max} byte limit")]
    TooLarge { size: u64, max: u64 },

    /// Bytes are not a recognised image format
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FilesError {
    /// Whether the error was caused by the upload itself rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FilesError::Empty | FilesError::TooLarge { .. } | FilesError::UnsupportedMediaType(_)
        )
    }
}
