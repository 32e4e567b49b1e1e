//! Content-addressed image storage.
//!
//! This module provides [`ImageStore`], which accepts raw upload bytes, verifies they are an
//! image, and writes them under a path derived from their SHA-256 hash.
//!
//! # Content Addressing
//!
//! - **Deduplication**: uploading the same bytes twice returns the same URL
//! - **Immutability**: an existing file is never rewritten
//! - **Deterministic paths**: same content always produces the same URL
//!
//! Writes go to a temporary sibling file first and are renamed into place, so a reader never
//! sees a partially written image.

use crate::constants::{IMAGES_FOLDER_NAME, UPLOADS_URL_PREFIX};
use crate::FilesError;
use chrono::{DateTime, Utc};
use guidebook_types::NonEmptyText;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata for a stored image.
#[derive(Debug, Clone, serde::Serialize, PartialEq, Eq)]
pub struct StoredImage {
    /// Public URL, relative to the server root (`/uploads/images/ab/ab3f….png`)
    pub url: String,

    /// Hexadecimal SHA-256 digest of the content
    pub hash: String,

    /// Sniffed media type, always `image/*`
    pub media_type: NonEmptyText,

    /// Size of the image in bytes
    pub size_bytes: u64,

    /// UTC timestamp when the image was first stored
    pub stored_at: DateTime<Utc>,
}

/// Store for uploaded images.
///
/// Cheap to share behind an `Arc`; holds only the root path and size cap.
#[derive(Debug)]
pub struct ImageStore {
    /// Canonicalised uploads root (the directory served under `/uploads`)
    uploads_root: PathBuf,

    /// Largest accepted upload in bytes
    max_bytes: u64,
}

impl ImageStore {
    /// Creates an `ImageStore` rooted at `uploads_root`, creating the directory if missing.
    ///
    /// # Arguments
    ///
    /// * `uploads_root` - Directory served under `/uploads`
    /// * `max_bytes` - Largest accepted upload in bytes
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - The path exists but is not a directory
    /// - The directory cannot be created or canonicalised
    pub fn new(uploads_root: &Path, max_bytes: u64) -> Result<Self, FilesError> {
        if uploads_root.exists() && !uploads_root.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                uploads_root.display()
            )));
        }

        fs::create_dir_all(uploads_root)?;

        let uploads_root = uploads_root.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                uploads_root.display(),
                e
            ))
        })?;

        Ok(Self {
            uploads_root,
            max_bytes,
        })
    }

    /// Stores an uploaded image.
    ///
    /// # Arguments
    ///
    /// * `bytes` - The complete upload
    ///
    /// # Returns
    ///
    /// `StoredImage` with the public URL. When identical bytes were stored before, the existing
    /// file is reused and its modification time reported as `stored_at`.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - The upload is empty or larger than the configured cap
    /// - The bytes are not a recognised image format
    /// - Writing the file fails (I/O)
    pub fn store(&self, bytes: &[u8]) -> Result<StoredImage, FilesError> {
        if bytes.is_empty() {
            return Err(FilesError::Empty);
        }

        let size_bytes = bytes.len() as u64;
        if size_bytes > self.max_bytes {
            return Err(FilesError::TooLarge {
                size: size_bytes,
                max: self.max_bytes,
            });
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| FilesError::UnsupportedMediaType("unknown".into()))?;
        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(FilesError::UnsupportedMediaType(kind.mime_type().into()));
        }
        let media_type = NonEmptyText::new(kind.mime_type())
            .map_err(|_| FilesError::UnsupportedMediaType("unknown".into()))?;

        let hash = hex::encode(Sha256::digest(bytes));
        let relative_path = Self::relative_path(&hash, kind.extension());
        let storage_path = self.uploads_root.join(&relative_path);

        let stored_at = if storage_path.is_file() {
            tracing::debug!("image {} already stored", hash);
            fs::metadata(&storage_path)?
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now())
        } else {
            Self::write_atomically(&storage_path, bytes)?;
            tracing::info!("stored image {} ({} bytes)", relative_path, size_bytes);
            Utc::now()
        };

        Ok(StoredImage {
            url: format!("{UPLOADS_URL_PREFIX}/{relative_path}"),
            hash,
            media_type,
            size_bytes,
            stored_at,
        })
    }

    /// Returns the canonicalised uploads root.
    #[must_use]
    pub fn uploads_root(&self) -> &Path {
        &self.uploads_root
    }

    /// Returns the configured size cap in bytes.
    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Relative path of an image under the uploads root: `images/<hash[0..2]>/<hash>.<ext>`
    fn relative_path(hash_hex: &str, extension: &str) -> String {
        let shard = &hash_hex[0..2];
        format!("{IMAGES_FOLDER_NAME}/{shard}/{hash_hex}.{extension}")
    }

    fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), FilesError> {
        let parent = path.parent().ok_or_else(|| {
            FilesError::InvalidRootDirectory(format!("No parent for {}", path.display()))
        })?;
        fs::create_dir_all(parent)?;

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PNG: &[u8] = &[
        0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D',
        b'R',
    ];

    fn store(temp: &TempDir) -> ImageStore {
        ImageStore::new(&temp.path().join("uploads"), 1024).unwrap()
    }

    #[test]
    fn test_new_creates_missing_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("uploads");

        let store = ImageStore::new(&root, 10).unwrap();

        assert!(root.is_dir());
        assert_eq!(store.max_bytes(), 10);
        assert!(store.uploads_root().ends_with("uploads"));
    }

    #[test]
    fn test_new_rejects_file_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("file.txt");
        fs::write(&root, "not a directory").unwrap();

        let result = ImageStore::new(&root, 10);

        assert!(matches!(result, Err(FilesError::InvalidRootDirectory(_))));
    }

    #[test]
    fn test_store_writes_content_addressed_file() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let stored = store.store(PNG).unwrap();

        let expected_hash = hex::encode(Sha256::digest(PNG));
        assert_eq!(stored.hash, expected_hash);
        assert_eq!(stored.media_type.as_str(), "image/png");
        assert_eq!(stored.size_bytes, PNG.len() as u64);
        assert_eq!(
            stored.url,
            format!("/uploads/images/{}/{}.png", &expected_hash[0..2], expected_hash)
        );

        let on_disk = store
            .uploads_root()
            .join(stored.url.trim_start_matches("/uploads/"));
        assert_eq!(fs::read(on_disk).unwrap(), PNG);
    }

    #[test]
    fn test_store_deduplicates_identical_uploads() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let first = store.store(PNG).unwrap();
        let second = store.store(PNG).unwrap();

        assert_eq!(first.url, second.url);
        let shard_dir = store.uploads_root().join("images").join(&first.hash[0..2]);
        assert_eq!(fs::read_dir(shard_dir).unwrap().count(), 1);
    }

    #[test]
    fn test_store_rejects_empty_and_oversized() {
        let temp = TempDir::new().unwrap();
        let store = ImageStore::new(&temp.path().join("uploads"), 8).unwrap();

        assert!(matches!(store.store(&[]), Err(FilesError::Empty)));
        assert!(matches!(
            store.store(PNG),
            Err(FilesError::TooLarge { size: 16, max: 8 })
        ));
    }

    #[test]
    fn test_store_rejects_non_images() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let text = store.store(b"just some text");
        let pdf = store.store(b"%PDF-1.4\n%binary");

        assert!(matches!(text, Err(FilesError::UnsupportedMediaType(_))));
        match pdf {
            Err(e @ FilesError::UnsupportedMediaType(_)) => assert!(e.is_client_error()),
            other => panic!("expected unsupported media type, got {other:?}"),
        }
    }
}
