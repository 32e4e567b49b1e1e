//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.
//!
//! The `*_from_env_value` helpers take the raw `Option<String>` a binary read from the
//! environment, so they can be tested without touching process state.

use crate::constants::{
    DEFAULT_DATA_DIR, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_REST_ADDR, GUIDES_DIR_NAME, TAGS_DIR_NAME,
    UPLOADS_DIR_NAME,
};
use crate::{GuideError, GuideResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    max_upload_bytes: u64,
    export_highlight: bool,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`GuideError::InvalidInput`] if `max_upload_bytes` is zero.
    pub fn new(
        data_dir: PathBuf,
        max_upload_bytes: u64,
        export_highlight: bool,
    ) -> GuideResult<Self> {
        if max_upload_bytes == 0 {
            return Err(GuideError::InvalidInput(
                "max_upload_bytes must be greater than zero".into(),
            ));
        }

        Ok(Self {
            data_dir,
            max_upload_bytes,
            export_highlight,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn guides_dir(&self) -> PathBuf {
        self.data_dir.join(GUIDES_DIR_NAME)
    }

    pub fn tags_dir(&self) -> PathBuf {
        self.data_dir.join(TAGS_DIR_NAME)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join(UPLOADS_DIR_NAME)
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    pub fn export_highlight(&self) -> bool {
        self.export_highlight
    }

    /// Creates the data directory and its record subdirectories if they are missing.
    ///
    /// # Errors
    ///
    /// Returns [`GuideError::StorageDirCreation`] if a directory cannot be created.
    pub fn ensure_dirs(&self) -> GuideResult<()> {
        for dir in [self.guides_dir(), self.tags_dir(), self.uploads_dir()] {
            fs::create_dir_all(&dir).map_err(GuideError::StorageDirCreation)?;
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the data directory. `None` or blank yields [`DEFAULT_DATA_DIR`].
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    PathBuf::from(non_blank(value).unwrap_or_else(|| DEFAULT_DATA_DIR.into()))
}

/// Resolve the REST listen address. `None` or blank yields [`DEFAULT_REST_ADDR`].
pub fn rest_addr_from_env_value(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| DEFAULT_REST_ADDR.into())
}

/// Parse the upload size cap in bytes.
///
/// # Errors
///
/// Returns [`GuideError::InvalidInput`] if the value is not a positive integer.
pub fn max_upload_bytes_from_env_value(value: Option<String>) -> GuideResult<u64> {
    match non_blank(value) {
        None => Ok(DEFAULT_MAX_UPLOAD_BYTES),
        Some(v) => v
            .parse::<u64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                GuideError::InvalidInput(format!(
                    "GUIDEBOOK_MAX_UPLOAD_BYTES must be a positive integer, got: '{v}'"
                ))
            }),
    }
}

/// Parse the export highlighting switch. Defaults to `true`.
///
/// # Errors
///
/// Returns [`GuideError::InvalidInput`] for values other than true/false/1/0/yes/no/on/off.
pub fn export_highlight_from_env_value(value: Option<String>) -> GuideResult<bool> {
    match non_blank(value).map(|v| v.to_ascii_lowercase()) {
        None => Ok(true),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(GuideError::InvalidInput(format!(
                "GUIDEBOOK_EXPORT_HIGHLIGHT must be a boolean, got: '{v}'"
            ))),
        },
    }
}
