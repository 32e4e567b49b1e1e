//! Shared repository utilities.
//!
//! Record files live in sharded directories (`<base>/<s1>/<s2>/<id>/<file>.json`). This module
//! holds the read, atomic write, scan and removal primitives the guide and tag repositories use.

use crate::id::RecordId;
use crate::{GuideError, GuideResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Parses an identifier taken from a request path. A malformed id cannot name a record, so it is
/// reported as not found.
pub(crate) fn lookup_id(kind: &str, id: &str) -> GuideResult<RecordId> {
    RecordId::parse(id).map_err(|_| GuideError::NotFound(format!("{kind} {id}")))
}

/// Reads and parses a record file.
///
/// # Returns
///
/// `Ok(None)` when the file does not exist.
///
/// # Errors
///
/// Returns `GuideError::FileRead` for I/O failures other than a missing file and
/// `GuideError::Deserialization` if the contents are not a valid record.
pub(crate) fn read_record<T: DeserializeOwned>(path: &Path) -> GuideResult<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(GuideError::FileRead(e)),
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(GuideError::Deserialization)
}

/// Writes a record file atomically.
///
/// The record is serialised to a sibling `.tmp` file which is then renamed over `path`, so a
/// concurrent reader sees either the old or the new record, never a partial one. Parent
/// directories are created as needed.
///
/// # Errors
///
/// Returns `GuideError` if:
/// - serialisation fails,
/// - the record directory cannot be created,
/// - writing or renaming the file fails.
pub(crate) fn write_record<T: Serialize>(path: &Path, record: &T) -> GuideResult<()> {
    let json = serde_json::to_string_pretty(record).map_err(GuideError::Serialization)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(GuideError::StorageDirCreation)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, json).map_err(GuideError::FileWrite)?;
    fs::rename(&tmp, path).map_err(GuideError::FileWrite)
}

/// Removes a record directory and everything in it.
///
/// # Errors
///
/// Returns `GuideError::FileRemove` if removal fails for a reason other than the directory
/// already being gone.
pub(crate) fn remove_record_dir(dir: &Path) -> GuideResult<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(GuideError::FileRemove(e)),
    }
}

/// Loads every record named `filename` under the sharded `base_dir`.
///
/// Unreadable directories are skipped. Files that cannot be parsed are logged as warnings and
/// skipped, so one corrupt record never hides the rest.
///
/// # Returns
///
/// `(record_file_path, record)` pairs in no particular order. A missing `base_dir` yields an
/// empty list.
pub(crate) fn scan_records<T: DeserializeOwned>(
    base_dir: &Path,
    filename: &str,
) -> Vec<(PathBuf, T)> {
    let mut records = Vec::new();

    let s1_iter = match fs::read_dir(base_dir) {
        Ok(it) => it,
        Err(_) => return records,
    };
    for s1 in s1_iter.flatten() {
        let s1_path = s1.path();
        if !s1_path.is_dir() {
            continue;
        }

        let s2_iter = match fs::read_dir(&s1_path) {
            Ok(it) => it,
            Err(_) => continue,
        };

        for s2 in s2_iter.flatten() {
            let s2_path = s2.path();
            if !s2_path.is_dir() {
                continue;
            }

            let id_iter = match fs::read_dir(&s2_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for id_ent in id_iter.flatten() {
                let record_path = id_ent.path().join(filename);
                if !record_path.is_file() {
                    continue;
                }

                match read_record::<T>(&record_path) {
                    Ok(Some(record)) => records.push((record_path, record)),
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(
                            "failed to load {}: {} - {}",
                            filename,
                            record_path.display(),
                            e
                        );
                    }
                }
            }
        }
    }

    records
}

/// Removes repeated ids, keeping the first occurrence of each.
pub(crate) fn dedupe_ids(ids: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
    }

    #[test]
    fn test_write_then_read_record() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = RecordId::new()
            .sharded_dir(temp_dir.path())
            .join("sample.json");

        write_record(&path, &Sample { name: "a".into() }).expect("write should succeed");

        assert_eq!(
            read_record::<Sample>(&path).unwrap(),
            Some(Sample { name: "a".into() })
        );
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_read_missing_record_is_none() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let missing = temp_dir.path().join("nope.json");
        assert_eq!(read_record::<Sample>(&missing).unwrap(), None);
    }

    #[test]
    fn test_scan_skips_invalid_records() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path();

        let good = RecordId::new().sharded_dir(base).join("sample.json");
        write_record(&good, &Sample { name: "ok".into() }).unwrap();

        let bad_dir = RecordId::new().sharded_dir(base);
        fs::create_dir_all(&bad_dir).unwrap();
        fs::write(bad_dir.join("sample.json"), "{ not json").unwrap();

        let records = scan_records::<Sample>(base, "sample.json");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, good);
        assert_eq!(records[0].1.name, "ok");
    }

    #[test]
    fn test_scan_missing_base_is_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let records = scan_records::<Sample>(&temp_dir.path().join("absent"), "sample.json");
        assert!(records.is_empty());
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let ids = vec!["b".to_string(), "a".into(), "b".into(), "c".into(), "a".into()];
        assert_eq!(dedupe_ids(ids), vec!["b", "a", "c"]);
    }
}
