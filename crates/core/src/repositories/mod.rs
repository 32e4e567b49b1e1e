//! Repository management modules.
//!
//! Guides and tags are stored as JSON record files in sharded directories under the configured
//! data directory. [`Store`] is the entry point: it owns the configuration and the single
//! write lock that both repositories share, so that a tag deletion rewriting many guides and a
//! guide update rewriting one never interleave.

pub mod guides;
pub(crate) mod shared;
pub mod tags;

use crate::config::CoreConfig;
use crate::{GuideError, GuideResult};
use std::sync::{Arc, Mutex, MutexGuard};

use guides::GuideService;
use tags::TagService;

/// Handle to the file-backed guide and tag store.
///
/// Cloning is cheap; clones share the same write lock.
#[derive(Clone, Debug)]
pub struct Store {
    cfg: Arc<CoreConfig>,
    write_lock: Arc<Mutex<()>>,
}

impl Store {
    /// Creates a store over the directories named by `cfg`.
    ///
    /// # Arguments
    ///
    /// * `cfg` - Core configuration containing the data directory
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    pub fn guides(&self) -> GuideService {
        GuideService::new(self.clone())
    }

    pub fn tags(&self) -> TagService {
        TagService::new(self.clone())
    }

    /// Serialises writers. Readers never take this lock: atomic renames keep every record file
    /// whole.
    pub(crate) fn write_guard(&self) -> GuideResult<MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| GuideError::LockPoisoned)
    }
}
