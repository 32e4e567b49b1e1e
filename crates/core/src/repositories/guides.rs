//! Guide records.
//!
//! This module provides CRUD, search and tag association for guides.
//!
//! ## Storage Layout
//!
//! ```text
//! guides/
//!   <s1>/
//!     <s2>/
//!       <id>/
//!         guide.json    # fields, content and ordered tag ids
//! ```
//!
//! A guide's tag associations are stored inside its own record, so replacing a guide's tag set
//! is a single atomic file replacement: a concurrent reader sees the old set or the new set,
//! never a mixture.
//!
//! ## Content
//!
//! The `content` field is persisted exactly as supplied by the editor. It is normalised on the
//! way out, by [`GuideWithTags::document`], rather than on the way in, so historical data is
//! never rewritten behind the author's back.

use crate::constants::GUIDE_JSON_FILENAME;
use crate::id::RecordId;
use crate::repositories::shared::{
    dedupe_ids, lookup_id, read_record, remove_record_dir, scan_records, write_record,
};
use crate::repositories::tags::{load_all, read_tag, Tag};
use crate::repositories::Store;
use crate::slug::derive_slug;
use crate::{GuideError, GuideResult};
use chrono::{DateTime, Utc};
use guidebook_content::{
    export_filename, normalise, Document, ExportGuide, ExportTag,
};
use guidebook_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

// ============================================================================
// RECORD TYPES
// ============================================================================

/// On-disk shape of `guide.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct GuideRecord {
    pub(crate) id: String,
    title: String,
    slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    content: Value,
    #[serde(default)]
    pub(crate) tag_ids: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// A guide with its tags materialised, in stored association order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuideWithTags {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    /// Content as persisted; see [`GuideWithTags::document`].
    pub content: Value,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GuideWithTags {
    fn from_record(record: GuideRecord, tags: Vec<Tag>) -> Self {
        Self {
            id: record.id,
            title: record.title,
            slug: record.slug,
            description: record.description,
            content: record.content,
            tags,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    /// The guide's content, normalised.
    pub fn document(&self) -> Document {
        normalise(&self.content)
    }

    /// Everything the HTML export needs, with content normalised.
    pub fn export_guide(&self) -> ExportGuide {
        ExportGuide {
            id: self.id.clone(),
            title: self.title.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            tags: self
                .tags
                .iter()
                .map(|tag| ExportTag {
                    name: tag.name.clone(),
                    color: tag.color.to_string(),
                })
                .collect(),
            document: self.document(),
        }
    }

    /// Download filename for this guide's export.
    pub fn export_filename(&self) -> String {
        export_filename(&self.slug, &self.id)
    }
}

/// Fields for a new guide.
#[derive(Debug, Clone)]
pub struct NewGuide {
    pub title: NonEmptyText,
    /// Explicit slug. `None` or blank derives one from the title.
    pub slug: Option<String>,
    pub description: Option<String>,
    /// Editor document JSON. `None` stores an empty document.
    pub content: Option<Value>,
}

/// Partial guide update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct GuidePatch {
    pub title: Option<NonEmptyText>,
    /// New slug source; it is passed through slug derivation.
    pub slug: Option<String>,
    /// `Some("")` clears the description.
    pub description: Option<String>,
    pub content: Option<Value>,
}

/// Guide listing filter. Both criteria must hold when both are given.
#[derive(Debug, Clone, Default)]
pub struct GuideFilter {
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    /// Tag id the guide must carry.
    pub tag: Option<String>,
}

impl GuideFilter {
    fn matches(&self, record: &GuideRecord) -> bool {
        let search_ok = match self.search.as_deref().map(str::trim) {
            Some(search) if !search.is_empty() => record
                .title
                .to_lowercase()
                .contains(&search.to_lowercase()),
            _ => true,
        };
        let tag_ok = match self.tag.as_deref() {
            Some(tag) if !tag.is_empty() => record.tag_ids.iter().any(|id| id == tag),
            _ => true,
        };
        search_ok && tag_ok
    }
}

// ============================================================================
// GUIDE SERVICE
// ============================================================================

/// Service for guide CRUD, search and tag association.
#[derive(Clone, Debug)]
pub struct GuideService {
    store: Store,
}

impl GuideService {
    pub(crate) fn new(store: Store) -> Self {
        Self { store }
    }

    /// Fetches one guide with its tags.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::NotFound` if no guide has this id.
    pub fn get(&self, id: &str) -> GuideResult<GuideWithTags> {
        let record = self.read(id)?;
        let tags = self.resolve_tags(&record.tag_ids)?;
        Ok(GuideWithTags::from_record(record, tags))
    }

    /// Fetches one guide by slug.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::NotFound` if no guide has this slug.
    pub fn get_by_slug(&self, slug: &str) -> GuideResult<GuideWithTags> {
        let record = self
            .all_records()
            .into_iter()
            .map(|(_, record)| record)
            .find(|record| record.slug == slug)
            .ok_or_else(|| GuideError::NotFound(format!("guide with slug {slug}")))?;
        let tags = self.resolve_tags(&record.tag_ids)?;
        Ok(GuideWithTags::from_record(record, tags))
    }

    /// Lists guides matching `filter`, newest created first.
    ///
    /// Guide files that cannot be parsed are logged as warnings and skipped.
    pub fn list(&self, filter: &GuideFilter) -> Vec<GuideWithTags> {
        let tags_by_id: HashMap<String, Tag> = load_all(&self.store.config().tags_dir())
            .into_iter()
            .map(|(_, tag)| (tag.id.clone(), tag))
            .collect();

        let mut records: Vec<GuideRecord> = self
            .all_records()
            .into_iter()
            .map(|(_, record)| record)
            .filter(|record| filter.matches(record))
            .collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        records
            .into_iter()
            .map(|record| {
                let tags = record
                    .tag_ids
                    .iter()
                    .filter_map(|id| tags_by_id.get(id).cloned())
                    .collect();
                GuideWithTags::from_record(record, tags)
            })
            .collect()
    }

    /// Creates a guide with the given tags.
    ///
    /// # Arguments
    ///
    /// * `new` - Title, optional slug, description and content
    /// * `tag_ids` - Tags to associate; duplicates are collapsed
    ///
    /// # Errors
    ///
    /// Returns `GuideError` if:
    /// - a tag id does not name an existing tag (`InvalidInput`),
    /// - another guide already has the slug (`Conflict`),
    /// - the record cannot be written.
    pub fn create(&self, new: NewGuide, tag_ids: Vec<String>) -> GuideResult<GuideWithTags> {
        let _guard = self.store.write_guard()?;

        let tag_ids = self.validated_tag_ids(tag_ids)?;
        let slug = match new.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => derive_slug(slug),
            _ => derive_slug(new.title.as_str()),
        };
        self.ensure_slug_free(&slug, None)?;

        let now = Utc::now();
        let record_id = RecordId::new();
        let content = match new.content {
            Some(content) => content,
            None => serde_json::to_value(Document::empty_at(now.timestamp_millis()))
                .map_err(GuideError::Serialization)?,
        };

        let record = GuideRecord {
            id: record_id.to_string(),
            title: new.title.into_inner(),
            slug,
            description: new.description.filter(|d| !d.trim().is_empty()),
            content,
            tag_ids,
            created_at: now,
            updated_at: now,
        };
        write_record(&self.guide_path(&record_id), &record)?;
        tracing::info!("created guide {} ({})", record.id, record.slug);

        let tags = self.resolve_tags(&record.tag_ids)?;
        Ok(GuideWithTags::from_record(record, tags))
    }

    /// Applies a partial update and optionally replaces the tag set.
    ///
    /// # Arguments
    ///
    /// * `id` - Guide to update
    /// * `patch` - Fields to change
    /// * `tag_ids` - `None` leaves associations untouched, `Some(vec![])` clears them, any other
    ///   list replaces them wholesale
    ///
    /// # Errors
    ///
    /// Returns `GuideError` if:
    /// - the guide does not exist (`NotFound`),
    /// - a tag id does not name an existing tag (`InvalidInput`),
    /// - the new slug is taken by another guide (`Conflict`),
    /// - the record cannot be written.
    pub fn update(
        &self,
        id: &str,
        patch: GuidePatch,
        tag_ids: Option<Vec<String>>,
    ) -> GuideResult<GuideWithTags> {
        let _guard = self.store.write_guard()?;

        let record_id = lookup_id("guide", id)?;
        let mut record = self.read(id)?;

        if let Some(tag_ids) = tag_ids {
            record.tag_ids = self.validated_tag_ids(tag_ids)?;
        }
        if let Some(slug) = patch.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let slug = derive_slug(slug);
            self.ensure_slug_free(&slug, Some(record.id.as_str()))?;
            record.slug = slug;
        }
        if let Some(title) = patch.title {
            record.title = title.into_inner();
        }
        if let Some(description) = patch.description {
            record.description = Some(description).filter(|d| !d.trim().is_empty());
        }
        if let Some(content) = patch.content {
            record.content = content;
        }
        record.updated_at = Utc::now();

        write_record(&self.guide_path(&record_id), &record)?;
        tracing::info!("updated guide {}", record.id);

        let tags = self.resolve_tags(&record.tag_ids)?;
        Ok(GuideWithTags::from_record(record, tags))
    }

    /// Deletes a guide. Its tag associations go with it.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::NotFound` if no guide has this id, or a storage error if the
    /// directory cannot be removed.
    pub fn delete(&self, id: &str) -> GuideResult<()> {
        let _guard = self.store.write_guard()?;

        let record_id = lookup_id("guide", id)?;
        if !self.guide_path(&record_id).is_file() {
            return Err(GuideError::NotFound(format!("guide {id}")));
        }
        remove_record_dir(&record_id.sharded_dir(&self.store.config().guides_dir()))?;

        tracing::info!("deleted guide {}", id);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // helpers
    // ------------------------------------------------------------------------

    fn guide_path(&self, id: &RecordId) -> PathBuf {
        id.sharded_dir(&self.store.config().guides_dir())
            .join(GUIDE_JSON_FILENAME)
    }

    fn read(&self, id: &str) -> GuideResult<GuideRecord> {
        let record_id = lookup_id("guide", id)?;
        read_record(&self.guide_path(&record_id))?
            .ok_or_else(|| GuideError::NotFound(format!("guide {id}")))
    }

    fn all_records(&self) -> Vec<(PathBuf, GuideRecord)> {
        scan_records(&self.store.config().guides_dir(), GUIDE_JSON_FILENAME)
    }

    /// Materialises tags in association order. Ids whose tag file has gone are skipped.
    fn resolve_tags(&self, tag_ids: &[String]) -> GuideResult<Vec<Tag>> {
        let tags_dir = self.store.config().tags_dir();
        let mut tags = Vec::with_capacity(tag_ids.len());
        for id in tag_ids {
            match read_tag(&tags_dir, id)? {
                Some(tag) => tags.push(tag),
                None => tracing::warn!("guide references missing tag {}", id),
            }
        }
        Ok(tags)
    }

    fn validated_tag_ids(&self, tag_ids: Vec<String>) -> GuideResult<Vec<String>> {
        let tags_dir = self.store.config().tags_dir();
        let tag_ids = dedupe_ids(tag_ids);
        for id in &tag_ids {
            if read_tag(&tags_dir, id)?.is_none() {
                return Err(GuideError::InvalidInput(format!("unknown tag id: {id}")));
            }
        }
        Ok(tag_ids)
    }

    fn ensure_slug_free(&self, slug: &str, except_id: Option<&str>) -> GuideResult<()> {
        let taken = self
            .all_records()
            .iter()
            .any(|(_, record)| record.slug == slug && Some(record.id.as_str()) != except_id);
        if taken {
            return Err(GuideError::Conflict(format!(
                "a guide with slug '{slug}' already exists"
            )));
        }
        Ok(())
    }
}
