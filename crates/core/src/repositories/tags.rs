//! Tag records.
//!
//! ## Storage Layout
//!
//! ```text
//! tags/
//!   <s1>/
//!     <s2>/
//!       <id>/
//!         tag.json
//! ```
//!
//! Tag names and slugs are unique. Deleting a tag also removes its id from every guide that
//! carries it.

use crate::constants::{GUIDE_JSON_FILENAME, TAG_JSON_FILENAME};
use crate::id::RecordId;
use crate::repositories::guides::GuideRecord;
use crate::repositories::shared::{
    lookup_id, read_record, remove_record_dir, scan_records, write_record,
};
use crate::repositories::Store;
use crate::slug::derive_slug;
use crate::{GuideError, GuideResult};
use guidebook_types::{HexColour, NonEmptyText};
use serde::{Deserialize, Serialize};

/// A tag as stored and returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub color: HexColour,
}

/// Fields for a new tag.
#[derive(Debug, Clone)]
pub struct NewTag {
    pub name: NonEmptyText,
    /// `None` gives the default colour.
    pub color: Option<HexColour>,
}

/// Partial tag update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct TagPatch {
    pub name: Option<NonEmptyText>,
    pub color: Option<HexColour>,
}

/// Service for tag CRUD.
#[derive(Clone, Debug)]
pub struct TagService {
    store: Store,
}

impl TagService {
    pub(crate) fn new(store: Store) -> Self {
        Self { store }
    }

    /// Lists all tags ordered by name.
    ///
    /// Tag files that cannot be parsed are logged as warnings and skipped.
    pub fn list(&self) -> Vec<Tag> {
        let mut tags: Vec<Tag> = load_all(self.store.config().tags_dir().as_path())
            .into_iter()
            .map(|(_, tag)| tag)
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        tags
    }

    /// Fetches one tag.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::NotFound` if no tag has this id.
    pub fn get(&self, id: &str) -> GuideResult<Tag> {
        let record_id = lookup_id("tag", id)?;
        read_record(&self.tag_path(&record_id))?
            .ok_or_else(|| GuideError::NotFound(format!("tag {id}")))
    }

    /// Creates a tag, deriving its slug from the name.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::Conflict` if another tag already has this name or slug, or a storage
    /// error if the record cannot be written.
    pub fn create(&self, new: NewTag) -> GuideResult<Tag> {
        let _guard = self.store.write_guard()?;

        let name = new.name.into_inner();
        let slug = derive_slug(&name);
        self.ensure_unique(&name, &slug, None)?;

        let record_id = RecordId::new();
        let tag = Tag {
            id: record_id.to_string(),
            name,
            slug,
            color: new.color.unwrap_or_default(),
        };
        write_record(&self.tag_path(&record_id), &tag)?;

        tracing::info!("created tag {} ({})", tag.id, tag.slug);
        Ok(tag)
    }

    /// Applies a partial update. A name change re-derives the slug.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::NotFound` for an unknown id and `GuideError::Conflict` if the new
    /// name or slug is taken by another tag.
    pub fn update(&self, id: &str, patch: TagPatch) -> GuideResult<Tag> {
        let _guard = self.store.write_guard()?;

        let mut tag = self.get(id)?;
        if let Some(name) = patch.name {
            let name = name.into_inner();
            let slug = derive_slug(&name);
            self.ensure_unique(&name, &slug, Some(tag.id.as_str()))?;
            tag.name = name;
            tag.slug = slug;
        }
        if let Some(color) = patch.color {
            tag.color = color;
        }

        let record_id = lookup_id("tag", id)?;
        write_record(&self.tag_path(&record_id), &tag)?;

        tracing::info!("updated tag {}", tag.id);
        Ok(tag)
    }

    /// Deletes a tag and removes it from every guide that carries it.
    ///
    /// Guides are rewritten first, so an interruption leaves at worst a tag with fewer guides,
    /// never a guide pointing at a deleted tag file that later reappears.
    ///
    /// # Errors
    ///
    /// Returns `GuideError::NotFound` for an unknown id, or a storage error if a guide or the
    /// tag directory cannot be rewritten.
    pub fn delete(&self, id: &str) -> GuideResult<()> {
        let _guard = self.store.write_guard()?;

        let record_id = lookup_id("tag", id)?;
        let tag_dir = record_id.sharded_dir(&self.store.config().tags_dir());
        if !tag_dir.join(TAG_JSON_FILENAME).is_file() {
            return Err(GuideError::NotFound(format!("tag {id}")));
        }

        let guides_dir = self.store.config().guides_dir();
        for (path, mut guide) in scan_records::<GuideRecord>(&guides_dir, GUIDE_JSON_FILENAME) {
            let before = guide.tag_ids.len();
            guide.tag_ids.retain(|tag_id| tag_id != id);
            if guide.tag_ids.len() != before {
                write_record(&path, &guide)?;
                tracing::debug!("removed tag {} from guide {}", id, guide.id);
            }
        }

        remove_record_dir(&tag_dir)?;
        tracing::info!("deleted tag {}", id);
        Ok(())
    }

    fn tag_path(&self, id: &RecordId) -> std::path::PathBuf {
        id.sharded_dir(&self.store.config().tags_dir())
            .join(TAG_JSON_FILENAME)
    }

    fn ensure_unique(&self, name: &str, slug: &str, except_id: Option<&str>) -> GuideResult<()> {
        let tags_dir = self.store.config().tags_dir();
        let clash = load_all(&tags_dir)
            .into_iter()
            .map(|(_, tag)| tag)
            .filter(|tag| Some(tag.id.as_str()) != except_id)
            .find(|tag| tag.name == name || tag.slug == slug);

        match clash {
            Some(existing) if existing.name == name => Err(GuideError::Conflict(format!(
                "a tag named '{name}' already exists"
            ))),
            Some(_) => Err(GuideError::Conflict(format!(
                "a tag with slug '{slug}' already exists"
            ))),
            None => Ok(()),
        }
    }
}

/// Loads every tag under `tags_dir`.
pub(crate) fn load_all(tags_dir: &std::path::Path) -> Vec<(std::path::PathBuf, Tag)> {
    scan_records::<Tag>(tags_dir, TAG_JSON_FILENAME)
}

/// Reads one tag by id. Malformed ids and missing files both yield `None`.
pub(crate) fn read_tag(tags_dir: &std::path::Path, id: &str) -> GuideResult<Option<Tag>> {
    match RecordId::parse(id) {
        Ok(record_id) => read_record(&record_id.sharded_dir(tags_dir).join(TAG_JSON_FILENAME)),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::repositories::guides::NewGuide;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_store(temp_dir: &TempDir) -> Store {
        let cfg = CoreConfig::new(temp_dir.path().to_path_buf(), 1024, false)
            .expect("CoreConfig::new should succeed");
        Store::new(Arc::new(cfg))
    }

    fn new_tag(name: &str) -> NewTag {
        NewTag {
            name: NonEmptyText::new(name).unwrap(),
            color: None,
        }
    }

    #[test]
    fn test_create_derives_slug_and_default_colour() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let tags = test_store(&temp_dir).tags();

        let tag = tags.create(new_tag("Boss Guides")).expect("create should succeed");

        assert_eq!(tag.slug, "boss-guides");
        assert_eq!(tag.color.as_str(), HexColour::DEFAULT);
        assert_eq!(tags.get(&tag.id).unwrap(), tag);
    }

    #[test]
    fn test_list_is_ordered_by_name() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let tags = test_store(&temp_dir).tags();

        tags.create(new_tag("Skilling")).unwrap();
        tags.create(new_tag("Bossing")).unwrap();
        tags.create(new_tag("Quests")).unwrap();

        let names: Vec<String> = tags.list().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Bossing", "Quests", "Skilling"]);
    }

    #[test]
    fn test_duplicate_name_or_slug_conflicts() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let tags = test_store(&temp_dir).tags();

        tags.create(new_tag("PvM")).unwrap();

        assert!(matches!(
            tags.create(new_tag("PvM")),
            Err(GuideError::Conflict(_))
        ));
        assert!(matches!(
            tags.create(new_tag("pvm!")),
            Err(GuideError::Conflict(_))
        ));
    }

    #[test]
    fn test_update_renames_and_recolours() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let tags = test_store(&temp_dir).tags();
        let tag = tags.create(new_tag("Old Name")).unwrap();

        let updated = tags
            .update(
                &tag.id,
                TagPatch {
                    name: Some(NonEmptyText::new("New Name").unwrap()),
                    color: Some(HexColour::parse("#FF0000").unwrap()),
                },
            )
            .expect("update should succeed");

        assert_eq!(updated.slug, "new-name");
        assert_eq!(updated.color.as_str(), "#ff0000");
        assert_eq!(tags.get(&tag.id).unwrap(), updated);
    }

    #[test]
    fn test_update_to_own_name_is_not_a_conflict() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let tags = test_store(&temp_dir).tags();
        let tag = tags.create(new_tag("Same")).unwrap();

        let patch = TagPatch {
            name: Some(NonEmptyText::new("Same").unwrap()),
            color: None,
        };
        assert!(tags.update(&tag.id, patch).is_ok());
    }

    #[test]
    fn test_get_unknown_or_malformed_id_is_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let tags = test_store(&temp_dir).tags();

        assert!(matches!(
            tags.get(&RecordId::new().to_string()),
            Err(GuideError::NotFound(_))
        ));
        assert!(matches!(tags.get("../etc"), Err(GuideError::NotFound(_))));
    }

    #[test]
    fn test_delete_cascades_to_guides() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(&temp_dir);
        let tags = store.tags();
        let guides = store.guides();

        let keep = tags.create(new_tag("Keep")).unwrap();
        let drop = tags.create(new_tag("Drop")).unwrap();
        let guide = guides
            .create(
                NewGuide {
                    title: NonEmptyText::new("Tagged").unwrap(),
                    slug: None,
                    description: None,
                    content: None,
                },
                vec![drop.id.clone(), keep.id.clone()],
            )
            .unwrap();

        tags.delete(&drop.id).expect("delete should succeed");

        let reloaded = guides.get(&guide.id).unwrap();
        let ids: Vec<&str> = reloaded.tags.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![keep.id.as_str()]);
        assert!(matches!(tags.get(&drop.id), Err(GuideError::NotFound(_))));
        assert!(matches!(tags.delete(&drop.id), Err(GuideError::NotFound(_))));
    }
}
