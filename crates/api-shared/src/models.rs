//! Wire types for the Guidebook HTTP API.
//!
//! Guide and tag payloads use snake_case field names. Table of contents entries keep the
//! camelCase shape the content renderer emits, so the same JSON can be fed straight back to an
//! editor front end.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

// ============================================================================
// GENERAL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error body returned with every 4xx/5xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ErrorRes {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
        }
    }

    pub fn with_errors(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            message: message.into(),
            errors: Some(errors),
        }
    }
}

// ============================================================================
// TAGS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TagRes {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// `#rrggbb`
    pub color: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTagReq {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateTagReq {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

// ============================================================================
// GUIDES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GuideRes {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    /// Editor document exactly as saved.
    #[schema(value_type = Object)]
    pub content: Value,
    pub tags: Vec<TagRes>,
    /// RFC 3339 timestamp.
    pub created_at: String,
    /// RFC 3339 timestamp.
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateGuideReq {
    pub title: String,
    /// Derived from the title when absent or blank.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub content: Option<Value>,
    /// Also accepted as `tagIds`.
    #[serde(default, alias = "tagIds")]
    pub tag_ids: Vec<String>,
}

/// Partial guide update. Omitted fields are unchanged.
///
/// `tag_ids` absent leaves associations alone, `[]` clears them and any other list replaces
/// them.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateGuideReq {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub content: Option<Value>,
    /// Also accepted as `tagIds`.
    #[serde(default, alias = "tagIds")]
    pub tag_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListGuidesQuery {
    /// Case-insensitive title substring.
    #[serde(default)]
    pub search: Option<String>,
    /// Tag id.
    #[serde(default)]
    pub tag: Option<String>,
}

// ============================================================================
// DOCUMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TocEntryRes {
    pub anchor_id: String,
    pub text: String,
    pub level: u8,
    pub source_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DocumentStatsRes {
    pub sections: usize,
    pub blocks: usize,
}

/// A guide's normalised document with its derived table of contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DocumentRes {
    #[schema(value_type = Object)]
    pub document: Value,
    pub toc: Vec<TocEntryRes>,
    pub stats: DocumentStatsRes,
}

// ============================================================================
// UPLOADS
// ============================================================================

/// Multipart form accepted by the image upload endpoint.
#[derive(Debug, Clone, ToSchema)]
pub struct UploadForm {
    /// Image file bytes.
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UploadedFile {
    pub url: String,
}

/// Image upload result in the shape block editors expect: `success` is `1` or `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UploadRes {
    pub success: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<UploadedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UploadRes {
    pub fn stored(url: impl Into<String>) -> Self {
        Self {
            success: 1,
            file: Some(UploadedFile { url: url.into() }),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: 0,
            file: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upload_res_shapes() {
        assert_eq!(
            serde_json::to_value(UploadRes::stored("/uploads/images/ab/abc.png")).unwrap(),
            json!({"success": 1, "file": {"url": "/uploads/images/ab/abc.png"}})
        );
        assert_eq!(
            serde_json::to_value(UploadRes::failed("No file uploaded")).unwrap(),
            json!({"success": 0, "message": "No file uploaded"})
        );
    }

    #[test]
    fn test_error_res_omits_empty_errors() {
        assert_eq!(
            serde_json::to_value(ErrorRes::new("Guide not found")).unwrap(),
            json!({"message": "Guide not found"})
        );
    }

    #[test]
    fn test_update_guide_req_distinguishes_absent_and_empty_tags() {
        let absent: UpdateGuideReq = serde_json::from_value(json!({"title": "T"})).unwrap();
        let empty: UpdateGuideReq = serde_json::from_value(json!({"tag_ids": []})).unwrap();

        assert_eq!(absent.tag_ids, None);
        assert_eq!(empty.tag_ids, Some(vec![]));
    }

    #[test]
    fn test_guide_requests_accept_camel_case_tag_ids() {
        let create: CreateGuideReq =
            serde_json::from_value(json!({"title": "G", "tagIds": ["a", "b"]})).unwrap();
        let update: UpdateGuideReq = serde_json::from_value(json!({"tagIds": []})).unwrap();

        assert_eq!(create.tag_ids, vec!["a", "b"]);
        assert_eq!(update.tag_ids, Some(vec![]));
    }
}
