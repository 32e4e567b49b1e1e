//! The block model: the canonical in-memory representation of a guide's content.
//!
//! A [`Document`] is an ordered sequence of [`Block`]s plus the editor's format metadata. The
//! block set is closed; anything the model does not recognise is carried verbatim in
//! [`Block::Unknown`] so that saving and exporting never silently loses it.
//!
//! Serialisation writes the persisted editor shape:
//!
//! ```json
//! {"time": 1700000000000, "version": "2.31.0",
//!  "blocks": [{"id": "a1", "type": "header", "data": {"text": "Setup", "level": 1}}]}
//! ```
//!
//! There is deliberately no way to deserialise a `Document` other than through
//! [`crate::normalise`]: the `Deserialize` impl below delegates to it.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Editor format version written into documents that do not carry one.
pub const DEFAULT_FORMAT_VERSION: &str = "2.31.0";

// ============================================================================
// DOCUMENT
// ============================================================================

/// An ordered sequence of blocks plus format metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Creation time in milliseconds since the Unix epoch.
    pub time: i64,
    /// Editor format version tag.
    pub version: String,
    /// Blocks in reading order. The index of a block is its anchor identity.
    pub blocks: Vec<Block>,
}

impl Document {
    /// Creates an empty document stamped with `time` and the current format version.
    pub fn empty_at(time: i64) -> Self {
        Self {
            time,
            version: DEFAULT_FORMAT_VERSION.to_owned(),
            blocks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(crate::normalise::normalise(&raw))
    }
}

// ============================================================================
// BLOCK
// ============================================================================

/// One typed unit of content.
///
/// `id` is the editor's opaque block identifier, kept when present so a save round-trips it.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Header {
        id: Option<String>,
        data: HeaderData,
    },
    Paragraph {
        id: Option<String>,
        data: ParagraphData,
    },
    Code {
        id: Option<String>,
        data: CodeData,
    },
    List {
        id: Option<String>,
        data: ListData,
    },
    Image {
        id: Option<String>,
        data: ImageData,
    },
    Callout {
        id: Option<String>,
        data: CalloutData,
    },
    /// A block whose type the model does not know. `raw` is the whole block value as it was
    /// read, and is what gets written back.
    Unknown { type_name: String, raw: Value },
}

impl Block {
    /// The `type` discriminator as persisted.
    pub fn type_name(&self) -> &str {
        match self {
            Block::Header { .. } => "header",
            Block::Paragraph { .. } => "paragraph",
            Block::Code { .. } => "code",
            Block::List { .. } => "list",
            Block::Image { .. } => "image",
            Block::Callout { .. } => "callout",
            Block::Unknown { type_name, .. } => type_name,
        }
    }

    /// The editor's block id, if any.
    pub fn id(&self) -> Option<&str> {
        match self {
            Block::Header { id, .. }
            | Block::Paragraph { id, .. }
            | Block::Code { id, .. }
            | Block::List { id, .. }
            | Block::Image { id, .. }
            | Block::Callout { id, .. } => id.as_deref(),
            Block::Unknown { raw, .. } => raw.get("id").and_then(Value::as_str),
        }
    }

    /// Whether this block satisfies the invariants of its variant.
    ///
    /// Headers and paragraphs need text, lists need items, images need a displayable URL.
    /// Code and callout blocks are always well formed. Unknown blocks never are.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Block::Header { data, .. } => !data.text.is_empty(),
            Block::Paragraph { data, .. } => !data.text.is_empty(),
            Block::Code { .. } | Block::Callout { .. } => true,
            Block::List { data, .. } => !data.items.is_empty(),
            Block::Image { data, .. } => data.display_url().is_some(),
            Block::Unknown { .. } => false,
        }
    }
}

impl Serialize for Block {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if let Block::Unknown { raw, .. } = self {
            return raw.serialize(serializer);
        }

        let mut map = serializer.serialize_map(None)?;
        if let Some(id) = self.id() {
            map.serialize_entry("id", id)?;
        }
        map.serialize_entry("type", self.type_name())?;
        match self {
            Block::Header { data, .. } => map.serialize_entry("data", data)?,
            Block::Paragraph { data, .. } => map.serialize_entry("data", data)?,
            Block::Code { data, .. } => map.serialize_entry("data", data)?,
            Block::List { data, .. } => map.serialize_entry("data", data)?,
            Block::Image { data, .. } => map.serialize_entry("data", data)?,
            Block::Callout { data, .. } => map.serialize_entry("data", data)?,
            Block::Unknown { .. } => {}
        }
        map.end()
    }
}

// ============================================================================
// VARIANT DATA
// ============================================================================

/// Heading level, always within `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;
    /// Level used when the stored value is missing or not numeric.
    pub const DEFAULT: HeadingLevel = HeadingLevel(2);

    /// Clamps any integer into the valid heading range.
    pub fn clamped(level: i64) -> Self {
        Self(level.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderData {
    /// Inline HTML subset, already sanitised.
    pub text: String,
    pub level: HeadingLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParagraphData {
    /// Inline HTML subset, already sanitised.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeData {
    /// Literal source text. Never interpreted as markup.
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl CodeData {
    /// Label shown when no language was chosen.
    pub const FALLBACK_LABEL: &'static str = "code";

    pub fn label(&self) -> &str {
        self.language.as_deref().unwrap_or(Self::FALLBACK_LABEL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    Ordered,
    #[default]
    Unordered,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListData {
    pub style: ListStyle,
    /// Plain-text items.
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub file: ImageFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_border: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stretched: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_background: Option<bool>,
}

impl ImageData {
    /// The URL to display: an external URL wins over the uploaded file URL.
    pub fn display_url(&self) -> Option<&str> {
        self.file
            .external_url
            .as_deref()
            .or(self.file.url.as_deref())
    }
}

/// Severity of a callout block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CalloutSeverity {
    #[default]
    Note,
    Info,
    Warning,
}

impl CalloutSeverity {
    /// Parses the persisted `type` value. Unrecognised values fall back to `Note`.
    pub fn from_type_name(value: &str) -> Self {
        match value {
            "info" => CalloutSeverity::Info,
            "warning" => CalloutSeverity::Warning,
            _ => CalloutSeverity::Note,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CalloutSeverity::Note => "note",
            CalloutSeverity::Info => "info",
            CalloutSeverity::Warning => "warning",
        }
    }

    /// Name of the icon the page view shows for this severity.
    pub fn icon(self) -> &'static str {
        match self {
            CalloutSeverity::Note => "alert-circle",
            CalloutSeverity::Info => "info",
            CalloutSeverity::Warning => "alert-triangle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalloutData {
    /// Inline HTML subset, already sanitised.
    pub text: String,
    #[serde(rename = "type")]
    pub severity: CalloutSeverity,
}
