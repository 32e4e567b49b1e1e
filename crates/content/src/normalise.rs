//! Repair of persisted or externally supplied content into a canonical [`Document`].
//!
//! Content reaches the store from older editor versions and from direct API writes that bypass
//! client-side validation. Every read path funnels through [`normalise`], after which the
//! renderers may assume well-formed blocks.
//!
//! Legacy field aliases are resolved by the fallback chains below, in precedence order:
//!
//! | Field | Chain |
//! |---|---|
//! | header / paragraph / callout text | `data.text`, `data.content` |
//! | code | `data.code`, `data.text`, empty |
//! | list item | string, `content`, `text`, compact JSON |
//! | image url | `data.file.url`, `data.url` |
//!
//! Heading levels are truncated and clamped to `1..=6`, so a stored level of `0` becomes `1`.
//! Missing or non-numeric levels fall back to `2`.
//!
//! Normalising is total and idempotent on the serialised form.

use chrono::Utc;
use serde_json::{Map, Value};

use crate::block::{
    Block, CalloutData, CalloutSeverity, CodeData, Document, HeaderData, HeadingLevel, ImageData,
    ImageFile, ListData, ListStyle, ParagraphData, DEFAULT_FORMAT_VERSION,
};
use crate::inline::sanitise;

const TEXT_CHAIN: &[&str] = &["text", "content"];
const CODE_CHAIN: &[&str] = &["code", "text"];
const LIST_ITEM_CHAIN: &[&str] = &["content", "text"];

/// Normalises raw document JSON, stamping documents without a valid `time` with the current time.
///
/// # Arguments
///
/// * `raw` - Anything: a persisted document, a legacy payload, `null`.
///
/// # Returns
///
/// A canonical `Document`. Absent or block-less input yields an empty document.
pub fn normalise(raw: &Value) -> Document {
    normalise_at(raw, Utc::now().timestamp_millis())
}

/// Deterministic form of [`normalise`]: `now_ms` is used wherever a timestamp must be supplied.
pub fn normalise_at(raw: &Value, now_ms: i64) -> Document {
    let Some(entries) = raw.get("blocks").and_then(Value::as_array) else {
        return Document::empty_at(now_ms);
    };

    let time = raw.get("time").and_then(as_timestamp).unwrap_or(now_ms);
    let version = raw
        .get("version")
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_FORMAT_VERSION)
        .to_owned();

    let blocks = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let block = normalise_block(entry);
            if block.is_none() {
                tracing::debug!(index, "dropping empty block during normalisation");
            }
            block
        })
        .collect();

    Document {
        time,
        version,
        blocks,
    }
}

// ============================================================================
// BLOCKS
// ============================================================================

/// Normalises a single block entry. `None` means the block is dropped.
fn normalise_block(entry: &Value) -> Option<Block> {
    let Some(object) = entry.as_object() else {
        return Some(Block::Unknown {
            type_name: String::new(),
            raw: entry.clone(),
        });
    };

    let type_name = object.get("type").and_then(Value::as_str).unwrap_or("");
    let id = object.get("id").and_then(Value::as_str).map(str::to_owned);
    let empty = Map::new();
    let data = object
        .get("data")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let block = match type_name {
        "header" => {
            let text = inline_text(data)?;
            Block::Header {
                id,
                data: HeaderData {
                    text,
                    level: heading_level(data.get("level")),
                },
            }
        }
        "paragraph" => Block::Paragraph {
            id,
            data: ParagraphData {
                text: inline_text(data)?,
            },
        },
        "code" => Block::Code {
            id,
            data: CodeData {
                code: first_text(data, CODE_CHAIN).unwrap_or_default(),
                language: data.get("language").and_then(scalar_text).filter(|l| !l.is_empty()),
            },
        },
        "list" => Block::List {
            id,
            data: list_data(data)?,
        },
        "image" => Block::Image {
            id,
            data: image_data(data),
        },
        "callout" => Block::Callout {
            id,
            data: CalloutData {
                text: inline_text(data).unwrap_or_default(),
                severity: data
                    .get("type")
                    .and_then(Value::as_str)
                    .map(CalloutSeverity::from_type_name)
                    .unwrap_or_default(),
            },
        },
        other => Block::Unknown {
            type_name: other.to_owned(),
            raw: entry.clone(),
        },
    };

    Some(block)
}

/// Text of a header, paragraph or callout, sanitised. `None` when empty.
fn inline_text(data: &Map<String, Value>) -> Option<String> {
    first_text(data, TEXT_CHAIN)
        .map(|text| sanitise(&text))
        .filter(|text| !text.is_empty())
}

fn heading_level(value: Option<&Value>) -> HeadingLevel {
    let level = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64),
        _ => None,
    };

    level.map(HeadingLevel::clamped).unwrap_or(HeadingLevel::DEFAULT)
}

fn list_data(data: &Map<String, Value>) -> Option<ListData> {
    let items: Vec<String> = data
        .get("items")
        .and_then(Value::as_array)?
        .iter()
        .map(list_item)
        .collect();

    if items.is_empty() {
        return None;
    }

    let style = match data.get("style").and_then(Value::as_str) {
        Some("ordered") => ListStyle::Ordered,
        _ => ListStyle::Unordered,
    };

    Some(ListData { style, items })
}

fn list_item(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Object(fields) => {
            first_text(fields, LIST_ITEM_CHAIN).unwrap_or_else(|| item.to_string())
        }
        Value::Number(_) | Value::Bool(_) | Value::Null | Value::Array(_) => item.to_string(),
    }
}

fn image_data(data: &Map<String, Value>) -> ImageData {
    let file = data.get("file").and_then(Value::as_object);
    let from_file = |key: &str| {
        file.and_then(|f| f.get(key))
            .and_then(scalar_text)
            .filter(|s| !s.is_empty())
    };

    let url = from_file("url").or_else(|| {
        data.get("url")
            .and_then(scalar_text)
            .filter(|s| !s.is_empty())
    });

    ImageData {
        file: ImageFile {
            url,
            external_url: from_file("externalUrl"),
        },
        caption: data
            .get("caption")
            .and_then(scalar_text)
            .filter(|c| !c.is_empty()),
        with_border: data.get("withBorder").and_then(Value::as_bool),
        stretched: data.get("stretched").and_then(Value::as_bool),
        with_background: data.get("withBackground").and_then(Value::as_bool),
    }
}

// ============================================================================
// COERCION
// ============================================================================

/// First non-empty textual value among `keys`.
fn first_text(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| fields.get(*key).and_then(scalar_text))
        .find(|text| !text.is_empty())
}

/// Strings, numbers and booleans in textual form. Everything else counts as absent.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn as_timestamp(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}
