// src/services/normalize.rs

//! Upstream response normalization.
//!
//! Payloads are decoded into a typed intermediate form before mapping.
//! Collection items are decoded one by one from raw JSON values, so a bad
//! item is dropped without affecting its neighbours.

use std::collections::HashSet;

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{Book, SearchMode, SearchRequest, UNKNOWN_AUTHOR};

/// A normalized book still awaiting cover resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub book: Book,
    /// Upstream volume ID, used to derive cover URLs
    pub volume_id: String,
    /// Upstream declared a thumbnail for this volume
    pub has_image: bool,
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(default, rename = "totalItems", deserialize_with = "lenient")]
    total_items: Option<u64>,
    #[serde(default)]
    items: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    id: String,
    #[serde(rename = "volumeInfo")]
    volume_info: RawVolumeInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVolumeInfo {
    title: String,
    #[serde(default, deserialize_with = "lenient_authors")]
    authors: Option<Vec<Option<String>>>,
    #[serde(default, deserialize_with = "lenient")]
    published_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    image_links: Option<RawImageLinks>,
    #[serde(default, deserialize_with = "lenient")]
    industry_identifiers: Option<Vec<RawIdentifier>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawImageLinks {
    #[serde(default, deserialize_with = "lenient")]
    thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

/// Decode an ancillary field, treating a wrong type as absent.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Decode `authors` without ever rejecting the volume.
///
/// A non-array is absent. Entries that are not strings are `None`, which the
/// author policy turns into the placeholder.
fn lenient_authors<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<Option<String>>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(entries) => Some(
            entries
                .into_iter()
                .map(|entry| match entry {
                    Value::String(name) => Some(name),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

/// Normalize a raw payload for the given request.
pub fn normalize(bytes: &[u8], request: &SearchRequest, target: &str) -> Result<Vec<Draft>> {
    match request.mode {
        SearchMode::ById => normalize_single(bytes, &request.term, target, request.detailed),
        mode => normalize_collection(bytes, mode, &request.term, target, request.detailed),
    }
}

/// Normalize a single-volume payload. The book ID is the requested ID.
pub fn normalize_single(
    bytes: &[u8],
    id: &str,
    target: &str,
    detailed: bool,
) -> Result<Vec<Draft>> {
    let mut payload = parse_object(bytes, target)?;
    let info = payload
        .remove("volumeInfo")
        .ok_or_else(|| AppError::malformed(target, "missing volumeInfo"))?;
    let info: RawVolumeInfo = serde_json::from_value(info)
        .map_err(|e| AppError::malformed(target, format!("invalid volumeInfo: {e}")))?;

    let volume_id = id.trim().to_string();
    let draft = map_volume(volume_id.clone(), volume_id, info, detailed)
        .ok_or_else(|| AppError::malformed(target, "volume has an empty title"))?;
    Ok(vec![draft])
}

/// Normalize a paged collection payload.
pub fn normalize_collection(
    bytes: &[u8],
    mode: SearchMode,
    term: &str,
    target: &str,
    detailed: bool,
) -> Result<Vec<Draft>> {
    let payload = parse_object(bytes, target)?;
    let raw: RawCollection = serde_json::from_value(Value::Object(payload))
        .map_err(|e| AppError::malformed(target, format!("invalid collection: {e}")))?;

    let items = raw.items.unwrap_or_default();
    if items.is_empty() {
        return match raw.total_items {
            // Upstream knows of matches, this page is just past the end.
            Some(total) if total > 0 => Ok(Vec::new()),
            _ => Err(AppError::no_results(term)),
        };
    }

    let item_count = items.len();
    let mut skipped = 0usize;
    let mut seen = HashSet::new();
    let mut drafts = Vec::with_capacity(item_count);

    for (index, item) in items.into_iter().enumerate() {
        let raw_item: RawItem = match serde_json::from_value(item) {
            Ok(raw_item) => raw_item,
            Err(e) => {
                skipped += 1;
                log::debug!("Skipping malformed item {} from {}: {}", index, target, e);
                continue;
            }
        };

        let identifier = match mode {
            SearchMode::ByIsbn => {
                isbn_13(&raw_item.volume_info).unwrap_or_else(|| raw_item.id.clone())
            }
            _ => raw_item.id.clone(),
        };
        if seen.contains(&identifier) {
            log::debug!("Skipping duplicate item {} from {}", identifier, target);
            continue;
        }

        match map_volume(identifier.clone(), raw_item.id, raw_item.volume_info, detailed) {
            Some(draft) => {
                seen.insert(identifier);
                drafts.push(draft);
            }
            None => {
                skipped += 1;
                log::debug!("Skipping item {} with empty title from {}", index, target);
            }
        }
    }

    if skipped == item_count {
        return Err(AppError::malformed(
            target,
            format!("all {item_count} items were malformed"),
        ));
    }
    if skipped > 0 {
        log::warn!("Dropped {} of {} items from {}", skipped, item_count, target);
    }
    Ok(drafts)
}

fn parse_object(bytes: &[u8], target: &str) -> Result<serde_json::Map<String, Value>> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(AppError::malformed(
            target,
            format!("expected a JSON object, got {}", json_kind(&other)),
        )),
        Err(e) => Err(AppError::malformed(target, e)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn isbn_13(info: &RawVolumeInfo) -> Option<String> {
    info.industry_identifiers
        .as_ref()?
        .iter()
        .find(|i| i.kind == "ISBN_13" && !i.identifier.trim().is_empty())
        .map(|i| i.identifier.trim().to_string())
}

/// Map a decoded volume to a draft. `None` if the title is blank.
fn map_volume(
    identifier: String,
    volume_id: String,
    info: RawVolumeInfo,
    detailed: bool,
) -> Option<Draft> {
    let title = info.title.trim();
    if title.is_empty() {
        return None;
    }

    let has_image = info
        .image_links
        .as_ref()
        .and_then(|links| links.thumbnail.as_deref())
        .is_some();

    Some(Draft {
        book: Book {
            id: identifier,
            title: title.to_string(),
            authors: map_authors(info.authors),
            published_date: info.published_date,
            cover: None,
            description: if detailed { info.description } else { None },
        },
        volume_id,
        has_image,
    })
}

/// Missing, empty and non-string authors all become the placeholder.
fn map_authors(authors: Option<Vec<Option<String>>>) -> Vec<String> {
    let authors: Vec<String> = authors
        .unwrap_or_default()
        .into_iter()
        .map(|a| a.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()))
        .collect();
    if authors.is_empty() {
        vec![UNKNOWN_AUTHOR.to_string()]
    } else {
        authors
    }
}
