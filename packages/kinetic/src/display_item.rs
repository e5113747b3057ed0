//! Display items and the data-provider boundary.
//!
//! Records arrive from the backend as loosely shaped JSON documents (city hubs,
//! mentors, partners, technologies all use slightly different field names).
//! This module turns them into strict [`DisplayItem`]s and drops anything that
//! lacks an identity or a label, so the engine never sees undefined fields.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

/// A single card in a carousel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayItem {
    /// Stable identity (document id or slug).
    pub id: String,
    /// Ordinal position in the dataset after filtering.
    pub index: usize,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl DisplayItem {
    pub fn new(id: impl Into<String>, index: usize, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            index,
            label: label.into(),
            image: None,
            text: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

const ID_KEYS: &[&str] = &["_id", "id", "slug"];
const LABEL_KEYS: &[&str] = &["label", "name", "title"];
const IMAGE_KEYS: &[&str] = &["image", "imageUrl", "logo", "photo"];
const TEXT_KEYS: &[&str] = &["text", "description", "role", "subtitle"];

/// Read the first non-empty string among `keys`.
///
/// Numbers are accepted and stringified; Mongo-style `{ "$oid": "..." }`
/// wrappers are unwrapped.
fn first_string(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match record.get(*key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => match map.get("$oid") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        },
        _ => None,
    })
}

/// Convert one loose record. Returns `None` when identity or label is missing.
pub fn parse_item(record: &Value, index: usize) -> Option<DisplayItem> {
    let id = first_string(record, ID_KEYS)?;
    let label = first_string(record, LABEL_KEYS)?;
    Some(DisplayItem {
        id,
        index,
        label,
        image: first_string(record, IMAGE_KEYS),
        text: first_string(record, TEXT_KEYS),
    })
}

/// Convert a list of loose records, filtering malformed entries.
///
/// Ordinals are assigned after filtering so they stay dense.
pub fn parse_items(records: &[Value]) -> Vec<DisplayItem> {
    let mut items = Vec::with_capacity(records.len());
    for (position, record) in records.iter().enumerate() {
        match parse_item(record, items.len()) {
            Some(item) => items.push(item),
            None => log::warn!(
                "Dropping malformed display item at position {} (needs an id and a label)",
                position
            ),
        }
    }
    items
}

/// Source of raw carousel records.
pub trait DataProvider {
    /// Fetch the raw records. Failures are reported, never retried here.
    fn fetch(&self) -> Result<Vec<Value>>;
}

/// Fetch from `provider` and parse. Never fails: a failed fetch degrades to an
/// empty dataset, which the engine renders as nothing.
pub fn load_items(provider: &dyn DataProvider) -> Vec<DisplayItem> {
    match provider.fetch() {
        Ok(records) => {
            let items = parse_items(&records);
            log::info!(
                "Loaded {} display items ({} records fetched)",
                items.len(),
                records.len()
            );
            items
        }
        Err(e) => {
            log::warn!("Display item fetch failed, rendering empty carousel: {:#}", e);
            Vec::new()
        }
    }
}

/// Provider over records already in memory.
#[derive(Clone, Debug, Default)]
pub struct StaticProvider {
    records: Vec<Value>,
}

impl StaticProvider {
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }

    /// Parse a JSON array (or `{ "data": [...] }` envelope) into a provider.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).context("display items are not valid JSON")?;
        Ok(Self::new(records_from_value(value)?))
    }
}

impl DataProvider for StaticProvider {
    fn fetch(&self) -> Result<Vec<Value>> {
        Ok(self.records.clone())
    }
}

/// Provider reading a JSON file on every fetch.
#[derive(Clone, Debug)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataProvider for JsonFileProvider {
    fn fetch(&self) -> Result<Vec<Value>> {
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let value: Value = serde_json::from_str(&contents)
            .with_context(|| format!("{} is not valid JSON", self.path.display()))?;
        records_from_value(value)
    }
}

/// Accept either a bare array or the backend's `{ "data": [...] }` envelope.
fn records_from_value(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(records)) => Ok(records),
            _ => anyhow::bail!("expected a JSON array or an object with a \"data\" array"),
        },
        _ => anyhow::bail!("expected a JSON array or an object with a \"data\" array"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FailingProvider;

    impl DataProvider for FailingProvider {
        fn fetch(&self) -> Result<Vec<Value>> {
            anyhow::bail!("backend unavailable")
        }
    }

    #[test]
    fn test_parse_item_field_aliases() {
        let record = json!({
            "_id": { "$oid": "65f0c2" },
            "name": "  Lagos Hub ",
            "imageUrl": "/hubs/lagos.jpg",
            "description": "Weekend cohort"
        });
        let item = parse_item(&record, 4).unwrap();
        assert_eq!(item.id, "65f0c2");
        assert_eq!(item.index, 4);
        assert_eq!(item.label, "Lagos Hub");
        assert_eq!(item.image.as_deref(), Some("/hubs/lagos.jpg"));
        assert_eq!(item.text.as_deref(), Some("Weekend cohort"));
    }

    #[test]
    fn test_parse_items_filters_and_reindexes() {
        let records = vec![
            json!({ "id": "a", "title": "Rust" }),
            json!({ "title": "no identity" }),
            json!({ "id": "c", "label": "" }),
            json!({ "slug": "d", "name": "Go", "logo": 42 }),
        ];
        let items = parse_items(&records);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "a");
        assert_eq!(items[1].id, "d");
        assert_eq!(items[1].index, 1);
        assert_eq!(items[1].image.as_deref(), Some("42"));
    }

    #[test]
    fn test_failed_fetch_degrades_to_empty() {
        assert!(load_items(&FailingProvider).is_empty());
    }

    #[test]
    fn test_static_provider_envelope() {
        let provider =
            StaticProvider::from_json_str(r#"{ "data": [ { "id": 1, "name": "Abuja" } ] }"#).unwrap();
        let items = load_items(&provider);
        assert_eq!(items, vec![DisplayItem::new("1", 0, "Abuja")]);
    }

    #[test]
    fn test_static_provider_rejects_scalar() {
        assert!(StaticProvider::from_json_str("3").is_err());
    }
}
