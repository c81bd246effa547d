//! Newsletter catalog loaded once at startup.
//!
//! The catalog is a JSON array of `{title, description}` objects. Loading
//! never fails: a missing or unreadable file yields an empty catalog, and
//! malformed records are skipped with a warning.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single recommendable newsletter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub title: String,
    pub description: String,
}

impl CatalogItem {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Ordered, immutable set of catalog items.
///
/// Item identity is its position. Cloning is cheap, items are shared.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Arc<[CatalogItem]>,
    version: String,
}

impl Catalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        let version = catalog_version(&items);
        Self {
            items: items.into(),
            version,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn get(&self, idx: usize) -> Option<&CatalogItem> {
        self.items.get(idx)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Content hash of the catalog, hex encoded.
    /// Two catalogs with the same items in the same order share a version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Descriptions in catalog order, the text that gets embedded.
    pub fn descriptions(&self) -> Vec<String> {
        self.items().iter().map(|i| i.description.clone()).collect()
    }
}

/// SHA256 over every title and description, length-prefixed so that
/// field boundaries can't collide.
fn catalog_version(items: &[CatalogItem]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((items.len() as u64).to_le_bytes());
    for item in items {
        for field in [&item.title, &item.description] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

/// Raw record as it appears in the file. Every field is optional so that
/// a single bad record doesn't reject the whole file.
#[derive(Debug, Deserialize)]
struct RawRecord {
    title: Option<serde_json::Value>,
    description: Option<serde_json::Value>,
}

/// Why a catalog record was skipped.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecordRejection {
    #[error("record is not an object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` is not a string")]
    NotAString(&'static str),

    #[error("field `{0}` is empty")]
    EmptyField(&'static str),
}

fn string_field(
    value: Option<serde_json::Value>,
    name: &'static str,
) -> Result<String, RecordRejection> {
    match value {
        None | Some(serde_json::Value::Null) => Err(RecordRejection::MissingField(name)),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => {
            Err(RecordRejection::EmptyField(name))
        }
        Some(serde_json::Value::String(s)) => Ok(s),
        Some(_) => Err(RecordRejection::NotAString(name)),
    }
}

/// Validate a single catalog record.
pub fn validate_record(value: serde_json::Value) -> Result<CatalogItem, RecordRejection> {
    if !value.is_object() {
        return Err(RecordRejection::NotAnObject);
    }
    let raw: RawRecord =
        serde_json::from_value(value).map_err(|_| RecordRejection::NotAnObject)?;

    Ok(CatalogItem {
        title: string_field(raw.title, "title")?,
        description: string_field(raw.description, "description")?,
    })
}

/// Parse catalog JSON, keeping valid records in order.
pub fn parse_catalog(source: &str) -> Catalog {
    let values: Vec<serde_json::Value> = match serde_json::from_str(source) {
        Ok(serde_json::Value::Array(values)) => values,
        Ok(_) => {
            log::warn!("catalog is not a JSON array, serving an empty catalog");
            return Catalog::empty();
        }
        Err(err) => {
            log::warn!("catalog is not valid JSON ({err}), serving an empty catalog");
            return Catalog::empty();
        }
    };

    let total = values.len();
    let items: Vec<CatalogItem> = values
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match validate_record(value) {
            Ok(item) => Some(item),
            Err(reason) => {
                log::warn!("skipping catalog record #{idx}: {reason}");
                None
            }
        })
        .collect();

    if items.len() != total {
        log::warn!("{} of {total} catalog records skipped", total - items.len());
    }

    Catalog::new(items)
}

/// Loads the catalog from a JSON file.
pub struct JsonCatalogStore {
    path: PathBuf,
}

impl JsonCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read and validate the catalog.
    ///
    /// Missing or unreadable files degrade to an empty catalog.
    pub fn load(&self) -> Catalog {
        let source = match std::fs::read_to_string(&self.path) {
            Ok(source) => source,
            Err(err) => {
                log::warn!(
                    "could not read catalog {}: {err}; serving an empty catalog",
                    self.path.display()
                );
                return Catalog::empty();
            }
        };

        let catalog = parse_catalog(&source);
        log::info!(
            "loaded {} catalog items from {} (version {})",
            catalog.len(),
            self.path.display(),
            &catalog.version()[..12]
        );
        catalog
    }
}
