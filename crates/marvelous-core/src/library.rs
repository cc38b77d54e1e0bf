//! The user's saved and viewed series, and their persisted form.
//!
//! Each collection is written to its own key as
//! `{"version": 1, "items": [...]}`. A bare JSON array (the format used
//! before versioning) is still accepted when restoring.

use marvelous_api::Series;
use serde::{Deserialize, Serialize};

use crate::error::MarvelousError;
use crate::persistence::KeyValueStore;

pub const SAVED_KEY: &str = "marvel-saved-series";
pub const VIEWED_KEY: &str = "marvel-viewed-series";

/// Maximum number of saved series.
pub const SAVED_CAPACITY: usize = 10;

const BLOB_VERSION: u32 = 1;

/// Result of toggling a series in the saved set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
    /// The series was not saved and the set is full.
    Refused,
}

impl Toggle {
    pub fn succeeded(self) -> bool {
        !matches!(self, Self::Refused)
    }
}

#[derive(Serialize)]
struct BlobRef<'a> {
    version: u32,
    items: &'a [Series],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredBlob {
    Legacy(Vec<Series>),
    Versioned { version: u32, items: Vec<Series> },
}

fn encode(items: &[Series]) -> Result<String, MarvelousError> {
    Ok(serde_json::to_string(&BlobRef {
        version: BLOB_VERSION,
        items,
    })?)
}

fn decode(raw: &str) -> Result<Vec<Series>, MarvelousError> {
    match serde_json::from_str::<StoredBlob>(raw)? {
        StoredBlob::Legacy(items) => Ok(items),
        StoredBlob::Versioned { version, items } if version == BLOB_VERSION => Ok(items),
        StoredBlob::Versioned { version, .. } => Err(MarvelousError::Storage(format!(
            "unsupported blob version {version}"
        ))),
    }
}

/// Keep the first occurrence of each id.
fn dedup_by_id(items: &mut Vec<Series>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|s| seen.insert(s.id));
}

/// Saved (bounded) and viewed (unbounded) series, unique by id, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Library {
    saved: Vec<Series>,
    viewed: Vec<Series>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> &[Series] {
        &self.saved
    }

    pub fn viewed(&self) -> &[Series] {
        &self.viewed
    }

    pub fn is_saved(&self, id: u64) -> bool {
        self.saved.iter().any(|s| s.id == id)
    }

    pub fn is_viewed(&self, id: u64) -> bool {
        self.viewed.iter().any(|s| s.id == id)
    }

    /// Add `series` to the saved set, or remove it if already present.
    ///
    /// Adding is refused once the set holds [`SAVED_CAPACITY`] entries.
    pub fn toggle_saved(&mut self, series: Series) -> Toggle {
        match self.saved.iter().position(|s| s.id == series.id) {
            Some(index) => {
                self.saved.remove(index);
                Toggle::Removed
            }
            None if self.saved.len() >= SAVED_CAPACITY => Toggle::Refused,
            None => {
                self.saved.push(series);
                Toggle::Added
            }
        }
    }

    /// Append to the viewing history. Returns `false` if the id was already there.
    pub fn add_to_viewed(&mut self, series: Series) -> bool {
        if self.is_viewed(series.id) {
            return false;
        }
        self.viewed.push(series);
        true
    }

    /// Empty the viewing history and drop its key from storage.
    pub fn clear_viewed(&mut self, store: &dyn KeyValueStore) {
        self.viewed.clear();
        if let Err(e) = store.remove_item(VIEWED_KEY) {
            tracing::warn!(key = VIEWED_KEY, "Failed to remove stored series: {e}");
        }
    }

    /// Overwrite both keys with the current collections. Errors are logged but not propagated.
    pub fn persist(&self, store: &dyn KeyValueStore) {
        for (key, items) in [(SAVED_KEY, &self.saved), (VIEWED_KEY, &self.viewed)] {
            let result = encode(items).and_then(|blob| store.set_item(key, &blob));
            if let Err(e) = result {
                tracing::warn!(key, "Failed to persist series: {e}");
            }
        }
    }

    /// Load both collections from storage.
    ///
    /// A missing key leaves that collection as is. So does a blob that fails
    /// to parse; the failure is logged and never returned.
    pub fn restore(&mut self, store: &dyn KeyValueStore) {
        if let Some(mut saved) = load_key(store, SAVED_KEY) {
            dedup_by_id(&mut saved);
            if saved.len() > SAVED_CAPACITY {
                tracing::warn!(
                    count = saved.len(),
                    "Stored saved series exceed capacity, keeping the first {SAVED_CAPACITY}"
                );
                saved.truncate(SAVED_CAPACITY);
            }
            self.saved = saved;
        }
        if let Some(mut viewed) = load_key(store, VIEWED_KEY) {
            dedup_by_id(&mut viewed);
            self.viewed = viewed;
        }
        tracing::debug!(
            saved = self.saved.len(),
            viewed = self.viewed.len(),
            "Restored library"
        );
    }
}

fn load_key(store: &dyn KeyValueStore, key: &str) -> Option<Vec<Series>> {
    let raw = match store.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, "Error loading from storage: {e}");
            return None;
        }
    };
    match decode(&raw) {
        Ok(items) => Some(items),
        Err(e) => {
            tracing::warn!(key, "Error loading from storage: {e}");
            None
        }
    }
}
