use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Substring the catalog uses for its "no image" placeholder artwork.
pub const PLACEHOLDER_IMAGE_MARKER: &str = "image_not_available";

// ── Response envelope ───────────────────────────────────────────

/// Top-level response body: `{ code, status, data: { ... } }`.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct DataWrapper<T> {
    pub code: Option<i64>,
    pub status: Option<String>,
    #[serde(rename = "attributionText")]
    pub attribution_text: Option<String>,
    pub data: DataContainer<T>,
}

/// The `data` field of a response: one page of results plus counters.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct DataContainer<T> {
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub results: Vec<T>,
}

impl<T> DataContainer<T> {
    pub fn first(self) -> Option<T> {
        self.results.into_iter().next()
    }
}

// ── Entities ────────────────────────────────────────────────────

/// Image reference: the full URL is assembled from `path` and `extension`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub path: String,
    pub extension: String,
}

impl Thumbnail {
    /// URL for a sized variant such as `portrait_medium` or `standard_large`.
    pub fn url(&self, variant: &str) -> String {
        format!("{}/{variant}.{}", self.path, self.extension)
    }

    /// URL of the full-size image.
    pub fn full_url(&self) -> String {
        format!("{}.{}", self.path, self.extension)
    }

    pub fn is_placeholder(&self) -> bool {
        self.path.contains(PLACEHOLDER_IMAGE_MARKER)
    }
}

/// A comic-book series.
///
/// Only `id`, `title` and `thumbnail` are typed. Every other field the API
/// returns is kept in `extra` so a stored copy serializes back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Thumbnail>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Series {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            thumbnail: None,
            extra: Map::new(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.extra.get("description").and_then(Value::as_str)
    }

    pub fn start_year(&self) -> Option<i64> {
        self.extra.get("startYear").and_then(Value::as_i64)
    }

    pub fn end_year(&self) -> Option<i64> {
        self.extra.get("endYear").and_then(Value::as_i64)
    }
}

/// A character. Used for the random avatar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Thumbnail>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Character {
    /// Whether the character has real artwork rather than the placeholder.
    pub fn has_image(&self) -> bool {
        self.thumbnail
            .as_ref()
            .is_some_and(|t| !t.path.is_empty() && !t.is_placeholder())
    }
}
