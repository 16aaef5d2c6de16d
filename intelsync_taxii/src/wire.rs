//! Typed envelopes for the TAXII 2.1 wire format.
//!
//! Only the fields the sync loop reads are modeled; objects themselves stay
//! opaque `serde_json::Value`s until normalization.

use intelsync_core::FeedCollection;
use serde::Deserialize;

/// Response to `GET /taxii2/`.
#[derive(Debug, Deserialize)]
pub struct DiscoveryResponse {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub api_roots: Vec<String>,
}

/// Response to `GET {api_root}/collections/`.
#[derive(Debug, Deserialize)]
pub struct CollectionsResponse {
    #[serde(default)]
    pub collections: Vec<Collection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Collection {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub can_read: bool,
    /// Custom feed property describing the collection's content, e.g. "report".
    #[serde(rename = "type", default)]
    pub collection_type: Option<String>,
}

impl From<Collection> for FeedCollection {
    fn from(c: Collection) -> Self {
        Self {
            id: c.id,
            title: c.title,
            collection_type: c.collection_type,
        }
    }
}

/// One page of objects.
#[derive(Debug, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub more: bool,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub objects: Vec<serde_json::Value>,
}
