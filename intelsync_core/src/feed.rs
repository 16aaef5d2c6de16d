//! Checkpoint types and the connector-facing trait.
//!
//! A feed source lazily produces `PageBatch`es: one page worth of normalized
//! records plus a high-water-mark string the caller persists to resume
//! incrementally on the next run.

use crate::record::IntelObject;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// A named, server-hosted, pageable set of intelligence objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCollection {
    pub id: String,
    pub title: String,
    /// Feed-defined content hint (e.g. "report"); drives record counting.
    pub collection_type: Option<String>,
}

/// One page worth of normalized records plus the resumption timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBatch {
    pub objects: Vec<IntelObject>,
    /// Latest observed modification timestamp, `%Y-%m-%dT%H:%M:%SZ`.
    pub high_water_mark: String,
}

/// Format an instant the way feed checkpoints are exchanged.
pub fn format_high_water_mark(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// A feed source enumerates readable collections and pages through them.
///
/// Implementations live in protocol crates (`intelsync_taxii`) or caller code.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Source identifier (stable, used for provenance and logging).
    async fn id(&self) -> &'static str;

    /// Enumerate the collections the client is allowed to read.
    async fn collections(&self) -> Result<Vec<FeedCollection>>;

    /// Lazily produce successive `PageBatch`es for one collection, optionally
    /// bounded below by `added_after`.
    ///
    /// A transport failure ends the stream after logging; the error does not
    /// propagate past the connector boundary. A parse failure on a record
    /// aborts that page's batch with `Err`.
    fn pull_pages(
        &self,
        collection: &FeedCollection,
        added_after: Option<DateTime<Utc>>,
    ) -> BoxStream<'static, Result<PageBatch>>;
}
