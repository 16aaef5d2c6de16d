//! Intelsync core library: shared error type, normalized record model, and
//! the feed-source trait consumed by ingestion callers.

pub mod error;
pub mod feed;
pub mod identity;
pub mod record;

pub use error::{Error, Result};
pub use feed::{format_high_water_mark, FeedCollection, FeedSource, PageBatch};
pub use identity::ProvenanceIdentity;
pub use record::IntelObject;
