//! TAXII 2.1 feed client implementing the `intelsync_core` feed traits.
//!
//! Pulls STIX objects page by page from a collection-sharing server,
//! normalizes them, and yields (batch, high-water-mark) checkpoints.

pub mod client;
pub mod connector;
pub mod wire;

pub use client::{HttpTransport, TaxiiClient, TaxiiConfig, TaxiiTransport};
pub use connector::TaxiiFeedSource;
pub use wire::{Collection, CollectionsResponse, DiscoveryResponse, Envelope};
