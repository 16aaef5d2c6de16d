//! TAXII feed connector.
//!
//! Pages through a readable collection, normalizes every retrieved object,
//! and lazily yields (batch, high-water-mark) checkpoints. Incremental sync
//! uses an `added_after` timestamp lower bound. Requests are issued strictly
//! sequentially; a transport failure aborts the remaining pagination for the
//! collection without propagating past the connector boundary.

use crate::client::TaxiiClient;
use async_stream::stream;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;
use intelsync_core::{
    format_high_water_mark, FeedCollection, FeedSource, IntelObject, PageBatch,
    ProvenanceIdentity, Result,
};
use std::sync::Arc;

pub struct TaxiiFeedSource {
    client: Arc<TaxiiClient>,
    identity: ProvenanceIdentity,
}

impl TaxiiFeedSource {
    pub fn new(client: TaxiiClient, identity: ProvenanceIdentity) -> Self {
        Self {
            client: Arc::new(client),
            identity,
        }
    }

    pub fn identity(&self) -> &ProvenanceIdentity {
        &self.identity
    }

    /// Normalize one raw object and log it the way feed operators expect.
    ///
    /// Returns the record count this object contributes to the collection
    /// total: reports always count; other types count only when the
    /// collection itself is not a report collection (their members arrive
    /// alongside the reports that reference them).
    fn process_object(
        identity: &ProvenanceIdentity,
        collection_type: Option<&str>,
        raw: serde_json::Value,
    ) -> Result<(IntelObject, u64)> {
        let raw_id = raw
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or("<unknown>")
            .to_string();

        let obj = IntelObject::parse(raw, identity).map_err(|err| {
            tracing::error!(id = %raw_id, error = %err, "failed to process object");
            err
        })?;

        let mut counted = 0u64;
        if obj.object_type == "report" {
            counted = 1;
            tracing::info!(
                r#type = %obj.object_type,
                id = %obj.id,
                name = obj.name().unwrap_or_default(),
                "report"
            );
            for reference in obj.object_refs() {
                tracing::info!(reference = %reference, "report reference");
            }
        } else {
            if collection_type != Some("report") {
                counted = 1;
            }
            if obj.object_type == "indicator" {
                tracing::info!(
                    r#type = %obj.object_type,
                    id = %obj.id,
                    pattern = obj.pattern().unwrap_or_default(),
                    "indicator"
                );
            } else {
                tracing::info!(r#type = %obj.object_type, id = %obj.id, "object");
            }
        }

        Ok((obj, counted))
    }
}

#[async_trait]
impl FeedSource for TaxiiFeedSource {
    async fn id(&self) -> &'static str {
        "taxii2"
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn collections(&self) -> Result<Vec<FeedCollection>> {
        let collections = self.client.readable_collections().await?;
        Ok(collections.into_iter().map(FeedCollection::from).collect())
    }

    fn pull_pages(
        &self,
        collection: &FeedCollection,
        added_after: Option<DateTime<Utc>>,
    ) -> BoxStream<'static, Result<PageBatch>> {
        let client = self.client.clone();
        let identity = self.identity.clone();
        let collection = collection.clone();

        Box::pin(stream! {
            let added_after_str = added_after.map(format_high_water_mark);
            tracing::info!(
                collection = %collection.title,
                collection_id = %collection.id,
                added_after = added_after_str.as_deref().unwrap_or("<none>"),
                "retrieving data from collection"
            );

            let mut next: Option<String> = None;
            let mut page_counter = 0u64;
            let mut record_counter = 0u64;
            // Running maximum across pages: the emitted checkpoint never
            // moves backwards even when a later page carries older records.
            let mut high_water = added_after;

            loop {
                let envelope = match client
                    .objects_page(&collection.id, added_after_str.as_deref(), next.as_deref())
                    .await
                {
                    Ok(envelope) => envelope,
                    Err(err) => {
                        tracing::error!(
                            collection = %collection.title,
                            error = %err,
                            "error retrieving data from collection, aborting pagination"
                        );
                        break;
                    }
                };

                page_counter += 1;
                tracing::info!(
                    collection = %collection.title,
                    page = page_counter,
                    objects = envelope.objects.len(),
                    "processing page"
                );

                let mut objects = Vec::with_capacity(envelope.objects.len());
                let mut parse_failed = false;
                for raw in envelope.objects {
                    match Self::process_object(
                        &identity,
                        collection.collection_type.as_deref(),
                        raw,
                    ) {
                        Ok((obj, counted)) => {
                            record_counter += counted;
                            let at = obj.checkpoint_instant().unwrap_or_else(Utc::now);
                            if high_water.map_or(true, |current| at > current) {
                                high_water = Some(at);
                            }
                            objects.push(obj);
                        }
                        Err(err) => {
                            // The batch is aborted; nothing partial is emitted.
                            yield Err(err);
                            parse_failed = true;
                            break;
                        }
                    }
                }
                if parse_failed {
                    break;
                }

                let mark = high_water.unwrap_or_else(Utc::now);
                yield Ok(PageBatch {
                    objects,
                    high_water_mark: format_high_water_mark(mark),
                });

                if !envelope.more {
                    break;
                }
                match envelope.next {
                    Some(token) => next = Some(token),
                    None => break,
                }
            }

            tracing::info!(
                collection = %collection.title,
                records = record_counter,
                "finished retrieving data from collection"
            );
        })
    }
}
