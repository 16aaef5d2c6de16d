//! Normalized intelligence record.
//!
//! Only the common envelope (type tag, id, provenance reference, timestamps)
//! is typed; the full object including custom properties travels in `raw`
//! for the ingestion caller to interpret. Schema design beyond this envelope
//! is deliberately out of scope.

use crate::identity::ProvenanceIdentity;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single normalized record pulled from a feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelObject {
    /// STIX type tag, e.g. "indicator" or "report".
    pub object_type: String,
    /// Stable identifier in the external system.
    pub id: String,
    /// Provenance reference injected at normalization time.
    pub created_by_ref: String,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    /// Full payload including custom properties.
    pub raw: serde_json::Value,
}

impl IntelObject {
    /// Normalize one raw feed object, attributing it to `identity`.
    ///
    /// The provenance reference is injected into the payload before the
    /// envelope is validated, so it survives into `raw`. Any violation of
    /// the minimal envelope is `Error::Parse`; a malformed record never
    /// disappears silently.
    #[tracing::instrument(level = "debug", skip(value, identity))]
    pub fn parse(value: serde_json::Value, identity: &ProvenanceIdentity) -> Result<Self> {
        let mut value = value;
        let obj = value
            .as_object_mut()
            .ok_or_else(|| Error::parse_message("record is not a JSON object"))?;

        obj.insert(
            "created_by_ref".to_string(),
            serde_json::Value::String(identity.standard_id.clone()),
        );

        let object_type = required_string(obj, "type")?;
        let id = required_string(obj, "id")?;
        let created = optional_timestamp(obj, "created")?;
        let modified = optional_timestamp(obj, "modified")?;

        Ok(Self {
            object_type,
            id,
            created_by_ref: identity.standard_id.clone(),
            created,
            modified,
            raw: value,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.raw.get("name").and_then(|v| v.as_str())
    }

    pub fn pattern(&self) -> Option<&str> {
        self.raw.get("pattern").and_then(|v| v.as_str())
    }

    pub fn object_refs(&self) -> Vec<&str> {
        self.raw
            .get("object_refs")
            .and_then(|v| v.as_array())
            .map(|refs| refs.iter().filter_map(|r| r.as_str()).collect())
            .unwrap_or_default()
    }

    /// The instant this record contributes to the high-water-mark:
    /// `modified`, else `created`, else `None` (callers substitute "now").
    pub fn checkpoint_instant(&self) -> Option<DateTime<Utc>> {
        self.modified.or(self.created)
    }
}

fn required_string(obj: &serde_json::Map<String, serde_json::Value>, key: &str) -> Result<String> {
    let value = obj
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::parse_message(format!("record {key} is missing or not a string")))?;
    if value.trim().is_empty() {
        return Err(Error::parse_message(format!("record {key} is empty")));
    }
    Ok(value.to_string())
}

fn optional_timestamp(
    obj: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Result<Option<DateTime<Utc>>> {
    match obj.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| Error::parse(format!("record {key} timestamp"), e)),
        Some(_) => Err(Error::parse_message(format!(
            "record {key} is not a timestamp string"
        ))),
    }
}
