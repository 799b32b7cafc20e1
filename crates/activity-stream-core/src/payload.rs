//! Shape-tolerant parsing of a component's `activity.json`.
//!
//! Producers write one of three shapes: a bare array of records, an object
//! wrapping the array under `history`, or a single record object. All three
//! normalize to the same ordered record list.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::component::Component;
use crate::error::Result;
use crate::record::ActivityRecord;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LogPayload {
    Records(Vec<Value>),
    History { history: Vec<Value> },
    Single(Map<String, Value>),
}

impl LogPayload {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Flatten into records stamped with `component`, preserving file order.
    /// Entries that are not JSON objects cannot carry a record and are skipped.
    pub fn into_records(self, component: Component) -> Vec<ActivityRecord> {
        let entries = match self {
            Self::Records(items) | Self::History { history: items } => items,
            Self::Single(fields) => return vec![ActivityRecord::from_object(fields, component)],
        };

        let total = entries.len();
        let records: Vec<ActivityRecord> = entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::Object(fields) => Some(ActivityRecord::from_object(fields, component)),
                _ => None,
            })
            .collect();
        if records.len() < total {
            debug!(
                component = component.as_str(),
                skipped = total - records.len(),
                "skipped non-object log entries"
            );
        }
        records
    }
}

/// Parse raw file content into the normalized record list for `component`.
pub fn parse_records(content: &str, component: Component) -> Result<Vec<ActivityRecord>> {
    Ok(LogPayload::parse(content)?.into_records(component))
}

/// Keep only the newest `max` records, order preserved.
pub fn clip_tail(mut records: Vec<ActivityRecord>, max: usize) -> Vec<ActivityRecord> {
    if records.len() > max {
        records.split_off(records.len() - max)
    } else {
        records
    }
}
