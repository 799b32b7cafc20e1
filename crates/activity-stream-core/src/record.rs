use serde::Serialize;
use serde_json::{Map, Value};

use crate::component::Component;

/// Timestamp used when a producer omits `time` or writes a non-numeric one.
pub const MISSING_TIME: f64 = 0.0;

/// One timestamped event from a component's log.
///
/// `component` is always assigned by the reader from the file the record came
/// from; whatever the producer wrote under that key is discarded. Fields other
/// than `time`, `description` and `component` are carried in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRecord {
    pub time: f64,
    pub description: String,
    pub component: Component,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActivityRecord {
    pub fn new(time: f64, description: impl Into<String>, component: Component) -> Self {
        Self {
            time,
            description: description.into(),
            component,
            extra: Map::new(),
        }
    }

    /// Build a record from a producer's JSON object, stamping `component`.
    pub fn from_object(mut fields: Map<String, Value>, component: Component) -> Self {
        let time = fields
            .remove("time")
            .and_then(|v| v.as_f64())
            .filter(|t| t.is_finite())
            .unwrap_or(MISSING_TIME);
        let description = match fields.remove("description") {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        fields.remove("component");

        Self {
            time,
            description,
            component,
            extra: fields,
        }
    }

    /// Compact JSON of the whole record, used when there is no description to show.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
