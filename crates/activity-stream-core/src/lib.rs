//! Activity stream core: reading, normalizing and merging per-component
//! activity logs into one timeline.

pub mod collector;
pub mod component;
pub mod detector;
pub mod error;
pub mod heartbeat;
pub mod payload;
pub mod record;
pub mod state;
pub mod store;
pub mod timeline;

pub use collector::{Collector, LogHealth, MAX_CACHED};
pub use component::{Component, StreamFilter};
pub use detector::{has_changed, ChangeDetector};
pub use error::{Error, Result};
pub use heartbeat::{Heartbeat, HEARTBEAT_INTERVAL};
pub use record::ActivityRecord;
pub use state::{AggregatedState, SystemMetrics};
pub use store::ActivityStore;
