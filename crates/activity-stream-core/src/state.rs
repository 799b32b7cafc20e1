use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound, Utc};

use crate::collector::Collector;
use crate::component::{Component, StreamFilter};
use crate::record::ActivityRecord;
use crate::timeline;

/// One sample of host utilization. Values are percentages rounded to one
/// decimal, the capture time is truncated to whole seconds, so two samples
/// taken on an idle host compare equal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SystemMetrics {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub captured_at: DateTime<Utc>,
}

impl SystemMetrics {
    pub fn new(cpu: f64, memory: f64, disk: f64, captured_at: DateTime<Utc>) -> Self {
        Self {
            cpu: round_pct(cpu),
            memory: round_pct(memory),
            disk: round_pct(disk),
            captured_at: captured_at.trunc_subsecs(0),
        }
    }
}

fn round_pct(value: f64) -> f64 {
    if value.is_finite() {
        (value.clamp(0.0, 100.0) * 10.0).round() / 10.0
    } else {
        0.0
    }
}

/// What the dashboard shows during one poll cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregatedState {
    pub activities: BTreeMap<Component, Vec<ActivityRecord>>,
    pub metrics: SystemMetrics,
    /// Followed components whose last read failed; their lists are stale.
    pub stale: Vec<Component>,
}

impl AggregatedState {
    /// Refresh every component the filter follows and snapshot the caches.
    pub fn collect(collector: &mut Collector, filter: StreamFilter, metrics: SystemMetrics) -> Self {
        let activities = filter
            .components()
            .into_iter()
            .map(|c| (c, collector.refresh(c).to_vec()))
            .collect();
        Self {
            activities,
            metrics,
            stale: collector.failing(filter),
        }
    }

    /// All held records as one ascending timeline.
    pub fn timeline(&self) -> Vec<ActivityRecord> {
        timeline::merge(self.activities.values().cloned())
    }

    pub fn record_count(&self) -> usize {
        self.activities.values().map(Vec::len).sum()
    }
}
