//! Per-component log reading with stale-but-available caching.
//!
//! Each component keeps the newest records it could parse. A read that fails
//! (file missing, half-written, malformed) leaves the cache as it was and
//! marks the log failing until the next clean read. Tail mode additionally
//! keeps a cursor of how many records it already emitted.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::component::{Component, StreamFilter};
use crate::error::{Error, Result};
use crate::payload::{clip_tail, parse_records};
use crate::record::ActivityRecord;
use crate::store::ActivityStore;

pub const MAX_CACHED: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogHealth {
    Healthy,
    Failing(String),
}

#[derive(Debug)]
pub struct ComponentLog {
    pub path: PathBuf,
    cache: Vec<ActivityRecord>,
    cursor: usize,
    health: LogHealth,
    unreported: bool,
}

impl ComponentLog {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            cache: Vec::new(),
            cursor: 0,
            health: LogHealth::Healthy,
            unreported: false,
        }
    }

    /// Returns true when this failure starts a new failure episode.
    fn fail(&mut self, reason: String) -> bool {
        let started = self.health == LogHealth::Healthy;
        self.health = LogHealth::Failing(reason);
        if started {
            self.unreported = true;
        }
        started
    }

    fn recover(&mut self) {
        self.health = LogHealth::Healthy;
        self.unreported = false;
    }
}

pub struct Collector {
    store: ActivityStore,
    max_cached: usize,
    logs: BTreeMap<Component, ComponentLog>,
}

impl Collector {
    pub fn new(store: ActivityStore) -> Self {
        Self::with_capacity(store, MAX_CACHED)
    }

    pub fn with_capacity(store: ActivityStore, max_cached: usize) -> Self {
        let logs = Component::ALL
            .into_iter()
            .map(|c| (c, ComponentLog::new(store.path_for(c))))
            .collect();
        Self {
            store,
            max_cached,
            logs,
        }
    }

    pub fn store(&self) -> &ActivityStore {
        &self.store
    }

    fn log_mut(&mut self, component: Component) -> &mut ComponentLog {
        let path = self.store.path_for(component);
        self.logs
            .entry(component)
            .or_insert_with(|| ComponentLog::new(path))
    }

    fn read_full(&self, component: Component) -> Result<Vec<ActivityRecord>> {
        let content = self.store.read(component)?;
        parse_records(&content, component)
    }

    /// Re-read `component`'s log and return its newest records (at most the
    /// cache capacity). On any failure the previous cache is returned unchanged.
    pub fn refresh(&mut self, component: Component) -> &[ActivityRecord] {
        let max = self.max_cached;
        match self.read_full(component) {
            Ok(records) => {
                let log = self.log_mut(component);
                log.cache = clip_tail(records, max);
                log.recover();
                debug!(
                    component = component.as_str(),
                    entries = log.cache.len(),
                    "refreshed activities"
                );
            }
            Err(err) => self.record_failure(component, &err),
        }
        &self.log_mut(component).cache
    }

    pub fn refresh_all(&mut self, filter: StreamFilter) {
        for component in filter.components() {
            self.refresh(component);
        }
    }

    /// Records appended since the previous call, advancing the cursor.
    ///
    /// A file holding fewer records than the cursor was truncated or rotated:
    /// the cursor restarts at zero and everything in it counts as new.
    pub fn delta(&mut self, component: Component) -> Result<Vec<ActivityRecord>> {
        let records = match self.read_full(component) {
            Ok(records) => records,
            Err(err) => {
                self.record_failure(component, &err);
                return Err(err);
            }
        };

        let max = self.max_cached;
        let log = self.log_mut(component);
        log.recover();
        if log.cursor > records.len() {
            debug!(
                component = component.as_str(),
                cursor = log.cursor,
                len = records.len(),
                "log shrank, rewinding cursor"
            );
            log.cursor = 0;
        }
        let fresh = records[log.cursor..].to_vec();
        log.cursor = records.len();
        log.cache = clip_tail(records, max);
        Ok(fresh)
    }

    fn record_failure(&mut self, component: Component, err: &Error) {
        if self.log_mut(component).fail(err.to_string()) {
            warn!(component = component.as_str(), error = %err, "activity log unreadable, keeping last good data");
        } else {
            debug!(component = component.as_str(), error = %err, "activity log still unreadable");
        }
    }

    /// The reason for a failure episode that began since the last call, once.
    pub fn take_failure(&mut self, component: Component) -> Option<String> {
        let log = self.log_mut(component);
        if !log.unreported {
            return None;
        }
        log.unreported = false;
        match &log.health {
            LogHealth::Failing(reason) => Some(reason.clone()),
            LogHealth::Healthy => None,
        }
    }

    pub fn cached(&self, component: Component) -> &[ActivityRecord] {
        self.logs
            .get(&component)
            .map(|log| log.cache.as_slice())
            .unwrap_or_default()
    }

    pub fn cursor(&self, component: Component) -> usize {
        self.logs.get(&component).map(|log| log.cursor).unwrap_or(0)
    }

    pub fn health(&self, component: Component) -> LogHealth {
        self.logs
            .get(&component)
            .map(|log| log.health.clone())
            .unwrap_or(LogHealth::Healthy)
    }

    /// Components among `filter`'s whose most recent read failed.
    pub fn failing(&self, filter: StreamFilter) -> Vec<Component> {
        filter
            .components()
            .into_iter()
            .filter(|c| matches!(self.health(*c), LogHealth::Failing(_)))
            .collect()
    }
}
