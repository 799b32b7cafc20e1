//! Plain-text tail mode: new records as they are appended, one per line.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use activity_stream_core::record::MISSING_TIME;
use activity_stream_core::{
    timeline, ActivityRecord, ActivityStore, Collector, Component, Heartbeat, StreamFilter,
};
use chrono::{Local, TimeZone, Utc};

use super::{cancel_on_ctrl_c, drive, PollLoop};
use crate::config::{Config, ConfigOrigin};
use crate::logging;
use crate::render::{clock_label, EMERGENCY_MARKER};

const RULE_WIDTH: usize = 80;
const ALERT_ON: &str = "\x1b[91m";
const ALERT_OFF: &str = "\x1b[0m";

pub struct TailLoop<W: Write> {
    out: W,
    collector: Collector,
    filter: StreamFilter,
    heartbeat: Heartbeat,
    interval: Duration,
    pending: Vec<ActivityRecord>,
    warnings: Vec<String>,
}

impl<W: Write> TailLoop<W> {
    pub fn new(out: W, collector: Collector, filter: StreamFilter, config: &Config) -> Self {
        Self {
            out,
            collector,
            filter,
            heartbeat: Heartbeat::new(config.heartbeat_interval(), Instant::now()),
            interval: config.tail_interval(),
            pending: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Startup banner. `created` lists the log files made by `ensure_layout`.
    pub fn start(&mut self, created: &[(Component, PathBuf)]) -> io::Result<()> {
        writeln!(
            self.out,
            "Monitoring activity logs in: {}",
            self.collector.store().root().display()
        )?;
        for (component, path) in created {
            writeln!(self.out, "Created {component} log file: {}", path.display())?;
        }
        writeln!(self.out, "Starting event monitor... (Press Ctrl+C to stop)")?;
        writeln!(self.out, "{}", "-".repeat(RULE_WIDTH))?;
        self.out.flush()
    }

    pub fn stop(&mut self) -> io::Result<()> {
        writeln!(self.out, "\nStopping activity stream...")?;
        self.out.flush()
    }

    fn collect_component(&mut self, component: Component) {
        match self.collector.delta(component) {
            Ok(fresh) => self.pending.extend(fresh),
            Err(err) => {
                // one line per failure episode, not per poll
                if self.collector.take_failure(component).is_none() {
                    return;
                }
                if err.is_not_found() {
                    tracing::debug!(component = component.as_str(), "log file missing");
                } else if err.is_parse_failure() {
                    self.warnings
                        .push(format!("Warning: Invalid JSON in {component} log"));
                } else {
                    self.warnings
                        .push(format!("Error reading {component} activities: {err}"));
                }
            }
        }
    }
}

impl<W: Write> PollLoop for TailLoop<W> {
    fn fetch(&mut self, _now: Instant) -> anyhow::Result<()> {
        for component in self.filter.components() {
            self.collect_component(component);
        }
        Ok(())
    }

    fn present(&mut self, now: Instant) -> anyhow::Result<()> {
        for warning in self.warnings.drain(..) {
            writeln!(self.out, "{warning}")?;
        }

        let fresh = timeline::merge([std::mem::take(&mut self.pending)]);
        if fresh.is_empty() {
            if self.heartbeat.due(now) {
                writeln!(
                    self.out,
                    "[{}] System running - no events in last {}s",
                    Local::now().format("%H:%M:%S"),
                    self.heartbeat.interval().as_secs()
                )?;
            }
        } else {
            self.heartbeat.note_activity(now);
            let fallback = Utc::now().timestamp_millis() as f64 / 1000.0;
            for record in &fresh {
                writeln!(self.out, "{}", format_tail_line(record, &Local, fallback))?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn should_continue(&self) -> bool {
        true
    }

    fn pause(&self) -> Duration {
        self.interval
    }

    fn report(&mut self, err: &anyhow::Error) {
        let _ = writeln!(self.out, "Error: {err}");
        let _ = self.out.flush();
    }
}

/// `[HH:MM:SS] component: description`. Records without a time are stamped
/// with `fallback_secs`; records without a description print as JSON.
pub fn format_tail_line<Tz: TimeZone>(record: &ActivityRecord, tz: &Tz, fallback_secs: f64) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let secs = if record.time == MISSING_TIME {
        fallback_secs
    } else {
        record.time
    };
    let body = if record.description.is_empty() {
        record.to_json()
    } else {
        record.description.clone()
    };
    let stamp = clock_label(secs, tz);
    if record.component.is_emergency() {
        format!(
            "{ALERT_ON}[{stamp}] {EMERGENCY_MARKER}{}: {body}{ALERT_OFF}",
            record.component
        )
    } else {
        format!("[{stamp}] {}: {body}", record.component)
    }
}

pub async fn run_tail(config: Config, origin: ConfigOrigin, filter: StreamFilter) -> anyhow::Result<()> {
    logging::init_stderr();
    origin.log();

    let store = ActivityStore::new(&config.root);
    let created = store.ensure_layout()?;
    tracing::info!(root = %store.root().display(), filter = %filter, "tail starting");
    let collector = Collector::with_capacity(store, config.max_cached);

    let mut tail = TailLoop::new(io::stdout(), collector, filter, &config);
    tail.start(&created)?;

    let cancel = cancel_on_ctrl_c();
    drive(&mut tail, &cancel, config.error_backoff()).await;

    tail.stop()?;
    Ok(())
}
