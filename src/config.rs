//! Activity stream configuration
//!
//! All tunable timings in one place. Loaded from TOML at startup when a file
//! exists, falls back to defaults otherwise.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use activity_stream_core::store::DEFAULT_ROOT;

pub const CONFIG_ENV: &str = "ACTIVITY_STREAM_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "activity_stream.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `<component>/activity.json`.
    pub root: PathBuf,
    /// Dashboard data refresh cadence.
    pub refresh_interval_ms: u64,
    /// Tail mode polling interval.
    pub tail_interval_ms: u64,
    /// Longest the dashboard waits for a keypress per iteration.
    pub input_timeout_ms: u64,
    /// Silence before a heartbeat notice.
    pub heartbeat_secs: u64,
    /// Records cached per component.
    pub max_cached: usize,
    /// Timeline rows shown on the dashboard.
    pub max_rows: usize,
    /// Pause after a failed cycle.
    pub error_backoff_ms: u64,
    /// Log file for the dashboard (it never logs to the terminal).
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            refresh_interval_ms: 500,
            tail_interval_ms: 100,
            input_timeout_ms: 100,
            heartbeat_secs: 30,
            max_cached: 100,
            max_rows: 50,
            error_backoff_ms: 1000,
            log_file: None,
        }
    }
}

/// Where the active configuration came from. Loading happens before any
/// subscriber is installed, so the outcome is kept and logged later.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOrigin {
    File(PathBuf),
    Missing(PathBuf),
    Malformed { path: PathBuf, error: String },
}

impl ConfigOrigin {
    /// Emit the outcome through whatever subscriber is now installed.
    pub fn log(&self) {
        match self {
            Self::File(path) => tracing::info!("Loaded config from {}", path.display()),
            Self::Missing(path) => tracing::debug!("No config at {} - using defaults", path.display()),
            Self::Malformed { path, error } => {
                tracing::warn!("Failed to parse {}: {} - using defaults", path.display(), error)
            }
        }
    }
}

impl Config {
    /// Load from `path`; a missing or malformed file yields defaults.
    pub fn load(path: &Path) -> (Self, ConfigOrigin) {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return (Self::default(), ConfigOrigin::Missing(path.to_path_buf())),
        };
        match toml::from_str(&content) {
            Ok(config) => (config, ConfigOrigin::File(path.to_path_buf())),
            Err(e) => (
                Self::default(),
                ConfigOrigin::Malformed {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                },
            ),
        }
    }

    /// `$ACTIVITY_STREAM_CONFIG`, else `./activity_stream.toml`.
    pub fn discover() -> (Self, ConfigOrigin) {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load(&path)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn tail_interval(&self) -> Duration {
        Duration::from_millis(self.tail_interval_ms)
    }

    /// Never longer than the refresh interval, so input cannot starve refreshes.
    pub fn input_timeout(&self) -> Duration {
        Duration::from_millis(self.input_timeout_ms.min(self.refresh_interval_ms))
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_cadence() {
        let c = Config::default();
        assert_eq!(c.root, PathBuf::from("activity_logs"));
        assert_eq!(c.refresh_interval(), Duration::from_millis(500));
        assert_eq!(c.tail_interval(), Duration::from_millis(100));
        assert_eq!(c.heartbeat_interval(), Duration::from_secs(30));
        assert_eq!(c.max_cached, 100);
        assert_eq!(c.max_rows, 50);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c: Config = toml::from_str("heartbeat_secs = 5\nroot = \"/var/log/echo\"").unwrap();
        assert_eq!(c.heartbeat_secs, 5);
        assert_eq!(c.root, PathBuf::from("/var/log/echo"));
        assert_eq!(c.refresh_interval_ms, 500);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = Path::new("/nonexistent/activity_stream.toml");
        let (c, origin) = Config::load(path);
        assert_eq!(c.max_rows, 50);
        assert_eq!(origin, ConfigOrigin::Missing(path.to_path_buf()));
    }

    #[test]
    fn malformed_file_gives_defaults_and_keeps_the_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity_stream.toml");
        std::fs::write(&path, "refresh_interval_ms = \"fast\"").unwrap();
        let (c, origin) = Config::load(&path);
        assert_eq!(c.refresh_interval_ms, 500);
        match origin {
            ConfigOrigin::Malformed { path: p, error } => {
                assert_eq!(p, path);
                assert!(error.contains("refresh_interval_ms"), "{error}");
            }
            other => panic!("expected malformed, got {other:?}"),
        }
    }

    #[test]
    fn valid_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity_stream.toml");
        std::fs::write(&path, "max_rows = 20").unwrap();
        let (c, origin) = Config::load(&path);
        assert_eq!(c.max_rows, 20);
        assert_eq!(origin, ConfigOrigin::File(path));
    }

    #[test]
    fn input_timeout_capped_by_refresh_interval() {
        let c = Config {
            input_timeout_ms: 900,
            ..Config::default()
        };
        assert_eq!(c.input_timeout(), Duration::from_millis(500));
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn malformed_outcome_logged_once_subscriber_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity_stream.toml");
        std::fs::write(&path, "heartbeat_secs = [").unwrap();
        let (_, origin) = Config::load(&path);

        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || origin.log());

        let out = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("WARN"), "{out}");
        assert!(out.contains("Failed to parse"), "{out}");
        assert!(out.contains("using defaults"), "{out}");
    }
}
