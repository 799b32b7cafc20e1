//! Interactive full-screen dashboard.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use activity_stream_core::{
    ActivityStore, AggregatedState, ChangeDetector, Collector, Heartbeat, StreamFilter,
};
use chrono::{DateTime, Local};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{backend::Backend, Terminal};

use super::{cancel_on_ctrl_c, drive, PollLoop};
use crate::config::{Config, ConfigOrigin};
use crate::logging;
use crate::metrics::{MetricsSource, SysinfoSampler};
use crate::render::{self, View};
use crate::terminal::TerminalSession;

const PAUSE: Duration = Duration::from_millis(50);

/// Where keystrokes come from.
pub trait InputSource {
    /// Wait at most `timeout` for the next terminal event.
    fn next_event(&mut self, timeout: Duration) -> std::io::Result<Option<Event>>;
}

pub struct CrosstermInput;

impl InputSource for CrosstermInput {
    fn next_event(&mut self, timeout: Duration) -> std::io::Result<Option<Event>> {
        if event::poll(timeout)? {
            event::read().map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Pre-recorded events, one per poll. Used for headless runs and tests.
impl InputSource for VecDeque<Event> {
    fn next_event(&mut self, _timeout: Duration) -> std::io::Result<Option<Event>> {
        Ok(self.pop_front())
    }
}

pub struct Dashboard<B: Backend, M: MetricsSource, I: InputSource> {
    terminal: Terminal<B>,
    collector: Collector,
    metrics: M,
    input: I,
    filter: StreamFilter,

    state: AggregatedState,
    detector: ChangeDetector,
    heartbeat: Heartbeat,
    heartbeat_at: Option<DateTime<Local>>,

    refresh_interval: Duration,
    input_timeout: Duration,
    max_rows: usize,
    last_refresh: Option<Instant>,

    dirty: bool,
    clear_pending: bool,
    notice: Option<String>,
    running: bool,
    redraws: u64,
}

impl<B: Backend, M: MetricsSource, I: InputSource> Dashboard<B, M, I> {
    pub fn new(
        terminal: Terminal<B>,
        collector: Collector,
        metrics: M,
        input: I,
        filter: StreamFilter,
        config: &Config,
    ) -> Self {
        Self {
            terminal,
            collector,
            metrics,
            input,
            filter,
            state: AggregatedState::default(),
            detector: ChangeDetector::new(),
            heartbeat: Heartbeat::new(config.heartbeat_interval(), Instant::now()),
            heartbeat_at: None,
            refresh_interval: config.refresh_interval(),
            input_timeout: config.input_timeout(),
            max_rows: config.max_rows,
            last_refresh: None,
            dirty: false,
            clear_pending: false,
            notice: None,
            running: true,
            redraws: 0,
        }
    }

    pub fn state(&self) -> &AggregatedState {
        &self.state
    }

    pub fn heartbeat_at(&self) -> Option<DateTime<Local>> {
        self.heartbeat_at
    }

    /// Number of frames actually drawn.
    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Resize(..) => self.dirty = true,
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('c') | KeyCode::Char('C') => self.clear_pending = true,
            _ => {}
        }
    }

    fn render(&mut self) -> std::io::Result<()> {
        let view = View {
            filter: self.filter,
            state: &self.state,
            heartbeat_at: self.heartbeat_at,
            notice: self.notice.as_deref(),
            max_rows: self.max_rows,
        };
        self.terminal.draw(|frame| {
            let area = frame.area();
            let rows = render::compose(&view, area.width, area.height);
            render::draw(frame, &rows);
        })?;
        self.redraws += 1;
        Ok(())
    }
}

impl<B: Backend, M: MetricsSource, I: InputSource> PollLoop for Dashboard<B, M, I> {
    fn fetch(&mut self, now: Instant) -> anyhow::Result<()> {
        if let Some(last) = self.last_refresh {
            if now.saturating_duration_since(last) < self.refresh_interval {
                return Ok(());
            }
        }
        self.last_refresh = Some(now);

        let metrics = self.metrics.sample();
        let state = AggregatedState::collect(&mut self.collector, self.filter, metrics);

        let beat_before = self.heartbeat_at;
        if state.record_count() == 0 {
            if self.heartbeat.due(now) {
                self.heartbeat_at = Some(Local::now());
            }
        } else {
            self.heartbeat.note_activity(now);
            self.heartbeat_at = None;
        }

        let changed = self.detector.observe(&state);
        self.dirty |= changed || beat_before != self.heartbeat_at;
        self.state = state;
        Ok(())
    }

    fn present(&mut self, _now: Instant) -> anyhow::Result<()> {
        if self.clear_pending {
            self.terminal.clear()?;
            self.clear_pending = false;
            self.dirty = true;
        }
        if !self.dirty {
            return Ok(());
        }
        self.render()?;
        self.dirty = false;
        Ok(())
    }

    fn poll_input(&mut self) -> anyhow::Result<()> {
        if let Some(event) = self.input.next_event(self.input_timeout)? {
            self.handle_event(event);
        }
        Ok(())
    }

    fn should_continue(&self) -> bool {
        self.running
    }

    fn pause(&self) -> Duration {
        PAUSE
    }

    fn report(&mut self, err: &anyhow::Error) {
        self.notice = Some(err.to_string());
        let _ = self.render();
        self.notice = None;
        self.dirty = true;
    }
}

pub async fn run_dashboard(config: Config, origin: ConfigOrigin, filter: StreamFilter) -> anyhow::Result<()> {
    let _log_guard = logging::init_file(config.log_file.as_deref());
    origin.log();

    let store = ActivityStore::new(&config.root);
    store.ensure_layout()?;
    tracing::info!(root = %store.root().display(), filter = %filter, "dashboard starting");
    let collector = Collector::with_capacity(store, config.max_cached);

    let (session, terminal) = TerminalSession::enter()?;
    let mut dashboard = Dashboard::new(
        terminal,
        collector,
        SysinfoSampler::new(),
        CrosstermInput,
        filter,
        &config,
    );

    let cancel = cancel_on_ctrl_c();
    drive(&mut dashboard, &cancel, config.error_backoff()).await;

    drop(dashboard);
    session.leave();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use activity_stream_core::{Component, SystemMetrics};
    use chrono::{TimeZone, Utc};
    use ratatui::backend::TestBackend;

    struct FixedMetrics(SystemMetrics);

    impl MetricsSource for FixedMetrics {
        fn sample(&mut self) -> SystemMetrics {
            self.0.clone()
        }
    }

    fn fixed() -> FixedMetrics {
        FixedMetrics(SystemMetrics::new(
            10.0,
            20.0,
            30.0,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        ))
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn dashboard(
        dir: &tempfile::TempDir,
        filter: StreamFilter,
        events: Vec<Event>,
    ) -> Dashboard<TestBackend, FixedMetrics, VecDeque<Event>> {
        let store = ActivityStore::new(dir.path());
        store.ensure_layout().unwrap();
        let terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        Dashboard::new(
            terminal,
            Collector::new(store),
            fixed(),
            events.into(),
            filter,
            &Config::default(),
        )
    }

    fn screen_lines(d: &Dashboard<TestBackend, FixedMetrics, VecDeque<Event>>) -> Vec<String> {
        let buffer = d.terminal().backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect()
    }

    fn write(dir: &tempfile::TempDir, component: Component, content: &str) {
        let store = ActivityStore::new(dir.path());
        let path = store.path_for(component);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn draws_merged_timeline_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir,
            Component::Ml,
            r#"[{"time": 1000, "description": "trial 1"}, {"time": 2000, "description": "trial 2"}]"#,
        );
        let mut d = dashboard(&dir, StreamFilter::All, vec![]);
        let now = Instant::now();
        d.fetch(now).unwrap();
        d.present(now).unwrap();

        let lines = screen_lines(&d);
        assert_eq!(lines[0], "Activity Stream - all");
        assert!(lines[2].starts_with("System: CPU 10.0%"));
        assert!(lines[4].ends_with("[ml] trial 2"), "{:?}", lines[4]);
        assert!(lines[5].ends_with("[ml] trial 1"), "{:?}", lines[5]);
    }

    #[test]
    fn unchanged_cycles_skip_redraw() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, Component::Sensory, r#"[{"time": 5, "description": "touch"}]"#);
        let mut d = dashboard(&dir, StreamFilter::All, vec![]);
        let start = Instant::now();

        d.fetch(start).unwrap();
        d.present(start).unwrap();
        assert_eq!(d.redraws(), 1);

        let later = start + Duration::from_millis(600);
        d.fetch(later).unwrap();
        d.present(later).unwrap();
        assert_eq!(d.redraws(), 1);

        write(&dir, Component::Sensory, r#"[{"time": 5, "description": "touch"}, {"time": 6, "description": "smell"}]"#);
        let after = later + Duration::from_millis(600);
        d.fetch(after).unwrap();
        d.present(after).unwrap();
        assert_eq!(d.redraws(), 2);
    }

    #[test]
    fn refresh_waits_for_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dashboard(&dir, StreamFilter::All, vec![]);
        let start = Instant::now();
        d.fetch(start).unwrap();
        write(&dir, Component::Ml, r#"[{"time": 1, "description": "early"}]"#);
        d.fetch(start + Duration::from_millis(100)).unwrap();
        assert_eq!(d.state().record_count(), 0);
        d.fetch(start + Duration::from_millis(500)).unwrap();
        assert_eq!(d.state().record_count(), 1);
    }

    #[test]
    fn empty_view_shows_heartbeat_after_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dashboard(&dir, StreamFilter::Only(Component::Cognitive), vec![]);
        let start = Instant::now();
        d.fetch(start).unwrap();
        d.present(start).unwrap();
        assert!(d.heartbeat_at().is_none());
        assert!(!screen_lines(&d).iter().any(|l| l.contains(render::HEARTBEAT_TEXT)));

        let later = start + Duration::from_secs(31);
        d.fetch(later).unwrap();
        d.present(later).unwrap();
        let lines = screen_lines(&d);
        assert_eq!(lines[0], "Activity Stream - cognitive");
        assert!(lines[4].starts_with(render::HEARTBEAT_TEXT));
        assert!(!lines.iter().any(|l| l.contains("[cognitive]")));
    }

    #[test]
    fn quit_keys_stop_the_loop() {
        for code in [KeyCode::Char('q'), KeyCode::Esc] {
            let dir = tempfile::tempdir().unwrap();
            let mut d = dashboard(&dir, StreamFilter::All, vec![key(code)]);
            assert!(d.should_continue());
            d.poll_input().unwrap();
            assert!(!d.should_continue());
        }
        let dir = tempfile::tempdir().unwrap();
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        let mut d = dashboard(&dir, StreamFilter::All, vec![ctrl_c]);
        d.poll_input().unwrap();
        assert!(!d.should_continue());
    }

    #[test]
    fn clear_key_forces_redraw() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dashboard(&dir, StreamFilter::All, vec![key(KeyCode::Char('c'))]);
        let now = Instant::now();
        d.fetch(now).unwrap();
        d.present(now).unwrap();
        assert_eq!(d.redraws(), 1);

        d.poll_input().unwrap();
        assert!(d.should_continue());
        d.fetch(now).unwrap();
        d.present(now).unwrap();
        assert_eq!(d.redraws(), 2);
    }

    #[test]
    fn malformed_log_marks_stale_until_it_recovers() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, Component::Browser, "[{\"time\": ");
        let mut d = dashboard(&dir, StreamFilter::All, vec![]);
        let now = Instant::now();
        d.fetch(now).unwrap();
        d.present(now).unwrap();
        let lines = screen_lines(&d);
        assert!(lines[2].ends_with("| stale: browser"), "{:?}", lines[2]);
        assert!(!lines.iter().any(|l| l.starts_with(render::EMERGENCY_MARKER)));
        assert_eq!(d.state().record_count(), 0);

        write(&dir, Component::Browser, "[]");
        let later = now + Duration::from_secs(1);
        d.fetch(later).unwrap();
        d.present(later).unwrap();
        assert!(!screen_lines(&d)[2].contains("stale"));

        let quiet = now + Duration::from_secs(31);
        d.fetch(quiet).unwrap();
        d.present(quiet).unwrap();
        assert!(d.heartbeat_at().is_some());
        assert!(screen_lines(&d)[4].starts_with(render::HEARTBEAT_TEXT));
    }

    #[test]
    fn report_shows_notice_then_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = dashboard(&dir, StreamFilter::All, vec![]);
        d.report(&anyhow::anyhow!("terminal went away"));
        assert_eq!(screen_lines(&d)[0], "Error: terminal went away");

        let now = Instant::now();
        d.fetch(now).unwrap();
        d.present(now).unwrap();
        assert_eq!(screen_lines(&d)[0], "Activity Stream - all");
    }

    #[tokio::test]
    async fn drive_runs_until_quit_key() {
        let dir = tempfile::tempdir().unwrap();
        let events = vec![key(KeyCode::Char('x')), key(KeyCode::Char('q'))];
        let mut d = dashboard(&dir, StreamFilter::All, events);
        drive(&mut d, &tokio_util::sync::CancellationToken::new(), Duration::from_millis(1)).await;
        assert!(!d.should_continue());
        assert_eq!(d.redraws(), 1);
    }
}
