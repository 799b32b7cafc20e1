use std::time::{Duration, Instant};

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Elapsed-interval timer for "still alive, no events" notices.
#[derive(Debug, Clone)]
pub struct Heartbeat {
    interval: Duration,
    last: Instant,
}

impl Heartbeat {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self { interval, last: now }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Real activity restarts the silence window.
    pub fn note_activity(&mut self, now: Instant) {
        self.last = now;
    }

    /// True once a full interval has passed since the last activity or beat.
    /// Firing restarts the window, so a quiet stream beats once per interval.
    pub fn due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_due_before_interval() {
        let start = Instant::now();
        let mut hb = Heartbeat::new(HEARTBEAT_INTERVAL, start);
        assert!(!hb.due(start + Duration::from_secs(29)));
    }

    #[test]
    fn fires_once_per_interval() {
        let start = Instant::now();
        let mut hb = Heartbeat::new(HEARTBEAT_INTERVAL, start);
        assert!(hb.due(start + Duration::from_secs(30)));
        assert!(!hb.due(start + Duration::from_millis(30_100)));
        assert!(!hb.due(start + Duration::from_secs(59)));
        assert!(hb.due(start + Duration::from_secs(60)));
    }

    #[test]
    fn activity_restarts_window() {
        let start = Instant::now();
        let mut hb = Heartbeat::new(HEARTBEAT_INTERVAL, start);
        hb.note_activity(start + Duration::from_secs(25));
        assert!(!hb.due(start + Duration::from_secs(40)));
        assert!(hb.due(start + Duration::from_secs(55)));
    }
}
