//! The polling driver shared by the dashboard and tail modes.
//!
//! Both modes run the same single-threaded loop: fetch, present, check input,
//! pause. A failed iteration is reported and followed by a backoff, never
//! propagated. The loop ends when the strategy says so or on Ctrl-C.

pub mod dashboard;
pub mod tail;

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

pub trait PollLoop {
    /// Gather this iteration's data.
    fn fetch(&mut self, now: Instant) -> anyhow::Result<()>;

    /// Show whatever `fetch` produced.
    fn present(&mut self, now: Instant) -> anyhow::Result<()>;

    /// Bounded wait for user input. Must not block longer than the refresh cadence.
    fn poll_input(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn should_continue(&self) -> bool;

    /// Sleep between iterations.
    fn pause(&self) -> Duration;

    /// Surface a failed iteration to the user as a one-line notice.
    fn report(&mut self, err: &anyhow::Error);
}

fn cycle<L: PollLoop>(poll: &mut L, now: Instant) -> anyhow::Result<()> {
    poll.fetch(now)?;
    poll.present(now)?;
    poll.poll_input()
}

pub async fn drive<L: PollLoop>(poll: &mut L, cancel: &CancellationToken, backoff: Duration) {
    let mut iterations: u64 = 0;
    while poll.should_continue() && !cancel.is_cancelled() {
        let wait = match cycle(poll, Instant::now()) {
            Ok(()) => poll.pause(),
            Err(e) => {
                tracing::warn!(error = %e, "poll iteration failed");
                poll.report(&e);
                backoff
            }
        };
        iterations += 1;

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }
    }
    tracing::debug!(iterations, "poll loop stopped");
}

/// A token cancelled by the first Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            watcher.cancel();
        }
    });
    cancel
}
