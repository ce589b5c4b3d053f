//! Periodic polling
//!
//! [`PollTask`] runs an async job on a fixed delay: immediately on start, then
//! `period` after each run completes, so runs never overlap. The returned
//! [`PollHandle`] stops the task explicitly or when dropped.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

pub struct PollTask;

impl PollTask {
    pub fn start<F, Fut>(period: Duration, mut job: F) -> PollHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            loop {
                // A closed channel also means stop
                tokio::select! {
                    _ = job() => {}
                    _ = stop_rx.changed() => break,
                }
                tokio::select! {
                    _ = tokio::time::sleep(period) => {}
                    _ = stop_rx.changed() => break,
                }
            }
            debug!("Poll task stopped");
        });

        PollHandle {
            stop: Some(stop_tx),
            task: Some(task),
        }
    }
}

/// Handle to a running [`PollTask`].
#[derive(Debug)]
pub struct PollHandle {
    stop: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Stop polling. Calling this more than once has no effect.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(true);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_none()
    }

    /// Stop and wait for an in-flight run to be cancelled.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Whole seconds until the next refresh, wrapping to the period.
///
/// A new countdown is due immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    period: u64,
    remaining: u64,
}

impl Countdown {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.as_secs().max(1),
            remaining: 0,
        }
    }

    /// Advance by one second. Returns true when a refresh is due.
    pub fn tick(&mut self) -> bool {
        self.advance(1)
    }

    /// Advance by `seconds`. Returns true when a refresh became due; the
    /// countdown then restarts from the full period.
    pub fn advance(&mut self, seconds: u64) -> bool {
        if self.remaining <= seconds {
            self.remaining = self.period;
            true
        } else {
            self.remaining -= seconds;
            false
        }
    }

    pub fn remaining(&self) -> Duration {
        Duration::from_secs(self.remaining)
    }

    /// Make the next tick due.
    pub fn reset(&mut self) {
        self.remaining = 0;
    }
}
