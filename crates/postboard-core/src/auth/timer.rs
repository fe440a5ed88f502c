use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Armed,
    Fired,
}

/// One-shot, cancellable token expiry.
///
/// Every `arm` gets a new generation. The spawned task hands its generation
/// back to `on_fire`, and the owner calls `fire(generation)` to claim it;
/// a task that lost a race with `cancel` or a re-arm claims nothing.
#[derive(Debug)]
pub struct ExpiryTimer {
    state: TimerState,
    generation: u64,
    deadline: Option<Instant>,
    handle: Option<JoinHandle<()>>,
}

impl ExpiryTimer {
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            generation: 0,
            deadline: None,
            handle: None,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.state == TimerState::Armed
    }

    /// Time left before the armed timer fires.
    pub fn remaining(&self) -> Option<Duration> {
        match (self.state, self.deadline) {
            (TimerState::Armed, Some(deadline)) => {
                Some(deadline.saturating_duration_since(Instant::now()))
            }
            _ => None,
        }
    }

    /// Cancel any armed timer, then schedule `on_fire` after `duration`.
    /// Must be called from within a Tokio runtime.
    pub fn arm<F>(&mut self, duration: Duration, on_fire: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        self.cancel();

        self.generation += 1;
        let generation = self.generation;
        debug!(generation, secs = duration.as_secs_f64(), "Arming expiry timer");

        self.deadline = Some(Instant::now() + duration);
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            on_fire(generation);
        }));
        self.state = TimerState::Armed;
        generation
    }

    /// Claim the expiry for `generation`. True only for the current armed timer.
    pub fn fire(&mut self, generation: u64) -> bool {
        if self.state != TimerState::Armed || self.generation != generation {
            debug!(generation, current = self.generation, "Ignoring stale expiry");
            return false;
        }
        self.state = TimerState::Fired;
        self.deadline = None;
        self.handle = None;
        true
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        if self.state == TimerState::Armed {
            debug!(generation = self.generation, "Expiry timer cancelled");
            self.state = TimerState::Idle;
        }
        self.deadline = None;
    }
}

impl Default for ExpiryTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ExpiryTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
