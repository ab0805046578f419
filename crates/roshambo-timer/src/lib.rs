//! Round deadline timer for roshambo rooms.
//!
//! Every round has a fixed time budget. A [`RoundTimer`] holds at most one
//! armed deadline, tagged with the round it belongs to. Arming replaces the
//! previous deadline, cancelling is synchronous, and firing disarms.
//!
//! # Integration
//!
//! The timer is designed to sit inside a room actor's `tokio::select!` loop,
//! next to the command channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         cmd = commands.recv() => { /* join, move, leave ... */ }
//!         expiry = timer.expired() => {
//!             room.expire(expiry.round);
//!         }
//!     }
//! }
//! ```
//!
//! Because the actor is the only thing that polls [`RoundTimer::expired`],
//! a deadline cancelled by a command handler can never fire afterwards:
//! the next loop iteration sees an unarmed timer and pends.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

/// Default time budget for one round.
pub const DEFAULT_ROUND_DURATION: Duration = Duration::from_secs(10);

/// A deadline that has passed, returned by [`RoundTimer::expired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    /// The round this deadline was armed for.
    pub round: u64,
    /// How late the wakeup was relative to the deadline.
    pub late_by: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    round: u64,
    at: Instant,
}

/// Single-shot, cancelable round deadline. One per room.
#[derive(Debug)]
pub struct RoundTimer {
    duration: Duration,
    armed: Option<Armed>,
}

impl RoundTimer {
    /// Creates an unarmed timer with the given per-round budget.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            armed: None,
        }
    }

    /// Starts the countdown for `round`, `duration` from now.
    ///
    /// Any previously armed deadline is replaced, so arming is also the way
    /// to restart the clock for the next round.
    pub fn arm(&mut self, round: u64) {
        if let Some(prev) = self.armed {
            trace!(prev_round = prev.round, round, "replacing armed deadline");
        }
        self.armed = Some(Armed {
            round,
            at: Instant::now() + self.duration,
        });
        debug!(round, budget = ?self.duration, "round deadline armed");
    }

    /// Disarms the timer. Returns the round whose deadline was cancelled,
    /// or `None` if nothing was armed.
    pub fn cancel(&mut self) -> Option<u64> {
        let cancelled = self.armed.take().map(|a| a.round);
        if let Some(round) = cancelled {
            debug!(round, "round deadline cancelled");
        }
        cancelled
    }

    /// Waits until the armed deadline passes.
    ///
    /// Pends forever while unarmed. The deadline is disarmed only after the
    /// sleep completes, so dropping this future early (another `select!`
    /// branch won) leaves the timer armed.
    pub async fn expired(&mut self) -> Expiry {
        let Some(armed) = self.armed else {
            return std::future::pending().await;
        };

        time::sleep_until(armed.at).await;

        self.armed = None;
        let late_by = Instant::now().saturating_duration_since(armed.at);
        trace!(round = armed.round, ?late_by, "round deadline fired");

        Expiry {
            round: armed.round,
            late_by,
        }
    }

    /// Whether a deadline is currently armed.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// The round the armed deadline belongs to.
    pub fn armed_round(&self) -> Option<u64> {
        self.armed.map(|a| a.round)
    }

    /// When the armed deadline fires.
    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|a| a.at)
    }

    /// Time left before the armed deadline fires.
    pub fn remaining(&self) -> Option<Duration> {
        self.armed
            .map(|a| a.at.saturating_duration_since(Instant::now()))
    }

    /// The per-round budget.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Default for RoundTimer {
    fn default() -> Self {
        Self::new(DEFAULT_ROUND_DURATION)
    }
}
