//! Tick timing: the fixed cadence and intent deadline for the scheduler.
//!
//! The tick *counter* lives in the world state and is the single source of
//! truth for simulated time. This module owns the real-time side: how long
//! a tick lasts, how far into a tick the intent deadline falls, and the
//! wall-clock stamps carried on the wire.
//!
//! All duration math is validated at construction so the scheduler never
//! has to reason about a deadline that falls outside its own tick.

use std::time::Duration;

use tokio::time::Instant;

/// Errors that can occur when building tick timing.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Invalid timing configuration (zero period, deadline past the period).
    #[error("invalid tick timing: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// The real-time cadence of the tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTiming {
    /// Full tick period in milliseconds.
    duration_ms: u64,
    /// Offset from tick start to the intent deadline, in milliseconds.
    deadline_ms: u64,
}

impl TickTiming {
    /// Build tick timing from millisecond settings.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the period is zero or the
    /// deadline offset is not strictly inside the period.
    pub fn new(duration_ms: u64, deadline_ms: u64) -> Result<Self, ClockError> {
        if duration_ms == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "tick.duration_ms must be at least 1".to_owned(),
            });
        }
        if deadline_ms == 0 || deadline_ms >= duration_ms {
            return Err(ClockError::InvalidConfig {
                reason: format!(
                    "tick.deadline_ms ({deadline_ms}) must be in 1..tick.duration_ms ({duration_ms})"
                ),
            });
        }
        Ok(Self {
            duration_ms,
            deadline_ms,
        })
    }

    /// The full tick period.
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// The tick period in milliseconds.
    pub const fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// The deadline offset in milliseconds.
    pub const fn deadline_offset_ms(&self) -> u64 {
        self.deadline_ms
    }

    /// The monotonic instant at which the intent deadline fires for a tick
    /// that started at `tick_start`.
    pub fn deadline_instant(&self, tick_start: Instant) -> Instant {
        tick_start
            .checked_add(Duration::from_millis(self.deadline_ms))
            .unwrap_or(tick_start)
    }

    /// The monotonic instant at which the next tick is due for a tick that
    /// started at `tick_start`.
    pub fn period_end(&self, tick_start: Instant) -> Instant {
        tick_start
            .checked_add(Duration::from_millis(self.duration_ms))
            .unwrap_or(tick_start)
    }
}

/// Current wall-clock time as milliseconds since the Unix epoch.
///
/// Used for lease expiry and the advisory timestamps on the wire; the
/// scheduler's own cadence runs on the monotonic clock.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
