//! Countdown timer state and its transitions

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Default countdown duration in seconds
pub const DEFAULT_DURATION_SECONDS: u64 = 30;

/// Radius of the progress arc drawn around the clock face
pub const ARC_RADIUS: f64 = 131.0;

/// Share of the initial duration below which the clock switches to the alert colour
pub const LOW_TIME_RATIO: f64 = 0.1;

/// Result of toggling the timer between running and paused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Started,
    Paused,
    /// Nothing left to count down
    Ignored,
}

/// Result of a single one-second tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer was not running (or the tick was stale)
    Ignored,
    /// Counted down one second, still running
    Counted(u64),
    /// Reached zero; timer stopped and rewound to its initial duration
    Completed,
}

/// Countdown state owned by the timer
///
/// `remaining_seconds` never exceeds `initial_seconds`, and the timer is never
/// running with nothing left on the clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerState {
    remaining_seconds: u64,
    initial_seconds: u64,
    is_running: bool,
}

impl TimerState {
    /// Create a paused timer holding `initial_seconds`
    pub fn new(initial_seconds: u64) -> Self {
        Self {
            remaining_seconds: initial_seconds,
            initial_seconds,
            is_running: false,
        }
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn initial_seconds(&self) -> u64 {
        self.initial_seconds
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Whether start/pause is currently allowed
    pub fn can_toggle(&self) -> bool {
        self.remaining_seconds > 0
    }

    /// Flip between running and paused
    pub fn toggle(&mut self) -> Toggle {
        if !self.can_toggle() {
            return Toggle::Ignored;
        }

        self.is_running = !self.is_running;
        if self.is_running {
            Toggle::Started
        } else {
            Toggle::Paused
        }
    }

    /// Count down one second
    ///
    /// Hitting zero stops the timer and rewinds it to the initial duration in
    /// the same step, so a running timer never shows `0`.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running {
            return TickOutcome::Ignored;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.is_running = false;
            self.remaining_seconds = self.initial_seconds;
            TickOutcome::Completed
        } else {
            TickOutcome::Counted(self.remaining_seconds)
        }
    }

    /// Stop and rewind to the initial duration
    pub fn reset(&mut self) {
        self.is_running = false;
        self.remaining_seconds = self.initial_seconds;
    }

    /// Change the duration by `delta` seconds, clamped at zero
    ///
    /// Rejected while running, in which case `false` is returned.
    pub fn adjust_duration(&mut self, delta: i64) -> bool {
        if self.is_running {
            return false;
        }

        let current = i64::try_from(self.remaining_seconds).unwrap_or(i64::MAX);
        let adjusted = u64::try_from(current.saturating_add(delta).max(0)).unwrap_or(0);
        self.remaining_seconds = adjusted;
        self.initial_seconds = adjusted;
        true
    }

    /// Elapsed share of the countdown, in `[0, 1)`
    pub fn progress_fraction(&self) -> f64 {
        if self.remaining_seconds == self.initial_seconds {
            0.0
        } else {
            1.0 - self.remaining_seconds as f64 / self.initial_seconds as f64
        }
    }

    /// True once the remaining time drops to a tenth of the duration
    pub fn is_low(&self) -> bool {
        self.remaining_seconds as f64 <= self.initial_seconds as f64 * LOW_TIME_RATIO
    }

    /// Stroke offset of the progress arc
    pub fn dash_offset(&self) -> f64 {
        arc_circumference() * self.progress_fraction()
    }

    /// Remaining time as `MM:SS`
    pub fn display(&self) -> String {
        format_clock(self.remaining_seconds)
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_SECONDS)
    }
}

/// Everything the clock face needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerView {
    pub remaining_seconds: u64,
    pub initial_seconds: u64,
    pub is_running: bool,
    pub can_start: bool,
    pub display: String,
    pub progress: f64,
    pub dash_offset: f64,
    pub circumference: f64,
    pub low_time: bool,
    pub muted: bool,
}

impl TimerView {
    pub fn new(state: &TimerState, muted: bool) -> Self {
        Self {
            remaining_seconds: state.remaining_seconds(),
            initial_seconds: state.initial_seconds(),
            is_running: state.is_running(),
            can_start: state.can_toggle(),
            display: state.display(),
            progress: state.progress_fraction(),
            dash_offset: state.dash_offset(),
            circumference: arc_circumference(),
            low_time: state.is_low(),
            muted,
        }
    }
}

/// Full length of the progress arc
pub fn arc_circumference() -> f64 {
    2.0 * PI * ARC_RADIUS
}

/// Format seconds as zero-padded `MM:SS`; minutes are not wrapped into hours
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
