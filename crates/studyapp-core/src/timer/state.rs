use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::phase::{Phase, PhaseDurations};

/// One immutable snapshot of the countdown.
///
/// Observers only ever hold copies of this; the engine replaces it whole on
/// every command and tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    /// Remaining time in the current phase.
    pub time_left_ms: u64,
    pub is_running: bool,
    pub phase: Phase,
    pub completed_focus_sessions: u32,
    pub durations: PhaseDurations,
}

impl TimerState {
    /// Initial state: idle at the start of a full focus phase.
    pub fn new(durations: PhaseDurations) -> Self {
        Self {
            time_left_ms: durations.focus_ms,
            is_running: false,
            phase: Phase::Focus,
            completed_focus_sessions: 0,
            durations,
        }
    }

    pub fn time_left(&self) -> Duration {
        Duration::from_millis(self.time_left_ms)
    }

    /// Full length of the current phase.
    pub fn phase_duration_ms(&self) -> u64 {
        self.durations.duration_of(self.phase)
    }

    /// Remaining time as `MM:SS`. Minutes are not wrapped into hours.
    pub fn formatted(&self) -> String {
        format_mm_ss(self.time_left_ms)
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(PhaseDurations::default())
    }
}

pub fn format_mm_ss(ms: u64) -> String {
    let total_secs = ms / 1000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
