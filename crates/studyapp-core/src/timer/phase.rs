//! Pomodoro phases and the pure transition rule between them.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use super::state::TimerState;

/// Focus sessions between two long breaks unless configured otherwise.
pub const DEFAULT_LONG_BREAK_INTERVAL: NonZeroU32 = match NonZeroU32::new(4) {
    Some(n) => n,
    None => unreachable!(),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Focus,
    ShortBreak,
    LongBreak,
}

impl Phase {
    /// Human-readable label shown in notifications and the CLI.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Focus => "Focus time",
            Phase::ShortBreak => "Short break",
            Phase::LongBreak => "Long break",
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, Phase::Focus)
    }
}

/// Configured phase lengths in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub focus_ms: u64,
    pub short_break_ms: u64,
    pub long_break_ms: u64,
}

impl PhaseDurations {
    pub fn from_minutes(focus: u64, short_break: u64, long_break: u64) -> Self {
        Self {
            focus_ms: minutes_to_ms(focus),
            short_break_ms: minutes_to_ms(short_break),
            long_break_ms: minutes_to_ms(long_break),
        }
    }

    pub fn from_secs(focus: u64, short_break: u64, long_break: u64) -> Self {
        Self {
            focus_ms: focus.saturating_mul(1000),
            short_break_ms: short_break.saturating_mul(1000),
            long_break_ms: long_break.saturating_mul(1000),
        }
    }

    pub fn duration_of(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Focus => self.focus_ms,
            Phase::ShortBreak => self.short_break_ms,
            Phase::LongBreak => self.long_break_ms,
        }
    }
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self::from_minutes(25, 5, 15)
    }
}

fn minutes_to_ms(min: u64) -> u64 {
    min.saturating_mul(60).saturating_mul(1000)
}

/// Result of a phase reaching zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseOutcome {
    pub phase: Phase,
    pub duration_ms: u64,
    pub completed_focus_sessions: u32,
}

/// Decides what follows a completed phase. No I/O, no clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseClock {
    long_break_interval: NonZeroU32,
}

impl PhaseClock {
    pub fn new(long_break_interval: NonZeroU32) -> Self {
        Self { long_break_interval }
    }

    pub fn long_break_interval(&self) -> NonZeroU32 {
        self.long_break_interval
    }

    /// Outcome of `current`'s phase completing.
    ///
    /// A finished focus phase bumps the session count and picks a long break
    /// when the new count is a multiple of the interval. A finished break
    /// always returns to focus with the count untouched.
    pub fn next_phase(&self, current: &TimerState) -> PhaseOutcome {
        let durations = current.durations;
        match current.phase {
            Phase::Focus => {
                let completed = current.completed_focus_sessions.saturating_add(1);
                let phase = if completed % self.long_break_interval.get() == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                };
                PhaseOutcome {
                    phase,
                    duration_ms: durations.duration_of(phase),
                    completed_focus_sessions: completed,
                }
            }
            Phase::ShortBreak | Phase::LongBreak => PhaseOutcome {
                phase: Phase::Focus,
                duration_ms: durations.focus_ms,
                completed_focus_sessions: current.completed_focus_sessions,
            },
        }
    }
}

impl Default for PhaseClock {
    fn default() -> Self {
        Self::new(DEFAULT_LONG_BREAK_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn focus_state(completed: u32) -> TimerState {
        TimerState {
            time_left_ms: 0,
            is_running: true,
            phase: Phase::Focus,
            completed_focus_sessions: completed,
            durations: PhaseDurations::default(),
        }
    }

    #[test]
    fn focus_completion_selects_long_break_every_fourth_session() {
        let clock = PhaseClock::default();
        for n in 1..=8u32 {
            let outcome = clock.next_phase(&focus_state(n - 1));
            assert_eq!(outcome.completed_focus_sessions, n);
            let expected = if n % 4 == 0 { Phase::LongBreak } else { Phase::ShortBreak };
            assert_eq!(outcome.phase, expected, "after {n} focus sessions");
            assert_eq!(
                outcome.duration_ms,
                PhaseDurations::default().duration_of(expected)
            );
        }
    }

    #[test]
    fn break_completion_returns_to_focus_without_counting() {
        let clock = PhaseClock::default();
        for phase in [Phase::ShortBreak, Phase::LongBreak] {
            let state = TimerState {
                phase,
                ..focus_state(3)
            };
            let outcome = clock.next_phase(&state);
            assert_eq!(outcome.phase, Phase::Focus);
            assert_eq!(outcome.completed_focus_sessions, 3);
            assert_eq!(outcome.duration_ms, 25 * 60 * 1000);
        }
    }

    #[test]
    fn custom_interval_is_respected() {
        let clock = PhaseClock::new(NonZeroU32::new(2).unwrap());
        assert_eq!(clock.next_phase(&focus_state(0)).phase, Phase::ShortBreak);
        assert_eq!(clock.next_phase(&focus_state(1)).phase, Phase::LongBreak);
    }

    #[test]
    fn labels() {
        assert_eq!(Phase::Focus.label(), "Focus time");
        assert_eq!(Phase::ShortBreak.label(), "Short break");
        assert_eq!(Phase::LongBreak.label(), "Long break");
        assert!(Phase::LongBreak.is_break());
        assert!(!Phase::Focus.is_break());
    }

    proptest! {
        #[test]
        fn long_break_iff_count_divisible(completed in 0u32..10_000, interval in 1u32..12) {
            let clock = PhaseClock::new(NonZeroU32::new(interval).unwrap());
            let outcome = clock.next_phase(&focus_state(completed));
            prop_assert_eq!(outcome.completed_focus_sessions, completed + 1);
            prop_assert_eq!(
                outcome.phase == Phase::LongBreak,
                (completed + 1) % interval == 0
            );
        }
    }
}
