//! Timer engine implementation.
//!
//! The engine is a plain state machine over [`TimerState`]. It owns no
//! thread and no clock: the timer host calls [`TimerEngine::tick`] once per
//! tick interval while the engine is running.
//!
//! ## State Transitions
//!
//! ```text
//! Idle(p, t) --start--> Running(p, t) --pause--> Idle(p, t)
//! any        --reset--> Idle(p, full(p))
//! Running(p, 0) --complete_phase--> Idle(p', full(p'))
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(PhaseDurations::default(), PhaseClock::default());
//! engine.start();
//! // Once per second:
//! engine.tick();
//! engine.complete_phase(); // Some(Event::PhaseCompleted) when time ran out
//! ```

use chrono::Utc;

use super::phase::{PhaseClock, PhaseDurations};
use super::state::TimerState;
use crate::events::Event;

/// Countdown consumed by one tick.
pub const TICK_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct TimerEngine {
    state: TimerState,
    clock: PhaseClock,
}

impl TimerEngine {
    /// Create an engine idle at the start of a full focus phase.
    pub fn new(durations: PhaseDurations, clock: PhaseClock) -> Self {
        Self {
            state: TimerState::new(durations),
            clock,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn snapshot(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.state.is_running {
            return None;
        }
        self.state = TimerState {
            is_running: true,
            ..self.state
        };
        Some(Event::TimerStarted {
            phase: self.state.phase,
            time_left_ms: self.state.time_left_ms,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        self.state = TimerState {
            is_running: false,
            ..self.state
        };
        Some(Event::TimerPaused {
            phase: self.state.phase,
            time_left_ms: self.state.time_left_ms,
            at: Utc::now(),
        })
    }

    /// Rewind the current phase. Phase and session count are kept.
    pub fn reset(&mut self) -> Option<Event> {
        self.state = TimerState {
            time_left_ms: self.state.phase_duration_ms(),
            is_running: false,
            ..self.state
        };
        Some(Event::TimerReset {
            phase: self.state.phase,
            time_left_ms: self.state.time_left_ms,
            at: Utc::now(),
        })
    }

    /// Count down one tick. Does nothing unless running.
    ///
    /// Reaching zero does not transition by itself; follow up with
    /// [`complete_phase`](Self::complete_phase) so the zero state can be
    /// published first.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        self.state = TimerState {
            time_left_ms: self.state.time_left_ms.saturating_sub(TICK_MS),
            ..self.state
        };
        Some(Event::Ticked {
            time_left_ms: self.state.time_left_ms,
        })
    }

    /// Move a running engine whose countdown hit zero into the next phase.
    ///
    /// The next phase starts paused and waits for an explicit `start()`.
    pub fn complete_phase(&mut self) -> Option<Event> {
        if !self.state.is_running || self.state.time_left_ms > 0 {
            return None;
        }
        let finished = self.state.phase;
        let outcome = self.clock.next_phase(&self.state);
        self.state = TimerState {
            time_left_ms: outcome.duration_ms,
            is_running: false,
            phase: outcome.phase,
            completed_focus_sessions: outcome.completed_focus_sessions,
            durations: self.state.durations,
        };
        Some(Event::PhaseCompleted {
            finished,
            next: outcome.phase,
            completed_focus_sessions: outcome.completed_focus_sessions,
            at: Utc::now(),
        })
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(PhaseDurations::default(), PhaseClock::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::Phase;
    use proptest::prelude::*;

    fn tick_once(engine: &mut TimerEngine) -> Option<Event> {
        engine.tick();
        engine.complete_phase()
    }

    fn run_phase(engine: &mut TimerEngine) -> Option<Event> {
        engine.start();
        let mut completed = None;
        while engine.is_running() {
            completed = tick_once(engine);
        }
        completed
    }

    #[test]
    fn start_pause_start() {
        let mut engine = TimerEngine::default();
        assert!(!engine.is_running());

        assert!(engine.start().is_some());
        assert!(engine.is_running());

        assert!(engine.pause().is_some());
        assert!(!engine.is_running());

        assert!(engine.start().is_some());
        assert!(engine.is_running());
    }

    #[test]
    fn start_twice_equals_start_once() {
        let mut once = TimerEngine::default();
        once.start();

        let mut twice = TimerEngine::default();
        twice.start();
        assert!(twice.start().is_none());

        assert_eq!(once.snapshot(), twice.snapshot());
    }

    #[test]
    fn pause_when_paused_leaves_state_unchanged() {
        let mut engine = TimerEngine::default();
        engine.start();
        engine.tick();
        engine.pause();
        let before = engine.snapshot();
        assert!(engine.pause().is_none());
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn tick_on_paused_engine_is_noop() {
        let mut engine = TimerEngine::default();
        let before = engine.snapshot();
        assert!(engine.tick().is_none());
        assert!(engine.complete_phase().is_none());
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn three_second_focus_completes_after_three_ticks() {
        let mut engine = TimerEngine::new(PhaseDurations::from_secs(3, 1, 2), PhaseClock::default());
        engine.start();

        assert!(tick_once(&mut engine).is_none());
        assert_eq!(engine.snapshot().time_left_ms, 2000);
        assert!(tick_once(&mut engine).is_none());
        assert_eq!(engine.snapshot().time_left_ms, 1000);

        let done = tick_once(&mut engine);
        assert!(matches!(
            done,
            Some(Event::PhaseCompleted {
                finished: Phase::Focus,
                next: Phase::ShortBreak,
                completed_focus_sessions: 1,
                ..
            })
        ));
        let state = engine.snapshot();
        assert_eq!(state.phase, Phase::ShortBreak);
        assert_eq!(state.time_left_ms, 1000);
        assert!(!state.is_running);
        assert_eq!(state.completed_focus_sessions, 1);
    }

    #[test]
    fn zero_state_is_observable_before_transition() {
        let mut engine = TimerEngine::new(PhaseDurations::from_secs(1, 1, 1), PhaseClock::default());
        engine.start();
        assert_eq!(engine.tick(), Some(Event::Ticked { time_left_ms: 0 }));
        let zero = engine.snapshot();
        assert_eq!(zero.time_left_ms, 0);
        assert_eq!(zero.phase, Phase::Focus);
        assert!(zero.is_running);
    }

    #[test]
    fn default_focus_then_short_break() {
        let mut engine = TimerEngine::default();
        run_phase(&mut engine);
        let state = engine.snapshot();
        assert_eq!(state.phase, Phase::ShortBreak);
        assert_eq!(state.time_left_ms, 5 * 60 * 1000);
        assert!(!state.is_running);
        assert_eq!(state.completed_focus_sessions, 1);
    }

    #[test]
    fn fourth_focus_completion_is_long_break() {
        let mut engine = TimerEngine::default();
        for _ in 0..3 {
            run_phase(&mut engine); // focus
            run_phase(&mut engine); // short break
        }
        run_phase(&mut engine);
        let state = engine.snapshot();
        assert_eq!(state.phase, Phase::LongBreak);
        assert_eq!(state.time_left_ms, 15 * 60 * 1000);
        assert_eq!(state.completed_focus_sessions, 4);
    }

    #[test]
    fn break_completion_does_not_count() {
        let mut engine = TimerEngine::new(PhaseDurations::from_secs(2, 2, 2), PhaseClock::default());
        run_phase(&mut engine);
        assert_eq!(engine.snapshot().completed_focus_sessions, 1);
        run_phase(&mut engine);
        let state = engine.snapshot();
        assert_eq!(state.phase, Phase::Focus);
        assert_eq!(state.completed_focus_sessions, 1);
    }

    #[test]
    fn reset_mid_countdown_restores_full_focus() {
        let mut engine = TimerEngine::default();
        engine.start();
        for _ in 0..15 * 60 {
            engine.tick();
        }
        assert_eq!(engine.snapshot().time_left_ms, 10 * 60 * 1000);

        engine.reset();
        let state = engine.snapshot();
        assert_eq!(state.phase, Phase::Focus);
        assert_eq!(state.time_left_ms, 25 * 60 * 1000);
        assert!(!state.is_running);
        assert_eq!(state.completed_focus_sessions, 0);
    }

    #[test]
    fn reset_in_break_keeps_phase_and_count() {
        let mut engine = TimerEngine::new(PhaseDurations::from_secs(1, 3, 5), PhaseClock::default());
        run_phase(&mut engine);
        engine.start();
        engine.tick();
        engine.reset();
        let state = engine.snapshot();
        assert_eq!(state.phase, Phase::ShortBreak);
        assert_eq!(state.time_left_ms, 3000);
        assert_eq!(state.completed_focus_sessions, 1);
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Start,
        Pause,
        Reset,
        Tick,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![Just(Op::Start), Just(Op::Pause), Just(Op::Reset), Just(Op::Tick)]
    }

    proptest! {
        #[test]
        fn reachable_states_keep_invariants(ops in proptest::collection::vec(op(), 0..400)) {
            let durations = PhaseDurations::from_secs(3, 2, 4);
            let mut engine = TimerEngine::new(durations, PhaseClock::default());
            let mut last_count = 0;
            for op in ops {
                match op {
                    Op::Start => { engine.start(); }
                    Op::Pause => { engine.pause(); }
                    Op::Reset => {
                        engine.reset();
                        let s = engine.snapshot();
                        prop_assert_eq!(s.time_left_ms, s.phase_duration_ms());
                        prop_assert!(!s.is_running);
                    }
                    Op::Tick => { tick_once(&mut engine); }
                }
                let s = engine.snapshot();
                prop_assert!(s.time_left_ms <= s.phase_duration_ms());
                prop_assert!(s.completed_focus_sessions >= last_count);
                prop_assert!(s.completed_focus_sessions - last_count <= 1);
                last_count = s.completed_focus_sessions;
            }
        }
    }
}
