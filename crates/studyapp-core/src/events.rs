use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// What a timer command or tick changed.
///
/// Engine commands return `None` when they were no-ops, so an `Event` always
/// means a new `TimerState` worth publishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        time_left_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        time_left_ms: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        phase: Phase,
        time_left_ms: u64,
        at: DateTime<Utc>,
    },
    Ticked {
        time_left_ms: u64,
    },
    /// A phase ran down to zero; the engine now waits in `next`.
    PhaseCompleted {
        finished: Phase,
        next: Phase,
        completed_focus_sessions: u32,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{PhaseClock, PhaseDurations, TimerEngine};

    #[test]
    fn every_engine_event_serializes_with_its_tag() {
        let mut engine = TimerEngine::new(PhaseDurations::from_secs(1, 1, 1), PhaseClock::default());
        let events = [
            engine.start(),
            engine.pause(),
            engine.start(),
            engine.tick(),
            engine.complete_phase(),
            engine.reset(),
        ];
        let tags: Vec<String> = events
            .iter()
            .map(|e| {
                let json = serde_json::to_value(e.as_ref().unwrap()).unwrap();
                json["type"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(
            tags,
            [
                "timer_started",
                "timer_paused",
                "timer_started",
                "ticked",
                "phase_completed",
                "timer_reset",
            ]
        );
    }
}
