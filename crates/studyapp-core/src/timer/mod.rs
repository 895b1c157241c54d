mod engine;
mod phase;
mod state;

pub use engine::{TimerEngine, TICK_MS};
pub use phase::{Phase, PhaseClock, PhaseDurations, PhaseOutcome, DEFAULT_LONG_BREAK_INTERVAL};
pub use state::{format_mm_ss, TimerState};
