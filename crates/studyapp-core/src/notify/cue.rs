use tracing::info;

use crate::timer::Phase;

/// Audible/haptic signal fired when a phase runs out.
pub trait CompletionCue: Send + Sync {
    fn phase_completed(&self, finished: Phase, next: Phase);
}

/// Cue that only writes a log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCue;

impl CompletionCue for LogCue {
    fn phase_completed(&self, finished: Phase, next: Phase) {
        info!(?finished, ?next, "phase completed");
    }
}
