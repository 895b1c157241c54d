//! State propagation from the timer host to UI observers.
//!
//! The bridge outlives individual engine instances: it is created once at
//! composition time and handed to the [`TimerService`](crate::host::TimerService),
//! so observers stay attached across STOP and re-creation.
//!
//! Delivery is conflating. A slow observer skips intermediate snapshots but
//! never sees an older state after a newer one, and a fresh observer gets the
//! latest state immediately instead of waiting for the next tick.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::trace;

use crate::timer::{PhaseDurations, TimerState};

#[derive(Debug, Clone)]
pub struct StateObserverBridge {
    tx: Arc<watch::Sender<TimerState>>,
}

impl StateObserverBridge {
    pub fn new(initial: TimerState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn with_durations(durations: PhaseDurations) -> Self {
        Self::new(TimerState::new(durations))
    }

    /// Replace the current snapshot. Works with zero observers attached.
    pub fn publish(&self, state: TimerState) {
        trace!(?state, "publish");
        self.tx.send_replace(state);
    }

    pub fn current(&self) -> TimerState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> StateObserver {
        StateObserver {
            rx: self.tx.subscribe(),
        }
    }

    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for StateObserverBridge {
    fn default() -> Self {
        Self::new(TimerState::default())
    }
}

/// A UI-side subscription. Drop it to detach.
#[derive(Debug)]
pub struct StateObserver {
    rx: watch::Receiver<TimerState>,
}

impl StateObserver {
    /// Latest published state, marking it as seen.
    pub fn current(&mut self) -> TimerState {
        *self.rx.borrow_and_update()
    }

    /// Wait for a state newer than the last one seen.
    ///
    /// Returns `None` once every bridge handle has been dropped.
    pub async fn changed(&mut self) -> Option<TimerState> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// Wait until a published state satisfies `pred`, checking the current
    /// one first.
    pub async fn wait_for(&mut self, pred: impl FnMut(&TimerState) -> bool) -> Option<TimerState> {
        let state = self.rx.wait_for(pred).await.ok()?;
        Some(*state)
    }
}
