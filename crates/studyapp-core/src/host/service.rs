use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::actor::{HostContext, TimerHost};
use super::command::TimerCommand;
use crate::bridge::{StateObserver, StateObserverBridge};
use crate::error::{CoreError, Result};
use crate::notify::{CompletionCue, NotificationPresenter};
use crate::storage::Config;
use crate::timer::{PhaseClock, PhaseDurations, TimerState, TICK_MS};

/// Parameters fixed for the lifetime of one engine instance.
///
/// Each tick removes [`TICK_MS`] from the countdown, so `tick_period` only
/// differs from one second in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSettings {
    pub durations: PhaseDurations,
    pub clock: PhaseClock,
    pub tick_period: Duration,
}

impl TimerSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            durations: config.durations(),
            clock: config.phase_clock()?,
            tick_period: Duration::from_millis(TICK_MS),
        })
    }
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            durations: PhaseDurations::default(),
            clock: PhaseClock::default(),
            tick_period: Duration::from_millis(TICK_MS),
        }
    }
}

#[derive(Default)]
struct Slot {
    current: Option<TimerHost>,
    /// Task of the most recently stopped instance, awaited by the next one.
    retired: Option<JoinHandle<()>>,
    next_generation: u64,
}

/// Command entry point for the Pomodoro timer.
///
/// Construct one at composition time and hand references to every consumer.
/// The current engine instance lives in a background task and keeps counting
/// with or without observers. STOP ends that instance; the next command
/// starts a fresh one with default state.
pub struct TimerService {
    runtime: Handle,
    ctx: HostContext,
    slot: Mutex<Slot>,
}

impl TimerService {
    /// Must be called from within a tokio runtime.
    pub fn new(
        settings: TimerSettings,
        bridge: StateObserverBridge,
        presenter: Arc<NotificationPresenter>,
        cue: Arc<dyn CompletionCue>,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| CoreError::Runtime(e.to_string()))?;
        Ok(Self {
            runtime,
            ctx: HostContext {
                bridge,
                presenter,
                cue,
                durations: settings.durations,
                clock: settings.clock,
                tick_period: settings.tick_period,
            },
            slot: Mutex::new(Slot::default()),
        })
    }

    /// Enqueue `cmd` and return immediately.
    ///
    /// Commands are applied in delivery order. Never fails: a command for a
    /// stopped instance starts a new one, and STOP without an instance is
    /// ignored.
    pub fn dispatch(&self, cmd: TimerCommand) {
        let mut slot = self.lock_slot();

        if cmd == TimerCommand::Stop {
            match slot.current.take() {
                Some(host) => {
                    debug!(generation = host.generation(), "stopping timer instance");
                    let _ = host.send(TimerCommand::Stop);
                    slot.retired = Some(host.into_task());
                }
                None => debug!("stop ignored: no timer instance"),
            }
            return;
        }

        if slot.current.as_ref().is_some_and(TimerHost::is_closed) {
            if let Some(dead) = slot.current.take() {
                warn!(generation = dead.generation(), "timer instance exited unexpectedly");
                slot.retired = Some(dead.into_task());
            }
        }

        let host = self.ensure_host(&mut slot);
        if let Err(cmd) = host.send(cmd) {
            // Lost the race with an exiting task: re-deliver to a fresh one.
            if let Some(dead) = slot.current.take() {
                slot.retired = Some(dead.into_task());
            }
            let host = self.ensure_host(&mut slot);
            if host.send(cmd).is_err() {
                warn!(%cmd, "timer command dropped");
            }
        }
    }

    pub fn start(&self) {
        self.dispatch(TimerCommand::Start);
    }

    pub fn pause(&self) {
        self.dispatch(TimerCommand::Pause);
    }

    pub fn reset(&self) {
        self.dispatch(TimerCommand::Reset);
    }

    pub fn stop(&self) {
        self.dispatch(TimerCommand::Stop);
    }

    /// Whether an engine instance is alive.
    pub fn is_active(&self) -> bool {
        self.lock_slot().current.as_ref().is_some_and(|host| !host.is_closed())
    }

    pub fn subscribe(&self) -> StateObserver {
        self.ctx.bridge.subscribe()
    }

    pub fn current_state(&self) -> TimerState {
        self.ctx.bridge.current()
    }

    pub fn bridge(&self) -> &StateObserverBridge {
        &self.ctx.bridge
    }

    pub fn presenter(&self) -> &NotificationPresenter {
        &self.ctx.presenter
    }

    /// Stop the current instance and wait until it has released everything.
    pub async fn shutdown(&self) {
        let (current, retired) = {
            let mut slot = self.lock_slot();
            (slot.current.take(), slot.retired.take())
        };
        if let Some(host) = current {
            let _ = host.send(TimerCommand::Stop);
            if let Err(e) = host.into_task().await {
                warn!(error = %e, "timer instance ended abnormally");
            }
        }
        if let Some(task) = retired {
            let _ = task.await;
        }
    }

    fn ensure_host<'a>(&self, slot: &'a mut Slot) -> &'a TimerHost {
        let Slot {
            current,
            retired,
            next_generation,
        } = slot;
        current.get_or_insert_with(|| {
            *next_generation += 1;
            debug!(generation = *next_generation, "spawning timer instance");
            TimerHost::spawn(&self.runtime, self.ctx.clone(), *next_generation, retired.take())
        })
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for TimerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerService")
            .field("active", &self.is_active())
            .field("state", &self.current_state())
            .finish()
    }
}
