//! The long-lived task that owns one engine instance.
//!
//! All mutation of the instance's [`TimerState`] happens inside this task:
//! commands arrive on an unbounded mailbox and ticks come from an
//! [`Interval`] that only exists while the engine is running. Dropping the
//! interval is how pause, reset, completion and stop cancel the pending tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, info_span, warn, Instrument};

use super::command::TimerCommand;
use crate::bridge::StateObserverBridge;
use crate::events::Event;
use crate::notify::{CompletionCue, NotificationPresenter};
use crate::timer::{PhaseClock, PhaseDurations, TimerEngine, TimerState};

/// Everything an engine instance needs, shared by every generation.
#[derive(Clone)]
pub(crate) struct HostContext {
    pub(crate) bridge: StateObserverBridge,
    pub(crate) presenter: Arc<NotificationPresenter>,
    pub(crate) cue: Arc<dyn CompletionCue>,
    pub(crate) durations: PhaseDurations,
    pub(crate) clock: PhaseClock,
    pub(crate) tick_period: Duration,
}

impl HostContext {
    fn emit(&self, state: TimerState) {
        self.bridge.publish(state);
        self.presenter.render(&state);
    }
}

/// Handle to a running engine instance.
pub(crate) struct TimerHost {
    generation: u64,
    tx: mpsc::UnboundedSender<TimerCommand>,
    task: JoinHandle<()>,
}

impl TimerHost {
    /// Spawn a fresh instance. It waits for `prior` to finish before touching
    /// the bridge so states from two generations never interleave.
    pub(crate) fn spawn(
        runtime: &Handle,
        ctx: HostContext,
        generation: u64,
        prior: Option<JoinHandle<()>>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let span = info_span!("timer_host", generation);
        let task = runtime.spawn(run(ctx, rx, prior).instrument(span));
        Self {
            generation,
            tx,
            task,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Enqueue a command. Hands the command back if the task has exited.
    pub(crate) fn send(&self, cmd: TimerCommand) -> Result<(), TimerCommand> {
        self.tx.send(cmd).map_err(|e| e.0)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub(crate) fn into_task(self) -> JoinHandle<()> {
        self.task
    }
}

async fn run(
    ctx: HostContext,
    mut rx: mpsc::UnboundedReceiver<TimerCommand>,
    prior: Option<JoinHandle<()>>,
) {
    if let Some(prior) = prior {
        if let Err(e) = prior.await {
            warn!(error = %e, "previous timer instance ended abnormally");
        }
    }

    let mut engine = TimerEngine::new(ctx.durations, ctx.clock);
    let mut ticker: Option<Interval> = None;
    info!(time_left_ms = engine.snapshot().time_left_ms, "timer host started");
    ctx.emit(engine.snapshot());

    loop {
        tokio::select! {
            biased;

            cmd = rx.recv() => {
                let cmd = match cmd {
                    Some(TimerCommand::Stop) => {
                        debug!("stop requested");
                        break;
                    }
                    Some(cmd) => cmd,
                    None => {
                        debug!("command channel closed");
                        break;
                    }
                };
                debug!(%cmd, "command");
                let event = match cmd {
                    TimerCommand::Start => {
                        let event = engine.start();
                        if event.is_some() {
                            ticker = Some(new_ticker(ctx.tick_period));
                        }
                        event
                    }
                    TimerCommand::Pause => {
                        ticker = None;
                        engine.pause()
                    }
                    TimerCommand::Reset => {
                        ticker = None;
                        engine.reset()
                    }
                    TimerCommand::Stop => None,
                };
                if event.is_some() {
                    ctx.emit(engine.snapshot());
                }
            }

            _ = next_tick(&mut ticker) => {
                if engine.tick().is_none() {
                    ticker = None;
                    continue;
                }
                ctx.emit(engine.snapshot());

                if let Some(Event::PhaseCompleted { finished, next, completed_focus_sessions, .. }) =
                    engine.complete_phase()
                {
                    ticker = None;
                    info!(?finished, ?next, completed_focus_sessions, "phase completed");
                    ctx.cue.phase_completed(finished, next);
                    ctx.emit(engine.snapshot());
                }
            }
        }
    }

    drop(ticker);
    rx.close();
    let last = TimerState {
        is_running: false,
        ..engine.snapshot()
    };
    ctx.bridge.publish(last);
    ctx.presenter.dismiss();
    info!(completed_focus_sessions = last.completed_focus_sessions, "timer host stopped");
}

fn new_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
    ticker
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending().await,
    }
}
