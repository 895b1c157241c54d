use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::{debug, info, warn};

use super::{Notification, NotificationAction, NotificationChannel, NotificationSink};
use crate::host::TimerCommand;
use crate::storage::NotificationsConfig;
use crate::timer::TimerState;

/// Fixed slot of the timer notification. At most one is ever visible.
pub const TIMER_NOTIFICATION_ID: u32 = 1;

/// Renders timer snapshots into the persistent notification.
///
/// Only the active timer host calls [`render`](Self::render); updates are
/// last-write-wins. Platform failures put the presenter in a degraded mode
/// that is logged once and never reaches the engine.
pub struct NotificationPresenter {
    sink: Arc<dyn NotificationSink>,
    channel: NotificationChannel,
    enabled: bool,
    channel_ready: OnceLock<bool>,
    last: Mutex<Option<Notification>>,
    degraded: AtomicBool,
}

impl NotificationPresenter {
    pub fn new(sink: Arc<dyn NotificationSink>, channel: NotificationChannel) -> Self {
        Self {
            sink,
            channel,
            enabled: true,
            channel_ready: OnceLock::new(),
            last: Mutex::new(None),
            degraded: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &NotificationsConfig, sink: Arc<dyn NotificationSink>) -> Self {
        let channel = NotificationChannel {
            id: config.channel_id.clone(),
            name: config.channel_name.clone(),
        };
        Self {
            enabled: config.enabled,
            ..Self::new(sink, channel)
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// Build the notification for `state` without displaying it.
    pub fn build(&self, state: &TimerState) -> Notification {
        let toggle = if state.is_running {
            NotificationAction {
                label: "Pause".into(),
                command: TimerCommand::Pause,
            }
        } else {
            NotificationAction {
                label: "Resume".into(),
                command: TimerCommand::Start,
            }
        };
        Notification {
            channel_id: self.channel.id.clone(),
            title: format!("Time left: {}", state.formatted()),
            body: state.phase.label().to_string(),
            ongoing: true,
            actions: vec![
                toggle,
                NotificationAction {
                    label: "Reset".into(),
                    command: TimerCommand::Reset,
                },
                NotificationAction {
                    label: "Stop".into(),
                    command: TimerCommand::Stop,
                },
            ],
        }
    }

    /// Show `state` in the timer slot.
    pub fn render(&self, state: &TimerState) {
        if !self.enabled || !self.ensure_channel() {
            return;
        }

        let notification = self.build(state);
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if last.as_ref() == Some(&notification) {
            return;
        }

        match self.sink.show(TIMER_NOTIFICATION_ID, &notification) {
            Ok(()) => {
                if self.degraded.swap(false, Ordering::Relaxed) {
                    info!("timer notification restored");
                }
                *last = Some(notification);
            }
            Err(e) => {
                if !self.degraded.swap(true, Ordering::Relaxed) {
                    warn!(error = %e, "timer notification unavailable, continuing without it");
                }
            }
        }
    }

    /// Remove the timer notification.
    pub fn dismiss(&self) {
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if last.take().is_none() {
            return;
        }
        if let Err(e) = self.sink.cancel(TIMER_NOTIFICATION_ID) {
            debug!(error = %e, "failed to cancel timer notification");
        }
    }

    /// Translate an action payload delivered by the platform.
    pub fn handle_action(&self, payload: &str) -> Option<TimerCommand> {
        match payload.parse() {
            Ok(cmd) => Some(cmd),
            Err(e) => {
                warn!(%payload, error = %e, "ignoring unknown notification action");
                None
            }
        }
    }

    fn ensure_channel(&self) -> bool {
        *self.channel_ready.get_or_init(|| match self.sink.create_channel(&self.channel) {
            Ok(()) => {
                debug!(channel = %self.channel.id, "notification channel registered");
                true
            }
            Err(e) => {
                self.degraded.store(true, Ordering::Relaxed);
                warn!(channel = %self.channel.id, error = %e, "cannot register notification channel");
                false
            }
        })
    }
}

impl std::fmt::Debug for NotificationPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationPresenter")
            .field("channel", &self.channel)
            .field("enabled", &self.enabled)
            .field("degraded", &self.is_degraded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MemorySink;
    use crate::timer::Phase;

    fn presenter(sink: &MemorySink) -> NotificationPresenter {
        NotificationPresenter::from_config(&NotificationsConfig::default(), Arc::new(sink.clone()))
    }

    #[test]
    fn renders_time_phase_and_actions() {
        let sink = MemorySink::new();
        let presenter = presenter(&sink);
        let state = TimerState {
            time_left_ms: 4 * 60 * 1000 + 7_000,
            is_running: true,
            phase: Phase::ShortBreak,
            ..TimerState::default()
        };
        presenter.render(&state);

        let shown = sink.last_shown().unwrap();
        assert_eq!(shown.title, "Time left: 04:07");
        assert_eq!(shown.body, "Short break");
        assert!(shown.ongoing);
        let labels: Vec<_> = shown.actions.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, ["Pause", "Reset", "Stop"]);
        let payloads: Vec<_> = shown.actions.iter().map(|a| a.payload()).collect();
        assert_eq!(payloads, ["pause", "reset", "stop"]);
    }

    #[test]
    fn paused_state_offers_resume() {
        let sink = MemorySink::new();
        let notification = presenter(&sink).build(&TimerState::default());
        assert_eq!(notification.actions[0].label, "Resume");
        assert_eq!(notification.actions[0].command, TimerCommand::Start);
    }

    #[test]
    fn channel_registered_once() {
        let sink = MemorySink::new();
        let presenter = presenter(&sink);
        for secs in (0..5u64).rev() {
            presenter.render(&TimerState {
                time_left_ms: secs * 1000,
                ..TimerState::default()
            });
        }
        assert_eq!(sink.channels().len(), 1);
        assert_eq!(sink.channels()[0].id, "pomodoro_channel_v1");
        assert_eq!(sink.shown().len(), 5);
    }

    #[test]
    fn identical_render_is_skipped() {
        let sink = MemorySink::new();
        let presenter = presenter(&sink);
        presenter.render(&TimerState::default());
        presenter.render(&TimerState::default());
        assert_eq!(sink.shown().len(), 1);
    }

    #[test]
    fn permission_denied_degrades_quietly() {
        let sink = MemorySink::denying();
        let presenter = presenter(&sink);
        presenter.render(&TimerState::default());
        assert!(presenter.is_degraded());
        assert!(sink.shown().is_empty());
    }

    #[test]
    fn disabled_presenter_renders_nothing() {
        let sink = MemorySink::new();
        let config = NotificationsConfig {
            enabled: false,
            ..NotificationsConfig::default()
        };
        let presenter = NotificationPresenter::from_config(&config, Arc::new(sink.clone()));
        presenter.render(&TimerState::default());
        assert!(sink.channels().is_empty());
        assert!(sink.shown().is_empty());
    }

    #[test]
    fn dismiss_cancels_fixed_slot() {
        let sink = MemorySink::new();
        let presenter = presenter(&sink);
        presenter.render(&TimerState::default());
        presenter.dismiss();
        presenter.dismiss();
        assert_eq!(sink.cancelled(), vec![TIMER_NOTIFICATION_ID]);
    }

    #[test]
    fn action_payloads_route_to_commands() {
        let presenter = presenter(&MemorySink::new());
        assert_eq!(presenter.handle_action("reset"), Some(TimerCommand::Reset));
        assert_eq!(presenter.handle_action("bogus"), None);
    }
}
