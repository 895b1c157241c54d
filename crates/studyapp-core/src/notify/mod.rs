//! Persistent timer notification.
//!
//! The platform notification service sits behind [`NotificationSink`]; the
//! [`NotificationPresenter`] turns timer snapshots into notifications and
//! owns the single timer slot.

mod cue;
mod presenter;

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;
use crate::host::TimerCommand;

pub use cue::{CompletionCue, LogCue};
pub use presenter::{NotificationPresenter, TIMER_NOTIFICATION_ID};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
}

/// A button embedded in the notification. Tapping it delivers `command`
/// back to the timer service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub label: String,
    pub command: TimerCommand,
}

impl NotificationAction {
    /// Payload string the platform hands back on tap.
    pub fn payload(&self) -> String {
        self.command.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub channel_id: String,
    pub title: String,
    pub body: String,
    pub ongoing: bool,
    pub actions: Vec<NotificationAction>,
}

/// Platform notification service.
pub trait NotificationSink: Send + Sync {
    fn create_channel(&self, channel: &NotificationChannel) -> Result<(), NotifyError>;
    fn show(&self, id: u32, notification: &Notification) -> Result<(), NotifyError>;
    fn cancel(&self, id: u32) -> Result<(), NotifyError>;
}

/// Sink for hosts without a notification platform.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn create_channel(&self, _channel: &NotificationChannel) -> Result<(), NotifyError> {
        Ok(())
    }

    fn show(&self, _id: u32, _notification: &Notification) -> Result<(), NotifyError> {
        Ok(())
    }

    fn cancel(&self, _id: u32) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryLog {
    channels: Vec<NotificationChannel>,
    shown: Vec<(u32, Notification)>,
    cancelled: Vec<u32>,
}

/// Records everything it is asked to display. Clones share one log.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    log: Arc<Mutex<MemoryLog>>,
    deny: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that behaves like a platform with notifications disabled.
    pub fn denying() -> Self {
        Self {
            deny: true,
            ..Self::default()
        }
    }

    pub fn channels(&self) -> Vec<NotificationChannel> {
        self.with_log(|log| log.channels.clone())
    }

    pub fn shown(&self) -> Vec<Notification> {
        self.with_log(|log| log.shown.iter().map(|(_, n)| n.clone()).collect())
    }

    pub fn last_shown(&self) -> Option<Notification> {
        self.with_log(|log| log.shown.last().map(|(_, n)| n.clone()))
    }

    pub fn cancelled(&self) -> Vec<u32> {
        self.with_log(|log| log.cancelled.clone())
    }

    fn with_log<T>(&self, f: impl FnOnce(&mut MemoryLog) -> T) -> T {
        let mut guard = self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

impl NotificationSink for MemorySink {
    fn create_channel(&self, channel: &NotificationChannel) -> Result<(), NotifyError> {
        self.with_log(|log| log.channels.push(channel.clone()));
        Ok(())
    }

    fn show(&self, id: u32, notification: &Notification) -> Result<(), NotifyError> {
        if self.deny {
            return Err(NotifyError::PermissionDenied);
        }
        self.with_log(|log| log.shown.push((id, notification.clone())));
        Ok(())
    }

    fn cancel(&self, id: u32) -> Result<(), NotifyError> {
        self.with_log(|log| log.cancelled.push(id));
        Ok(())
    }
}
