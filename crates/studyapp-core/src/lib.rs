//! # StudyApp Core Library
//!
//! Core logic for the StudyApp study tracker: a Pomodoro focus timer that
//! keeps running in the background, plus study session storage and analytics.
//! The CLI binary (and any other front end) is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a state machine over an immutable [`TimerState`]
//!   snapshot; [`PhaseClock`] decides what follows a finished phase
//! - **Timer Host**: [`TimerService`] runs each engine instance in a tokio
//!   task and accepts [`TimerCommand`]s through a non-blocking entry point
//! - **Notifications**: [`NotificationPresenter`] mirrors every tick into one
//!   persistent notification with Pause/Reset/Stop actions
//! - **Observers**: [`StateObserverBridge`] replays the current state to new
//!   subscribers and fans out updates
//! - **Storage**: SQLite study sessions and TOML configuration
//!
//! Timer state is deliberately volatile: restarting the process resets it.
//!
//! ## Composition
//!
//! ```ignore
//! let config = Config::load_or_default();
//! let bridge = StateObserverBridge::with_durations(config.durations());
//! let presenter = Arc::new(NotificationPresenter::from_config(&config.notifications, sink));
//! let timer = TimerService::new(TimerSettings::from_config(&config)?, bridge, presenter, Arc::new(LogCue))?;
//! let mut observer = timer.subscribe();
//! timer.start();
//! ```

pub mod bridge;
pub mod error;
pub mod events;
pub mod host;
pub mod notify;
pub mod stats;
pub mod storage;
pub mod timer;

pub use bridge::{StateObserver, StateObserverBridge};
pub use error::{ConfigError, CoreError, DatabaseError, NotifyError};
pub use events::Event;
pub use host::{TimerCommand, TimerService, TimerSettings};
pub use notify::{
    CompletionCue, LogCue, MemorySink, Notification, NotificationAction, NotificationChannel,
    NotificationPresenter, NotificationSink, NullSink,
};
pub use stats::{GoalProgress, StudyAnalytics};
pub use storage::{Config, Database, NewStudySession, StudySession};
pub use timer::{Phase, PhaseClock, PhaseDurations, TimerEngine, TimerState};
