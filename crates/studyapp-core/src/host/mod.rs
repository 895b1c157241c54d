//! Background hosting of the timer engine.
//!
//! [`TimerService`] is the command entry point; each engine instance runs in
//! its own tokio task (see `actor`) and talks to the outside world only
//! through the state bridge and the notification presenter.

mod actor;
mod command;
mod service;

pub use command::{ParseCommandError, TimerCommand};
pub use service::{TimerService, TimerSettings};
