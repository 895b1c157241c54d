use std::io::{IsTerminal, Write};
use std::sync::Arc;

use clap::Subcommand;
use studyapp_core::{
    CompletionCue, Config, Notification, NotificationChannel, NotificationPresenter,
    NotificationSink, NotifyError, Phase, StateObserverBridge, TimerCommand, TimerService,
    TimerSettings, TimerState,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the timer, reading start/pause/reset/stop/quit from stdin
    Run {
        /// Print each state as a JSON line
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Run { json } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_interactive(json))
        }
    }
}

async fn run_interactive(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let settings = TimerSettings::from_config(&config)?;
    let bridge = StateObserverBridge::with_durations(settings.durations);
    let presenter = Arc::new(NotificationPresenter::from_config(
        &config.notifications,
        Arc::new(TerminalSink),
    ));
    let cue = Arc::new(BellCue {
        sound: config.notifications.sound,
    });
    let timer = TimerService::new(settings, bridge, presenter, cue)?;

    let mut observer = timer.subscribe();
    let printer = tokio::spawn(async move {
        print_state(&observer.current(), json);
        while let Some(state) = observer.changed().await {
            print_state(&state, json);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }
        match line.parse::<TimerCommand>() {
            Ok(cmd) => timer.dispatch(cmd),
            Err(e) => eprintln!("{e}"),
        }
    }

    timer.shutdown().await;
    drop(timer);
    printer.await?;
    Ok(())
}

fn print_state(state: &TimerState, json: bool) {
    if json {
        match serde_json::to_string(state) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("error: {e}"),
        }
    } else {
        let status = if state.is_running { "" } else { " (paused)" };
        println!(
            "{} {}{} [{} done]",
            state.formatted(),
            state.phase.label(),
            status,
            state.completed_focus_sessions
        );
    }
}

/// Shows the timer notification as a status line on stderr.
struct TerminalSink;

impl NotificationSink for TerminalSink {
    fn create_channel(&self, channel: &NotificationChannel) -> Result<(), NotifyError> {
        info!(id = %channel.id, name = %channel.name, "notification channel ready");
        Ok(())
    }

    fn show(&self, _id: u32, notification: &Notification) -> Result<(), NotifyError> {
        let mut stderr = std::io::stderr();
        if !stderr.is_terminal() {
            return Ok(());
        }
        let actions: Vec<&str> = notification.actions.iter().map(|a| a.label.as_str()).collect();
        write!(
            stderr,
            "\r\x1b[2K{} | {} [{}]",
            notification.title,
            notification.body,
            actions.join("/")
        )
        .and_then(|()| stderr.flush())
        .map_err(|e| NotifyError::Unavailable(e.to_string()))
    }

    fn cancel(&self, _id: u32) -> Result<(), NotifyError> {
        let mut stderr = std::io::stderr();
        if stderr.is_terminal() {
            write!(stderr, "\r\x1b[2K").map_err(|e| NotifyError::Unavailable(e.to_string()))?;
        }
        Ok(())
    }
}

/// Rings the terminal bell when a phase ends.
struct BellCue {
    sound: bool,
}

impl CompletionCue for BellCue {
    fn phase_completed(&self, finished: Phase, next: Phase) {
        info!(?finished, ?next, "phase completed");
        if self.sound {
            eprint!("\x07");
        }
    }
}
