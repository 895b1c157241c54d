use chrono::{DateTime, NaiveDate, Utc};
use clap::Subcommand;
use studyapp_core::{Database, NewStudySession};

#[derive(Subcommand)]
pub enum SessionAction {
    /// Log a study session
    Add {
        /// Subject studied
        subject: String,
        /// Duration in minutes
        minutes: u32,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = parse_due)]
        due: Option<DateTime<Utc>>,
        /// Mark the session as completed
        #[arg(long)]
        completed: bool,
    },
    /// List sessions, newest first
    List {
        #[arg(long)]
        subject: Option<String>,
    },
    /// Update fields of a session
    Update {
        id: i64,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        minutes: Option<u32>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, value_parser = parse_due)]
        due: Option<DateTime<Utc>>,
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Delete a session
    Delete { id: i64 },
    /// Minutes of completed study today
    Today,
}

fn parse_due(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| format!("invalid date: {s}"));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid date '{s}': {e}"))
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        SessionAction::Add {
            subject,
            minutes,
            notes,
            tag,
            due,
            completed,
        } => {
            let stored = db.insert(&NewStudySession {
                notes,
                tag,
                due_date: due,
                is_completed: completed,
                ..NewStudySession::new(subject, minutes)
            })?;
            println!("{}", serde_json::to_string_pretty(&stored)?);
        }
        SessionAction::List { subject } => {
            let sessions = match subject {
                Some(subject) => db.query_by_subject(&subject)?,
                None => db.query_all()?,
            };
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        SessionAction::Update {
            id,
            subject,
            minutes,
            notes,
            tag,
            due,
            completed,
        } => {
            let mut session = db.get(id)?.ok_or_else(|| format!("session not found: {id}"))?;
            if let Some(subject) = subject {
                session.subject = subject;
            }
            if let Some(minutes) = minutes {
                session.duration_minutes = minutes;
            }
            if notes.is_some() {
                session.notes = notes;
            }
            if tag.is_some() {
                session.tag = tag;
            }
            if due.is_some() {
                session.due_date = due;
            }
            if let Some(completed) = completed {
                session.is_completed = completed;
            }
            db.update(&session)?;
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        SessionAction::Delete { id } => {
            db.delete(id)?;
            println!("deleted session {id}");
        }
        SessionAction::Today => {
            let minutes = db.today_study_minutes()?;
            println!("{}", serde_json::json!({ "today_minutes": minutes }));
        }
    }
    Ok(())
}
