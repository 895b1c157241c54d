//! SQLite-based study session storage.
//!
//! Sessions are logged by the user and are independent of the Pomodoro
//! timer, which keeps no durable state.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{CoreError, DatabaseError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySession {
    pub id: i64,
    pub subject: String,
    pub duration_minutes: u32,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
    pub tag: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
}

/// A session that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudySession {
    pub subject: String,
    pub duration_minutes: u32,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_completed: bool,
}

impl NewStudySession {
    pub fn new(subject: impl Into<String>, duration_minutes: u32) -> Self {
        Self {
            subject: subject.into(),
            duration_minutes,
            timestamp: Utc::now(),
            notes: None,
            tag: None,
            due_date: None,
            is_completed: false,
        }
    }
}

/// SQLite database for study sessions.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/studyapp/studyapp.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("studyapp.db");
        let conn = Connection::open(&path).map_err(|source| DatabaseError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS study_sessions (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                subject          TEXT NOT NULL,
                duration_minutes INTEGER NOT NULL,
                timestamp_ms     INTEGER NOT NULL,
                notes            TEXT,
                tag              TEXT,
                due_date_ms      INTEGER,
                is_completed     INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_study_sessions_timestamp ON study_sessions(timestamp_ms);
            CREATE INDEX IF NOT EXISTS idx_study_sessions_subject ON study_sessions(subject);",
        )
    }

    /// Store a new session and return it with its id.
    pub fn insert(&self, session: &NewStudySession) -> Result<StudySession, DatabaseError> {
        self.conn.execute(
            "INSERT INTO study_sessions
                (subject, duration_minutes, timestamp_ms, notes, tag, due_date_ms, is_completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                session.subject,
                session.duration_minutes,
                session.timestamp.timestamp_millis(),
                session.notes,
                session.tag,
                session.due_date.map(|d| d.timestamp_millis()),
                session.is_completed,
            ],
        )?;
        Ok(StudySession {
            id: self.conn.last_insert_rowid(),
            subject: session.subject.clone(),
            duration_minutes: session.duration_minutes,
            timestamp: session.timestamp,
            notes: session.notes.clone(),
            tag: session.tag.clone(),
            due_date: session.due_date,
            is_completed: session.is_completed,
        })
    }

    /// Overwrite every field of an existing session.
    pub fn update(&self, session: &StudySession) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE study_sessions
             SET subject = ?2, duration_minutes = ?3, timestamp_ms = ?4, notes = ?5,
                 tag = ?6, due_date_ms = ?7, is_completed = ?8
             WHERE id = ?1",
            params![
                session.id,
                session.subject,
                session.duration_minutes,
                session.timestamp.timestamp_millis(),
                session.notes,
                session.tag,
                session.due_date.map(|d| d.timestamp_millis()),
                session.is_completed,
            ],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound(session.id));
        }
        Ok(())
    }

    pub fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let changed = self
            .conn
            .execute("DELETE FROM study_sessions WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(DatabaseError::NotFound(id));
        }
        Ok(())
    }

    pub fn get(&self, id: i64) -> Result<Option<StudySession>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_SESSIONS} WHERE id = ?1"))?;
        match stmt.query_row(params![id], session_from_row) {
            Ok(session) => Ok(Some(session)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All sessions, newest first.
    pub fn query_all(&self) -> Result<Vec<StudySession>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_SESSIONS} ORDER BY timestamp_ms DESC, id DESC"))?;
        let rows = stmt.query_map([], session_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn query_by_subject(&self, subject: &str) -> Result<Vec<StudySession>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_SESSIONS} WHERE subject = ?1 ORDER BY timestamp_ms DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![subject], session_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Minutes of completed sessions logged in `[from, until)`.
    pub fn completed_minutes_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let minutes = self.conn.query_row(
            "SELECT COALESCE(SUM(duration_minutes), 0) FROM study_sessions
             WHERE is_completed = 1 AND timestamp_ms >= ?1 AND timestamp_ms < ?2",
            params![from.timestamp_millis(), until.timestamp_millis()],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(u64::try_from(minutes).unwrap_or(0))
    }

    /// Minutes of completed sessions logged on the local calendar day.
    pub fn today_study_minutes(&self) -> Result<u64, DatabaseError> {
        let today = Local::now().date_naive();
        let tomorrow = today.succ_opt().unwrap_or(today);
        self.completed_minutes_between(local_midnight(today), local_midnight(tomorrow))
    }
}

const SELECT_SESSIONS: &str = "SELECT id, subject, duration_minutes, timestamp_ms, notes, tag, due_date_ms, is_completed
     FROM study_sessions";

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<StudySession> {
    Ok(StudySession {
        id: row.get(0)?,
        subject: row.get(1)?,
        duration_minutes: row.get(2)?,
        timestamp: from_millis(row.get(3)?),
        notes: row.get(4)?,
        tag: row.get(5)?,
        due_date: row.get::<_, Option<i64>>(6)?.map(from_millis),
        is_completed: row.get(7)?,
    })
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

fn local_midnight(day: NaiveDate) -> DateTime<Utc> {
    let naive = day.and_time(NaiveTime::MIN);
    naive
        .and_local_timezone(Local)
        .earliest()
        .map(|midnight| midnight.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}
