use serde::Serialize;
use studyapp_core::{Config, Database, GoalProgress, StudyAnalytics};

#[derive(Serialize)]
struct StatsReport {
    #[serde(flatten)]
    analytics: StudyAnalytics,
    today_minutes: u64,
    weekly_goal: GoalProgress,
}

pub fn run(subject: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let sessions = match subject {
        Some(subject) => db.query_by_subject(&subject)?,
        None => db.query_all()?,
    };

    let analytics = StudyAnalytics::from_sessions(&sessions);
    let report = StatsReport {
        weekly_goal: analytics.goal_progress(config.goals.weekly_minutes),
        today_minutes: db.today_study_minutes()?,
        analytics,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
