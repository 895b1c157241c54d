//! Study analytics.
//!
//! Simple folds over the logged sessions: totals, averages, the longest
//! session, tag usage, time per subject, the day streak and the current
//! week. Days are calendar days in the timezone of the reference time.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Days, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::storage::StudySession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongestSession {
    pub subject: String,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Progress towards the weekly study goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub goal_minutes: u32,
    pub weekly_minutes: u64,
    /// Capped at 100.
    pub percent: u32,
    pub reached: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyAnalytics {
    pub session_count: usize,
    pub total_minutes: u64,
    /// Integer average; 0 when there are no sessions.
    pub average_minutes: u64,
    pub longest: Option<LongestSession>,
    /// Most used first; ties ordered by tag name.
    pub tag_counts: Vec<TagCount>,
    pub minutes_per_subject: BTreeMap<String, u64>,
    /// Consecutive days with at least one session, counting back from today.
    /// Zero when nothing was logged today.
    pub current_streak: u32,
    /// Minutes logged in the current Monday-to-Sunday week.
    pub weekly_minutes: u64,
}

impl StudyAnalytics {
    /// Analytics relative to the local current time.
    pub fn from_sessions(sessions: &[StudySession]) -> Self {
        Self::from_sessions_at(sessions, Local::now())
    }

    /// Analytics relative to `now`.
    pub fn from_sessions_at<Tz: TimeZone>(sessions: &[StudySession], now: DateTime<Tz>) -> Self {
        let total_minutes: u64 = sessions.iter().map(|s| u64::from(s.duration_minutes)).sum();
        let average_minutes = match sessions.len() {
            0 => 0,
            n => total_minutes / n as u64,
        };

        let longest = sessions
            .iter()
            .reduce(|best, s| if s.duration_minutes > best.duration_minutes { s } else { best })
            .map(|s| LongestSession {
                subject: s.subject.clone(),
                duration_minutes: s.duration_minutes,
            });

        let mut tags: BTreeMap<&str, usize> = BTreeMap::new();
        for tag in sessions.iter().filter_map(|s| s.tag.as_deref()) {
            *tags.entry(tag).or_default() += 1;
        }
        let mut tag_counts: Vec<TagCount> = tags
            .into_iter()
            .map(|(tag, count)| TagCount {
                tag: tag.to_string(),
                count,
            })
            .collect();
        tag_counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));

        let mut minutes_per_subject: BTreeMap<String, u64> = BTreeMap::new();
        for s in sessions {
            *minutes_per_subject.entry(s.subject.clone()).or_default() += u64::from(s.duration_minutes);
        }

        let tz = now.timezone();
        let day_of = |s: &StudySession| s.timestamp.with_timezone(&tz).date_naive();
        let today = now.date_naive();

        let days: BTreeSet<NaiveDate> = sessions.iter().map(day_of).collect();
        let mut current_streak = 0;
        let mut day = Some(today);
        while let Some(d) = day.filter(|d| days.contains(d)) {
            current_streak += 1;
            day = d.pred_opt();
        }

        let week_start = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
        let week_end = week_start + Days::new(7);
        let weekly_minutes = sessions
            .iter()
            .filter(|&s| (week_start..week_end).contains(&day_of(s)))
            .map(|s| u64::from(s.duration_minutes))
            .sum();

        Self {
            session_count: sessions.len(),
            total_minutes,
            average_minutes,
            longest,
            tag_counts,
            minutes_per_subject,
            current_streak,
            weekly_minutes,
        }
    }

    pub fn goal_progress(&self, goal_minutes: u32) -> GoalProgress {
        let percent = match goal_minutes {
            0 => 100,
            goal => (self.weekly_minutes * 100 / u64::from(goal)).min(100) as u32,
        };
        GoalProgress {
            goal_minutes,
            weekly_minutes: self.weekly_minutes,
            percent,
            reached: self.weekly_minutes >= u64::from(goal_minutes),
        }
    }

    /// Total time as `(hours, minutes)`.
    pub fn total_hours_minutes(&self) -> (u64, u64) {
        (self.total_minutes / 60, self.total_minutes % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn session(id: i64, subject: &str, minutes: u32, tag: Option<&str>) -> StudySession {
        logged_at(id, subject, minutes, tag, Utc::now())
    }

    fn logged_at(
        id: i64,
        subject: &str,
        minutes: u32,
        tag: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> StudySession {
        StudySession {
            id,
            subject: subject.into(),
            duration_minutes: minutes,
            timestamp,
            notes: None,
            tag: tag.map(Into::into),
            due_date: None,
            is_completed: true,
        }
    }

    #[test]
    fn empty_sessions_produce_zeroes() {
        let stats = StudyAnalytics::from_sessions(&[]);
        assert_eq!(stats, StudyAnalytics::default());
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.weekly_minutes, 0);
    }

    /// Wednesday 2026-03-11, 18:00 UTC.
    fn wednesday_evening() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 11, 18, 0, 0).unwrap()
    }

    #[test]
    fn streak_counts_back_from_today_until_a_gap() {
        let now = wednesday_evening();
        let sessions = vec![
            logged_at(1, "Math", 30, None, now - Duration::hours(2)),
            logged_at(2, "Math", 10, None, now - Duration::hours(3)),
            logged_at(3, "Art", 20, None, now - Duration::days(1)),
            logged_at(4, "Art", 20, None, now - Duration::days(2)),
            // gap on day 3
            logged_at(5, "Math", 50, None, now - Duration::days(4)),
            logged_at(6, "Math", 50, None, now - Duration::days(5)),
        ];
        let stats = StudyAnalytics::from_sessions_at(&sessions, now);
        assert_eq!(stats.current_streak, 3);
    }

    #[test]
    fn streak_is_zero_without_a_session_today() {
        let now = wednesday_evening();
        let sessions = vec![
            logged_at(1, "Math", 30, None, now - Duration::days(1)),
            logged_at(2, "Math", 30, None, now - Duration::days(2)),
        ];
        let stats = StudyAnalytics::from_sessions_at(&sessions, now);
        assert_eq!(stats.current_streak, 0);
    }

    #[test]
    fn weekly_minutes_respect_the_monday_boundary() {
        let now = wednesday_evening();
        let monday_start = Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap();
        let sessions = vec![
            logged_at(1, "Math", 30, None, monday_start),
            logged_at(2, "Math", 45, None, now),
            logged_at(3, "Art", 60, None, monday_start - Duration::seconds(1)),
            logged_at(4, "Art", 15, None, Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap()),
        ];
        let stats = StudyAnalytics::from_sessions_at(&sessions, now);
        assert_eq!(stats.weekly_minutes, 75);
        assert_eq!(stats.total_minutes, 150);
    }

    #[test]
    fn days_follow_the_reference_timezone() {
        // 23:30 UTC on Tuesday is already Wednesday at UTC+2.
        let offset = chrono::FixedOffset::east_opt(2 * 3600).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 11, 9, 0, 0).unwrap().with_timezone(&offset);
        let sessions = vec![logged_at(
            1,
            "Math",
            30,
            None,
            Utc.with_ymd_and_hms(2026, 3, 10, 23, 30, 0).unwrap(),
        )];
        let stats = StudyAnalytics::from_sessions_at(&sessions, now);
        assert_eq!(stats.current_streak, 1);
    }

    #[test]
    fn goal_progress_is_capped() {
        let stats = StudyAnalytics {
            weekly_minutes: 75,
            ..StudyAnalytics::default()
        };
        let half = stats.goal_progress(150);
        assert_eq!(half.percent, 50);
        assert!(!half.reached);

        let over = stats.goal_progress(60);
        assert_eq!(over.percent, 100);
        assert!(over.reached);
    }

    #[test]
    fn folds_totals_tags_and_subjects() {
        let sessions = vec![
            session(1, "Math", 30, Some("Exam")),
            session(2, "Physics", 90, Some("Homework")),
            session(3, "Math", 45, Some("Exam")),
            session(4, "Art", 20, None),
        ];
        let stats = StudyAnalytics::from_sessions(&sessions);

        assert_eq!(stats.session_count, 4);
        assert_eq!(stats.total_minutes, 185);
        assert_eq!(stats.average_minutes, 46);
        assert_eq!(stats.total_hours_minutes(), (3, 5));
        assert_eq!(
            stats.longest,
            Some(LongestSession {
                subject: "Physics".into(),
                duration_minutes: 90
            })
        );
        assert_eq!(stats.tag_counts[0], TagCount { tag: "Exam".into(), count: 2 });
        assert_eq!(stats.tag_counts[1], TagCount { tag: "Homework".into(), count: 1 });
        assert_eq!(stats.minutes_per_subject["Math"], 75);
        assert_eq!(stats.minutes_per_subject["Art"], 20);
    }

    #[test]
    fn longest_keeps_first_on_tie() {
        let sessions = vec![session(1, "Math", 40, None), session(2, "Art", 40, None)];
        let stats = StudyAnalytics::from_sessions(&sessions);
        assert_eq!(stats.longest.unwrap().subject, "Math");
    }
}
