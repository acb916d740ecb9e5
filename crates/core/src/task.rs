//! Calendar task and reminder types.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Minutes-before-due offsets at which reminders fire.
pub const REMINDER_OFFSETS_MINUTES: [i64; 2] = [5, 1];

/// A calendar task, created by the user or on behalf of a parsed AI event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID
    pub id: String,

    /// What to do
    pub text: String,

    /// Calendar date, serialized as `YYYY-MM-DD`
    pub date: NaiveDate,

    /// Optional clock time, serialized as `HH:MM`
    #[serde(default, with = "hhmm", skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,

    /// Last modification
    pub updated: DateTime<Utc>,
}

impl Task {
    /// The due wall-clock time, if the task has a time of day.
    pub fn due_at(&self) -> Option<NaiveDateTime> {
        self.time.map(|t| self.date.and_time(t))
    }

    /// Ordering key: date then time, untimed tasks at midnight.
    pub fn sort_key(&self) -> NaiveDateTime {
        self.date.and_time(self.time.unwrap_or(NaiveTime::MIN))
    }

    /// Plan the reminders for this task that still lie in the future.
    pub fn reminders(&self, now: NaiveDateTime) -> Vec<Reminder> {
        let Some(due) = self.due_at() else {
            return Vec::new();
        };

        REMINDER_OFFSETS_MINUTES
            .iter()
            .map(|&minutes| Reminder {
                task_id: self.id.clone(),
                trigger_at: due - Duration::minutes(minutes),
                minutes_before: minutes,
                title: if minutes > 1 {
                    "Task starting soon".into()
                } else {
                    "Task about to start".into()
                },
                message: format!(
                    "{} in {} minute{}",
                    self.text,
                    minutes,
                    if minutes == 1 { "" } else { "s" }
                ),
            })
            .filter(|r| r.trigger_at > now)
            .collect()
    }
}

/// A planned reminder notification for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub task_id: String,
    pub trigger_at: NaiveDateTime,
    pub minutes_before: i64,
    pub title: String,
    pub message: String,
}

/// `Option<NaiveTime>` as `HH:MM`; reads `HH:MM:SS` too.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => s.serialize_str(&t.format("%H:%M").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.as_deref().and_then(super::parse_clock_time))
    }
}

/// Parse a clock time written as `HH:MM` or `HH:MM:SS`. Empty → `None`.
pub fn parse_clock_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(time: Option<&str>) -> Task {
        Task {
            id: "task-1".into(),
            text: "Water tomatoes".into(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            time: time.and_then(parse_clock_time),
            updated: Utc::now(),
        }
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn time_serializes_as_hours_and_minutes() {
        let json = serde_json::to_string(&task(Some("07:30"))).unwrap();
        assert!(json.contains(r#""date":"2024-06-01""#));
        assert!(json.contains(r#""time":"07:30""#));
    }

    #[test]
    fn time_with_seconds_is_accepted() {
        let json = r#"{"id":"t","text":"Mulch","date":"2024-06-01","time":"09:00:00","updated":"2024-05-01T00:00:00Z"}"#;
        let parsed: Task = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.time, NaiveTime::from_hms_opt(9, 0, 0));
    }

    #[test]
    fn untimed_task_has_no_reminders() {
        assert!(task(None).reminders(at(0, 0)).is_empty());
        assert_eq!(task(None).sort_key(), at(0, 0));
    }

    #[test]
    fn reminders_fire_five_and_one_minute_before() {
        let reminders = task(Some("07:30")).reminders(at(6, 0));
        assert_eq!(reminders.len(), 2);
        assert_eq!(reminders[0].trigger_at, at(7, 25));
        assert_eq!(reminders[0].message, "Water tomatoes in 5 minutes");
        assert_eq!(reminders[1].trigger_at, at(7, 29));
        assert_eq!(reminders[1].message, "Water tomatoes in 1 minute");
    }

    #[test]
    fn past_reminders_are_skipped() {
        let reminders = task(Some("07:30")).reminders(at(7, 27));
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].minutes_before, 1);

        assert!(task(Some("07:30")).reminders(at(7, 29)).is_empty());
    }
}
