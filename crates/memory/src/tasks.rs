//! Calendar task store on top of a key-value blob.
//!
//! All tasks live as one JSON array under [`TASKS_KEY`]. Every mutation is a
//! read-modify-write guarded by a mutex and followed by a [`TaskEvent`].

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use greenbible_core::error::StoreError;
use greenbible_core::event::{TaskEvent, TaskEventBus, TaskSubscription};
use greenbible_core::store::{KeyValueStore, TaskStore};
use greenbible_core::task::{parse_clock_time, Task};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Key holding the serialized task array.
pub const TASKS_KEY: &str = "calendar_tasks:tasks_json";

/// A task record as found on disk. Every field is optional so that older
/// or hand-edited records can still be read.
#[derive(Debug, Deserialize)]
struct StoredTask {
    id: Option<String>,
    text: Option<String>,
    date: Option<String>,
    time: Option<String>,
    updated: Option<String>,
}

impl StoredTask {
    fn into_task(self) -> Option<Task> {
        let date = self.date.as_deref().map(str::trim).filter(|d| !d.is_empty())?;
        let date = match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            Ok(date) => date,
            Err(e) => {
                warn!(error = %e, date, "Skipping task with unreadable date");
                return None;
            }
        };

        Some(Task {
            id: self.id.filter(|id| !id.is_empty()).unwrap_or_else(new_task_id),
            text: self.text.unwrap_or_default(),
            date,
            time: self.time.as_deref().and_then(parse_clock_time),
            updated: self
                .updated
                .as_deref()
                .and_then(parse_updated)
                .unwrap_or_else(Utc::now),
        })
    }
}

fn parse_updated(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc())
                .ok()
        })
}

fn new_task_id() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("task-{}", &simple[..8])
}

fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| t.sort_key());
}

/// The calendar task store.
pub struct KvTaskStore {
    kv: Arc<dyn KeyValueStore>,
    events: TaskEventBus,
    write_lock: Mutex<()>,
}

impl KvTaskStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            events: TaskEventBus::default(),
            write_lock: Mutex::new(()),
        }
    }

    /// Subscribe to task changes.
    pub fn subscribe(&self) -> TaskSubscription {
        self.events.subscribe()
    }

    /// Add a task by hand, optionally timed.
    pub async fn add(
        &self,
        text: &str,
        date: NaiveDate,
        time: Option<NaiveTime>,
    ) -> Result<Task, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::InvalidTask("task text is empty".into()));
        }

        let task = Task {
            id: new_task_id(),
            text: text.to_string(),
            date,
            time,
            updated: Utc::now(),
        };

        let _guard = self.write_lock.lock().await;
        let mut tasks = self.load().await?;
        tasks.push(task.clone());
        self.save(tasks).await?;

        info!(id = %task.id, text = %task.text, date = %task.date, "Task added");
        self.events.publish(TaskEvent::Added(task.clone()));
        Ok(task)
    }

    async fn load(&self) -> Result<Vec<Task>, StoreError> {
        let Some(raw) = self.kv.get(TASKS_KEY).await? else {
            return Ok(Vec::new());
        };

        let records: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Task blob is corrupt, treating as empty");
                return Ok(Vec::new());
            }
        };

        Ok(records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<StoredTask>(record) {
                Ok(stored) => stored.into_task(),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed task record");
                    None
                }
            })
            .collect())
    }

    async fn save(&self, mut tasks: Vec<Task>) -> Result<(), StoreError> {
        sort_tasks(&mut tasks);
        let blob = serde_json::to_string(&tasks).map_err(|e| StoreError::Corrupt {
            key: TASKS_KEY.into(),
            reason: e.to_string(),
        })?;
        self.kv.set(TASKS_KEY, &blob).await?;
        debug!(count = tasks.len(), "Tasks persisted");
        Ok(())
    }
}

#[async_trait]
impl TaskStore for KvTaskStore {
    async fn append(&self, title: &str, at: DateTime<Local>) -> Result<Task, StoreError> {
        let time = at
            .time()
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0));
        self.add(title, at.date_naive(), time).await
    }

    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        let mut tasks = self.load().await?;
        sort_tasks(&mut tasks);
        Ok(tasks)
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tasks = self.load().await?;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Ok(false);
        }

        self.save(tasks).await?;
        info!(id, "Task removed");
        self.events.publish(TaskEvent::Removed { id: id.to_string() });
        Ok(true)
    }
}
