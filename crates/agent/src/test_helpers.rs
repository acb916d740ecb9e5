//! Shared test doubles for the chat pipeline.

use async_trait::async_trait;
use chrono::{DateTime, Local, Timelike, Utc};
use greenbible_core::error::{GatewayError, StoreError};
use greenbible_core::location::{LocationProvider, LocationSummary};
use greenbible_core::model::LanguageModel;
use greenbible_core::store::TaskStore;
use greenbible_core::task::Task;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// A model that returns scripted replies in order.
///
/// Panics if called more often than replies were provided.
pub struct ScriptedModel {
    replies: Mutex<Vec<Result<String, GatewayError>>>,
    prompts: Mutex<Vec<String>>,
    gate: Option<std::sync::Arc<Notify>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<String, GatewayError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().rev().collect()),
            prompts: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn reply(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn network_error() -> Self {
        Self::new(vec![Err(GatewayError::Network("connection refused".into()))])
    }

    /// Block every `send` until the gate is notified.
    pub fn gated(mut self, gate: std::sync::Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send(&self, prompt: &str) -> Result<String, GatewayError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop()
            .expect("ScriptedModel: no more replies")
    }
}

/// A task store that records every append and keeps tasks in memory.
pub struct RecordingTaskStore {
    appends: Mutex<Vec<(String, DateTime<Local>)>>,
    tasks: Mutex<Vec<Task>>,
    fail: bool,
    next_id: AtomicUsize,
}

impl RecordingTaskStore {
    pub fn new() -> Self {
        Self {
            appends: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
            fail: false,
            next_id: AtomicUsize::new(1),
        }
    }

    /// A store whose appends always fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn appends(&self) -> Vec<(String, DateTime<Local>)> {
        self.appends.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskStore for RecordingTaskStore {
    async fn append(&self, title: &str, at: DateTime<Local>) -> Result<Task, StoreError> {
        self.appends.lock().unwrap().push((title.to_string(), at));
        if self.fail {
            return Err(StoreError::Io {
                key: "calendar_tasks:tasks_json".into(),
                reason: "disk full".into(),
            });
        }
        let task = Task {
            id: format!("task-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            text: title.to_string(),
            date: at.date_naive(),
            time: at.time().with_second(0),
            updated: Utc::now(),
        };
        self.tasks.lock().unwrap().push(task.clone());
        Ok(task)
    }

    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        Ok(tasks.len() != before)
    }
}

/// A location provider with a fixed answer.
pub struct FixedLocation(pub LocationSummary);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn summary(&self) -> LocationSummary {
        self.0.clone()
    }
}
