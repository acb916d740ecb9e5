//! Persistence traits: key-value blobs and calendar tasks.

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::error::StoreError;
use crate::task::Task;

/// A persistent string-blob store keyed by name.
///
/// Implementations: one-file-per-key on disk, in-memory (for testing).
/// Each `set` is atomic: readers see the old blob or the new one, never a mix.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// The backend name (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    /// Read a blob. Missing keys are `Ok(None)`.
    async fn get(&self, key: &str) -> std::result::Result<Option<String>, StoreError>;

    /// Write a blob, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> std::result::Result<(), StoreError>;

    /// Delete a blob. Returns whether anything was removed.
    async fn remove(&self, key: &str) -> std::result::Result<bool, StoreError>;
}

/// The calendar task store.
///
/// The chat pipeline only appends; listing and removal serve the calendar
/// surface.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Create and persist a timed task at the given local instant.
    async fn append(&self, title: &str, at: DateTime<Local>) -> std::result::Result<Task, StoreError>;

    /// All tasks, ordered by date then time.
    async fn list(&self) -> std::result::Result<Vec<Task>, StoreError>;

    /// Remove a task by ID. Returns whether it existed.
    async fn remove(&self, id: &str) -> std::result::Result<bool, StoreError>;
}
