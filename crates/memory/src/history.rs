//! Bounded chat history persisted as one JSON array blob.
//!
//! Loading is fail-soft: a missing, unreadable, or corrupt blob yields an
//! empty history, and individual malformed records are skipped.

use greenbible_core::error::StoreError;
use greenbible_core::message::{ChatMessage, HistoryLimit};
use greenbible_core::store::KeyValueStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Key holding the serialized message array.
pub const HISTORY_KEY: &str = "ai_chat_history";

/// Key holding the user-chosen history limit.
pub const HISTORY_LIMIT_KEY: &str = "ai_chat_history_limit";

/// Keep the last `limit` messages, order preserved.
pub fn trim_history(mut messages: Vec<ChatMessage>, limit: usize) -> Vec<ChatMessage> {
    if messages.len() > limit {
        messages.drain(..messages.len() - limit);
    }
    messages
}

/// Chat history on top of a key-value store.
#[derive(Clone)]
pub struct HistoryStore {
    kv: Arc<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load the persisted history, trimmed to the resolved limit.
    pub async fn load(&self, limit: Option<HistoryLimit>) -> Vec<ChatMessage> {
        let raw = match self.kv.get(HISTORY_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read chat history");
                return Vec::new();
            }
        };

        let records: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Chat history blob is corrupt, starting empty");
                return Vec::new();
            }
        };

        let messages = records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<ChatMessage>(record) {
                Ok(message) => Some(message),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed chat message");
                    None
                }
            })
            .collect();

        trim_history(messages, HistoryLimit::resolve(limit))
    }

    /// Trim and write the history. Failures are logged and returned.
    pub async fn persist(
        &self,
        messages: &[ChatMessage],
        limit: Option<HistoryLimit>,
    ) -> Result<(), StoreError> {
        let keep = HistoryLimit::resolve(limit);
        let start = messages.len().saturating_sub(keep);
        let tail = &messages[start..];

        let blob = serde_json::to_string(tail).map_err(|e| StoreError::Corrupt {
            key: HISTORY_KEY.into(),
            reason: e.to_string(),
        })?;

        if let Err(e) = self.kv.set(HISTORY_KEY, &blob).await {
            warn!(error = %e, count = tail.len(), "Failed to persist chat history");
            return Err(e);
        }

        debug!(count = tail.len(), "Chat history persisted");
        Ok(())
    }

    /// The stored limit, if one was ever saved and is readable.
    pub async fn load_limit(&self) -> Option<HistoryLimit> {
        match self.kv.get(HISTORY_LIMIT_KEY).await {
            Ok(Some(raw)) => match raw.trim().parse::<i64>() {
                Ok(value) => Some(HistoryLimit(value)),
                Err(e) => {
                    warn!(error = %e, raw = %raw, "Ignoring unreadable history limit");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read history limit");
                None
            }
        }
    }

    /// Store a new limit, then re-trim and re-persist the stored corpus.
    ///
    /// Returns the messages retained under the new limit.
    pub async fn save_limit(&self, limit: HistoryLimit) -> Result<Vec<ChatMessage>, StoreError> {
        self.kv.set(HISTORY_LIMIT_KEY, &limit.0.to_string()).await?;

        let retained = self.load(Some(limit)).await;
        self.persist(&retained, Some(limit)).await?;
        Ok(retained)
    }

    /// Remove every stored message. The limit is kept.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.kv.remove(HISTORY_KEY).await?;
        Ok(())
    }
}
