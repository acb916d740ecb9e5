pub mod chat;
pub mod config_cmd;
pub mod history;
pub mod onboard;
pub mod status;
pub mod tasks;

use std::sync::Arc;

use greenbible_config::AppConfig;
use greenbible_memory::{FileKvStore, HistoryStore, KvTaskStore};

/// Persistent stores rooted at the configured data directory.
pub struct Stores {
    pub history: HistoryStore,
    pub tasks: Arc<KvTaskStore>,
}

impl Stores {
    pub fn open(config: &AppConfig) -> Self {
        let kv = Arc::new(FileKvStore::new(config.data_dir()));
        tracing::debug!(dir = %kv.dir().display(), "Opening stores");
        Self {
            history: HistoryStore::new(kv.clone()),
            tasks: Arc::new(KvTaskStore::new(kv)),
        }
    }
}

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load().map_err(|e| format!("Failed to load config: {e}").into())
}
