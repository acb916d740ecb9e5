//! Persistence for GreenBible: key-value backends, chat history, and tasks.

pub mod file_kv;
pub mod history;
pub mod in_memory;
pub mod tasks;

pub use file_kv::FileKvStore;
pub use history::{trim_history, HistoryStore, HISTORY_KEY, HISTORY_LIMIT_KEY};
pub use in_memory::InMemoryKv;
pub use tasks::{KvTaskStore, TASKS_KEY};
