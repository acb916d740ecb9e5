//! # GreenBible Core
//!
//! Domain types, collaborator traits, and error definitions for the
//! GreenBible gardening assistant. This crate has **zero framework
//! dependencies**; it defines the domain model that the other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator of the chat pipeline is a trait here:
//! - [`LanguageModel`]: the generative-language gateway
//! - [`TaskStore`]: persisted calendar tasks
//! - [`KeyValueStore`]: string blob persistence
//! - [`LocationProvider`]: free-text location context
//!
//! Implementations live in their respective crates, so the pipeline can be
//! exercised with scripted stand-ins in tests.

pub mod error;
pub mod event;
pub mod location;
pub mod message;
pub mod model;
pub mod store;
pub mod task;

// Re-export key types at crate root for ergonomics
pub use error::{GatewayError, StoreError};
pub use event::{TaskEvent, TaskEventBus, TaskSubscription};
pub use location::{LocationProvider, LocationSummary};
pub use message::{ChatMessage, HistoryLimit, Role};
pub use model::LanguageModel;
pub use store::{KeyValueStore, TaskStore};
pub use task::{Reminder, Task};
