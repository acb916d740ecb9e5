//! Task change notifications.
//!
//! The task store publishes an event whenever its contents change. Views
//! that show tasks (calendar list, reminder planner) subscribe to refresh
//! without polling. The bus is owned by the store instance.

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::task::Task;

/// A change to the task store.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// A task was created
    Added(Task),

    /// A task was deleted
    Removed { id: String },
}

/// A broadcast-based bus for task events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct TaskEventBus {
    sender: broadcast::Sender<Arc<TaskEvent>>,
}

impl TaskEventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: TaskEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Start receiving events published from now on.
    pub fn subscribe(&self) -> TaskSubscription {
        TaskSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for TaskEventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

/// A live subscription to task events.
pub struct TaskSubscription {
    receiver: broadcast::Receiver<Arc<TaskEvent>>,
}

impl TaskSubscription {
    /// Wait for the next event. `None` once the bus is gone.
    ///
    /// Lagged subscribers skip the events they missed.
    pub async fn recv(&mut self) -> Option<Arc<TaskEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Task subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take an already-published event without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<TaskEvent>> {
        self.receiver.try_recv().ok()
    }

    /// Stop receiving events.
    pub fn unsubscribe(self) {}
}
