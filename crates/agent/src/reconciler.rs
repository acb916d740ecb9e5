//! Turns a parsed event into a calendar task.

use std::sync::Arc;

use greenbible_core::error::StoreError;
use greenbible_core::store::TaskStore;
use greenbible_core::task::Task;
use tracing::{info, warn};

use crate::parser::ParsedReply;
use crate::prompt::{long_date_label, short_time_label};

/// What happened to the event of one reply.
#[derive(Debug)]
pub enum Reconciliation {
    /// The reply carried no schedulable event. The store was not touched.
    NoEvent,

    /// A task was created; `message` confirms it to the user.
    Scheduled { task: Task, message: String },

    /// The store refused the task; `message` apologizes to the user.
    Failed { error: StoreError, message: String },
}

impl Reconciliation {
    /// The chat message to show, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Reconciliation::NoEvent => None,
            Reconciliation::Scheduled { message, .. } | Reconciliation::Failed { message, .. } => {
                Some(message)
            }
        }
    }
}

/// Schedules parsed events on the task store. No retries.
#[derive(Clone)]
pub struct TaskReconciler {
    store: Arc<dyn TaskStore>,
}

impl TaskReconciler {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub async fn reconcile(&self, parsed: &ParsedReply, raw_reply: &str) -> Reconciliation {
        let Some(at) = parsed.event_at else {
            info!(
                raw = %raw_reply,
                title = %parsed.event_title,
                at = "none",
                rule = parsed.matched_rule.unwrap_or("none"),
                "No event in reply"
            );
            return Reconciliation::NoEvent;
        };

        match self.store.append(&parsed.event_title, at).await {
            Ok(task) => {
                info!(
                    raw = %raw_reply,
                    title = %parsed.event_title,
                    at = %at.to_rfc3339(),
                    task_id = %task.id,
                    "Event scheduled"
                );
                let message = format!(
                    "Added \"{}\" to your calendar on {} at {}.",
                    parsed.event_title,
                    long_date_label(&at),
                    short_time_label(&at)
                );
                Reconciliation::Scheduled { task, message }
            }
            Err(error) => {
                warn!(
                    raw = %raw_reply,
                    title = %parsed.event_title,
                    at = %at.to_rfc3339(),
                    error = %error,
                    "Failed to schedule event"
                );
                let message = format!(
                    "Sorry, I couldn't add \"{}\" to your calendar. Please try adding it manually.",
                    parsed.event_title
                );
                Reconciliation::Failed { error, message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::RecordingTaskStore;
    use chrono::{Local, TimeZone};

    fn parsed_with_event() -> ParsedReply {
        ParsedReply {
            answer_text: "Prune in the evening.".into(),
            event_title: "Prune roses".into(),
            event_at: Local.with_ymd_and_hms(2024, 6, 2, 17, 0, 0).earliest(),
            matched_rule: Some("event_angle"),
        }
    }

    #[tokio::test]
    async fn scheduled_event_is_confirmed() {
        let store = Arc::new(RecordingTaskStore::new());
        let reconciler = TaskReconciler::new(store.clone());

        let outcome = reconciler.reconcile(&parsed_with_event(), "raw").await;
        match &outcome {
            Reconciliation::Scheduled { task, message } => {
                assert_eq!(task.text, "Prune roses");
                assert_eq!(
                    message,
                    "Added \"Prune roses\" to your calendar on Sunday, June 2 at 5:00 PM."
                );
            }
            other => panic!("expected Scheduled, got {other:?}"),
        }
        assert_eq!(store.appends().len(), 1);
    }

    #[tokio::test]
    async fn no_event_leaves_store_untouched() {
        let store = Arc::new(RecordingTaskStore::new());
        let reconciler = TaskReconciler::new(store.clone());
        let parsed = ParsedReply {
            event_at: None,
            ..parsed_with_event()
        };

        let outcome = reconciler.reconcile(&parsed, "raw").await;
        assert!(matches!(outcome, Reconciliation::NoEvent));
        assert!(outcome.message().is_none());
        assert!(store.appends().is_empty());
    }

    #[tokio::test]
    async fn store_failure_yields_apology() {
        let store = Arc::new(RecordingTaskStore::failing());
        let reconciler = TaskReconciler::new(store.clone());

        let outcome = reconciler.reconcile(&parsed_with_event(), "raw").await;
        assert!(matches!(outcome, Reconciliation::Failed { .. }));
        assert!(outcome.message().unwrap().contains("couldn't add \"Prune roses\""));
        assert_eq!(store.appends().len(), 1);
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn no_event_log_records_missing_instant() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let parsed = ParsedReply {
            event_at: None,
            ..parsed_with_event()
        };
        let outcome = TaskReconciler::new(Arc::new(RecordingTaskStore::new()))
            .reconcile(&parsed, "answer:Prune later. event:<{Prune roses, someday}>")
            .await;
        assert!(matches!(outcome, Reconciliation::NoEvent));

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        let line = output
            .lines()
            .find(|l| l.contains("No event in reply"))
            .expect("no-event log line");
        assert!(line.contains("at=\"none\"") || line.contains("at=none"), "{line}");
        assert!(line.contains("rule=\"event_angle\"") || line.contains("rule=event_angle"), "{line}");
    }
}
