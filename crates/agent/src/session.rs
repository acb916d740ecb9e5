//! The chat session: one conversation, one turn in flight at a time.
//!
//! A turn walks `Idle → Sending → {Answered, Failed} → [Scheduling →
//! {Scheduled, ScheduleFailed}] → Idle`. Gateway failures become a canned
//! tip and skip scheduling. Persistence failures are logged; the in-memory
//! conversation keeps the message either way.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Local, Utc};
use greenbible_core::error::StoreError;
use greenbible_core::location::LocationProvider;
use greenbible_core::message::{ChatMessage, HistoryLimit, Role};
use greenbible_core::model::LanguageModel;
use greenbible_core::store::TaskStore;
use greenbible_memory::history::{trim_history, HistoryStore};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::fallback::{random_fallback, GREETING, LOCATION_NOTICE};
use crate::parser::{ParsedReply, ReplyParser};
use crate::prompt::{build_prompt, PromptContext, DEFAULT_CONTEXT_MESSAGES};
use crate::reconciler::{Reconciliation, TaskReconciler};

/// Source of the current local time.
pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// Where a turn is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Sending,
    Answered,
    Failed,
    Scheduling,
    Scheduled,
    ScheduleFailed,
}

/// One-time notices, scoped to this session.
#[derive(Debug, Clone, Default)]
pub struct SessionFlags {
    pub greeted: bool,
    pub location_notice_shown: bool,
}

/// Everything that happened during a completed turn.
#[derive(Debug)]
pub struct TurnReport {
    pub question: ChatMessage,
    pub answer: ChatMessage,
    /// `None` when the gateway failed and a fallback was shown.
    pub parsed: Option<ParsedReply>,
    pub reconciliation: Reconciliation,
    pub confirmation: Option<ChatMessage>,
    /// One-time notice to show alongside the answer.
    pub notice: Option<&'static str>,
    /// States visited, in order, ending with `Idle`.
    pub states: Vec<TurnState>,
    /// Whether every history write of this turn succeeded.
    pub persisted: bool,
}

/// The result of submitting input.
#[derive(Debug)]
pub enum TurnOutcome {
    Completed(Box<TurnReport>),
    /// Another turn is in flight; the input was dropped.
    Busy,
    /// The input was blank.
    EmptyInput,
}

/// Clears the in-flight flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A gardening chat session.
pub struct ChatSession {
    model: Arc<dyn LanguageModel>,
    history: HistoryStore,
    reconciler: TaskReconciler,
    location: Arc<dyn LocationProvider>,
    parser: ReplyParser,
    locale: String,
    context_messages: usize,
    clock: Clock,

    messages: Mutex<Vec<ChatMessage>>,
    limit: Mutex<Option<HistoryLimit>>,
    in_flight: AtomicBool,
    state: std::sync::Mutex<TurnState>,
    flags: std::sync::Mutex<SessionFlags>,
}

impl ChatSession {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        history: HistoryStore,
        tasks: Arc<dyn TaskStore>,
        location: Arc<dyn LocationProvider>,
    ) -> Self {
        Self {
            model,
            history,
            reconciler: TaskReconciler::new(tasks),
            location,
            parser: ReplyParser::new(),
            locale: "en-US".to_string(),
            context_messages: DEFAULT_CONTEXT_MESSAGES,
            clock: Arc::new(Local::now),
            messages: Mutex::new(Vec::new()),
            limit: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            state: std::sync::Mutex::new(TurnState::Idle),
            flags: std::sync::Mutex::new(SessionFlags::default()),
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Number of history messages rendered into each prompt.
    pub fn with_context_messages(mut self, count: usize) -> Self {
        self.context_messages = count;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Load the stored limit and history. Returns the number of messages restored.
    pub async fn restore(&self) -> usize {
        let limit = self.history.load_limit().await;
        let loaded = self.history.load(limit).await;
        let count = loaded.len();

        *self.limit.lock().await = limit;
        *self.messages.lock().await = loaded;

        debug!(count, limit = HistoryLimit::resolve(limit), "Chat history restored");
        count
    }

    /// Greeting for a fresh conversation, returned once per session.
    pub async fn greeting(&self) -> Option<&'static str> {
        let empty = self.messages.lock().await.is_empty();
        let mut flags = self.lock_flags();
        if flags.greeted || !empty {
            return None;
        }
        flags.greeted = true;
        Some(GREETING)
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.messages.lock().await.clone()
    }

    pub fn state(&self) -> TurnState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn flags(&self) -> SessionFlags {
        self.lock_flags().clone()
    }

    /// The resolved history limit in effect.
    pub async fn limit(&self) -> usize {
        HistoryLimit::resolve(*self.limit.lock().await)
    }

    /// Change the history limit. Trims memory and storage immediately.
    pub async fn set_limit(&self, limit: HistoryLimit) -> Result<usize, StoreError> {
        *self.limit.lock().await = Some(limit);

        let retained = {
            let mut messages = self.messages.lock().await;
            let trimmed = trim_history(std::mem::take(&mut *messages), HistoryLimit::resolve(Some(limit)));
            *messages = trimmed;
            messages.clone()
        };

        self.history.save_limit(limit).await?;
        self.history.persist(&retained, Some(limit)).await?;
        info!(limit = %limit, retained = retained.len(), "History limit changed");
        Ok(retained.len())
    }

    /// Forget the conversation, in memory and in storage.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.messages.lock().await.clear();
        self.history.clear().await
    }

    /// Run one turn for the given input.
    pub async fn submit(&self, input: &str) -> TurnOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!("Turn already in flight, input dropped");
            return TurnOutcome::Busy;
        };

        let question = input.trim();
        if question.is_empty() {
            return TurnOutcome::EmptyInput;
        }

        let mut states = Vec::new();
        let mut persisted = true;
        self.enter(TurnState::Sending, &mut states);

        let now = (self.clock)();
        let recent = self.messages.lock().await.clone();
        let question_msg = self.append(Role::User, question, &mut persisted).await;

        let location = self.location.summary().await;
        let notice = if location.denied {
            let mut flags = self.lock_flags();
            if flags.location_notice_shown {
                None
            } else {
                flags.location_notice_shown = true;
                Some(LOCATION_NOTICE)
            }
        } else {
            None
        };

        let prompt = build_prompt(&PromptContext {
            question,
            history: &recent,
            now,
            location: &location.text,
            locale: &self.locale,
            context_messages: self.context_messages,
        });

        let (answer_text, parsed, raw) = match self.model.send(&prompt).await {
            Ok(raw) => {
                self.enter(TurnState::Answered, &mut states);
                let parsed = self.parser.parse(&raw);
                (parsed.answer_text.clone(), Some(parsed), raw)
            }
            Err(e) => {
                warn!(model = self.model.name(), error = %e, "Model request failed, showing fallback");
                self.enter(TurnState::Failed, &mut states);
                (random_fallback().to_string(), None, String::new())
            }
        };

        let answer = self.append(Role::Assistant, &answer_text, &mut persisted).await;

        let mut reconciliation = Reconciliation::NoEvent;
        let mut confirmation = None;
        if let Some(parsed) = &parsed {
            if parsed.has_event() {
                self.enter(TurnState::Scheduling, &mut states);
            }
            reconciliation = self.reconciler.reconcile(parsed, &raw).await;
            match &reconciliation {
                Reconciliation::NoEvent => {}
                Reconciliation::Scheduled { .. } => self.enter(TurnState::Scheduled, &mut states),
                Reconciliation::Failed { .. } => self.enter(TurnState::ScheduleFailed, &mut states),
            }
            if let Some(text) = reconciliation.message().map(str::to_string) {
                confirmation = Some(self.append(Role::Assistant, &text, &mut persisted).await);
            }
        }

        self.enter(TurnState::Idle, &mut states);

        TurnOutcome::Completed(Box::new(TurnReport {
            question: question_msg,
            answer,
            parsed,
            reconciliation,
            confirmation,
            notice,
            states,
            persisted,
        }))
    }

    fn enter(&self, next: TurnState, states: &mut Vec<TurnState>) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = next;
        states.push(next);
        debug!(state = ?next, "Turn state");
    }

    fn lock_flags(&self) -> std::sync::MutexGuard<'_, SessionFlags> {
        self.flags.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a message, trim to the limit, and persist.
    async fn append(&self, role: Role, text: &str, persisted: &mut bool) -> ChatMessage {
        let limit = *self.limit.lock().await;
        let mut messages = self.messages.lock().await;

        let mut stamp: DateTime<Utc> = (self.clock)().with_timezone(&Utc);
        if let Some(last) = messages.last() {
            stamp = stamp.max(last.timestamp);
        }

        let message = ChatMessage::at(role, text, stamp);
        messages.push(message.clone());
        let trimmed = trim_history(std::mem::take(&mut *messages), HistoryLimit::resolve(limit));
        *messages = trimmed;

        if self.history.persist(&messages, limit).await.is_err() {
            *persisted = false;
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FALLBACK_TIPS;
    use crate::test_helpers::{FixedLocation, RecordingTaskStore, ScriptedModel};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use greenbible_core::location::LocationSummary;
    use greenbible_core::store::KeyValueStore;
    use greenbible_memory::in_memory::InMemoryKv;
    use tokio::sync::Notify;

    const SCHEDULING_REPLY: &str =
        "answer:Prune in the evening when it is cooler. event:<{Prune roses, 2024-06-02-17:00}>";

    fn fixed_clock() -> Clock {
        Arc::new(|| {
            Local
                .with_ymd_and_hms(2024, 6, 1, 7, 30, 0)
                .earliest()
                .unwrap()
        })
    }

    struct Harness {
        session: ChatSession,
        model: Arc<ScriptedModel>,
        tasks: Arc<RecordingTaskStore>,
        kv: Arc<InMemoryKv>,
    }

    fn harness_with(model: ScriptedModel, tasks: RecordingTaskStore, location: LocationSummary) -> Harness {
        let model = Arc::new(model);
        let tasks = Arc::new(tasks);
        let kv = Arc::new(InMemoryKv::new());
        let session = ChatSession::new(
            model.clone(),
            HistoryStore::new(kv.clone()),
            tasks.clone(),
            Arc::new(FixedLocation(location)),
        )
        .with_clock(fixed_clock());
        Harness {
            session,
            model,
            tasks,
            kv,
        }
    }

    fn harness(model: ScriptedModel) -> Harness {
        harness_with(
            model,
            RecordingTaskStore::new(),
            LocationSummary::known("Austin, Texas"),
        )
    }

    fn completed(outcome: TurnOutcome) -> TurnReport {
        match outcome {
            TurnOutcome::Completed(report) => *report,
            other => panic!("expected a completed turn, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn scheduling_turn_appends_one_task_and_confirms() {
        let h = harness(ScriptedModel::reply(SCHEDULING_REPLY));

        let report = completed(h.session.submit("remind me to prune roses tomorrow at 5pm").await);

        let appends = h.tasks.appends();
        assert_eq!(appends.len(), 1);
        assert_eq!(appends[0].0, "Prune roses");
        assert_eq!(
            appends[0].1,
            Local.with_ymd_and_hms(2024, 6, 2, 17, 0, 0).earliest().unwrap()
        );

        assert_eq!(report.answer.text, "Prune in the evening when it is cooler.");
        let confirmation = report.confirmation.expect("confirmation message");
        assert!(confirmation.text.contains("Prune roses"));
        assert_eq!(
            report.states,
            vec![
                TurnState::Sending,
                TurnState::Answered,
                TurnState::Scheduling,
                TurnState::Scheduled,
                TurnState::Idle
            ]
        );

        let messages = h.session.messages().await;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[2].text, confirmation.text);
        assert!(report.persisted);
    }

    #[tokio::test]
    async fn gateway_failure_shows_one_fallback_and_skips_scheduling() {
        let h = harness(ScriptedModel::network_error());

        let report = completed(h.session.submit("remind me to prune roses tomorrow at 5pm").await);

        assert!(FALLBACK_TIPS.contains(&report.answer.text.as_str()));
        assert!(report.parsed.is_none());
        assert!(report.confirmation.is_none());
        assert!(h.tasks.appends().is_empty());
        assert_eq!(
            report.states,
            vec![TurnState::Sending, TurnState::Failed, TurnState::Idle]
        );

        let assistant: Vec<_> = h
            .session
            .messages()
            .await
            .into_iter()
            .filter(|m| m.role == Role::Assistant)
            .collect();
        assert_eq!(assistant.len(), 1);
    }

    #[tokio::test]
    async fn store_failure_is_reported_in_chat() {
        let h = harness_with(
            ScriptedModel::reply(SCHEDULING_REPLY),
            RecordingTaskStore::failing(),
            LocationSummary::known("Austin, Texas"),
        );

        let report = completed(h.session.submit("remind me to prune roses").await);
        assert!(matches!(report.reconciliation, Reconciliation::Failed { .. }));
        assert_eq!(report.states[3], TurnState::ScheduleFailed);
        assert!(report.confirmation.unwrap().text.starts_with("Sorry"));
    }

    #[tokio::test]
    async fn plain_answer_does_not_touch_the_task_store() {
        let h = harness(ScriptedModel::reply("answer:Use compost tea. event:<NA>"));
        let report = completed(h.session.submit("How do I feed tomatoes?").await);

        assert_eq!(report.answer.text, "Use compost tea.");
        assert!(report.confirmation.is_none());
        assert!(h.tasks.appends().is_empty());
        assert_eq!(h.session.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let h = harness(ScriptedModel::new(vec![]));
        assert!(matches!(h.session.submit("   \n").await, TurnOutcome::EmptyInput));
        assert!(h.model.prompts().is_empty());
        assert!(h.session.messages().await.is_empty());
        assert!(!h.session.is_busy());
    }

    #[tokio::test]
    async fn second_submission_while_in_flight_is_busy() {
        let gate = Arc::new(Notify::new());
        let h = harness(ScriptedModel::reply("answer:Ok event:<NA>").gated(gate.clone()));
        let session = Arc::new(h.session);

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.submit("first question").await }
        });

        while !session.is_busy() {
            tokio::task::yield_now().await;
        }
        assert!(matches!(session.submit("second question").await, TurnOutcome::Busy));

        gate.notify_one();
        let report = completed(first.await.unwrap());
        assert_eq!(report.question.text, "first question");
        assert!(!session.is_busy());
        assert_eq!(h.model.prompts().len(), 1);
    }

    #[tokio::test]
    async fn prompt_history_excludes_the_current_question() {
        let h = harness(ScriptedModel::new(vec![
            Ok("answer:Early morning. event:<NA>".into()),
            Ok("answer:Twice a week. event:<NA>".into()),
        ]));

        completed(h.session.submit("When should I water?").await);
        completed(h.session.submit("How often?").await);

        let prompts = h.model.prompts();
        assert!(prompts[0].contains("none yet"));
        assert!(prompts[1].contains("user: When should I water?"));
        assert!(prompts[1].contains("assistant: Early morning."));
        assert!(!prompts[1].contains("user: How often?"));
    }

    #[tokio::test]
    async fn history_is_persisted_and_restored() {
        let h = harness(ScriptedModel::reply("answer:Mulch. event:<NA>"));
        completed(h.session.submit("Keep soil moist?").await);

        let restored = ChatSession::new(
            Arc::new(ScriptedModel::new(vec![])),
            HistoryStore::new(h.kv.clone()),
            Arc::new(RecordingTaskStore::new()),
            Arc::new(FixedLocation(LocationSummary::unknown())),
        );
        assert_eq!(restored.restore().await, 2);
        assert_eq!(restored.messages().await, h.session.messages().await);
        assert!(restored.greeting().await.is_none());
    }

    #[tokio::test]
    async fn lowering_the_limit_trims_immediately() {
        let h = harness(ScriptedModel::new(vec![
            Ok("answer:A event:<NA>".into()),
            Ok("answer:B event:<NA>".into()),
        ]));
        h.session.set_limit(HistoryLimit(10)).await.unwrap();
        completed(h.session.submit("one").await);
        completed(h.session.submit("two").await);
        assert_eq!(h.session.messages().await.len(), 4);

        assert_eq!(h.session.set_limit(HistoryLimit(1)).await.unwrap(), 1);
        let messages = h.session.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, "B");

        let stored = HistoryStore::new(h.kv.clone()).load(Some(HistoryLimit(200))).await;
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn location_notice_is_shown_once() {
        let h = harness_with(
            ScriptedModel::new(vec![
                Ok("answer:A event:<NA>".into()),
                Ok("answer:B event:<NA>".into()),
            ]),
            RecordingTaskStore::new(),
            LocationSummary::denied(),
        );

        let first = completed(h.session.submit("one").await);
        let second = completed(h.session.submit("two").await);
        assert_eq!(first.notice, Some(LOCATION_NOTICE));
        assert_eq!(second.notice, None);
        assert!(h.model.prompts()[0].contains("Location permission denied"));
    }

    #[tokio::test]
    async fn greeting_is_offered_once_for_fresh_sessions() {
        let h = harness(ScriptedModel::new(vec![]));
        assert_eq!(h.session.greeting().await, Some(GREETING));
        assert_eq!(h.session.greeting().await, None);
        assert!(h.session.flags().greeted);
    }

    struct ReadOnlyKv;

    #[async_trait]
    impl KeyValueStore for ReadOnlyKv {
        fn name(&self) -> &str {
            "read_only"
        }
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }
        async fn set(&self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Io {
                key: key.into(),
                reason: "read-only file system".into(),
            })
        }
        async fn remove(&self, _key: &str) -> Result<bool, StoreError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn persistence_failure_keeps_the_conversation_in_memory() {
        let session = ChatSession::new(
            Arc::new(ScriptedModel::reply("answer:Still here. event:<NA>")),
            HistoryStore::new(Arc::new(ReadOnlyKv)),
            Arc::new(RecordingTaskStore::new()),
            Arc::new(FixedLocation(LocationSummary::unknown())),
        )
        .with_clock(fixed_clock());

        let report = completed(session.submit("Are you there?").await);
        assert!(!report.persisted);
        assert_eq!(report.answer.text, "Still here.");
        assert_eq!(session.messages().await.len(), 2);
    }

    #[tokio::test]
    async fn timestamps_never_go_backwards_when_the_clock_does() {
        use std::sync::atomic::AtomicI64;

        let ticks = Arc::new(AtomicI64::new(0));
        let clock: Clock = {
            let ticks = ticks.clone();
            Arc::new(move || {
                let step = ticks.fetch_add(1, Ordering::SeqCst);
                Local
                    .with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
                    .earliest()
                    .unwrap()
                    - chrono::Duration::minutes(step)
            })
        };

        let kv = Arc::new(InMemoryKv::new());
        let history = HistoryStore::new(kv.clone());
        let session = ChatSession::new(
            Arc::new(ScriptedModel::reply("answer:Mulch helps. event:<NA>")),
            history.clone(),
            Arc::new(RecordingTaskStore::new()),
            Arc::new(FixedLocation(LocationSummary::unknown())),
        )
        .with_clock(clock);

        completed(session.submit("Should I mulch?").await);
        completed(session.submit("How thick?").await);

        let messages = session.messages().await;
        assert_eq!(messages.len(), 4);
        assert!(ticks.load(Ordering::SeqCst) >= 4);
        assert!(messages.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

        let stored = history.load(None).await;
        assert_eq!(stored, messages);
    }
}
