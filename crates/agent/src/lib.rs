//! The GreenBible chat pipeline.
//!
//! One turn runs:
//!
//! 1. **Record** the question in the bounded history
//! 2. **Build** the prompt (date, time, location, locale, recent messages)
//! 3. **Send** it to the language model; on failure show a canned tip
//! 4. **Parse** the `answer:... event:<...>` reply line
//! 5. **Schedule** the event, if any, and confirm it in the chat

pub mod fallback;
pub mod parser;
pub mod prompt;
pub mod reconciler;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use fallback::{quick_question, random_fallback, FALLBACK_TIPS, GREETING, QUICK_QUESTIONS};
pub use parser::{ParsedReply, ReplyParser};
pub use prompt::{build_prompt, PromptContext};
pub use reconciler::{Reconciliation, TaskReconciler};
pub use session::{ChatSession, Clock, SessionFlags, TurnOutcome, TurnReport, TurnState};
