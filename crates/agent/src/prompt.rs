//! Prompt assembly.
//!
//! The prompt is a pure function of its inputs. The reply line convention it
//! asks for (`answer:... event:<...>`) is what [`crate::parser`] reads back.

use chrono::{DateTime, Local};
use greenbible_core::message::ChatMessage;

/// Default number of history messages rendered into the prompt.
pub const DEFAULT_CONTEXT_MESSAGES: usize = 5;

/// Everything the prompt is built from.
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub question: &'a str,
    /// Conversation so far, oldest first. Only the tail is rendered.
    pub history: &'a [ChatMessage],
    pub now: DateTime<Local>,
    pub location: &'a str,
    pub locale: &'a str,
    pub context_messages: usize,
}

/// `Saturday, June 1`
pub fn long_date_label(at: &DateTime<Local>) -> String {
    at.format("%A, %B %-d").to_string()
}

/// `7:30 AM`
pub fn short_time_label(at: &DateTime<Local>) -> String {
    at.format("%-I:%M %p").to_string()
}

fn render_history(history: &[ChatMessage], keep: usize) -> String {
    let start = history.len().saturating_sub(keep);
    let recent = &history[start..];
    if recent.is_empty() {
        return "none yet".to_string();
    }
    recent
        .iter()
        .map(|m| format!("{}: {}", m.role, m.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the full prompt text for one turn.
pub fn build_prompt(ctx: &PromptContext<'_>) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are a gardening assistant within the GreenBible app. ");
    prompt.push_str("Use the context to tailor your response and keep it actionable.\n\n");

    prompt.push_str("Context:\n");
    prompt.push_str(&format!("- Local date: {}\n", long_date_label(&ctx.now)));
    prompt.push_str(&format!("- Local time: {}\n", short_time_label(&ctx.now)));
    prompt.push_str(&format!("- Today (ISO): {}\n", ctx.now.format("%Y-%m-%d")));
    prompt.push_str(&format!("- User location: {}\n", ctx.location));
    prompt.push_str(&format!("- User locale: {}\n", ctx.locale));
    prompt.push_str("- App mode: chat assistant for gardeners.\n\n");

    prompt.push_str("Recent conversation:\n");
    prompt.push_str(&render_history(ctx.history, ctx.context_messages));
    prompt.push_str("\n\n");

    prompt.push_str(&format!("User question: {}\n", ctx.question));
    prompt.push_str("Instructions: Provide a friendly, concise answer with practical steps. ");
    prompt.push_str(
        "If information is insufficient, state the limitation and suggest next actions.\n",
    );
    prompt.push_str(
        "Respond with exactly one line in this format: \
         answer:<concise answer> event:<{Title, YYYY-MM-DD-HH:mm}>\n",
    );
    prompt.push_str(
        "If the user is not asking to schedule something, use event:<NA>. \
         Resolve relative dates such as \"tomorrow\" against the local date above.",
    );

    prompt
}
