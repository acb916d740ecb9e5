//! Reply parsing.
//!
//! The model is asked for one line shaped like
//! `answer:<text> event:<{Title, YYYY-MM-DD-HH:mm}>` but nothing guarantees
//! it. Parsing is a cascade of fallbacks and never fails: the worst outcome
//! is an answer with no event.

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use regex_lite::Regex;

use crate::fallback::random_fallback;

/// The result of parsing one raw reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    /// Text shown to the user. Never empty.
    pub answer_text: String,

    /// Title for the calendar task. Falls back to the answer text.
    pub event_title: String,

    /// Local instant to schedule at. `None` means no task.
    pub event_at: Option<DateTime<Local>>,

    /// Name of the rule that located the event block, if any did.
    pub matched_rule: Option<&'static str>,
}

impl ParsedReply {
    pub fn has_event(&self) -> bool {
        self.event_at.is_some()
    }
}

/// A named pattern that locates the event block. Group 1 is the block.
struct EventRule {
    name: &'static str,
    pattern: Regex,
}

/// Parses raw model replies. Build once and reuse.
pub struct ReplyParser {
    answer: Regex,
    datetime: Regex,
    event_rules: Vec<EventRule>,
}

impl Default for ReplyParser {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(pattern: &str) -> Regex {
    // Patterns are literals in this module; a failure here is a programming error.
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid reply pattern {pattern}: {e}"))
}

impl ReplyParser {
    pub fn new() -> Self {
        let rule = |name, pattern| EventRule {
            name,
            pattern: compile(pattern),
        };

        Self {
            answer: compile(r"(?i)answer:(.*?)(?:event:|$)"),
            datetime: compile(r"(\d{4})-(\d{2})-(\d{2})(?:-|T|\s)(\d{1,2}):(\d{2})"),
            event_rules: vec![
                rule("event_braces", r"(?i)event:\s*\{([^}]*)\}"),
                rule("event_angle", r"(?i)event:\s*<([^>]*)>"),
                rule("first_braces", r"\{([^}]*)\}"),
                rule("first_angle", r"<([^>]*)>"),
            ],
        }
    }

    /// Collapse whitespace runs to single spaces and trim.
    ///
    /// Unicode whitespace such as U+00A0 counts, so later patterns only see
    /// ASCII spaces.
    pub fn normalize(&self, raw: &str) -> String {
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn answer_text(&self, normalized: &str) -> String {
        let answer = match self.answer.captures(normalized) {
            Some(caps) => caps.get(1).map_or("", |m| m.as_str()).trim().to_string(),
            None => normalized.to_string(),
        };
        if answer.is_empty() {
            random_fallback().to_string()
        } else {
            answer
        }
    }

    fn event_block<'t>(&self, normalized: &'t str) -> Option<(&'static str, &'t str)> {
        self.event_rules.iter().find_map(|rule| {
            rule.pattern
                .captures(normalized)
                .and_then(|caps| caps.get(1))
                .map(|m| (rule.name, m.as_str()))
        })
    }

    /// Find `YYYY-MM-DD[-T ]H:MM` and build a local instant from it.
    fn event_instant(&self, remainder: &str) -> Option<DateTime<Local>> {
        let caps = self.datetime.captures(remainder)?;
        let number = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();

        let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
        let naive = NaiveDate::from_ymd_opt(year, number(2)?, number(3)?)?
            .and_hms_opt(number(4)?, number(5)?, 0)?;

        // Wall-clock times skipped by a DST jump have no instant.
        Local.from_local_datetime(&naive).earliest()
    }

    /// Parse one raw reply.
    pub fn parse(&self, raw: &str) -> ParsedReply {
        let normalized = self.normalize(raw);
        let answer_text = self.answer_text(&normalized);

        let no_event = |rule: Option<&'static str>| ParsedReply {
            answer_text: answer_text.clone(),
            event_title: answer_text.clone(),
            event_at: None,
            matched_rule: rule,
        };

        let Some((rule, block)) = self.event_block(&normalized) else {
            return no_event(None);
        };

        let block = block.trim();
        if block.is_empty() || block.eq_ignore_ascii_case("NA") {
            return no_event(Some(rule));
        }

        let stripped: String = block
            .chars()
            .filter(|c| !matches!(c, '{' | '}' | '<' | '>' | '[' | ']'))
            .collect();

        let Some((title, remainder)) = stripped.split_once(',') else {
            return no_event(Some(rule));
        };
        let remainder = remainder.trim();
        if remainder.is_empty() {
            return no_event(Some(rule));
        }

        let Some(at) = self.event_instant(remainder) else {
            return no_event(Some(rule));
        };

        let title = title.trim();
        let event_title = if title.is_empty() {
            answer_text.clone()
        } else {
            title.to_string()
        };

        ParsedReply {
            answer_text,
            event_title,
            event_at: Some(at),
            matched_rule: Some(rule),
        }
    }
}
