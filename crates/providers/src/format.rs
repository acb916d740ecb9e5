//! Display cleanup for raw model text.

/// Normalize raw model output for display.
///
/// - drops markdown bold markers (`**`)
/// - collapses runs of blank lines into a single line break
/// - turns `* ` bullets into `• `
/// - trims surrounding whitespace
pub fn clean_reply(raw: &str) -> String {
    let mut cleaned = raw.replace("**", "");

    while cleaned.contains("\n\n") {
        cleaned = cleaned.replace("\n\n", "\n");
    }

    cleaned.replace("* ", "• ").trim().to_string()
}
