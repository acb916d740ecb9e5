//! Canned replies shown when the model cannot be reached or says nothing.

use rand::Rng;

/// Gardening tips used in place of a model answer.
pub const FALLBACK_TIPS: [&str; 3] = [
    "I'm having trouble connecting right now. Try checking for pests on the underside of leaves—they often hide there.",
    "The AI is taking a breather. In the meantime, remember to water early in the morning to reduce evaporation.",
    "I hit a snag reaching Gemini. Consider adding a thin layer of mulch to help your soil retain moisture.",
];

/// Suggested questions offered before the first turn.
pub const QUICK_QUESTIONS: [&str; 4] = [
    "What vegetables can I plant this month?",
    "How do I treat leaf spots on tomatoes?",
    "How often should I water herbs indoors?",
    "What are eco-friendly pest control tips?",
];

/// First assistant message of a fresh conversation.
pub const GREETING: &str = "Hello! I'm your Plant Assistant. Ask me anything about planting, care, or sustainability and I'll do my best to help.";

/// Shown once per session when location sharing is off.
pub const LOCATION_NOTICE: &str = "GreenGarden tailors answers with your nearby climate. Please enable location access to get more relevant tips.";

/// Pick one fallback tip at random.
pub fn random_fallback() -> &'static str {
    let index = rand::rng().random_range(0..FALLBACK_TIPS.len());
    FALLBACK_TIPS[index]
}

/// Look up a quick question by its 1-based number.
pub fn quick_question(number: usize) -> Option<&'static str> {
    number
        .checked_sub(1)
        .and_then(|i| QUICK_QUESTIONS.get(i))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_comes_from_pool() {
        for _ in 0..20 {
            assert!(FALLBACK_TIPS.contains(&random_fallback()));
        }
    }

    #[test]
    fn quick_questions_are_one_based() {
        assert_eq!(quick_question(1), Some(QUICK_QUESTIONS[0]));
        assert_eq!(quick_question(4), Some(QUICK_QUESTIONS[3]));
        assert_eq!(quick_question(0), None);
        assert_eq!(quick_question(5), None);
    }
}
