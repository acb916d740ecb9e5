//! Collaborator implementations for GreenBible.
//!
//! The Gemini gateway implements `greenbible_core::LanguageModel`; the
//! configured location implements `greenbible_core::LocationProvider`.

pub mod format;
pub mod gemini;
pub mod location;

pub use format::clean_reply;
pub use gemini::GeminiGateway;
pub use location::ConfiguredLocation;
