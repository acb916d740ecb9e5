//! Language-model trait: the abstraction over the generative endpoint.
//!
//! The chat pipeline only needs one operation: send a fully assembled prompt
//! and receive cleaned reply text. Transport details (HTTP, auth, payload
//! shape, timeouts) belong to the implementation.

use async_trait::async_trait;

use crate::error::GatewayError;

/// The language-model gateway consumed by the chat session.
///
/// Implementations: Gemini over HTTP, scripted mocks in tests.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// A human-readable name for this gateway (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send a prompt and return the cleaned reply text.
    ///
    /// An empty reply is a valid success; callers decide how to fall back.
    async fn send(&self, prompt: &str) -> std::result::Result<String, GatewayError>;
}
