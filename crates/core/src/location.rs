//! Location context used to tailor answers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Free-text location description plus whether access was denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSummary {
    pub text: String,
    #[serde(default)]
    pub denied: bool,
}

impl LocationSummary {
    pub fn known(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            denied: false,
        }
    }

    /// Placeholder used when the user declined location sharing.
    pub fn denied() -> Self {
        Self {
            text: "Location permission denied".into(),
            denied: true,
        }
    }

    /// Placeholder used when no position is available.
    pub fn unknown() -> Self {
        Self::known("Unknown location")
    }
}

impl std::fmt::Display for LocationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Supplies the current location summary. Never fails: problems are
/// reported as placeholder text.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn summary(&self) -> LocationSummary;
}
