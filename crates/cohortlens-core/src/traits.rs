//! Core trait definitions for sheet sources and narrative generators.
//!
//! Sheet sources are implemented here ([`crate::source::FileSource`]) and in
//! `cohortlens-providers` (HTTP). Narrative generators live entirely in
//! `cohortlens-providers`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sheet source trait
// ---------------------------------------------------------------------------

/// Somewhere exam sheets can be fetched from.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Human-readable source name (e.g. "file").
    fn name(&self) -> &str;

    /// Fetch the raw text of the sheet at `location`.
    async fn fetch(&self, location: &str) -> anyhow::Result<String>;
}

// ---------------------------------------------------------------------------
// Narrative generator trait
// ---------------------------------------------------------------------------

/// Backend that turns a prompt into an executive summary.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Human-readable backend name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Generate text for a prompt.
    async fn generate(&self, request: &NarrativeRequest) -> anyhow::Result<NarrativeResponse>;
}

/// Request for a generated summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeRequest {
    /// Model identifier (e.g. "gemini-1.5-flash").
    pub model: String,
    /// The full prompt.
    pub prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Generated summary text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeResponse {
    /// The generated text.
    pub text: String,
    /// Model that actually answered.
    pub model: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}
