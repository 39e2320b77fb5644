//! cohortlens-providers: External integrations.
//!
//! Implements `NarrativeGenerator` for Gemini and Ollama, `SheetSource` over
//! HTTP, and the user configuration that wires them together.

pub mod config;
pub mod error;
pub mod gemini;
pub mod http_source;
pub mod mock;
pub mod ollama;

pub use config::{
    create_generator, create_sheet_source, load_config, load_config_from, CohortlensConfig,
    ProviderConfig,
};
pub use error::ProviderError;
