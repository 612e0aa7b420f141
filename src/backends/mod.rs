pub mod azure;
pub mod edge_cli;

use crate::catalog::RawVoice;
use crate::compiler::CompiledPayload;
use crate::config_loader::Settings;
use crate::error::{CatalogFetchError, SynthesisError};
use async_trait::async_trait;
use std::sync::Arc;

pub use azure::AzureBackend;
pub use edge_cli::EdgeCliBackend;

/// Trait that all synthesis backends must implement.
/// The compiler decides *what* to send; a backend only knows *how*.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Returns the unique ID of the backend (e.g., "azure")
    fn id(&self) -> &'static str;

    /// Returns the backend's full, unfiltered voice inventory
    async fn list_voices(&self) -> Result<Vec<RawVoice>, CatalogFetchError>;

    /// Returns the encoded audio (MP3) for a compiled payload.
    /// Prosody is applied exactly as the payload carries it, once.
    async fn synthesize(&self, payload: &CompiledPayload) -> Result<Vec<u8>, SynthesisError>;
}

pub fn create_backend(settings: &Settings) -> Result<Arc<dyn SpeechBackend>, config::ConfigError> {
    match settings.backend.as_str() {
        "azure" => Ok(Arc::new(AzureBackend::from_settings(settings)?)),
        "edge-cli" => Ok(Arc::new(EdgeCliBackend::from_settings(settings))),
        other => Err(config::ConfigError::Message(format!(
            "Unknown backend: {}. Expected 'azure' or 'edge-cli'",
            other
        ))),
    }
}
