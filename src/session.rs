//! One user's run of requests: validate, compile, synthesize, name, deliver.
//!
//! `synthesize` takes `&mut self`, so a session can never have two requests
//! in flight and the naming counters have a single writer.

use crate::backends::SpeechBackend;
use crate::catalog::CatalogCache;
use crate::compiler::{compile, CompiledPayload};
use crate::config_loader::Settings;
use crate::error::{Error, Result, SynthesisError, ValidationError};
use crate::naming::{NamingScheme, NamingState};
use crate::request::{RequestParams, SynthesisRequest};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Write `{dir}/{filename}`.
    File { dir: PathBuf },
    /// Hand the bytes back to the caller.
    Memory,
}

#[derive(Debug)]
pub enum Artifact {
    Saved {
        filename: String,
        path: PathBuf,
        size: usize,
    },
    InMemory {
        filename: String,
        audio: Vec<u8>,
    },
}

impl Artifact {
    pub fn filename(&self) -> &str {
        match self {
            Artifact::Saved { filename, .. } | Artifact::InMemory { filename, .. } => filename,
        }
    }
}

pub struct Session {
    backend: Arc<dyn SpeechBackend>,
    scheme: NamingScheme,
    delivery: Delivery,
    timeout: Duration,
    naming: NamingState,
}

impl Session {
    pub fn new(
        backend: Arc<dyn SpeechBackend>,
        scheme: NamingScheme,
        delivery: Delivery,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            scheme,
            delivery,
            timeout,
            naming: NamingState::new(),
        }
    }

    pub fn from_settings(
        backend: Arc<dyn SpeechBackend>,
        settings: &Settings,
        delivery: Delivery,
    ) -> Result<Self> {
        Ok(Self::new(
            backend,
            settings.naming()?,
            delivery,
            Duration::from_secs(settings.synthesis_timeout_secs),
        ))
    }

    pub fn naming_state(&self) -> &NamingState {
        &self.naming
    }

    /// Validation happens first; nothing reaches the backend for a bad
    /// request. A name is only consumed once audio has come back.
    pub async fn synthesize(&mut self, params: RequestParams) -> Result<Artifact> {
        let request = SynthesisRequest::new(params)?;
        let text = request.text().to_string();
        let payload = compile(request);

        let audio = self.dispatch(&payload).await?;
        let filename = self.scheme.next_name(&mut self.naming, &text);
        info!(
            "Synthesized {} bytes with {} as {}",
            audio.len(),
            payload.voice_id(),
            filename
        );

        match &self.delivery {
            Delivery::Memory => Ok(Artifact::InMemory { filename, audio }),
            Delivery::File { dir } => {
                tokio::fs::create_dir_all(dir).await?;
                let path = dir.join(&filename);
                tokio::fs::write(&path, &audio).await?;
                debug!("Wrote {}", path.display());
                Ok(Artifact::Saved {
                    filename,
                    path,
                    size: audio.len(),
                })
            }
        }
    }

    /// Pick the voice from the catalog, then synthesize. Everything that can be
    /// checked without a voice is checked before the catalog is fetched.
    pub async fn speak(
        &mut self,
        catalog: &CatalogCache,
        selection: Option<&str>,
        mut params: RequestParams,
    ) -> Result<Artifact> {
        if params.text.trim().is_empty() {
            return Err(ValidationError::EmptyText.into());
        }
        params.check_options()?;

        let voices = catalog.get().await;
        if voices.is_empty() {
            return Err(Error::NoVoices);
        }
        params.voice_id = voices.select(selection)?.id.clone();
        self.synthesize(params).await
    }

    async fn dispatch(&self, payload: &CompiledPayload) -> std::result::Result<Vec<u8>, SynthesisError> {
        debug!(
            "Dispatching {} payload to {}",
            if payload.is_styled() { "styled" } else { "plain" },
            self.backend.id()
        );
        let audio = tokio::time::timeout(self.timeout, self.backend.synthesize(payload))
            .await
            .map_err(|_| SynthesisError::Timeout(self.timeout.as_secs()))??;
        if audio.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }
        Ok(audio)
    }
}
