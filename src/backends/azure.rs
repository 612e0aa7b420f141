use super::SpeechBackend;
use crate::catalog::RawVoice;
use crate::compiler::{escape_xml, CompiledPayload, MARKUP_LANG, SYNTHESIS_NS};
use crate::config_loader::Settings;
use crate::error::{CatalogFetchError, SynthesisError};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

pub const DEFAULT_OUTPUT_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";
const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const FORMAT_HEADER: &str = "X-Microsoft-OutputFormat";
const USER_AGENT: &str = concat!("readingtown-tts/", env!("CARGO_PKG_VERSION"));

/// Neural TTS over the Cognitive Services REST interface.
pub struct AzureBackend {
    client: Client,
    endpoint: String,
    key: Option<String>,
    output_format: String,
    max_audio_bytes: u64,
}

impl AzureBackend {
    pub fn new(endpoint: &str, key: Option<String>, output_format: &str, max_audio_size_mb: u64) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key: key.filter(|k| !k.is_empty()),
            output_format: output_format.to_string(),
            max_audio_bytes: max_audio_size_mb * 1024 * 1024,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, config::ConfigError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| config::ConfigError::Message(format!("HTTP client: {}", e)))?;

        let mut backend = Self::new(
            &settings.azure_endpoint,
            Some(settings.azure_key.clone()),
            &settings.output_format,
            settings.max_audio_size_mb,
        );
        backend.client = client;
        Ok(backend)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.key {
            Some(key) => req.header(KEY_HEADER, key),
            None => req,
        }
    }

    /// Body for a request. Styled payloads already are a document; plain ones
    /// get a prosody-only wrapper with their flat fields.
    pub fn request_body(payload: &CompiledPayload) -> String {
        match payload {
            CompiledPayload::Styled { markup, .. } => markup.clone(),
            CompiledPayload::Plain {
                text,
                voice_id,
                rate,
                pitch,
                volume,
            } => {
                let volume_attr = volume
                    .as_ref()
                    .map(|v| format!(" volume='{}'", escape_xml(v)))
                    .unwrap_or_default();
                format!(
                    "<speak version='1.0' xmlns='{}' xml:lang='{}'><voice name='{}'>\
                     <prosody rate='{}' pitch='{}'{}>{}</prosody></voice></speak>",
                    SYNTHESIS_NS,
                    MARKUP_LANG,
                    escape_xml(voice_id),
                    escape_xml(rate),
                    escape_xml(pitch),
                    volume_attr,
                    escape_xml(text),
                )
            }
        }
    }

    async fn read_audio(&self, resp: Response) -> Result<Vec<u8>, SynthesisError> {
        let mut audio = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if (audio.len() + chunk.len()) as u64 > self.max_audio_bytes {
                return Err(SynthesisError::TooLarge {
                    limit_mb: self.max_audio_bytes / (1024 * 1024),
                });
            }
            audio.extend_from_slice(&chunk);
        }
        Ok(audio)
    }
}

#[async_trait]
impl SpeechBackend for AzureBackend {
    fn id(&self) -> &'static str {
        "azure"
    }

    async fn list_voices(&self) -> Result<Vec<RawVoice>, CatalogFetchError> {
        let req = self
            .client
            .get(self.url("/cognitiveservices/voices/list"));
        let resp = self.authorize(req).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(CatalogFetchError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| CatalogFetchError::Parse(e.to_string()))
    }

    async fn synthesize(&self, payload: &CompiledPayload) -> Result<Vec<u8>, SynthesisError> {
        let body = Self::request_body(payload);
        debug!(
            "POST synthesis for {} ({} bytes, styled: {})",
            payload.voice_id(),
            body.len(),
            payload.is_styled()
        );

        let req = self
            .client
            .post(self.url("/cognitiveservices/v1"))
            .header(reqwest::header::CONTENT_TYPE, "application/ssml+xml")
            .header(FORMAT_HEADER, &self.output_format)
            .body(body);
        let resp = self.authorize(req).send().await?;

        let status = resp.status();
        if status == StatusCode::BAD_REQUEST {
            let detail = resp.text().await.unwrap_or_default();
            return Err(SynthesisError::Rejected {
                voice_id: payload.voice_id().to_string(),
                style: payload.style(),
                detail: if detail.is_empty() {
                    "HTTP 400".to_string()
                } else {
                    detail
                },
            });
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SynthesisError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let audio = self.read_audio(resp).await?;
        if audio.is_empty() {
            return Err(SynthesisError::EmptyAudio);
        }
        Ok(audio)
    }
}
