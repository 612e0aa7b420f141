use crate::request::Style;
use thiserror::Error;

/// Request problems caught before anything is sent to a backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("text is empty")]
    EmptyText,

    #[error("{field} adjustment {value} is outside -50..=50")]
    OutOfRange { field: &'static str, value: i32 },

    #[error("unknown style: {0}")]
    UnknownStyle(String),

    #[error("volume cannot be adjusted together with style '{0}'")]
    VolumeWithStyle(Style),

    #[error("unknown voice: {0}")]
    UnknownVoice(String),
}

/// Failure while listing voices. Callers turn this into an empty catalog.
#[derive(Error, Debug)]
pub enum CatalogFetchError {
    #[error("voice list request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("voice list returned HTTP {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("could not parse voice list: {0}")]
    Parse(String),

    #[error("{tool} exited with status {code}: {message}")]
    Process {
        tool: String,
        code: i32,
        message: String,
    },

    #[error("voice list timed out after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by (or while talking to) the synthesis backend.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("{}", rejection_message(.voice_id, .style, .detail))]
    Rejected {
        voice_id: String,
        style: Option<Style>,
        detail: String,
    },

    #[error("backend returned HTTP {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("synthesis request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("synthesis timed out after {0}s")]
    Timeout(u64),

    #[error("audio exceeds the {limit_mb} MB limit")]
    TooLarge { limit_mb: u64 },

    #[error("backend returned no audio")]
    EmptyAudio,

    #[error("{tool} exited with status {code}: {message}")]
    Process {
        tool: String,
        code: i32,
        message: String,
    },

    #[error("{0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn rejection_message(voice_id: &str, style: &Option<Style>, detail: &str) -> String {
    match style {
        Some(style) => format!(
            "backend rejected the request: voice '{}' may not support style '{}' ({})",
            voice_id, style, detail
        ),
        None => format!(
            "backend rejected the request for voice '{}' ({})",
            voice_id, detail
        ),
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Catalog(#[from] CatalogFetchError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("no voices available")]
    NoVoices,

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
