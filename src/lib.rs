//! Readingtown TTS: turn text plus voice, prosody and style choices into
//! neural text-to-speech requests and save the audio they produce.

pub mod backends;
pub mod catalog;
pub mod compiler;
pub mod config_loader;
pub mod error;
pub mod i18n;
pub mod naming;
pub mod prosody;
pub mod request;
pub mod session;

pub use catalog::{build_catalog, CatalogCache, RawVoice, Tier, Voice, VoiceCatalog};
pub use compiler::{compile, CompiledPayload};
pub use error::{Error, Result};
pub use naming::{name, NamingScheme, NamingState};
pub use request::{RequestParams, Style, SynthesisRequest};
pub use session::{Artifact, Delivery, Session};
