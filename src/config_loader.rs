use crate::backends::azure::DEFAULT_OUTPUT_FORMAT;
use crate::catalog::{CatalogOptions, DEFAULT_LOCALES, DEFAULT_PREFERRED_NAME, PREMIUM_VOICES};
use crate::i18n::UiLanguage;
use crate::naming::NamingScheme;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const BACKENDS: [&str; 2] = ["azure", "edge-cli"];

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    // Backend selection
    pub backend: String, // "azure" or "edge-cli"
    pub azure_endpoint: String,
    pub azure_key: String, // empty = send no key header
    pub edge_tts_binary: String,
    pub output_format: String,
    // Output
    pub output_dir: String,
    pub naming_scheme: String, // "counter" or "timestamp"
    pub naming_prefix: String,
    pub timestamp_stem: String,
    // Catalog
    pub preferred_voice: String,
    pub supported_locales: Vec<String>,
    // Limits
    pub synthesis_timeout_secs: u64,
    pub catalog_timeout_secs: u64,
    pub max_audio_size_mb: u64,
    // CLI
    pub ui_language: String, // "en", "ko", "zh"
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: "azure".to_string(),
            azure_endpoint: "https://eastus.tts.speech.microsoft.com".to_string(),
            azure_key: String::new(),
            edge_tts_binary: "edge-tts".to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            output_dir: default_output_dir(),
            naming_scheme: "counter".to_string(),
            naming_prefix: "tts".to_string(),
            timestamp_stem: "audio".to_string(),
            preferred_voice: DEFAULT_PREFERRED_NAME.to_string(),
            supported_locales: DEFAULT_LOCALES.iter().map(|s| s.to_string()).collect(),
            synthesis_timeout_secs: 60,
            catalog_timeout_secs: 15,
            max_audio_size_mb: 50,
            ui_language: "en".to_string(),
        }
    }
}

fn default_output_dir() -> String {
    dirs::audio_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Music")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("readingtown")
        .to_string_lossy()
        .into_owned()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Defaults, then `Readingtown.*` in the working directory, then the user
    /// config file, then an explicit file, then `READINGTOWN_*` variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let d = Settings::default();
        let mut builder = Config::builder()
            .set_default("backend", d.backend)?
            .set_default("azure_endpoint", d.azure_endpoint)?
            .set_default("azure_key", d.azure_key)?
            .set_default("edge_tts_binary", d.edge_tts_binary)?
            .set_default("output_format", d.output_format)?
            .set_default("output_dir", d.output_dir)?
            .set_default("naming_scheme", d.naming_scheme)?
            .set_default("naming_prefix", d.naming_prefix)?
            .set_default("timestamp_stem", d.timestamp_stem)?
            .set_default("preferred_voice", d.preferred_voice)?
            .set_default("supported_locales", d.supported_locales)?
            .set_default("synthesis_timeout_secs", d.synthesis_timeout_secs)?
            .set_default("catalog_timeout_secs", d.catalog_timeout_secs)?
            .set_default("max_audio_size_mb", d.max_audio_size_mb)?
            .set_default("ui_language", d.ui_language)?
            // Merge with local config file (if exists)
            .add_source(File::with_name("Readingtown").required(false));

        if let Some(config_dir) = dirs::config_dir() {
            builder = builder.add_source(
                File::from(config_dir.join("readingtown-tts").join("Readingtown")).required(false),
            );
        }
        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Merge with environment variables (e.g. READINGTOWN_BACKEND=edge-cli)
        let builder = builder.add_source(
            Environment::with_prefix("READINGTOWN")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("supported_locales"),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !BACKENDS.contains(&self.backend.as_str()) {
            return Err(ConfigError::Message(format!(
                "Invalid backend: {}. Must be one of {:?}",
                self.backend, BACKENDS
            )));
        }
        self.naming()?;
        self.language()?;
        if self.synthesis_timeout_secs == 0 || self.catalog_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "timeouts must be greater than 0".to_string(),
            ));
        }
        if self.max_audio_size_mb == 0 {
            return Err(ConfigError::Message(
                "max_audio_size_mb must be greater than 0".to_string(),
            ));
        }
        if self.supported_locales.is_empty() {
            return Err(ConfigError::Message(
                "supported_locales must list at least one locale".to_string(),
            ));
        }
        Ok(())
    }

    pub fn naming(&self) -> Result<NamingScheme, ConfigError> {
        match self.naming_scheme.as_str() {
            "counter" if self.naming_prefix.trim().is_empty() => Err(ConfigError::Message(
                "naming_prefix must not be empty for the counter scheme".to_string(),
            )),
            "counter" => Ok(NamingScheme::Counter {
                prefix: self.naming_prefix.trim().to_string(),
            }),
            "timestamp" => Ok(NamingScheme::Timestamp {
                stem: self.timestamp_stem.clone(),
            }),
            other => Err(ConfigError::Message(format!(
                "Invalid naming_scheme: {}. Must be 'counter' or 'timestamp'",
                other
            ))),
        }
    }

    pub fn language(&self) -> Result<UiLanguage, ConfigError> {
        self.ui_language
            .parse()
            .map_err(|_| ConfigError::Message(format!("Invalid ui_language: {}", self.ui_language)))
    }

    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            supported_locales: self.supported_locales.clone(),
            premium_voices: PREMIUM_VOICES.iter().map(|s| s.to_string()).collect(),
            preferred_name: self.preferred_voice.clone(),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }
}
