//! Voice catalog: filter, classify, label and order the backend's voices.
//!
//! The raw inventory is large and mixed. We keep neural voices in a handful of
//! locales, rank curated expressive voices first, then multilingual ones, then
//! everything else. Labels are what users pick from, so they must be unique
//! and stable across fetches.

use crate::backends::SpeechBackend;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub const NEURAL_MARKER: &str = "Neural";
pub const MULTILINGUAL_MARKER: &str = "Multilingual";
pub const DEFAULT_PREFERRED_NAME: &str = "Aria";
/// Voice used when no catalog is consulted at all.
pub const DEFAULT_VOICE_ID: &str = "en-US-AriaNeural";

pub const DEFAULT_LOCALES: [&str; 5] = ["ko-KR", "en-US", "en-GB", "zh-CN", "zh-TW"];

/// Voices with a broad `mstts:express-as` style repertoire.
pub const PREMIUM_VOICES: [&str; 14] = [
    "en-GB-SoniaNeural",
    "en-US-AriaNeural",
    "en-US-DavisNeural",
    "en-US-GuyNeural",
    "en-US-JaneNeural",
    "en-US-JasonNeural",
    "en-US-JennyNeural",
    "en-US-NancyNeural",
    "en-US-SaraNeural",
    "en-US-TonyNeural",
    "zh-CN-XiaomoNeural",
    "zh-CN-XiaoxiaoNeural",
    "zh-CN-YunxiNeural",
    "zh-CN-YunyangNeural",
];

// locale, flag, tag
static LOCALE_BADGES: [(&str, &str, &str); 5] = [
    ("ko-KR", "🇰🇷", "[KR]"),
    ("en-US", "🇺🇸", "[US]"),
    ("en-GB", "🇬🇧", "[UK]"),
    ("zh-CN", "🇨🇳", "[CN]"),
    ("zh-TW", "🇹🇼", "[TW]"),
];
const UNKNOWN_LOCALE_FLAG: &str = "🌍";

/// One entry of the backend's voice list, as delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVoice {
    #[serde(rename = "ShortName")]
    pub id: String,
    #[serde(rename = "Locale")]
    pub locale: String,
    #[serde(rename = "Gender")]
    pub gender: String,
}

impl RawVoice {
    pub fn new(id: &str, locale: &str, gender: &str) -> Self {
        Self {
            id: id.to_string(),
            locale: locale.to_string(),
            gender: gender.to_string(),
        }
    }
}

/// Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Premium,
    Multilingual,
    Standard,
}

impl Tier {
    fn marker(self) -> Option<&'static str> {
        match self {
            Tier::Premium => Some("⭐"),
            Tier::Multilingual => Some("🌐"),
            Tier::Standard => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Gender {
    Female,
    Male,
    Neutral,
}

impl Gender {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "female" => Gender::Female,
            "male" => Gender::Male,
            _ => Gender::Neutral,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
            Gender::Neutral => "Neutral",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Voice {
    pub id: String,
    pub locale: String,
    pub gender: Gender,
    pub name: String,
    pub tier: Tier,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct CatalogOptions {
    pub supported_locales: Vec<String>,
    pub premium_voices: Vec<String>,
    pub preferred_name: String,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            supported_locales: DEFAULT_LOCALES.iter().map(|s| s.to_string()).collect(),
            premium_voices: PREMIUM_VOICES.iter().map(|s| s.to_string()).collect(),
            preferred_name: DEFAULT_PREFERRED_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
    by_label: HashMap<String, usize>,
    default_index: Option<usize>,
}

impl VoiceCatalog {
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.voices.iter().map(|v| v.label.as_str()).collect()
    }

    pub fn get(&self, label: &str) -> Option<&Voice> {
        self.by_label.get(label).map(|&i| &self.voices[i])
    }

    /// Accepts a display label or a backend voice id.
    pub fn resolve(&self, selection: &str) -> Option<&Voice> {
        let selection = selection.trim();
        self.get(selection)
            .or_else(|| self.voices.iter().find(|v| v.id == selection))
    }

    pub fn default_voice(&self) -> Option<&Voice> {
        self.default_index.map(|i| &self.voices[i])
    }

    /// The voice for a user's choice, or the default when nothing was chosen.
    pub fn select(&self, selection: Option<&str>) -> Result<&Voice, ValidationError> {
        let voice = match selection {
            Some(s) => self.resolve(s),
            None => self.default_voice(),
        };
        voice.ok_or_else(|| ValidationError::UnknownVoice(selection.unwrap_or_default().to_string()))
    }
}

pub fn build_catalog(raw_voices: &[RawVoice], options: &CatalogOptions) -> VoiceCatalog {
    let mut candidates: Vec<&RawVoice> = raw_voices
        .iter()
        .filter(|v| v.id.contains(NEURAL_MARKER))
        .filter(|v| options.supported_locales.iter().any(|l| *l == v.locale))
        .collect();

    // Collision suffixes depend on visiting order, so fix it.
    candidates.sort_by(|a, b| a.id.cmp(&b.id));
    candidates.dedup_by(|a, b| a.id == b.id);

    let mut seen = HashSet::new();
    let mut voices = Vec::with_capacity(candidates.len());
    for raw in candidates {
        let mut voice = classify(raw, options);
        if !seen.insert(voice.label.clone()) {
            voice.label = format!("{} [{}]", voice.label, voice.id);
            seen.insert(voice.label.clone());
        }
        voices.push(voice);
    }

    voices.sort_by(|a, b| a.tier.cmp(&b.tier).then_with(|| a.label.cmp(&b.label)));

    let by_label = voices
        .iter()
        .enumerate()
        .map(|(i, v)| (v.label.clone(), i))
        .collect();
    let default_index = voices
        .iter()
        .position(|v| v.name == options.preferred_name)
        .or(if voices.is_empty() { None } else { Some(0) });

    debug!(
        "Catalog built: {} of {} raw voices kept",
        voices.len(),
        raw_voices.len()
    );

    VoiceCatalog {
        voices,
        by_label,
        default_index,
    }
}

fn classify(raw: &RawVoice, options: &CatalogOptions) -> Voice {
    let tier = if options.premium_voices.iter().any(|p| *p == raw.id) {
        Tier::Premium
    } else if raw.id.contains(MULTILINGUAL_MARKER) {
        Tier::Multilingual
    } else {
        Tier::Standard
    };
    let name = clean_name(&raw.id);
    let gender = Gender::parse(&raw.gender);
    let (flag, tag) = locale_badge(&raw.locale);

    let mut label = format!("{} {} {} ({})", flag, tag, name, gender);
    if let Some(marker) = tier.marker() {
        label = format!("{} {}", marker, label);
    }

    Voice {
        id: raw.id.clone(),
        locale: raw.locale.clone(),
        gender,
        name,
        tier,
        label,
    }
}

/// `en-US-AndrewMultilingualNeural` -> `Andrew`
pub fn clean_name(id: &str) -> String {
    let last = id.rsplit('-').next().unwrap_or(id);
    let name = last
        .replace(MULTILINGUAL_MARKER, "")
        .replace(NEURAL_MARKER, "");
    if name.is_empty() {
        id.to_string()
    } else {
        name
    }
}

fn locale_badge(locale: &str) -> (&'static str, String) {
    if let Some((_, flag, tag)) = LOCALE_BADGES.iter().find(|(l, _, _)| *l == locale) {
        return (*flag, tag.to_string());
    }
    let region = locale.rsplit('-').next().unwrap_or(locale);
    (UNKNOWN_LOCALE_FLAG, format!("[{}]", region.to_ascii_uppercase()))
}

/// Fetches the catalog once and hands out the same copy until invalidated.
///
/// Failed or empty fetches produce an empty catalog and are not cached, so
/// the next call tries again.
pub struct CatalogCache {
    backend: Arc<dyn SpeechBackend>,
    options: CatalogOptions,
    fetch_timeout: Duration,
    cached: RwLock<Option<Arc<VoiceCatalog>>>,
}

impl CatalogCache {
    pub fn new(
        backend: Arc<dyn SpeechBackend>,
        options: CatalogOptions,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            options,
            fetch_timeout,
            cached: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Arc<VoiceCatalog> {
        if let Some(catalog) = self.cached.read().await.as_ref() {
            return catalog.clone();
        }

        let mut slot = self.cached.write().await;
        // Another caller may have filled it while we waited for the lock.
        if let Some(catalog) = slot.as_ref() {
            return catalog.clone();
        }

        let raw = match tokio::time::timeout(self.fetch_timeout, self.backend.list_voices()).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!("Voice list from {} failed: {}", self.backend.id(), e);
                return Arc::new(VoiceCatalog::default());
            }
            Err(_) => {
                warn!(
                    "Voice list from {} timed out after {:?}",
                    self.backend.id(),
                    self.fetch_timeout
                );
                return Arc::new(VoiceCatalog::default());
            }
        };

        let catalog = Arc::new(build_catalog(&raw, &self.options));
        if catalog.is_empty() {
            warn!("Voice list from {} had no usable voices", self.backend.id());
            return catalog;
        }

        info!("Loaded {} voices from {}", catalog.len(), self.backend.id());
        *slot = Some(catalog.clone());
        catalog
    }

    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<RawVoice> {
        vec![
            RawVoice::new("ko-KR-SunHiNeural", "ko-KR", "Female"),
            RawVoice::new("en-US-AndrewMultilingualNeural", "en-US", "Male"),
            RawVoice::new("en-US-GuyNeural", "en-US", "Male"),
            RawVoice::new("fr-FR-DeniseNeural", "fr-FR", "Female"),
            RawVoice::new("en-US-AriaNeural", "en-US", "Female"),
            RawVoice::new("en-GB-RyanNeural", "en-GB", "Male"),
            RawVoice::new("en-US-Standard-A", "en-US", "Female"),
            RawVoice::new("zh-TW-HsiaoChenNeural", "zh-TW", "Female"),
            RawVoice::new("ko-KR-HyunsuMultilingualNeural", "ko-KR", "Male"),
            RawVoice::new("zh-CN-XiaoxiaoNeural", "zh-CN", "Female"),
        ]
    }

    #[test]
    fn test_single_aria_is_premium_default() {
        let raw = vec![RawVoice::new("en-US-AriaNeural", "en-US", "Female")];
        let catalog = build_catalog(&raw, &CatalogOptions::default());
        assert_eq!(catalog.len(), 1);

        let voice = &catalog.voices()[0];
        assert_eq!(voice.tier, Tier::Premium);
        assert!(voice.label.contains("Aria"));
        assert!(voice.label.contains("Female"));
        assert_eq!(voice.label, "⭐ 🇺🇸 [US] Aria (Female)");
        assert_eq!(catalog.default_voice(), Some(voice));
    }

    #[test]
    fn test_filtering_and_order() {
        let catalog = build_catalog(&sample(), &CatalogOptions::default());
        assert_eq!(
            catalog.labels(),
            vec![
                "⭐ 🇨🇳 [CN] Xiaoxiao (Female)",
                "⭐ 🇺🇸 [US] Aria (Female)",
                "⭐ 🇺🇸 [US] Guy (Male)",
                "🌐 🇰🇷 [KR] Hyunsu (Male)",
                "🌐 🇺🇸 [US] Andrew (Male)",
                "🇬🇧 [UK] Ryan (Male)",
                "🇰🇷 [KR] SunHi (Female)",
                "🇹🇼 [TW] HsiaoChen (Female)",
            ]
        );
        assert!(catalog.resolve("fr-FR-DeniseNeural").is_none());
        assert!(catalog.resolve("en-US-Standard-A").is_none());
    }

    #[test]
    fn test_deterministic_regardless_of_input_order() {
        let options = CatalogOptions::default();
        let first = build_catalog(&sample(), &options);
        let second = build_catalog(&sample(), &options);
        assert_eq!(first.labels(), second.labels());

        let mut reversed = sample();
        reversed.reverse();
        let third = build_catalog(&reversed, &options);
        assert_eq!(first.labels(), third.labels());
    }

    #[test]
    fn test_default_falls_back_to_first() {
        let raw = vec![
            RawVoice::new("ko-KR-SunHiNeural", "ko-KR", "Female"),
            RawVoice::new("en-GB-RyanNeural", "en-GB", "Male"),
        ];
        let catalog = build_catalog(&raw, &CatalogOptions::default());
        assert_eq!(catalog.default_voice().unwrap().id, "en-GB-RyanNeural");

        let empty = build_catalog(&[], &CatalogOptions::default());
        assert!(empty.is_empty());
        assert!(empty.default_voice().is_none());
    }

    #[test]
    fn test_resolve_by_label_or_id() {
        let catalog = build_catalog(&sample(), &CatalogOptions::default());
        let by_label = catalog.resolve("🇬🇧 [UK] Ryan (Male)").unwrap();
        assert_eq!(by_label.id, "en-GB-RyanNeural");
        let by_id = catalog.resolve("en-GB-RyanNeural").unwrap();
        assert_eq!(by_id.label, by_label.label);
    }

    #[test]
    fn test_select_defaults_or_reports_unknown() {
        let catalog = build_catalog(&sample(), &CatalogOptions::default());
        assert_eq!(catalog.select(None).unwrap().id, "en-US-AriaNeural");
        assert_eq!(
            catalog.select(Some("🇬🇧 [UK] Ryan (Male)")).unwrap().id,
            "en-GB-RyanNeural"
        );
        assert_eq!(
            catalog.select(Some("fr-FR-DeniseNeural")),
            Err(ValidationError::UnknownVoice("fr-FR-DeniseNeural".to_string()))
        );
        assert!(VoiceCatalog::default().select(None).is_err());
    }

    #[test]
    fn test_duplicate_labels_are_disambiguated() {
        let raw = vec![
            RawVoice::new("en-US-EmmaNeural", "en-US", "Female"),
            RawVoice::new("en-US-EmmaNeural", "en-US", "Female"),
            RawVoice::new("en-US-x-EmmaNeural", "en-US", "Female"),
        ];
        let catalog = build_catalog(&raw, &CatalogOptions::default());
        assert_eq!(
            catalog.labels(),
            vec![
                "🇺🇸 [US] Emma (Female)",
                "🇺🇸 [US] Emma (Female) [en-US-x-EmmaNeural]",
            ]
        );
    }

    #[test]
    fn test_configured_locale_without_badge() {
        let options = CatalogOptions {
            supported_locales: vec!["ja-JP".to_string()],
            ..Default::default()
        };
        let raw = vec![RawVoice::new("ja-JP-NanamiNeural", "ja-JP", "Female")];
        let catalog = build_catalog(&raw, &options);
        assert_eq!(catalog.labels(), vec!["🌍 [JP] Nanami (Female)"]);
    }

    #[test]
    fn test_clean_name_and_gender() {
        assert_eq!(clean_name("en-US-AndrewMultilingualNeural"), "Andrew");
        assert_eq!(clean_name("zh-CN-liaoning-XiaobeiNeural"), "Xiaobei");
        assert_eq!(clean_name("Neural"), "Neural");
        assert_eq!(Gender::parse("Female"), Gender::Female);
        assert_eq!(Gender::parse("male"), Gender::Male);
        assert_eq!(Gender::parse("Unknown"), Gender::Neutral);
    }

    #[test]
    fn test_raw_voice_from_backend_json() {
        let json = r#"[{"Name":"Microsoft Server Speech Text to Speech Voice (en-US, AriaNeural)",
            "ShortName":"en-US-AriaNeural","Gender":"Female","Locale":"en-US",
            "StyleList":["cheerful","sad"]}]"#;
        let raw: Vec<RawVoice> = serde_json::from_str(json).unwrap();
        assert_eq!(raw, vec![RawVoice::new("en-US-AriaNeural", "en-US", "Female")]);
    }
}
