use crate::error::ValidationError;
use crate::prosody::Adjustment;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Delivery style. Anything other than `General` needs the markup path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    General,
    Affectionate,
    Angry,
    Assistant,
    Calm,
    Chat,
    Cheerful,
    CustomerService,
    Empathetic,
    Excited,
    Fearful,
    Friendly,
    Gentle,
    Hopeful,
    Lyrical,
    Newscast,
    Sad,
    Serious,
    Shouting,
    Terrified,
    Unfriendly,
    Whispering,
}

impl Style {
    pub const ALL: [Style; 22] = [
        Style::General,
        Style::Affectionate,
        Style::Angry,
        Style::Assistant,
        Style::Calm,
        Style::Chat,
        Style::Cheerful,
        Style::CustomerService,
        Style::Empathetic,
        Style::Excited,
        Style::Fearful,
        Style::Friendly,
        Style::Gentle,
        Style::Hopeful,
        Style::Lyrical,
        Style::Newscast,
        Style::Sad,
        Style::Serious,
        Style::Shouting,
        Style::Terrified,
        Style::Unfriendly,
        Style::Whispering,
    ];

    /// Name as the backend expects it inside `mstts:express-as`.
    pub fn as_str(self) -> &'static str {
        match self {
            Style::General => "general",
            Style::Affectionate => "affectionate",
            Style::Angry => "angry",
            Style::Assistant => "assistant",
            Style::Calm => "calm",
            Style::Chat => "chat",
            Style::Cheerful => "cheerful",
            Style::CustomerService => "customerservice",
            Style::Empathetic => "empathetic",
            Style::Excited => "excited",
            Style::Fearful => "fearful",
            Style::Friendly => "friendly",
            Style::Gentle => "gentle",
            Style::Hopeful => "hopeful",
            Style::Lyrical => "lyrical",
            Style::Newscast => "newscast",
            Style::Sad => "sad",
            Style::Serious => "serious",
            Style::Shouting => "shouting",
            Style::Terrified => "terrified",
            Style::Unfriendly => "unfriendly",
            Style::Whispering => "whispering",
        }
    }

    pub fn is_general(self) -> bool {
        self == Style::General
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Style {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Style::ALL
            .iter()
            .copied()
            .find(|style| style.as_str() == wanted)
            .ok_or_else(|| ValidationError::UnknownStyle(s.to_string()))
    }
}

/// Raw, unvalidated inputs as collected from the user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestParams {
    pub text: String,
    pub voice_id: String,
    #[serde(default)]
    pub speed: i32,
    #[serde(default)]
    pub pitch: i32,
    #[serde(default)]
    pub volume: Option<i32>,
    #[serde(default)]
    pub style: Option<String>,
}

/// A validated synthesis request. Fields are read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesisRequest {
    text: String,
    voice_id: String,
    speed: Adjustment,
    pitch: Adjustment,
    volume: Option<Adjustment>,
    style: Style,
}

struct CheckedOptions {
    speed: Adjustment,
    pitch: Adjustment,
    volume: Option<Adjustment>,
    style: Style,
}

impl RequestParams {
    /// Checks style, ranges and volume-with-style. None of these depend on the
    /// text or the voice, so a caller can reject a request before it looks
    /// up voices.
    pub fn check_options(&self) -> Result<(), ValidationError> {
        self.checked_options().map(|_| ())
    }

    fn checked_options(&self) -> Result<CheckedOptions, ValidationError> {
        let style = match self.style.as_deref() {
            Some(s) => s.parse::<Style>()?,
            None => Style::General,
        };
        let speed = Adjustment::new("speed", self.speed)?;
        let pitch = Adjustment::new("pitch", self.pitch)?;
        let volume = self
            .volume
            .map(|v| Adjustment::new("volume", v))
            .transpose()?;

        // The markup path has no volume attribute.
        if volume.is_some() && !style.is_general() {
            return Err(ValidationError::VolumeWithStyle(style));
        }

        Ok(CheckedOptions {
            speed,
            pitch,
            volume,
            style,
        })
    }
}

impl SynthesisRequest {
    pub fn new(params: RequestParams) -> Result<Self, ValidationError> {
        if params.text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        if params.voice_id.trim().is_empty() {
            return Err(ValidationError::UnknownVoice(params.voice_id));
        }
        let options = params.checked_options()?;

        Ok(Self {
            voice_id: params.voice_id.trim().to_string(),
            text: params.text,
            speed: options.speed,
            pitch: options.pitch,
            volume: options.volume,
            style: options.style,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    pub fn speed(&self) -> Adjustment {
        self.speed
    }

    pub fn pitch(&self) -> Adjustment {
        self.pitch
    }

    pub fn volume(&self) -> Option<Adjustment> {
        self.volume
    }

    pub fn style(&self) -> Style {
        self.style
    }
}
