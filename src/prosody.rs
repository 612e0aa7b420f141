//! Signed prosody adjustments and their wire encoding.
//!
//! The UI works with plain integers in `-50..=50`. The backend wants them as
//! signed strings with a unit suffix: `+10%`, `-5Hz`, `+0%`.

use crate::error::ValidationError;
use serde::Serialize;
use std::fmt;

pub const MIN_ADJUSTMENT: i32 = -50;
pub const MAX_ADJUSTMENT: i32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Percent,
    Hertz,
}

impl Unit {
    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Percent => "%",
            Unit::Hertz => "Hz",
        }
    }
}

/// A range-checked adjustment. Only constructible through [`Adjustment::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Adjustment(i32);

impl Adjustment {
    /// Out-of-range values are rejected, never clamped.
    pub fn new(field: &'static str, value: i32) -> Result<Self, ValidationError> {
        if !(MIN_ADJUSTMENT..=MAX_ADJUSTMENT).contains(&value) {
            return Err(ValidationError::OutOfRange { field, value });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> i32 {
        self.0
    }

    pub fn encode(self, unit: Unit) -> String {
        format!("{:+}{}", self.0, unit.suffix())
    }
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.0)
    }
}

/// Encode a raw integer, rejecting anything outside `-50..=50`.
///
/// The unit alone does not say which control a value came from, so errors
/// name it `value`. Use [`Adjustment::new`] to get a named field.
pub fn encode(value: i32, unit: Unit) -> Result<String, ValidationError> {
    Ok(Adjustment::new("value", value)?.encode(unit))
}

/// Rate, pitch and (optionally) volume in backend string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedProsody {
    pub rate: String,
    pub pitch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
}

impl EncodedProsody {
    pub fn new(rate: Adjustment, pitch: Adjustment, volume: Option<Adjustment>) -> Self {
        Self {
            rate: rate.encode(Unit::Percent),
            pitch: pitch.encode(Unit::Hertz),
            volume: volume.map(|v| v.encode(Unit::Percent)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use regex::Regex;

    #[test]
    fn test_encode_signs() {
        assert_eq!(encode(10, Unit::Percent).unwrap(), "+10%");
        assert_eq!(encode(-5, Unit::Hertz).unwrap(), "-5Hz");
        assert_eq!(encode(0, Unit::Percent).unwrap(), "+0%");
        assert_eq!(encode(-50, Unit::Percent).unwrap(), "-50%");
        assert_eq!(encode(50, Unit::Hertz).unwrap(), "+50Hz");
    }

    #[test]
    fn test_encode_rejects_out_of_range() {
        assert!(matches!(
            encode(51, Unit::Percent),
            Err(ValidationError::OutOfRange { value: 51, .. })
        ));
        assert!(encode(-51, Unit::Hertz).is_err());
        assert!(Adjustment::new("speed", i32::MIN).is_err());
    }

    #[test]
    fn test_error_names_the_field() {
        let err = encode(51, Unit::Percent).unwrap_err();
        assert_eq!(err.to_string(), "value adjustment 51 is outside -50..=50");

        let err = Adjustment::new("volume", -51).unwrap_err();
        assert_eq!(err.to_string(), "volume adjustment -51 is outside -50..=50");
    }

    #[test]
    fn test_encoded_prosody_volume_optional() {
        let rate = Adjustment::new("speed", 20).unwrap();
        let pitch = Adjustment::new("pitch", -3).unwrap();
        let p = EncodedProsody::new(rate, pitch, None);
        assert_eq!(p.rate, "+20%");
        assert_eq!(p.pitch, "-3Hz");
        assert!(p.volume.is_none());

        let vol = Adjustment::new("volume", -10).unwrap();
        let p = EncodedProsody::new(rate, pitch, Some(vol));
        assert_eq!(p.volume.as_deref(), Some("-10%"));
    }

    proptest! {
        #[test]
        fn prop_encode_format(speed in -50i32..=50, pitch in -50i32..=50) {
            let re = Regex::new(r"^[+-]\d+(%|Hz)$").unwrap();
            for (value, unit) in [(speed, Unit::Percent), (pitch, Unit::Hertz)] {
                let s = encode(value, unit).unwrap();
                prop_assert!(re.is_match(&s), "bad format: {}", s);
                prop_assert_eq!(s.starts_with('-'), value < 0);
                let digits = &s[1..s.len() - unit.suffix().len()];
                prop_assert_eq!(digits.parse::<i32>().unwrap(), value.abs());
            }
        }
    }
}
