//! Turns a validated [`SynthesisRequest`] into the exact payload handed to a
//! backend.
//!
//! Two shapes exist. `Plain` carries flat prosody fields and unmodified text.
//! `Styled` carries a self-contained markup document with the prosody inside
//! it; there are no outer prosody fields to apply a second time.

use crate::prosody::EncodedProsody;
use crate::request::{Style, SynthesisRequest};
use serde::Serialize;

pub const SYNTHESIS_NS: &str = "http://www.w3.org/2001/10/synthesis";
pub const MSTTS_NS: &str = "https://www.w3.org/2001/mstts";
pub const MARKUP_LANG: &str = "en-US";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum CompiledPayload {
    Plain {
        text: String,
        voice_id: String,
        rate: String,
        pitch: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        volume: Option<String>,
    },
    Styled {
        markup: String,
        voice_id: String,
        /// Kept for error reporting only; already embedded in `markup`.
        #[serde(skip)]
        style: Style,
    },
}

impl CompiledPayload {
    pub fn voice_id(&self) -> &str {
        match self {
            CompiledPayload::Plain { voice_id, .. } | CompiledPayload::Styled { voice_id, .. } => {
                voice_id
            }
        }
    }

    pub fn style(&self) -> Option<Style> {
        match self {
            CompiledPayload::Plain { .. } => None,
            CompiledPayload::Styled { style, .. } => Some(*style),
        }
    }

    pub fn is_styled(&self) -> bool {
        matches!(self, CompiledPayload::Styled { .. })
    }
}

pub fn compile(req: SynthesisRequest) -> CompiledPayload {
    let prosody = EncodedProsody::new(req.speed(), req.pitch(), req.volume());
    let style = req.style();

    if style.is_general() {
        return CompiledPayload::Plain {
            text: req.text().to_string(),
            voice_id: req.voice_id().to_string(),
            rate: prosody.rate,
            pitch: prosody.pitch,
            volume: prosody.volume,
        };
    }

    let markup = styled_markup(req.voice_id(), style, &prosody, req.text().trim());
    CompiledPayload::Styled {
        markup,
        voice_id: req.voice_id().to_string(),
        style,
    }
}

fn styled_markup(voice_id: &str, style: Style, prosody: &EncodedProsody, text: &str) -> String {
    format!(
        "<speak version='1.0' xmlns='{ns}' xmlns:mstts='{mstts}' xml:lang='{lang}'>\
         <voice name='{voice}'>\
         <mstts:express-as style='{style}'>\
         <prosody rate='{rate}' pitch='{pitch}'>{text}</prosody>\
         </mstts:express-as>\
         </voice>\
         </speak>",
        ns = SYNTHESIS_NS,
        mstts = MSTTS_NS,
        lang = MARKUP_LANG,
        voice = escape_xml(voice_id),
        style = escape_xml(style.as_str()),
        rate = escape_xml(&prosody.rate),
        pitch = escape_xml(&prosody.pitch),
        text = escape_xml(text),
    )
}

/// Escape the five XML-significant characters. Safe for both text nodes and
/// single- or double-quoted attribute values.
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestParams;
    use proptest::prelude::*;

    fn request(text: &str, style: Option<&str>, speed: i32, pitch: i32) -> SynthesisRequest {
        SynthesisRequest::new(RequestParams {
            text: text.to_string(),
            voice_id: "en-US-AriaNeural".to_string(),
            speed,
            pitch,
            volume: None,
            style: style.map(str::to_string),
        })
        .unwrap()
    }

    fn elements<'a, 'input>(
        doc: &'a roxmltree::Document<'input>,
        name: &str,
    ) -> Vec<roxmltree::Node<'a, 'input>> {
        doc.descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == name)
            .collect()
    }

    #[test]
    fn test_general_is_plain() {
        let payload = compile(request("  Hello <world> & co  ", None, 10, -5));
        match payload {
            CompiledPayload::Plain {
                text,
                voice_id,
                rate,
                pitch,
                volume,
            } => {
                assert_eq!(text, "  Hello <world> & co  ");
                assert_eq!(voice_id, "en-US-AriaNeural");
                assert_eq!(rate, "+10%");
                assert_eq!(pitch, "-5Hz");
                assert!(volume.is_none());
            }
            other => panic!("expected plain payload, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_carries_volume() {
        let req = SynthesisRequest::new(RequestParams {
            text: "Hi".to_string(),
            voice_id: "en-GB-SoniaNeural".to_string(),
            volume: Some(-20),
            ..Default::default()
        })
        .unwrap();
        match compile(req) {
            CompiledPayload::Plain { volume, .. } => assert_eq!(volume.as_deref(), Some("-20%")),
            other => panic!("expected plain payload, got {:?}", other),
        }
    }

    #[test]
    fn test_cheerful_scenario() {
        let payload = compile(request("Hi <there>", Some("cheerful"), 10, -5));
        assert!(payload.is_styled());
        assert_eq!(payload.voice_id(), "en-US-AriaNeural");
        assert_eq!(payload.style(), Some(Style::Cheerful));

        let CompiledPayload::Styled { markup, .. } = payload else {
            panic!("expected styled payload");
        };
        assert!(markup.contains("Hi &lt;there&gt;"));
        assert!(markup.contains("style='cheerful'"));
        assert!(markup.contains("rate='+10%'"));
        assert!(markup.contains("pitch='-5Hz'"));
        assert!(!markup.contains("volume="));
    }

    #[test]
    fn test_styled_exact_document() {
        let payload = compile(request("  Good morning  ", Some("sad"), 0, 3));
        let CompiledPayload::Styled { markup, .. } = payload else {
            panic!("expected styled payload");
        };
        assert_eq!(
            markup,
            "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' \
             xmlns:mstts='https://www.w3.org/2001/mstts' xml:lang='en-US'>\
             <voice name='en-US-AriaNeural'>\
             <mstts:express-as style='sad'>\
             <prosody rate='+0%' pitch='+3Hz'>Good morning</prosody>\
             </mstts:express-as></voice></speak>"
        );
    }

    #[test]
    fn test_styled_is_well_formed() {
        let payload = compile(request("one <voice> & 'two'", Some("whispering"), -20, 0));
        let CompiledPayload::Styled { markup, .. } = payload else {
            panic!("expected styled payload");
        };
        let doc = roxmltree::Document::parse(&markup).expect("markup should parse");

        let root = doc.root_element();
        assert_eq!(root.tag_name().name(), "speak");
        assert_eq!(root.tag_name().namespace(), Some(SYNTHESIS_NS));

        let voices = elements(&doc, "voice");
        assert_eq!(voices.len(), 1);
        assert_eq!(voices[0].attribute("name"), Some("en-US-AriaNeural"));

        let styles = elements(&doc, "express-as");
        assert_eq!(styles.len(), 1);
        assert_eq!(styles[0].tag_name().namespace(), Some(MSTTS_NS));
        assert_eq!(styles[0].attribute("style"), Some("whispering"));

        let prosody = elements(&doc, "prosody");
        assert_eq!(prosody.len(), 1);
        assert_eq!(prosody[0].attribute("rate"), Some("-20%"));
        assert_eq!(prosody[0].attribute("pitch"), Some("+0Hz"));
        assert_eq!(prosody[0].text(), Some("one <voice> & 'two'"));
    }

    #[test]
    fn test_styled_json_has_no_outer_prosody() {
        let payload = compile(request("Hi", Some("excited"), 5, 5));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["mode"], "styled");
        assert!(json.get("rate").is_none());
        assert!(json.get("pitch").is_none());
        assert!(json.get("volume").is_none());
        assert!(json.get("style").is_none());

        let plain = compile(request("Hi", None, 5, 5));
        let json = serde_json::to_value(&plain).unwrap();
        assert_eq!(json["mode"], "plain");
        assert!(json.get("markup").is_none());
        assert_eq!(json["rate"], "+5%");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml(r#"a & b < c > d "e" 'f'"#),
            "a &amp; b &lt; c &gt; d &quot;e&quot; &apos;f&apos;"
        );
        assert_eq!(escape_xml("&amp;"), "&amp;amp;");
    }

    proptest! {
        #[test]
        fn prop_escape_round_trip(text in "[a-zA-Z0-9 &<>'\"]{0,40}[a-zA-Z&<>]") {
            let payload = compile(request(&text, Some("calm"), 0, 0));
            let CompiledPayload::Styled { markup, .. } = payload else {
                panic!("expected styled payload");
            };
            let doc = roxmltree::Document::parse(&markup).expect("markup should parse");
            let prosody = elements(&doc, "prosody");
            prop_assert_eq!(prosody.len(), 1);
            prop_assert_eq!(prosody[0].text(), Some(text.trim()));
        }
    }
}
