//! Output file names.
//!
//! Two schemes are supported: a per-prefix counter that never repeats within
//! a session (`[1a1] (3) Hello world.mp3`) and a wall-clock stamp
//! (`audio_142501.mp3`).

use chrono::{DateTime, Local};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

pub const SNIPPET_MAX_CHARS: usize = 15;
pub const AUDIO_EXTENSION: &str = "mp3";

lazy_static! {
    static ref ILLEGAL_CHARS: Regex = Regex::new(r#"[\\/*?:"<>|]"#).expect("valid regex");
    static ref WHITESPACE_RUNS: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// Per-prefix counters for one session, plus the timestamp names already
/// handed out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingState {
    counters: HashMap<String, u32>,
    stamps: HashMap<String, u32>,
}

impl NamingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last counter handed out for `prefix`, if any.
    pub fn current(&self, prefix: &str) -> Option<u32> {
        self.counters.get(prefix).copied()
    }

    pub fn next_name(&mut self, prefix: &str, text: &str) -> String {
        let counter = self
            .counters
            .entry(prefix.to_string())
            .and_modify(|n| *n += 1)
            .or_insert(1);
        counter_filename(prefix, *counter, &snippet(text))
    }

    /// `{stem}_{HHMMSS}.mp3`; a repeat of the same second within the session
    /// gets `_2`, `_3`, ... so earlier files are never overwritten.
    pub fn next_stamped(&mut self, stem: &str, at: DateTime<Local>) -> String {
        let first = timestamp_name(stem, at);
        let seen = self
            .stamps
            .entry(first.clone())
            .and_modify(|n| *n += 1)
            .or_insert(1);
        if *seen == 1 {
            first
        } else {
            format!("{}_{}_{}.{}", stem, at.format("%H%M%S"), seen, AUDIO_EXTENSION)
        }
    }
}

/// Threaded form: takes the state by value and hands back the updated one.
pub fn name(prefix: &str, text: &str, mut state: NamingState) -> (String, NamingState) {
    let filename = state.next_name(prefix, text);
    (filename, state)
}

/// Filesystem-safe, short, single-line excerpt of `text`.
pub fn snippet(text: &str) -> String {
    let stripped = ILLEGAL_CHARS.replace_all(text, "");
    let collapsed = WHITESPACE_RUNS.replace_all(&stripped, " ");
    let truncated: String = collapsed.trim().chars().take(SNIPPET_MAX_CHARS).collect();
    truncated.trim().to_string()
}

fn counter_filename(prefix: &str, counter: u32, snippet: &str) -> String {
    let prefix = ILLEGAL_CHARS.replace_all(prefix, "");
    if snippet.is_empty() {
        format!("[{}] ({}).{}", prefix, counter, AUDIO_EXTENSION)
    } else {
        format!("[{}] ({}) {}.{}", prefix, counter, snippet, AUDIO_EXTENSION)
    }
}

pub fn timestamp_name(stem: &str, at: DateTime<Local>) -> String {
    format!("{}_{}.{}", stem, at.format("%H%M%S"), AUDIO_EXTENSION)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingScheme {
    Counter { prefix: String },
    Timestamp { stem: String },
}

impl NamingScheme {
    pub fn next_name(&self, state: &mut NamingState, text: &str) -> String {
        match self {
            NamingScheme::Counter { prefix } => state.next_name(prefix, text),
            NamingScheme::Timestamp { stem } => state.next_stamped(stem, Local::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_counter_sequence() {
        let state = NamingState::new();
        let (a, state) = name("1a1", "Hello world", state);
        let (b, state) = name("1a1", "Hello world", state);
        let (c, state) = name("1a1", "Hello world", state);
        assert_eq!(a, "[1a1] (1) Hello world.mp3");
        assert_eq!(b, "[1a1] (2) Hello world.mp3");
        assert_eq!(c, "[1a1] (3) Hello world.mp3");
        assert_eq!(state.current("1a1"), Some(3));
    }

    #[test]
    fn test_prefixes_are_independent() {
        let mut state = NamingState::new();
        assert_eq!(state.next_name("a", "x"), "[a] (1) x.mp3");
        assert_eq!(state.next_name("b", "x"), "[b] (1) x.mp3");
        assert_eq!(state.next_name("a", "x"), "[a] (2) x.mp3");
        assert_eq!(state.current("c"), None);
    }

    #[test]
    fn test_snippet_cleanup() {
        assert_eq!(snippet("a/b\\c*d?e:f\"g<h>i|j"), "abcdefghij");
        assert_eq!(snippet("  Hello \n\n  world\t!  "), "Hello world !");
        assert_eq!(snippet("The quick brown fox jumps"), "The quick brown");
        // Truncation can land on a space, which is trimmed again.
        assert_eq!(snippet("Fourteen chars one"), "Fourteen chars");
        assert_eq!(snippet("안녕하세요 리딩타운에 오신 것을 환영합니다"), "안녕하세요 리딩타운에 오신");
        assert_eq!(snippet("???"), "");
    }

    #[test]
    fn test_empty_snippet_name() {
        let mut state = NamingState::new();
        assert_eq!(state.next_name("q", "<<>>"), "[q] (1).mp3");
    }

    #[test]
    fn test_prefix_is_sanitized_in_filename_only() {
        let mut state = NamingState::new();
        assert_eq!(state.next_name("a/b", "hi"), "[ab] (1) hi.mp3");
        assert_eq!(state.current("a/b"), Some(1));
        assert_eq!(state.current("ab"), None);
    }

    #[test]
    fn test_timestamp_name() {
        let at = Local.with_ymd_and_hms(2026, 3, 1, 9, 5, 7).unwrap();
        assert_eq!(timestamp_name("audio", at), "audio_090507.mp3");
    }

    #[test]
    fn test_same_second_gets_suffix() {
        let at = Local.with_ymd_and_hms(2026, 3, 1, 9, 5, 7).unwrap();
        let later = Local.with_ymd_and_hms(2026, 3, 1, 9, 5, 8).unwrap();
        let mut state = NamingState::new();
        assert_eq!(state.next_stamped("audio", at), "audio_090507.mp3");
        assert_eq!(state.next_stamped("audio", at), "audio_090507_2.mp3");
        assert_eq!(state.next_stamped("audio", at), "audio_090507_3.mp3");
        assert_eq!(state.next_stamped("audio", later), "audio_090508.mp3");
        assert_eq!(state.next_stamped("clip", at), "clip_090507.mp3");
    }

    #[test]
    fn test_scheme_dispatch() {
        let mut state = NamingState::new();
        let counter = NamingScheme::Counter {
            prefix: "1a1".to_string(),
        };
        assert_eq!(counter.next_name(&mut state, "Hi"), "[1a1] (1) Hi.mp3");

        let stamp = NamingScheme::Timestamp {
            stem: "Readingtown".to_string(),
        };
        let name = stamp.next_name(&mut state, "Hi");
        assert!(name.starts_with("Readingtown_"));
        assert!(name.ends_with(".mp3"));
        assert_eq!(name.len(), "Readingtown_".len() + 6 + 4);
        assert_eq!(state.current("1a1"), Some(1));
    }
}
