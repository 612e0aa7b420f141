//! User-facing strings for the command line, in English, Korean and Chinese.

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiLanguage {
    #[default]
    En,
    Ko,
    Zh,
}

impl FromStr for UiLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(UiLanguage::En),
            "ko" | "korean" | "한국어" => Ok(UiLanguage::Ko),
            "zh" | "chinese" | "中文" => Ok(UiLanguage::Zh),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

pub struct Messages {
    pub title: &'static str,
    pub voice_label: &'static str,
    pub default_marker: &'static str,
    pub no_voices: &'static str,
    pub err_empty: &'static str,
    pub err_unknown_voice: &'static str,
    pub processing: &'static str,
    pub saved: &'static str,
    pub error: &'static str,
    pub style_hint: &'static str,
    pub repl_prompt: &'static str,
}

static EN: Messages = Messages {
    title: "Readingtown TTS",
    voice_label: "Voices",
    default_marker: "(default)",
    no_voices: "No voices available. Check the backend connection and try again.",
    err_empty: "Please enter text!",
    err_unknown_voice: "Voice not found in the catalog",
    processing: "Processing...",
    saved: "Saved",
    error: "Error",
    style_hint: "This voice may not support this style. Try another voice or 'general'.",
    repl_prompt: "Enter text (empty line to quit):",
};

static KO: Messages = Messages {
    title: "리딩타운 TTS 생성기",
    voice_label: "목소리 목록",
    default_marker: "(기본값)",
    no_voices: "사용할 수 있는 목소리가 없습니다. 연결을 확인한 뒤 다시 시도해주세요.",
    err_empty: "텍스트를 입력해주세요!",
    err_unknown_voice: "목록에 없는 목소리입니다",
    processing: "처리 중...",
    saved: "저장됨",
    error: "오류",
    style_hint: "이 목소리는 해당 스타일을 지원하지 않을 수 있습니다. 다른 목소리나 'general'을 사용해보세요.",
    repl_prompt: "텍스트를 입력하세요 (빈 줄을 입력하면 종료):",
};

static ZH: Messages = Messages {
    title: "Readingtown 语音生成器",
    voice_label: "语音列表",
    default_marker: "(默认)",
    no_voices: "没有可用的语音。请检查连接后重试。",
    err_empty: "请输入文本！",
    err_unknown_voice: "语音不在列表中",
    processing: "处理中...",
    saved: "已保存",
    error: "错误",
    style_hint: "该语音可能不支持此风格。请尝试其他语音或 'general'。",
    repl_prompt: "请输入文本（空行退出）：",
};

pub fn messages(lang: UiLanguage) -> &'static Messages {
    match lang {
        UiLanguage::En => &EN,
        UiLanguage::Ko => &KO,
        UiLanguage::Zh => &ZH,
    }
}
