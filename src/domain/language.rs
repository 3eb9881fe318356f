//! 语言代码与基于文字系统的启发式检测

use serde::{Deserialize, Serialize};

/// 支持的语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "zh")]
    Chinese,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Korean,
        Language::English,
        Language::Japanese,
        Language::Chinese,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::Korean => "ko",
            Language::English => "en",
            Language::Japanese => "ja",
            Language::Chinese => "zh",
        }
    }

    /// 用于提示词中的语言名称（英文）
    pub fn english_name(&self) -> &'static str {
        match self {
            Language::Korean => "Korean",
            Language::English => "English",
            Language::Japanese => "Japanese",
            Language::Chinese => "Chinese",
        }
    }

    /// 宽松解析：接受 `ko`、`ko-KR`、`kor`、`korean`、`한국어` 等写法
    pub fn from_code(raw: &str) -> Option<Self> {
        let normalized = raw
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '`')
            .to_lowercase();
        let primary = normalized
            .split(|c: char| c == '-' || c == '_')
            .next()
            .unwrap_or_default();

        match primary {
            "ko" | "kor" | "korean" | "한국어" => Some(Language::Korean),
            "en" | "eng" | "english" | "영어" => Some(Language::English),
            "ja" | "jp" | "jpn" | "japanese" | "日本語" | "일본어" => Some(Language::Japanese),
            "zh" | "cn" | "chi" | "zho" | "chinese" | "中文" | "중국어" => Some(Language::Chinese),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s).ok_or_else(|| format!("Unsupported language: {}", s))
    }
}

#[inline]
fn is_hangul(ch: char) -> bool {
    matches!(ch, '\u{AC00}'..='\u{D7A3}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}')
}

#[inline]
fn is_kana(ch: char) -> bool {
    matches!(ch, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}')
}

#[inline]
fn is_han(ch: char) -> bool {
    matches!(ch, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}')
}

/// 按文字系统统计的启发式检测
///
/// 韩文字母 > 假名 > 汉字 的优先级；都没有时返回英语。
/// 只在 LLM 检测失败或返回不支持的语言时使用。
pub fn detect_by_script(text: &str) -> Language {
    let (mut hangul, mut kana, mut han) = (0usize, 0usize, 0usize);
    for ch in text.chars() {
        if is_hangul(ch) {
            hangul += 1;
        } else if is_kana(ch) {
            kana += 1;
        } else if is_han(ch) {
            han += 1;
        }
    }

    if hangul > 0 && hangul >= kana {
        Language::Korean
    } else if kana > 0 {
        // 日文通常混有汉字，只要出现假名即判定为日语
        Language::Japanese
    } else if han > 0 {
        Language::Chinese
    } else {
        Language::English
    }
}
