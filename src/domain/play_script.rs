//! 剧本解析与集体说话人检测
//!
//! 剧本每行格式为 `说话人: 台词`，说话人只能是 `narrator` 或 `speakerN`。
//! 模型有时会生成“大家”“family”这类集体说话人，无法映射到单一音色，需要重新生成。

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// `speaker: text` 行
static SPEAKER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\**\s*([^:：\n]{1,40}?)\s*\**\s*[:：]\s*(.+?)\s*$").expect("valid speaker regex")
});

/// 合法说话人
static ALLOWED_SPEAKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(narrator|speaker\d+)$").expect("valid allowed-speaker regex"));

/// 集体说话人黑名单（小写比较）
const FORBIDDEN_SPEAKERS: &[&str] = &[
    // English
    "everyone", "everybody", "all", "family", "together", "crowd", "people", "children",
    "friends", "both", "group", "chorus", "others", "audience",
    // 한국어
    "모두", "모두들", "다같이", "다 같이", "다함께", "다 함께", "함께", "가족", "사람들",
    "아이들", "친구들", "일동", "우리",
    // 日本語
    "みんな", "皆", "全員", "家族", "一同", "みなさん", "皆さん",
    // 中文
    "大家", "所有人", "全家", "众人", "眾人", "一起", "家人", "合", "齐声",
];

/// 剧本行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptLine {
    pub speaker: String,
    pub text: String,
    /// 说话人是否可以映射到一个合成音色
    pub mappable: bool,
}

/// 解析后的剧本
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayScript {
    pub raw: String,
    pub lines: Vec<ScriptLine>,
    /// 出场说话人（按首次出现顺序，只含合法说话人）
    pub speakers: Vec<String>,
    /// 命中黑名单的说话人
    pub flagged_speakers: Vec<String>,
}

fn normalize_speaker(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '*' || c == '[' || c == ']' || c == '(' || c == ')')
        .trim()
        .to_lowercase()
}

pub fn is_forbidden_speaker(token: &str) -> bool {
    FORBIDDEN_SPEAKERS.contains(&normalize_speaker(token).as_str())
}

pub fn is_allowed_speaker(token: &str) -> bool {
    ALLOWED_SPEAKER.is_match(&normalize_speaker(token))
}

/// 扫描剧本中所有 `说话人:` 标记，返回命中黑名单的说话人（去重，保持顺序）
pub fn find_forbidden_speakers(script: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    script
        .lines()
        .filter_map(|line| SPEAKER_LINE.captures(line))
        .filter_map(|caps| caps.get(1).map(|m| normalize_speaker(m.as_str())))
        .filter(|speaker| is_forbidden_speaker(speaker))
        .filter(|speaker| seen.insert(speaker.clone()))
        .collect()
}

/// 解析剧本
///
/// 不符合 `说话人: 台词` 格式的行被忽略；说话人不在合法词表中的行保留但标记为不可映射
pub fn parse_script(raw: &str) -> PlayScript {
    let mut lines = Vec::new();
    let mut speakers: Vec<String> = Vec::new();

    for line in raw.lines() {
        let Some(caps) = SPEAKER_LINE.captures(line) else {
            continue;
        };
        let (Some(speaker), Some(text)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let speaker = normalize_speaker(speaker.as_str());
        let mappable = is_allowed_speaker(&speaker);
        if mappable && !speakers.contains(&speaker) {
            speakers.push(speaker.clone());
        }
        lines.push(ScriptLine {
            speaker,
            text: text.as_str().to_string(),
            mappable,
        });
    }

    PlayScript {
        raw: raw.to_string(),
        lines,
        speakers,
        flagged_speakers: find_forbidden_speakers(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_line_is_forbidden() {
        let script = "narrator: They packed the car.\nfamily: let's go";
        assert_eq!(find_forbidden_speakers(script), vec!["family"]);
    }

    #[test]
    fn test_localized_collective_speakers() {
        let script = "narrator: 출발!\n모두: 가자!\n大家：走吧！\nみんな: 行こう";
        assert_eq!(
            find_forbidden_speakers(script),
            vec!["모두", "大家", "みんな"]
        );
    }

    #[test]
    fn test_case_insensitive_and_deduplicated() {
        let script = "Everyone: hi\nEVERYONE: bye\nspeaker1: ok";
        assert_eq!(find_forbidden_speakers(script), vec!["everyone"]);
    }

    #[test]
    fn test_clean_script_has_no_forbidden() {
        let script = "narrator: Once upon a time.\nspeaker1: Hello!\nspeaker2: Hi.";
        assert!(find_forbidden_speakers(script).is_empty());
    }

    #[test]
    fn test_parse_script() {
        let script = "Title line without colon\nnarrator: Once.\n**speaker1**: Hello: world\nTom: hey";
        let parsed = parse_script(script);

        assert_eq!(parsed.lines.len(), 3);
        assert_eq!(parsed.lines[1].speaker, "speaker1");
        assert_eq!(parsed.lines[1].text, "Hello: world");
        assert!(parsed.lines[1].mappable);
        assert!(!parsed.lines[2].mappable);
        assert_eq!(parsed.speakers, vec!["narrator", "speaker1"]);
        assert!(parsed.flagged_speakers.is_empty());
    }

    #[test]
    fn test_full_width_colon() {
        let parsed = parse_script("speaker2：你好");
        assert_eq!(parsed.lines[0].speaker, "speaker2");
        assert_eq!(parsed.lines[0].text, "你好");
    }
}
