//! 从 LLM 回复中提取 JSON
//!
//! 模型常把 JSON 包在 ```json 代码块里，或在前后附带说明文字

use serde::de::DeserializeOwned;
use serde_json::Value;

/// 提取回复中的 JSON 片段
///
/// 优先取代码块内容；否则取第一个 `[`/`{` 到与之对应的最后一个 `]`/`}` 之间的内容
pub fn extract_json_block(raw: &str) -> &str {
    let trimmed = raw.trim();

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        // 跳过语言标记（如 json）
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }

    let open = trimmed.find(|c: char| c == '[' || c == '{');
    match open {
        Some(start) => {
            let closing = if trimmed[start..].starts_with('[') { ']' } else { '}' };
            match trimmed.rfind(closing) {
                Some(end) if end > start => &trimmed[start..=end],
                _ => &trimmed[start..],
            }
        }
        None => trimmed,
    }
}

/// 提取并反序列化
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(extract_json_block(raw))
}

/// 取出数组：本身是数组，或是只有一个数组字段的对象（如 `{"quizzes": [...]}`）
pub fn unwrap_array(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) if map.len() == 1 => match map.into_iter().next() {
            Some((_, Value::Array(items))) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        assert_eq!(extract_json_block(" [1, 2] "), "[1, 2]");
    }

    #[test]
    fn test_fenced_json() {
        let raw = "Here you go:\n```json\n{\"a\": 1}\n```\nThanks";
        assert_eq!(extract_json_block(raw), "{\"a\": 1}");
    }

    #[test]
    fn test_surrounding_text() {
        let raw = "Result: [\"a\", \"b\"] done";
        let parsed: Vec<String> = parse_json(raw).unwrap();
        assert_eq!(parsed, vec!["a", "b"]);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(parse_json::<Value>("no json here").is_err());
    }

    #[test]
    fn test_unwrap_array() {
        let wrapped: Value = serde_json::from_str(r#"{"items": [1, 2]}"#).unwrap();
        assert_eq!(unwrap_array(wrapped).map(|v| v.len()), Some(2));
        let object: Value = serde_json::from_str(r#"{"a": 1}"#).unwrap();
        assert!(unwrap_array(object).is_none());
    }
}
