//! 索引映射翻译
//!
//! 1. 按页序、页内序把所有文本项拍平成长度 N 的数组
//! 2. 译文必须是长度恰好为 N 的字符串数组，否则整次作废
//! 3. 按拍平时的形状还原回各页

use thiserror::Error;

use crate::domain::json_payload::{extract_json_block, unwrap_array};
use crate::domain::page::{Page, TextItem};

/// 译文校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("Translated payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Translated payload is not a JSON array")]
    NotAnArray,

    #[error("Translated item {0} is not a string")]
    NonStringItem(usize),

    #[error("Translated array length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// 拍平后的文本及其形状
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatTexts {
    /// 所有文本项，按页序、页内序排列
    pub items: Vec<String>,
    /// 每页的 (page_key, 文本项数量)
    shape: Vec<(i64, usize)>,
}

impl FlatTexts {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 按原形状还原。`translated` 长度必须等于 N
    pub fn unflatten(&self, translated: Vec<String>) -> Result<Vec<Page>, MappingError> {
        if translated.len() != self.items.len() {
            return Err(MappingError::LengthMismatch {
                expected: self.items.len(),
                actual: translated.len(),
            });
        }

        let mut iter = translated.into_iter();
        let pages = self
            .shape
            .iter()
            .map(|&(page_key, count)| {
                let texts = iter.by_ref().take(count).map(TextItem::new).collect();
                Page::new(page_key, texts)
            })
            .collect();
        Ok(pages)
    }
}

/// 拍平所有页的文本项
pub fn flatten_pages(pages: &[Page]) -> FlatTexts {
    let mut items = Vec::new();
    let mut shape = Vec::with_capacity(pages.len());
    for page in pages {
        shape.push((page.page_key, page.texts.len()));
        items.extend(page.texts.iter().map(|t| t.text.clone()));
    }
    FlatTexts { items, shape }
}

/// 解析 LLM 返回的译文数组，并校验长度
///
/// 全有或全无：任何一项不合格都返回错误，由调用方整体重试
pub fn parse_translated_array(raw: &str, expected: usize) -> Result<Vec<String>, MappingError> {
    let value: serde_json::Value = serde_json::from_str(extract_json_block(raw))
        .map_err(|e| MappingError::InvalidJson(e.to_string()))?;

    // 兼容 {"translations": [...]} 这类包了一层对象的回复
    let array = unwrap_array(value).ok_or(MappingError::NotAnArray)?;

    if array.len() != expected {
        return Err(MappingError::LengthMismatch {
            expected,
            actual: array.len(),
        });
    }

    array
        .into_iter()
        .enumerate()
        .map(|(i, v)| match v {
            serde_json::Value::String(s) => Ok(s),
            _ => Err(MappingError::NonStringItem(i)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pages() -> Vec<Page> {
        vec![
            Page::from_strs(5, &["a", "b"]),
            Page::from_strs(2, &[] as &[&str]),
            Page::from_strs(9, &["c"]),
        ]
    }

    #[test]
    fn test_flatten_preserves_order() {
        let flat = flatten_pages(&sample_pages());
        assert_eq!(flat.items, vec!["a", "b", "c"]);
        assert_eq!(flat.len(), 3);
    }

    #[test]
    fn test_unflatten_restores_shape() {
        let pages = sample_pages();
        let flat = flatten_pages(&pages);
        let restored = flat
            .unflatten(vec!["A".into(), "B".into(), "C".into()])
            .unwrap();

        assert_eq!(restored.len(), pages.len());
        for (orig, new) in pages.iter().zip(restored.iter()) {
            assert_eq!(orig.page_key, new.page_key);
            assert_eq!(orig.texts.len(), new.texts.len());
        }
        assert_eq!(restored[0].texts[1].text, "B");
        assert_eq!(restored[2].texts[0].text, "C");
    }

    #[test]
    fn test_cardinality_preserved_for_any_shape() {
        for n in 0..6usize {
            let pages: Vec<Page> = (0..n)
                .map(|k| {
                    let texts: Vec<String> = (0..k).map(|i| format!("{}-{}", k, i)).collect();
                    Page::from_strs(k as i64, &texts[..])
                })
                .collect();
            let flat = flatten_pages(&pages);
            let translated: Vec<String> = flat.items.iter().map(|s| s.to_uppercase()).collect();
            let restored = flat.unflatten(translated).unwrap();
            let count = |ps: &[Page]| ps.iter().map(|p| p.texts.len()).sum::<usize>();
            assert_eq!(count(&restored), count(&pages));
            assert_eq!(restored.len(), pages.len());
        }
    }

    #[test]
    fn test_unflatten_rejects_wrong_length() {
        let flat = flatten_pages(&sample_pages());
        let err = flat.unflatten(vec!["only one".into()]).unwrap_err();
        assert_eq!(err, MappingError::LengthMismatch { expected: 3, actual: 1 });
    }

    #[test]
    fn test_parse_translated_array() {
        let parsed = parse_translated_array("```json\n[\"가\", \"나\"]\n```", 2).unwrap();
        assert_eq!(parsed, vec!["가", "나"]);

        let wrapped = parse_translated_array(r#"{"translations": ["x"]}"#, 1).unwrap();
        assert_eq!(wrapped, vec!["x"]);
    }

    #[test]
    fn test_parse_rejects_bad_payloads() {
        assert!(matches!(
            parse_translated_array("not json", 1),
            Err(MappingError::InvalidJson(_))
        ));
        assert_eq!(
            parse_translated_array(r#"{"a": 1, "b": 2}"#, 1),
            Err(MappingError::NotAnArray)
        );
        assert_eq!(
            parse_translated_array(r#"["a", "b", "c"]"#, 2),
            Err(MappingError::LengthMismatch { expected: 2, actual: 3 })
        );
        assert_eq!(
            parse_translated_array(r#"["a", 3]"#, 2),
            Err(MappingError::NonStringItem(1))
        );
    }
}
