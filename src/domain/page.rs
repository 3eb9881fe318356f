//! Page - 输入内容的基本单元
//!
//! 一页由调用方分配的 `pageKey` 与有序的文本片段组成。
//! `pageKey` 不保证连续，下游阶段输出时必须按 `pageKey` 重新排序。

use serde::{Deserialize, Serialize};

/// 页内文本片段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextItem {
    pub text: String,
}

impl TextItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// 页
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub page_key: i64,
    #[serde(default)]
    pub texts: Vec<TextItem>,
}

impl Page {
    pub fn new(page_key: i64, texts: Vec<TextItem>) -> Self {
        Self { page_key, texts }
    }

    /// 便捷构造：从字符串列表创建
    pub fn from_strs<S: AsRef<str>>(page_key: i64, texts: &[S]) -> Self {
        Self {
            page_key,
            texts: texts.iter().map(|t| TextItem::new(t.as_ref())).collect(),
        }
    }

    /// 页内全部文本，以换行连接
    pub fn joined_text(&self) -> String {
        self.texts
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 页内字符数（按 Unicode 标量计）
    pub fn char_count(&self) -> usize {
        self.texts.iter().map(|t| t.text.chars().count()).sum()
    }

    pub fn is_blank(&self) -> bool {
        self.texts.iter().all(|t| t.text.trim().is_empty())
    }

    /// 替换文本，保持 page_key 不变
    pub fn with_texts(&self, texts: Vec<TextItem>) -> Self {
        Self {
            page_key: self.page_key,
            texts,
        }
    }
}

/// 按 pageKey 升序排序（稳定排序，重复 key 保持原顺序）
pub fn sort_pages(pages: &mut [Page]) {
    pages.sort_by_key(|p| p.page_key);
}

/// 所有页的文本，页间以空行分隔
pub fn full_text(pages: &[Page]) -> String {
    pages
        .iter()
        .map(Page::joined_text)
        .filter(|t| !t.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// 所有页的字符总数
pub fn total_chars(pages: &[Page]) -> usize {
    pages.iter().map(Page::char_count).sum()
}

/// 截取前 `max_chars` 个字符作为样本（用于语言检测）
pub fn sample_text(pages: &[Page], max_chars: usize) -> String {
    full_text(pages).chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_deserialize_camel_case() {
        let json = r#"{"pageKey": 7, "texts": [{"text": "a"}, {"text": "b"}]}"#;
        let page: Page = serde_json::from_str(json).unwrap();
        assert_eq!(page.page_key, 7);
        assert_eq!(page.texts.len(), 2);
        assert_eq!(page.joined_text(), "a\nb");
    }

    #[test]
    fn test_sort_pages_by_key() {
        let mut pages = vec![
            Page::from_strs(3, &["c"]),
            Page::from_strs(1, &["a"]),
            Page::from_strs(2, &["b"]),
        ];
        sort_pages(&mut pages);
        let keys: Vec<i64> = pages.iter().map(|p| p.page_key).collect();
        assert_eq!(keys, vec![1, 2, 3]);
    }

    #[test]
    fn test_full_text_skips_blank_pages() {
        let pages = vec![
            Page::from_strs(1, &["첫 문장."]),
            Page::from_strs(2, &["  "]),
            Page::from_strs(3, &["끝."]),
        ];
        assert_eq!(full_text(&pages), "첫 문장.\n\n끝.");
        assert!(pages[1].is_blank());
    }

    #[test]
    fn test_sample_text_counts_chars_not_bytes() {
        let pages = vec![Page::from_strs(1, &["가나다라마"])];
        assert_eq!(sample_text(&pages, 3), "가나다");
        assert_eq!(total_chars(&pages), 5);
    }
}
