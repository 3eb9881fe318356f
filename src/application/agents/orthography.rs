//! 校对 Agent
//!
//! 页内每个文本项先切成表格块与正文块，只有正文块送给模型，表格块原样保留。
//! 模型输入输出都是等长字符串数组，长度不符按格式错误重试。

use crate::application::agents::{generate_parsed, DEFAULT_PARSE_ATTEMPTS};
use crate::application::error::WorkflowError;
use crate::application::ports::LlmPort;
use crate::application::prompts::{orthography_prompt, refine_prompt, Prompt};
use crate::domain::text_segmenter::{join_blocks, segment_blocks, BlockKind, TextBlock};
use crate::domain::translation::parse_translated_array;
use crate::domain::{Language, Page, TextItem};

/// 一页的分块结果
struct PageBlocks {
    /// 每个文本项的块序列
    items: Vec<Vec<TextBlock>>,
}

impl PageBlocks {
    fn of(page: &Page) -> Self {
        Self {
            items: page.texts.iter().map(|t| segment_blocks(&t.text)).collect(),
        }
    }

    /// 需要送给模型的正文块（按项序、块序）
    fn prose(&self) -> Vec<String> {
        self.items
            .iter()
            .flatten()
            .filter(|b| b.kind == BlockKind::Prose && !b.text.trim().is_empty())
            .map(|b| b.text.clone())
            .collect()
    }

    /// 用改写后的正文块替换原正文块，重建页
    fn rebuild(mut self, page: &Page, rewritten: Vec<String>) -> Page {
        let mut rewritten = rewritten.into_iter();
        for block in self.items.iter_mut().flatten() {
            if block.kind == BlockKind::Prose && !block.text.trim().is_empty() {
                if let Some(text) = rewritten.next() {
                    block.text = text;
                }
            }
        }
        let texts = self
            .items
            .iter()
            .map(|blocks| TextItem::new(join_blocks(blocks)))
            .collect();
        page.with_texts(texts)
    }
}

async fn rewrite_prose<F>(
    llm: &dyn LlmPort,
    model: &str,
    page: &Page,
    agent: &'static str,
    build_prompt: F,
) -> Result<Page, WorkflowError>
where
    F: FnOnce(&str, usize) -> Prompt,
{
    let blocks = PageBlocks::of(page);
    let prose = blocks.prose();
    if prose.is_empty() {
        return Ok(page.clone());
    }

    let count = prose.len();
    let payload = serde_json::to_string(&prose)
        .map_err(|e| WorkflowError::Internal(e.to_string()))?;
    let request = build_prompt(&payload, count).into_json_request(model);

    let rewritten = generate_parsed(llm, request, DEFAULT_PARSE_ATTEMPTS, agent, |content| {
        parse_translated_array(content, count).map_err(|e| e.to_string())
    })
    .await?;

    Ok(blocks.rebuild(page, rewritten))
}

/// 逐页校对
pub async fn correct_page(
    llm: &dyn LlmPort,
    model: &str,
    language: Language,
    page: &Page,
) -> Result<Page, WorkflowError> {
    rewrite_prose(llm, model, page, "orthography", |payload, count| {
        orthography_prompt(language, payload, count)
    })
    .await
}

/// 结合前后页再校一遍
pub async fn refine_page(
    llm: &dyn LlmPort,
    model: &str,
    language: Language,
    page: &Page,
    previous: Option<&Page>,
    next: Option<&Page>,
) -> Result<Page, WorkflowError> {
    let previous = previous.map(Page::joined_text).unwrap_or_default();
    let next = next.map(Page::joined_text).unwrap_or_default();
    rewrite_prose(llm, model, page, "refine", |payload, count| {
        refine_prompt(language, payload, count, &previous, &next)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::FakeLlmClient;

    #[tokio::test]
    async fn test_table_blocks_bypass_model() {
        let llm = FakeLlmClient::new().on("Correct spelling", r#"["고양이가 앉았다."]"#);
        let page = Page::from_strs(1, &["고양이가앉았다.\n이름 | 나이\n나비 | 3"]);

        let corrected = correct_page(&llm, "m", Language::Korean, &page).await.unwrap();
        assert_eq!(corrected.texts[0].text, "고양이가 앉았다.\n이름 | 나이\n나비 | 3");

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].prompt.contains("나비 | 3"));
        assert!(calls[0].json_output);
    }

    #[tokio::test]
    async fn test_table_only_page_makes_no_call() {
        let llm = FakeLlmClient::new();
        let page = Page::from_strs(2, &["a | b\nc | d"]);
        let corrected = correct_page(&llm, "m", Language::English, &page).await.unwrap();
        assert_eq!(corrected, page);
        assert!(llm.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_length_is_error() {
        let llm = FakeLlmClient::new().on("Correct spelling", r#"["a", "b"]"#);
        let page = Page::from_strs(1, &["only one block"]);
        let result = correct_page(&llm, "m", Language::English, &page).await;
        assert!(result.is_err());
        assert_eq!(llm.calls().len(), DEFAULT_PARSE_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn test_refine_includes_neighbors() {
        let llm = FakeLlmClient::new().on("surrounding pages", r#"["Tom ran."]"#);
        let prev = Page::from_strs(1, &["Tom woke up."]);
        let page = Page::from_strs(2, &["Tomm ran."]);

        let refined = refine_page(&llm, "m", Language::English, &page, Some(&prev), None)
            .await
            .unwrap();
        assert_eq!(refined.texts[0].text, "Tom ran.");
        assert!(llm.calls()[0].prompt.contains("Tom woke up."));
    }
}
