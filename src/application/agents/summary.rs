//! 摘要 Agent

use crate::application::agents::generate_text;
use crate::application::error::WorkflowError;
use crate::application::ports::LlmPort;
use crate::application::prompts::{book_summary_prompt, page_summary_prompt};
use crate::domain::{Language, Page};

pub async fn summarize_page(
    llm: &dyn LlmPort,
    model: &str,
    language: Language,
    page: &Page,
) -> Result<String, WorkflowError> {
    if page.is_blank() {
        return Ok(String::new());
    }
    let request = page_summary_prompt(language, &page.joined_text()).into_request(model);
    generate_text(llm, request, "page_summary").await
}

/// 汇总各页摘要（空摘要跳过）
pub async fn summarize_book(
    llm: &dyn LlmPort,
    model: &str,
    language: Language,
    page_summaries: &[String],
) -> Result<String, WorkflowError> {
    let joined = page_summaries
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");
    if joined.is_empty() {
        return Ok(String::new());
    }
    let request = book_summary_prompt(language, &joined).into_request(model);
    generate_text(llm, request, "book_summary").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::FakeLlmClient;

    #[tokio::test]
    async fn test_blank_page_skips_model() {
        let llm = FakeLlmClient::new();
        let page = Page::from_strs(1, &["   "]);
        assert_eq!(summarize_page(&llm, "m", Language::English, &page).await.unwrap(), "");
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_book_summary_joins_page_summaries() {
        let llm = FakeLlmClient::new().on("whole book", "A cat sits and naps.");
        let summaries = vec!["A cat sits.".to_string(), String::new(), "It naps.".to_string()];
        let summary = summarize_book(&llm, "m", Language::English, &summaries).await.unwrap();
        assert_eq!(summary, "A cat sits and naps.");
        assert!(llm.calls()[0].prompt.contains("A cat sits.\nIt naps."));
    }
}
