//! 翻译 Agent
//!
//! - `translate_index_mapped`: 全部文本项一次翻译，数组长度必须与输入一致，否则整次重试
//! - `translate_page_chunked`: 旧路径，按块翻译纯文本后按比例分配回各文本项

use crate::application::agents::{generate_parsed, generate_text};
use crate::application::error::WorkflowError;
use crate::application::ports::LlmPort;
use crate::application::prompts::{chunk_translation_prompt, translation_prompt};
use crate::domain::translation::{
    chunk_text, flatten_pages, parse_translated_array, redistribute_sentences, RemapReport,
};
use crate::domain::{Language, Page, TextItem};

/// 同一文本项内句子的连接符：中日文不加空格
pub fn sentence_joiner(target: Language) -> &'static str {
    match target {
        Language::Japanese | Language::Chinese => "",
        Language::Korean | Language::English => " ",
    }
}

/// 索引映射翻译
///
/// 数组长度不符、不是数组或不是合法 JSON 时整次重试，最多重试 `max_retries` 次；
/// 用尽后返回 `WorkflowError::Translation`，不做截断或补齐
pub async fn translate_index_mapped(
    llm: &dyn LlmPort,
    model: &str,
    target: Language,
    pages: &[Page],
    max_retries: u32,
) -> Result<Vec<Page>, WorkflowError> {
    let flat = flatten_pages(pages);
    if flat.is_empty() {
        return Ok(pages.to_vec());
    }

    let expected = flat.len();
    let payload =
        serde_json::to_string(&flat.items).map_err(|e| WorkflowError::Internal(e.to_string()))?;
    let request = translation_prompt(target, &payload, expected).into_json_request(model);

    let translated = generate_parsed(llm, request, max_retries + 1, "translation", |content| {
        parse_translated_array(content, expected).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| WorkflowError::Translation(e.to_string()))?;

    tracing::info!(items = expected, target = %target, "Index-mapped translation completed");
    flat.unflatten(translated)
        .map_err(|e| WorkflowError::Translation(e.to_string()))
}

/// 分块翻译单页（旧路径）
///
/// 文本项数量保持不变；句数不一致时按比例分配并记录警告
pub async fn translate_page_chunked(
    llm: &dyn LlmPort,
    model: &str,
    target: Language,
    page: &Page,
    chunk_max_chars: usize,
) -> Result<(Page, RemapReport), WorkflowError> {
    let originals: Vec<String> = page.texts.iter().map(|t| t.text.clone()).collect();
    let joined = originals.join("\n\n");

    let mut translated = Vec::new();
    for chunk in chunk_text(&joined, chunk_max_chars) {
        let request = chunk_translation_prompt(target, &chunk).into_request(model);
        translated.push(generate_text(llm, request, "chunk_translation").await?);
    }

    let (items, report) =
        redistribute_sentences(&originals, &translated.join("\n"), sentence_joiner(target));
    if !report.is_exact() {
        tracing::warn!(
            page_key = page.page_key,
            original = report.original_sentences,
            translated = report.translated_sentences,
            "Chunked translation remapped proportionally"
        );
    }

    let texts = items.into_iter().map(TextItem::new).collect();
    Ok((page.with_texts(texts), report))
}
