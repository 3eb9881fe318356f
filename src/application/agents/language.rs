//! 语言检测

use crate::application::ports::LlmPort;
use crate::application::prompts::detect_language_prompt;
use crate::domain::language::detect_by_script;
use crate::domain::page::sample_text;
use crate::domain::{Language, Page};

/// 送去检测的样本长度（字符）
pub const DETECTION_SAMPLE_CHARS: usize = 500;

/// 检测内容语言
///
/// 先问模型；模型失败或回答不在支持范围内时按文字系统推断。不会失败。
pub async fn detect_language(llm: &dyn LlmPort, model: &str, pages: &[Page]) -> Language {
    let sample = sample_text(pages, DETECTION_SAMPLE_CHARS);
    let heuristic = detect_by_script(&sample);
    if sample.trim().is_empty() {
        return heuristic;
    }

    match llm.generate(detect_language_prompt(&sample).into_request(model)).await {
        Ok(response) => match Language::from_code(response.content.trim()) {
            Some(language) => {
                tracing::debug!(language = %language, "Language detected by model");
                language
            }
            None => {
                tracing::warn!(
                    reply = %response.content.trim(),
                    fallback = %heuristic,
                    "Unsupported language reply, using script heuristic"
                );
                heuristic
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, fallback = %heuristic, "Language detection failed, using script heuristic");
            heuristic
        }
    }
}
