//! 提示词模板
//!
//! 每个功能一组模板，按语言给出系统提示与回复语言约束

mod creative;
mod sound;
mod text;

pub use creative::{lyrics_prompt, play_prompt, quiz_prompt};
pub use sound::{effect_choice_prompt, effect_position_prompt, music_choice_prompt};
pub use text::{
    book_summary_prompt, chunk_translation_prompt, detect_language_prompt, orthography_prompt,
    page_summary_prompt, refine_prompt, translation_prompt,
};

use crate::application::ports::LlmRequest;
use crate::domain::Language;

/// 系统提示 + 用户提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// 构造 LLM 请求
    pub fn into_request(self, model: &str) -> LlmRequest {
        LlmRequest::new(model, self.user).with_system(self.system)
    }

    /// 构造要求 JSON 输出的 LLM 请求
    pub fn into_json_request(self, model: &str) -> LlmRequest {
        self.into_request(model).json()
    }
}

/// 回复语言约束
pub(crate) fn respond_in(language: Language) -> &'static str {
    match language {
        Language::Korean => "반드시 한국어로 답하세요.",
        Language::English => "Respond in English.",
        Language::Japanese => "必ず日本語で回答してください。",
        Language::Chinese => "请务必用中文回答。",
    }
}

/// 只输出 JSON 的约束
pub(crate) const JSON_ONLY: &str =
    "Return only valid JSON. Do not wrap it in markdown and do not add any explanation.";
