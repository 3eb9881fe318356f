//! 剧本生成 Agent
//!
//! 每次生成后扫描说话人，命中集体说话人黑名单就重新生成。
//! 尝试用尽仍有命中时返回最后一版并标记，不视为错误：下游合成会跳过不可映射的行。
//! 后续尝试调用失败时同样退回到已有的最后一版；一版都没有才返回错误。

use crate::application::agents::generate_text;
use crate::application::error::WorkflowError;
use crate::application::ports::LlmPort;
use crate::application::prompts::play_prompt;
use crate::domain::play_script::find_forbidden_speakers;
use crate::domain::Language;

/// 默认最多尝试次数
pub const DEFAULT_PLAY_ATTEMPTS: u32 = 3;

/// 生成结果（未解析的剧本文本）
#[derive(Debug, Clone)]
pub struct PlayOutcome {
    pub raw: String,
    pub attempts: u32,
    /// 最后一版中仍出现的集体说话人
    pub forbidden: Vec<String>,
}

impl PlayOutcome {
    /// 是否仍含集体说话人
    pub fn is_flagged(&self) -> bool {
        !self.forbidden.is_empty()
    }
}

pub async fn generate_play(
    llm: &dyn LlmPort,
    model: &str,
    language: Language,
    text: &str,
    speaker_count: usize,
    max_attempts: u32,
) -> Result<PlayOutcome, WorkflowError> {
    let max_attempts = max_attempts.max(1);
    let mut last: Option<PlayOutcome> = None;
    let mut attempt = 0;

    loop {
        attempt += 1;
        let forbidden = last.as_ref().map(|o| o.forbidden.as_slice()).unwrap_or(&[]);
        let request = play_prompt(language, text, speaker_count, forbidden).into_request(model);

        let raw = match generate_text(llm, request, "play").await {
            Ok(raw) => raw,
            Err(e) => match last {
                Some(previous) => {
                    tracing::warn!(
                        attempt = attempt,
                        error = %e,
                        speakers = ?previous.forbidden,
                        "Regeneration failed, returning previous flagged script"
                    );
                    return Ok(previous);
                }
                None => return Err(e),
            },
        };

        let outcome = PlayOutcome {
            forbidden: find_forbidden_speakers(&raw),
            raw,
            attempts: attempt,
        };
        if !outcome.is_flagged() {
            return Ok(outcome);
        }

        if attempt >= max_attempts {
            tracing::warn!(
                attempts = attempt,
                speakers = ?outcome.forbidden,
                "Forbidden speakers remain after all attempts, returning flagged script"
            );
            return Ok(outcome);
        }

        tracing::info!(
            attempt = attempt,
            speakers = ?outcome.forbidden,
            "Script uses forbidden speakers, regenerating"
        );
        last = Some(outcome);
    }
}
