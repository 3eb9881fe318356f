//! Data Transfer Objects
//!
//! 请求体采用 camelCase；响应的运行信息字段（`run_id`、`state`、`execution_time`、`error`、`language`）
//! 与各功能内容平铺在同一对象中

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::workflows::PageSummary;
use crate::application::{ApplicationError, RunReport};
use crate::domain::quiz::MAX_QUIZ_COUNT;
use crate::domain::{
    BackgroundMusic, Language, Lyrics, Page, PlayScript, ProblemType, Quiz, ScriptLine, SoundEffect,
};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 功能响应：运行信息 + 内容
#[derive(Debug, Serialize)]
pub struct WorkflowResponse<T: Serialize> {
    pub run_id: Uuid,
    pub state: &'static str,
    pub execution_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub language: Option<Language>,
    #[serde(flatten)]
    pub content: T,
}

impl<T: Serialize> WorkflowResponse<T> {
    pub fn new(report: RunReport, content: T) -> Self {
        Self {
            run_id: report.run_id,
            state: report.state.as_str(),
            execution_time: report.execution_time,
            error: report.error,
            language: report.language,
            content,
        }
    }
}

// ============================================================================
// 请求
// ============================================================================

/// 各功能共有的请求字段
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagesBody {
    pub pages: Vec<Page>,
    #[serde(default)]
    pub model: Option<String>,
    /// 为空时自动检测
    #[serde(default)]
    pub language: Option<String>,
}

/// 校验后的共有字段
#[derive(Debug)]
pub struct ResolvedPages {
    pub pages: Vec<Page>,
    pub model: String,
    pub language: Option<Language>,
}

impl PagesBody {
    pub fn resolve(self, default_model: &str) -> Result<ResolvedPages, ApplicationError> {
        if self.pages.is_empty() {
            return Err(ApplicationError::validation("pages must not be empty"));
        }

        let model = self
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_model.to_string());

        let language = match self.language.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(code) => Some(parse_language(code)?),
        };

        Ok(ResolvedPages {
            pages: self.pages,
            model,
            language,
        })
    }
}

pub fn parse_language(code: &str) -> Result<Language, ApplicationError> {
    Language::from_code(code)
        .ok_or_else(|| ApplicationError::validation(format!("Unsupported language: {}", code)))
}

#[derive(Debug, Deserialize)]
pub struct OrthographyBody {
    #[serde(flatten)]
    pub common: PagesBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizBody {
    #[serde(flatten)]
    pub common: PagesBody,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub problem_types: Vec<u8>,
}

impl QuizBody {
    /// 未指定时使用 `default_count`；0 题或超过 `MAX_QUIZ_COUNT` 视为非法请求
    pub fn count(&self, default_count: usize) -> Result<usize, ApplicationError> {
        match self.count {
            Some(0) => Err(ApplicationError::validation("count must be at least 1")),
            Some(n) if n > MAX_QUIZ_COUNT => Err(ApplicationError::validation(format!(
                "count must be at most {}",
                MAX_QUIZ_COUNT
            ))),
            Some(n) => Ok(n),
            None => Ok(default_count.min(MAX_QUIZ_COUNT)),
        }
    }

    pub fn problem_types(&self) -> Result<Vec<ProblemType>, ApplicationError> {
        let mut types = Vec::with_capacity(self.problem_types.len());
        for raw in &self.problem_types {
            let problem_type = ProblemType::try_from(*raw).map_err(ApplicationError::validation)?;
            if !types.contains(&problem_type) {
                types.push(problem_type);
            }
        }
        Ok(types)
    }
}

#[derive(Debug, Deserialize)]
pub struct LyricsBody {
    #[serde(flatten)]
    pub common: PagesBody,
    #[serde(default)]
    pub genre: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayBody {
    #[serde(flatten)]
    pub common: PagesBody,
    #[serde(default = "default_speaker_count")]
    pub speaker_count: usize,
}

fn default_speaker_count() -> usize {
    2
}

#[derive(Debug, Deserialize)]
pub struct TranslationBody {
    #[serde(flatten)]
    pub common: PagesBody,
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct SummaryBody {
    #[serde(flatten)]
    pub common: PagesBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundBody {
    #[serde(flatten)]
    pub common: PagesBody,
    #[serde(default = "default_generate_audio")]
    pub generate_audio: bool,
}

fn default_generate_audio() -> bool {
    true
}

// ============================================================================
// 响应内容
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PagesContent {
    pub pages: Vec<Page>,
}

#[derive(Debug, Serialize)]
pub struct QuizContent {
    pub quizzes: Vec<Quiz>,
}

#[derive(Debug, Serialize)]
pub struct LyricsContent {
    pub lyrics: Option<Lyrics>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayContent {
    pub speakers: Vec<String>,
    pub lines: Vec<ScriptLine>,
    pub flagged_speakers: Vec<String>,
    pub raw: String,
    pub attempts: u32,
}

impl PlayContent {
    pub fn new(script: Option<PlayScript>, attempts: u32) -> Self {
        let script = script.unwrap_or_else(|| PlayScript {
            raw: String::new(),
            lines: Vec::new(),
            speakers: Vec::new(),
            flagged_speakers: Vec::new(),
        });
        Self {
            speakers: script.speakers,
            lines: script.lines,
            flagged_speakers: script.flagged_speakers,
            raw: script.raw,
            attempts,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummaryDto {
    pub page_key: i64,
    pub summary: String,
}

impl From<PageSummary> for PageSummaryDto {
    fn from(value: PageSummary) -> Self {
        Self {
            page_key: value.page_key,
            summary: value.summary,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryContent {
    pub summary: String,
    pub page_summaries: Vec<PageSummaryDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundContent {
    pub background_music: Vec<BackgroundMusic>,
    pub sound_effects: Vec<SoundEffect>,
}
