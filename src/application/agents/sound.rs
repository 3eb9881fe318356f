//! 背景音乐 / 音效选择与音效定时
//!
//! 选择流程：页文本向量化 → 在目录集合中检索候选 → 模型从候选中挑一个。
//! 模型回复无法解析时退回相似度最高的候选。

use std::sync::Arc;

use serde::Deserialize;

use crate::application::agents::{generate_parsed, DEFAULT_PARSE_ATTEMPTS};
use crate::application::error::WorkflowError;
use crate::application::ports::{
    EmbeddingPort, LlmPort, LlmRequest, SearchHit, SearchQuery, VectorSearchPort,
};
use crate::application::prompts::{effect_choice_prompt, effect_position_prompt, music_choice_prompt};
use crate::domain::json_payload::parse_json;
use crate::domain::sound::{BackgroundMusic, CatalogCandidate, EffectPosition, SoundEffect};
use crate::domain::{Language, Page};

/// 目录检索
pub struct SoundCatalog {
    embedding: Arc<dyn EmbeddingPort>,
    search: Arc<dyn VectorSearchPort>,
    music_collection: String,
    effect_collection: String,
    limit: usize,
}

impl SoundCatalog {
    pub fn new(
        embedding: Arc<dyn EmbeddingPort>,
        search: Arc<dyn VectorSearchPort>,
        music_collection: impl Into<String>,
        effect_collection: impl Into<String>,
        limit: usize,
    ) -> Self {
        Self {
            embedding,
            search,
            music_collection: music_collection.into(),
            effect_collection: effect_collection.into(),
            limit: limit.max(1),
        }
    }

    pub async fn music_candidates(&self, text: &str) -> Result<Vec<CatalogCandidate>, WorkflowError> {
        self.candidates(text, &self.music_collection).await
    }

    pub async fn effect_candidates(&self, text: &str) -> Result<Vec<CatalogCandidate>, WorkflowError> {
        self.candidates(text, &self.effect_collection).await
    }

    async fn candidates(&self, text: &str, collection: &str) -> Result<Vec<CatalogCandidate>, WorkflowError> {
        let vector = self
            .embedding
            .embed(text)
            .await
            .map_err(|e| WorkflowError::agent("embedding", e))?;

        let hits = self
            .search
            .search(SearchQuery {
                collection: collection.to_string(),
                vector,
                limit: self.limit,
                payload_fields: vec!["path".to_string(), "description".to_string()],
            })
            .await
            .map_err(|e| WorkflowError::agent("vector_search", e))?;

        Ok(hits.iter().filter_map(candidate_from_hit).collect())
    }
}

/// 命中转候选；没有路径的命中丢弃
fn candidate_from_hit(hit: &SearchHit) -> Option<CatalogCandidate> {
    let path = hit
        .payload_str("path")
        .or_else(|| hit.payload_str("file_path"))
        .filter(|p| !p.trim().is_empty())?;
    Some(CatalogCandidate {
        path: path.to_string(),
        score: hit.score,
        description: hit.payload_str("description").unwrap_or_default().to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct Choice {
    index: i64,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct Timing {
    position: f64,
    duration: f64,
}

/// 让模型从候选中挑一个；返回 `None` 表示模型认为都不合适
async fn choose(
    llm: &dyn LlmPort,
    model: &str,
    request: LlmRequest,
    candidates: &[CatalogCandidate],
    agent: &'static str,
) -> Option<(usize, String)> {
    let count = candidates.len() as i64;
    let result = generate_parsed(llm, request, DEFAULT_PARSE_ATTEMPTS, agent, |content| {
        let choice: Choice = parse_json(content).map_err(|e| e.to_string())?;
        if choice.index >= count {
            return Err(format!("index {} out of range", choice.index));
        }
        Ok(choice)
    })
    .await;

    match result {
        Ok(choice) if choice.index < 0 => None,
        Ok(choice) => Some((choice.index as usize, choice.reason)),
        Err(e) => {
            tracing::warn!(agent = agent, model = %model, error = %e, "Choice failed, using top candidate");
            Some((0, "highest similarity".to_string()))
        }
    }
}

/// 为一页挑选背景音乐
pub async fn select_music(
    llm: &dyn LlmPort,
    model: &str,
    language: Language,
    page: &Page,
    candidates: &[CatalogCandidate],
) -> BackgroundMusic {
    if candidates.is_empty() {
        return BackgroundMusic::unselected(page.page_key, "no catalog candidates");
    }
    let request = music_choice_prompt(language, &page.joined_text(), candidates).into_json_request(model);
    // 背景音乐每页都要有，模型拒绝时仍取第一个
    let (index, reason) = choose(llm, model, request, candidates, "music_choice")
        .await
        .unwrap_or((0, "highest similarity".to_string()));
    BackgroundMusic::from_candidate(page.page_key, &candidates[index], reason)
}

/// 为一页挑选音效；模型可以选择不加
pub async fn select_effect(
    llm: &dyn LlmPort,
    model: &str,
    language: Language,
    page: &Page,
    candidates: &[CatalogCandidate],
) -> SoundEffect {
    if candidates.is_empty() {
        return SoundEffect::unselected(page.page_key, "no catalog candidates");
    }
    let request = effect_choice_prompt(language, &page.joined_text(), candidates).into_json_request(model);
    match choose(llm, model, request, candidates, "effect_choice").await {
        Some((index, reason)) => SoundEffect::from_candidate(page.page_key, &candidates[index], reason),
        None => SoundEffect::unselected(page.page_key, "no matching effect"),
    }
}

/// 音效在页内的位置；失败时放在页首
pub async fn position_effect(
    llm: &dyn LlmPort,
    model: &str,
    page: &Page,
    effect: &SoundEffect,
) -> EffectPosition {
    let request = effect_position_prompt(&page.joined_text(), &effect.prompt_text()).into_json_request(model);
    let timing = generate_parsed(llm, request, DEFAULT_PARSE_ATTEMPTS, "effect_timing", |content| {
        parse_json::<Timing>(content).map_err(|e| e.to_string())
    })
    .await;

    match timing {
        Ok(t) => EffectPosition::clamped(&effect.effect_path, t.position, t.duration),
        Err(e) => {
            tracing::warn!(page_key = page.page_key, error = %e, "Effect timing failed, using default position");
            EffectPosition::default_for(&effect.effect_path)
        }
    }
}
