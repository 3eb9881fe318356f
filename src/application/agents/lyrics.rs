//! 歌词生成 Agent

use crate::application::agents::generate_parsed;
use crate::application::error::WorkflowError;
use crate::application::ports::LlmPort;
use crate::application::prompts::lyrics_prompt;
use crate::domain::json_payload::parse_json;
use crate::domain::{Language, Lyrics};

/// 格式不对时的尝试次数
pub const LYRICS_ATTEMPTS: u32 = 3;

pub async fn generate_lyrics(
    llm: &dyn LlmPort,
    model: &str,
    language: Language,
    text: &str,
    genre: Option<&str>,
) -> Result<Lyrics, WorkflowError> {
    let request = lyrics_prompt(language, text, genre).into_json_request(model);
    let mut lyrics = generate_parsed(llm, request, LYRICS_ATTEMPTS, "lyrics", |content| {
        let lyrics: Lyrics = parse_json(content).map_err(|e| e.to_string())?;
        if lyrics.is_well_formed() {
            Ok(lyrics)
        } else {
            Err(format!("lyrics too short ({} lines)", lyrics.line_count()))
        }
    })
    .await?;

    // 请求指定的曲风优先
    if let Some(genre) = genre {
        lyrics.genre = Some(genre.to_string());
    }
    Ok(lyrics)
}
