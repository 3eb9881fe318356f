//! Domain Layer - 领域层
//!
//! 纯逻辑，不做任何 I/O:
//! - page: 页与文本项
//! - language: 语言代码与文字系统检测
//! - quiz: 测验题校验与挑选
//! - translation: 译文对齐（索引映射 / 按比例重映射）
//! - play_script: 剧本解析与集体说话人检测
//! - sound: 背景音乐、音效及其时间位置
//! - lyrics: 歌词

pub mod json_payload;
pub mod language;
pub mod lyrics;
pub mod page;
pub mod play_script;
pub mod quiz;
pub mod sound;
pub mod translation;

// 共享的文本分割器
pub mod text_segmenter;

pub use language::Language;
pub use lyrics::Lyrics;
pub use page::{Page, TextItem};
pub use play_script::{PlayScript, ScriptLine};
pub use quiz::{ProblemType, Quiz, QuizCandidate};
pub use sound::{BackgroundMusic, CatalogCandidate, EffectPosition, SoundEffect};
