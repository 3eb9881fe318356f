//! Translation Context - 翻译对齐
//!
//! - index_mapping: 主算法。所有文本拍平成一个数组一次翻译，严格校验数组长度后还原形状
//! - proportional: 旧的分块翻译路径。按比例把译文句子分配回原文本项，是有损近似

mod index_mapping;
mod proportional;

pub use index_mapping::{flatten_pages, parse_translated_array, FlatTexts, MappingError};
pub use proportional::{chunk_text, redistribute_sentences, RemapReport};
