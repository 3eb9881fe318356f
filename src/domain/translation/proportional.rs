//! 分块翻译与按比例重映射（旧路径）
//!
//! 内容超过阈值时按段落/句子边界分块逐块翻译。各语言的句子切分结果并不稳定，
//! 所以译文句子不是 1:1 对应，而是按原文各项句数的比例分配：
//! `expected = round(原文句数 * 译文总句数 / 原文总句数)`，最后一项取剩余部分。
//! 这是有损近似，数量不一致时只记录警告。

use crate::domain::text_segmenter::{split_paragraphs, split_sentences_default};

/// 重映射统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemapReport {
    pub original_sentences: usize,
    pub translated_sentences: usize,
}

impl RemapReport {
    /// 句数是否一致（一致时分配即为 1:1）
    pub fn is_exact(&self) -> bool {
        self.original_sentences == self.translated_sentences
    }
}

/// 把超长内容切成不超过 `max_chars` 的块
///
/// 先按段落累积；单段超长时按句子累积；单句超长时按字符硬切
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in split_paragraphs(text) {
        let pieces: Vec<String> = if paragraph.chars().count() > max_chars {
            split_sentences_default(&paragraph)
                .into_iter()
                .flat_map(|s| hard_split(&s, max_chars))
                .collect()
        } else {
            vec![paragraph]
        };

        for piece in pieces {
            let separator = if current.is_empty() { 0 } else { 2 };
            if current.chars().count() + separator + piece.chars().count() > max_chars {
                flush(&mut current, &mut chunks);
            }
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(&piece);
        }
    }
    flush(&mut current, &mut chunks);

    chunks
}

fn flush(current: &mut String, chunks: &mut Vec<String>) {
    if !current.trim().is_empty() {
        chunks.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

fn hard_split(sentence: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = sentence.chars().collect();
    if chars.len() <= max_chars {
        return vec![sentence.to_string()];
    }
    chars
        .chunks(max_chars)
        .map(|c| c.iter().collect::<String>())
        .collect()
}

/// 按比例把译文句子分配回原文本项
///
/// 返回值长度恒等于 `originals.len()`。原文为空的项保持为空；
/// 句子在同一项内以 `joiner` 连接（中日文传空串，其余语言传空格）。
pub fn redistribute_sentences(
    originals: &[String],
    translated_text: &str,
    joiner: &str,
) -> (Vec<String>, RemapReport) {
    let counts: Vec<usize> = originals
        .iter()
        .map(|t| split_sentences_default(t).len())
        .collect();
    let total_original: usize = counts.iter().sum();
    let translated = split_sentences_default(translated_text);
    let total_translated = translated.len();

    let report = RemapReport {
        original_sentences: total_original,
        translated_sentences: total_translated,
    };

    if !report.is_exact() {
        tracing::warn!(
            original = total_original,
            translated = total_translated,
            "Sentence count mismatch after chunked translation, distributing proportionally"
        );
    }

    let mut result = vec![String::new(); originals.len()];
    if total_original == 0 {
        return (result, report);
    }

    let last_filled = counts.iter().rposition(|&c| c > 0);
    let mut cursor = 0usize;

    for (idx, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let remaining = total_translated - cursor;
        let take = if Some(idx) == last_filled {
            remaining
        } else {
            let expected =
                ((count * total_translated) as f64 / total_original as f64).round() as usize;
            expected.min(remaining)
        };
        result[idx] = translated[cursor..cursor + take].join(joiner);
        cursor += take;
    }

    (result, report)
}
