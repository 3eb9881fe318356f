//! 文本分割器
//!
//! 提供多语言句子切分、段落切分，以及表格/正文分块

/// 默认最小字符数限制
/// 当句子字符数未达到此限制时，会与后一句合并
pub const DEFAULT_MIN_CHARS: usize = 1;

/// 文本分割配置
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    /// 最小字符数限制（用于合并短句）
    pub min_chars: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_chars: DEFAULT_MIN_CHARS,
        }
    }
}

/// 检查是否为句末标点
#[inline]
fn is_sentence_end(ch: char) -> bool {
    matches!(ch, '。' | '？' | '！' | '.' | '?' | '!' | '…')
}

/// 句末标点之后仍属于本句的收尾字符（引号、括号）
#[inline]
fn is_closing(ch: char) -> bool {
    matches!(
        ch,
        '"' | '\'' | '\u{201D}' | '\u{2019}' | '」' | '』' | ')' | '）' | ']' | '》'
    )
}

/// 表格列分隔符
#[inline]
fn has_column_separator(line: &str) -> bool {
    line.contains('|') || line.contains('\t')
}

/// 按句末标点切分单行（不做合并）
///
/// 连续的句末标点（如 `?!`、`……`）以及紧随其后的收尾引号归入同一句
fn split_line(line: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        current.push(ch);
        if !is_sentence_end(ch) {
            continue;
        }
        while let Some(&next) = chars.peek() {
            if is_sentence_end(next) || is_closing(next) {
                current.push(next);
                chars.next();
            } else {
                break;
            }
        }
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            sentences.push(trimmed.to_string());
        }
        current.clear();
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

/// 合并短片段直到满足 min_chars
fn merge_until_min_chars(segments: Vec<String>, min_chars: usize) -> Vec<String> {
    if segments.is_empty() || min_chars <= 1 {
        return segments;
    }

    let mut result: Vec<String> = Vec::new();
    let mut buffer = String::new();

    for seg in segments {
        if !buffer.is_empty() {
            buffer.push(' ');
        }
        buffer.push_str(&seg);

        if buffer.chars().count() >= min_chars {
            result.push(std::mem::take(&mut buffer));
        }
    }

    if !buffer.is_empty() {
        if let Some(last) = result.last_mut() {
            last.push(' ');
            last.push_str(&buffer);
        } else {
            result.push(buffer);
        }
    }

    result
}

/// 对文本进行句子切分
///
/// 1. 按行分割（支持 \n 和 \r\n），空行丢弃
/// 2. 每行按句末标点切分，不跨行合并
/// 3. 行内短句按 min_chars 合并
pub fn split_sentences(text: &str, config: &SegmentConfig) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .flat_map(|line| merge_until_min_chars(split_line(line), config.min_chars))
        .collect()
}

/// 使用默认配置切分句子（便捷方法）
pub fn split_sentences_default(text: &str) -> Vec<String> {
    split_sentences(text, &SegmentConfig::default())
}

/// 按空行切分段落
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }
    paragraphs
}

/// 文本块类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Prose,
    Table,
}

/// 分块结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub kind: BlockKind,
    pub text: String,
}

/// 判断整段文本是否为表格
///
/// 至少两行非空，且每一行非空内容都含列分隔符（`|` 或制表符）
pub fn is_table_block(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    lines.len() >= 2 && lines.iter().all(|l| has_column_separator(l))
}

/// 将文本切分为连续的表格块与正文块
///
/// 连续两行及以上带列分隔符的行构成表格块，其余行（包括只有一行分隔符的情况）归入正文。
/// 各块按原顺序以 `\n` 连接即可还原原文（首尾空行除外）。
pub fn segment_blocks(text: &str) -> Vec<TextBlock> {
    let lines: Vec<&str> = text.lines().collect();
    let mut blocks: Vec<TextBlock> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        // 表格行的最长连续区间
        let mut j = i;
        while j < lines.len() && has_column_separator(lines[j]) {
            j += 1;
        }

        if j - i >= 2 {
            push_block(&mut blocks, BlockKind::Table, &lines[i..j]);
            i = j;
            continue;
        }

        let start = i;
        i = if j > i { j } else { i + 1 };
        // 正文一直延伸到下一个表格区间前
        while i < lines.len() {
            let mut k = i;
            while k < lines.len() && has_column_separator(lines[k]) {
                k += 1;
            }
            if k - i >= 2 {
                break;
            }
            i = if k > i { k } else { i + 1 };
        }
        push_block(&mut blocks, BlockKind::Prose, &lines[start..i]);
    }

    blocks
}

fn push_block(blocks: &mut Vec<TextBlock>, kind: BlockKind, lines: &[&str]) {
    // 空白正文块同样保留，保证 join_blocks 可无损还原
    blocks.push(TextBlock {
        kind,
        text: lines.join("\n"),
    });
}

/// 按顺序还原分块
pub fn join_blocks(blocks: &[TextBlock]) -> String {
    blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences_multilingual() {
        let ko = split_sentences_default("고양이가 앉았다. 개가 짖었다!");
        assert_eq!(ko, vec!["고양이가 앉았다.", "개가 짖었다!"]);

        let ja = split_sentences_default("猫が座った。犬が吠えた。");
        assert_eq!(ja, vec!["猫が座った。", "犬が吠えた。"]);
    }

    #[test]
    fn test_closing_quote_stays_with_sentence() {
        let sentences = split_sentences_default("\"Really?!\" she asked. Yes.");
        assert_eq!(sentences, vec!["\"Really?!\"", "she asked.", "Yes."]);
    }

    #[test]
    fn test_no_cross_line_merge() {
        let config = SegmentConfig { min_chars: 50 };
        let sentences = split_sentences("첫째 줄.\n둘째 줄.", &config);
        assert_eq!(sentences.len(), 2);
    }

    #[test]
    fn test_short_sentences_merged_within_line() {
        let config = SegmentConfig { min_chars: 10 };
        let sentences = split_sentences("Hi. Yo. This is longer.", &config);
        assert_eq!(sentences, vec!["Hi. Yo. This is longer."]);
    }

    #[test]
    fn test_trailing_text_without_terminator() {
        let sentences = split_sentences_default("One. two without end");
        assert_eq!(sentences, vec!["One.", "two without end"]);
    }

    #[test]
    fn test_split_paragraphs() {
        let paragraphs = split_paragraphs("a\nb\n\n\nc\n");
        assert_eq!(paragraphs, vec!["a\nb", "c"]);
    }

    #[test]
    fn test_is_table_block() {
        assert!(is_table_block("| 이름 | 나이 |\n| 철수 | 10 |"));
        assert!(is_table_block("a\tb\nc\td"));
        assert!(!is_table_block("| only one line |"));
        assert!(!is_table_block("| a | b |\nplain text"));
    }

    #[test]
    fn test_segment_blocks_mixed() {
        let text = "머리말.\n| a | b |\n| 1 | 2 |\n맺음말.";
        let blocks = segment_blocks(text);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].kind, BlockKind::Prose);
        assert_eq!(blocks[1].kind, BlockKind::Table);
        assert_eq!(blocks[1].text, "| a | b |\n| 1 | 2 |");
        assert_eq!(blocks[2].kind, BlockKind::Prose);
        assert_eq!(join_blocks(&blocks), text);
    }

    #[test]
    fn test_single_separator_line_is_prose() {
        let text = "A | B is a choice.\nNext line.";
        let blocks = segment_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Prose);
    }
}
