//! 文本类提示词：语言检测、校对、翻译、摘要

use super::{respond_in, Prompt, JSON_ONLY};
use crate::domain::Language;

pub fn detect_language_prompt(sample: &str) -> Prompt {
    Prompt::new(
        "You identify the language of a text.",
        format!(
            "Which language is the following text written in? \
             Answer with a single ISO 639-1 code only (ko, en, ja or zh).\n\nText:\n{}",
            sample
        ),
    )
}

fn proofreader(language: Language) -> &'static str {
    match language {
        Language::Korean => "당신은 한국어 맞춤법과 띄어쓰기 교정 전문가입니다.",
        Language::English => "You are a meticulous English copy editor.",
        Language::Japanese => "あなたは日本語の校正の専門家です。",
        Language::Chinese => "你是一名专业的中文校对编辑。",
    }
}

/// 逐块校对：输入 N 个文本块，输出 N 个校对后的文本块
pub fn orthography_prompt(language: Language, blocks_json: &str, count: usize) -> Prompt {
    Prompt::new(
        format!("{} {}", proofreader(language), JSON_ONLY),
        format!(
            "Correct spelling, spacing and punctuation in each text block below. \
             Do not rewrite, summarize or translate. Keep line breaks.\n\
             Input is a JSON array of {count} strings. Return a JSON array of exactly {count} \
             corrected strings in the same order.\n{}\n\nBlocks:\n{}",
            respond_in(language),
            blocks_json,
        ),
    )
}

/// 结合前后页上下文再校一遍
pub fn refine_prompt(
    language: Language,
    blocks_json: &str,
    count: usize,
    previous: &str,
    next: &str,
) -> Prompt {
    Prompt::new(
        format!("{} {}", proofreader(language), JSON_ONLY),
        format!(
            "The blocks below were already corrected one page at a time. Using the surrounding \
             pages as context, fix only inconsistencies that span pages (names, terminology, \
             sentences split across pages). Leave everything else unchanged.\n\
             Return a JSON array of exactly {count} strings in the same order.\n{}\n\n\
             Previous page:\n{}\n\nNext page:\n{}\n\nBlocks:\n{}",
            respond_in(language),
            if previous.is_empty() { "(none)" } else { previous },
            if next.is_empty() { "(none)" } else { next },
            blocks_json,
        ),
    )
}

/// 索引映射翻译：N 项数组进，N 项数组出
pub fn translation_prompt(target: Language, items_json: &str, count: usize) -> Prompt {
    Prompt::new(
        format!(
            "You are a professional literary translator into {}. {}",
            target.english_name(),
            JSON_ONLY
        ),
        format!(
            "Translate every string in the JSON array below into {}.\n\
             The input has exactly {count} items. Return a JSON array with exactly {count} \
             translated strings, item i translating input item i. Never merge, split, drop or \
             reorder items. Translate empty strings as empty strings.\n\nItems:\n{}",
            target.english_name(),
            items_json,
        ),
    )
}

/// 分块翻译（纯文本）
pub fn chunk_translation_prompt(target: Language, chunk: &str) -> Prompt {
    Prompt::new(
        format!("You are a professional literary translator into {}.", target.english_name()),
        format!(
            "Translate the text below into {}. Keep paragraph breaks and translate sentence by \
             sentence. Output only the translation.\n\nText:\n{}",
            target.english_name(),
            chunk
        ),
    )
}

pub fn page_summary_prompt(language: Language, page_text: &str) -> Prompt {
    Prompt::new(
        "You summarize pages of a book for young readers.",
        format!(
            "Summarize this page in one or two sentences.\n{}\n\nPage:\n{}",
            respond_in(language),
            page_text
        ),
    )
}

pub fn book_summary_prompt(language: Language, page_summaries: &str) -> Prompt {
    Prompt::new(
        "You summarize books for young readers.",
        format!(
            "Below are summaries of each page of a book, in order. Write a summary of the whole \
             book in one short paragraph.\n{}\n\nPage summaries:\n{}",
            respond_in(language),
            page_summaries
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_prompt_states_count() {
        let prompt = translation_prompt(Language::Korean, r#"["a","b"]"#, 2);
        assert!(prompt.user.contains("exactly 2"));
        assert!(prompt.system.contains("Korean"));
    }

    #[test]
    fn test_refine_prompt_marks_missing_neighbors() {
        let prompt = refine_prompt(Language::English, "[]", 0, "", "next page");
        assert!(prompt.user.contains("(none)"));
        assert!(prompt.user.contains("next page"));
    }
}
