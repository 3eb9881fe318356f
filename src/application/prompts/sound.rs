//! 音效类提示词

use super::{respond_in, Prompt, JSON_ONLY};
use crate::domain::sound::{CatalogCandidate, POSITION_SCALE_MAX, READING_WINDOW_SECS};
use crate::domain::Language;

fn candidate_list(candidates: &[CatalogCandidate]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {} ({})", i, c.path, c.description))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn music_choice_prompt(language: Language, page_text: &str, candidates: &[CatalogCandidate]) -> Prompt {
    Prompt::new(
        format!("You choose background music for picture book pages. {}", JSON_ONLY),
        format!(
            "Choose the background music that best fits the mood of the page.\n\
             Return {{\"index\": number, \"reason\": string}} where index refers to the list. \
             The reason is one short sentence. {}\n\nPage:\n{}\n\nCandidates:\n{}",
            respond_in(language),
            page_text,
            candidate_list(candidates)
        ),
    )
}

pub fn effect_choice_prompt(language: Language, page_text: &str, candidates: &[CatalogCandidate]) -> Prompt {
    Prompt::new(
        format!("You choose sound effects for picture book pages. {}", JSON_ONLY),
        format!(
            "Choose the one sound effect that best matches an event on the page, or -1 if none fits.\n\
             Return {{\"index\": number, \"reason\": string}}. {}\n\nPage:\n{}\n\nCandidates:\n{}",
            respond_in(language),
            page_text,
            candidate_list(candidates)
        ),
    )
}

pub fn effect_position_prompt(page_text: &str, effect: &str) -> Prompt {
    Prompt::new(
        format!("You time sound effects against narration. {}", JSON_ONLY),
        format!(
            "The page is read aloud in about {} seconds. On a scale from 0 (start) to {} (end), \
             where should the sound effect \"{}\" start, and how many seconds should it last?\n\
             Return {{\"position\": number, \"duration\": number}}.\n\nPage:\n{}",
            READING_WINDOW_SECS, POSITION_SCALE_MAX, effect, page_text
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_are_indexed() {
        let candidates = vec![
            CatalogCandidate {
                path: "rain.mp3".into(),
                score: 0.9,
                description: "soft rain".into(),
            },
            CatalogCandidate {
                path: "wind.mp3".into(),
                score: 0.8,
                description: "wind".into(),
            },
        ];
        let prompt = effect_choice_prompt(Language::English, "It rained.", &candidates);
        assert!(prompt.user.contains("0. rain.mp3 (soft rain)"));
        assert!(prompt.user.contains("1. wind.mp3"));
    }
}
