//! 创作类提示词：测验、歌词、剧本

use super::{respond_in, Prompt, JSON_ONLY};
use crate::domain::{Language, ProblemType};

fn describe_type(problem_type: ProblemType) -> String {
    match problem_type {
        ProblemType::Ox => "0 (true/false, options [\"O\", \"X\"])".to_string(),
        other => format!("{} ({} options)", other.as_u8(), other.option_count()),
    }
}

pub fn quiz_prompt(language: Language, text: &str, count: usize, types: &[ProblemType]) -> Prompt {
    let type_rule = if types.is_empty() {
        "Use problemType 0 for true/false questions or 2-5 for multiple choice with that many options."
            .to_string()
    } else {
        let listed: Vec<String> = types.iter().map(|t| describe_type(*t)).collect();
        format!(
            "Use only these problemType values, spread evenly: {}.",
            listed.join(", ")
        )
    };

    Prompt::new(
        format!("You write reading comprehension quizzes for children. {}", JSON_ONLY),
        format!(
            "Write {count} distinct quiz questions about the text below.\n{type_rule}\n\
             Each item: {{\"question\": string, \"answer\": string, \"problemType\": number, \
             \"options\": [string]}}. The answer must be exactly one of the options.\n\
             Return a JSON array.\n{}\n\nText:\n{}",
            respond_in(language),
            text
        ),
    )
}

pub fn lyrics_prompt(language: Language, text: &str, genre: Option<&str>) -> Prompt {
    let genre = genre
        .map(|g| format!("Genre: {}.", g))
        .unwrap_or_else(|| "Pick a genre that fits the story.".to_string());
    Prompt::new(
        format!("You are a songwriter for children's stories. {}", JSON_ONLY),
        format!(
            "Write song lyrics based on the story below. {genre} \
             Use section tags such as [Verse] and [Chorus], at least four lines.\n\
             Return {{\"title\": string, \"lyrics\": string, \"genre\": string}}.\n{}\n\nStory:\n{}",
            respond_in(language),
            text
        ),
    )
}

/// 剧本生成；`retry_note` 为上一次命中的集体说话人
pub fn play_prompt(
    language: Language,
    text: &str,
    speaker_count: usize,
    retry_note: &[String],
) -> Prompt {
    let speakers: Vec<String> = (1..=speaker_count.max(1))
        .map(|i| format!("speaker{}", i))
        .collect();
    let mut user = format!(
        "Turn the story below into a radio play script.\n\
         Write one line per utterance in the form `speaker: text`.\n\
         Allowed speakers: narrator, {}. Never use any other speaker name, and never use a \
         group speaker such as everyone, all or family; give group lines to the narrator.\n{}\n\n\
         Story:\n{}",
        speakers.join(", "),
        respond_in(language),
        text
    );
    if !retry_note.is_empty() {
        user.push_str(&format!(
            "\n\nThe previous attempt used forbidden speakers ({}). Do not use them.",
            retry_note.join(", ")
        ));
    }
    Prompt::new("You adapt children's stories into scripts.", user)
}
