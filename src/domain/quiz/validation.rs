//! Quiz Context - 候选题校验
//!
//! 校验规则：
//! 1. 缺少题干或答案的候选题直接丢弃
//! 2. OX 题：各语言的真/假词统一为 "O"/"X"，选项强制为 ["O", "X"]
//! 3. 选择题：选项去重后截断到题型要求的数量；不足则丢弃；
//!    答案不在选项中时改为第一个选项（有损修正，不视为错误）
//! 4. 题干完全相同的候选题只保留第一道

use std::collections::HashSet;

use super::entities::{value_to_text, ProblemType, Quiz, QuizCandidate};

/// OX 规范化结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OxToken {
    O,
    X,
}

impl OxToken {
    pub fn as_str(&self) -> &'static str {
        match self {
            OxToken::O => "O",
            OxToken::X => "X",
        }
    }
}

/// 表示“真”的词（小写比较）
const TRUE_TOKENS: &[&str] = &[
    "o", "○", "⭕", "true", "t", "yes", "y", "correct", "right",
    "참", "맞다", "맞음", "맞아요", "예", "네", "그렇다",
    "はい", "正しい", "本当", "まる",
    "是", "对", "對", "正确", "正確", "真",
];

/// 表示“假”的词（小写比较）
const FALSE_TOKENS: &[&str] = &[
    "x", "×", "✕", "❌", "false", "f", "no", "n", "incorrect", "wrong",
    "거짓", "틀리다", "틀림", "틀려요", "아니오", "아니요", "아니다",
    "いいえ", "誤り", "間違い", "うそ", "ばつ",
    "否", "错", "錯", "错误", "錯誤", "假",
];

/// 将各语言的真/假词规范化为 O/X，无法识别时返回 None
pub fn normalize_ox_token(raw: &str) -> Option<OxToken> {
    let token = raw
        .trim()
        .trim_end_matches(|c: char| c == '.' || c == '。' || c == '!')
        .to_lowercase();
    if TRUE_TOKENS.contains(&token.as_str()) {
        Some(OxToken::O)
    } else if FALSE_TOKENS.contains(&token.as_str()) {
        Some(OxToken::X)
    } else {
        None
    }
}

/// 候选题被丢弃的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    MissingQuestion,
    MissingAnswer,
    UnknownProblemType,
    UnrecognizedOxAnswer(String),
    NotEnoughOptions { required: usize, found: usize },
    DuplicateQuestion,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::MissingQuestion => write!(f, "missing question"),
            RejectReason::MissingAnswer => write!(f, "missing answer"),
            RejectReason::UnknownProblemType => write!(f, "unknown problem type"),
            RejectReason::UnrecognizedOxAnswer(a) => write!(f, "unrecognized OX answer: {}", a),
            RejectReason::NotEnoughOptions { required, found } => {
                write!(f, "not enough distinct options: required {}, found {}", required, found)
            }
            RejectReason::DuplicateQuestion => write!(f, "duplicate question"),
        }
    }
}

/// 确定候选题的题型
///
/// 优先使用候选题自带的题型；缺失时用请求的默认题型；
/// 再不行则按选项判断（两个选项且都是 OX 词视为 OX 题，否则按选项数）
fn resolve_problem_type(
    candidate: &QuizCandidate,
    options: &[String],
    fallback: Option<ProblemType>,
) -> Option<ProblemType> {
    if let Some(t) = candidate.problem_type.as_ref().and_then(ProblemType::from_value) {
        return Some(t);
    }
    if fallback.is_some() {
        return fallback;
    }
    if options.len() == 2 && options.iter().all(|o| normalize_ox_token(o).is_some()) {
        return Some(ProblemType::Ox);
    }
    u8::try_from(options.len())
        .ok()
        .and_then(|n| ProblemType::try_from(n).ok())
}

/// 选项去重（保持首次出现顺序），并剔除空选项
fn distinct_options(raw: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .filter(|o| seen.insert(o.clone()))
        .collect()
}

/// 校验并规范化单个候选题
pub fn validate_candidate(
    candidate: &QuizCandidate,
    fallback_type: Option<ProblemType>,
) -> Result<Quiz, RejectReason> {
    let question = candidate
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or(RejectReason::MissingQuestion)?
        .to_string();

    let answer = candidate
        .answer
        .as_ref()
        .and_then(value_to_text)
        .filter(|a| !a.is_empty())
        .ok_or(RejectReason::MissingAnswer)?;

    let raw_options: Vec<String> = candidate
        .options
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(value_to_text)
        .collect();

    let problem_type = resolve_problem_type(candidate, &raw_options, fallback_type)
        .ok_or(RejectReason::UnknownProblemType)?;

    if problem_type.is_ox() {
        let token = normalize_ox_token(&answer)
            .ok_or_else(|| RejectReason::UnrecognizedOxAnswer(answer.clone()))?;
        return Ok(Quiz {
            question,
            answer: token.as_str().to_string(),
            problem_type,
            options: vec![OxToken::O.as_str().to_string(), OxToken::X.as_str().to_string()],
        });
    }

    let required = problem_type.option_count();
    let mut options = distinct_options(&raw_options);
    if options.len() < required {
        return Err(RejectReason::NotEnoughOptions {
            required,
            found: options.len(),
        });
    }

    let answer_pos = options.iter().position(|o| o == &answer);
    options.truncate(required);

    let answer = match answer_pos {
        Some(pos) if pos < required => answer,
        Some(_) => {
            // 截断会丢掉正确答案，用它替换最后一个保留的选项
            if let Some(last) = options.last_mut() {
                *last = answer.clone();
            }
            answer
        }
        None => {
            tracing::warn!(
                question = %question,
                answer = %answer,
                "Answer not among options, coercing to first option"
            );
            options[0].clone()
        }
    };

    Ok(Quiz {
        question,
        answer,
        problem_type,
        options,
    })
}

/// 题干去重，第一次出现的保留
pub fn dedupe_questions(quizzes: Vec<Quiz>) -> Vec<Quiz> {
    let mut seen = HashSet::new();
    quizzes
        .into_iter()
        .filter(|q| seen.insert(q.question.clone()))
        .collect()
}

/// 批量校验：返回有效题目（已去重）以及被丢弃的数量
pub fn validate_candidates(
    candidates: &[QuizCandidate],
    fallback_type: Option<ProblemType>,
) -> (Vec<Quiz>, usize) {
    let mut valid = Vec::with_capacity(candidates.len());
    let mut rejected = 0usize;

    for (index, candidate) in candidates.iter().enumerate() {
        match validate_candidate(candidate, fallback_type) {
            Ok(quiz) => valid.push(quiz),
            Err(reason) => {
                rejected += 1;
                tracing::debug!(index = index, reason = %reason, "Quiz candidate rejected");
            }
        }
    }

    let before = valid.len();
    let valid = dedupe_questions(valid);
    rejected += before - valid.len();

    (valid, rejected)
}
