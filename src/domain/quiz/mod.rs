//! Quiz Context - 测验题
//!
//! 职责:
//! - 题目实体与题型
//! - 候选题校验与规范化（OX 词表、选项去重、答案修正）
//! - 按题型轮询挑选

mod entities;
mod selection;
mod validation;

pub use entities::{ProblemType, Quiz, QuizCandidate};
pub use selection::{candidate_count, select_quizzes, MAX_QUIZ_COUNT};
pub use validation::{
    dedupe_questions, normalize_ox_token, validate_candidate, validate_candidates, OxToken,
    RejectReason,
};
