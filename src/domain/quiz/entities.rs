//! Quiz Context - 实体

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 题型，数值即选项数（OX 为 0，选项数为 2）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ProblemType {
    Ox,
    Two,
    Three,
    Four,
    Five,
}

impl ProblemType {
    /// 该题型要求的选项数
    pub fn option_count(&self) -> usize {
        match self {
            ProblemType::Ox | ProblemType::Two => 2,
            ProblemType::Three => 3,
            ProblemType::Four => 4,
            ProblemType::Five => 5,
        }
    }

    pub fn is_ox(&self) -> bool {
        matches!(self, ProblemType::Ox)
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            ProblemType::Ox => 0,
            ProblemType::Two => 2,
            ProblemType::Three => 3,
            ProblemType::Four => 4,
            ProblemType::Five => 5,
        }
    }

    /// 从 LLM 返回的松散值解析（`4`、`"4"`、`"OX"`、`"four"` 等）
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()).and_then(|n| Self::try_from(n).ok()),
            Value::String(s) => Self::from_label(s),
            _ => None,
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        if let Ok(n) = label.parse::<u8>() {
            return Self::try_from(n).ok();
        }
        match label.as_str() {
            "ox" | "o/x" | "true_false" | "truefalse" | "true/false" => Some(ProblemType::Ox),
            "two" => Some(ProblemType::Two),
            "three" => Some(ProblemType::Three),
            "four" => Some(ProblemType::Four),
            "five" => Some(ProblemType::Five),
            _ => None,
        }
    }
}

impl TryFrom<u8> for ProblemType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ProblemType::Ox),
            2 => Ok(ProblemType::Two),
            3 => Ok(ProblemType::Three),
            4 => Ok(ProblemType::Four),
            5 => Ok(ProblemType::Five),
            other => Err(format!("Invalid problem type: {}", other)),
        }
    }
}

impl From<ProblemType> for u8 {
    fn from(value: ProblemType) -> Self {
        value.as_u8()
    }
}

/// 已校验的测验题
///
/// 不变量：`answer` 必为 `options` 成员，`options.len() == problem_type.option_count()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub question: String,
    pub answer: String,
    pub problem_type: ProblemType,
    pub options: Vec<String>,
}

impl Quiz {
    pub fn is_consistent(&self) -> bool {
        self.options.len() == self.problem_type.option_count()
            && self.options.iter().any(|o| o == &self.answer)
    }
}

/// LLM 生成的候选题（字段类型宽松，等待校验）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizCandidate {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<Value>,
    #[serde(default, alias = "problem_type", alias = "type")]
    pub problem_type: Option<Value>,
    #[serde(default)]
    pub options: Option<Vec<Value>>,
}

impl QuizCandidate {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        problem_type: u8,
        options: &[&str],
    ) -> Self {
        Self {
            question: Some(question.into()),
            answer: Some(Value::String(answer.into())),
            problem_type: Some(Value::from(problem_type)),
            options: Some(options.iter().map(|o| Value::String(o.to_string())).collect()),
        }
    }
}

/// 把任意 JSON 标量转为字符串（数字、布尔值也可能出现在选项或答案中）
pub(crate) fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
