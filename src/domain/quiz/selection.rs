//! Quiz Context - 题目挑选

use super::entities::{ProblemType, Quiz};

/// 单次请求允许的最多题数
pub const MAX_QUIZ_COUNT: usize = 50;

/// 生成阶段需要请求的候选题数量
///
/// 指定题型时校验会丢弃大量候选题，因此多要一些：max(2N, N+5)
pub fn candidate_count(target: usize, has_requested_types: bool) -> usize {
    if has_requested_types {
        target.saturating_mul(2).max(target.saturating_add(5))
    } else {
        target
    }
}

/// 从有效题目中挑选 `target` 道
///
/// 指定题型时按题型轮询各取一道，直到凑满或所有题型都取尽，
/// 再用剩余的任意题型题目补足；未指定题型时取前 `target` 道。
/// 输入须已去重。
pub fn select_quizzes(valid: Vec<Quiz>, target: usize, requested: &[ProblemType]) -> Vec<Quiz> {
    if requested.is_empty() {
        return valid.into_iter().take(target).collect();
    }

    let mut used = vec![false; valid.len()];
    let mut picked: Vec<usize> = Vec::with_capacity(target.min(valid.len()));

    'rounds: while picked.len() < target {
        let mut progressed = false;
        for problem_type in requested {
            if picked.len() >= target {
                break 'rounds;
            }
            if let Some(idx) = (0..valid.len())
                .find(|&i| !used[i] && valid[i].problem_type == *problem_type)
            {
                used[idx] = true;
                picked.push(idx);
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    // 补足
    for idx in 0..valid.len() {
        if picked.len() >= target {
            break;
        }
        if !used[idx] {
            used[idx] = true;
            picked.push(idx);
        }
    }

    let mut slots: Vec<Option<Quiz>> = valid.into_iter().map(Some).collect();
    picked
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(question: &str, problem_type: ProblemType) -> Quiz {
        let options: Vec<String> = (0..problem_type.option_count())
            .map(|i| format!("opt{}", i))
            .collect();
        Quiz {
            question: question.to_string(),
            answer: options[0].clone(),
            problem_type,
            options,
        }
    }

    #[test]
    fn test_candidate_count() {
        assert_eq!(candidate_count(3, true), 8);
        assert_eq!(candidate_count(10, true), 20);
        assert_eq!(candidate_count(4, false), 4);
        assert_eq!(candidate_count(usize::MAX, true), usize::MAX);
    }

    #[test]
    fn test_huge_target_only_allocates_for_valid() {
        let valid = vec![quiz("o1", ProblemType::Ox)];
        let selected = select_quizzes(valid, 1_000_000_000_000, &[ProblemType::Ox]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].question, "o1");
    }

    #[test]
    fn test_round_robin_by_type() {
        let valid = vec![
            quiz("f1", ProblemType::Four),
            quiz("f2", ProblemType::Four),
            quiz("f3", ProblemType::Four),
            quiz("o1", ProblemType::Ox),
            quiz("o2", ProblemType::Ox),
        ];
        let selected = select_quizzes(valid, 4, &[ProblemType::Ox, ProblemType::Four]);
        let questions: Vec<&str> = selected.iter().map(|q| q.question.as_str()).collect();
        assert_eq!(questions, vec!["o1", "f1", "o2", "f2"]);
    }

    #[test]
    fn test_backfill_with_other_types() {
        let valid = vec![
            quiz("t1", ProblemType::Three),
            quiz("o1", ProblemType::Ox),
            quiz("t2", ProblemType::Three),
        ];
        let selected = select_quizzes(valid, 3, &[ProblemType::Ox]);
        let questions: Vec<&str> = selected.iter().map(|q| q.question.as_str()).collect();
        assert_eq!(questions, vec!["o1", "t1", "t2"]);
    }

    #[test]
    fn test_without_types_takes_first_n() {
        let valid = vec![
            quiz("a", ProblemType::Two),
            quiz("b", ProblemType::Ox),
            quiz("c", ProblemType::Five),
        ];
        let selected = select_quizzes(valid, 2, &[]);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[1].question, "b");
    }

    #[test]
    fn test_fewer_valid_than_target() {
        let valid = vec![quiz("a", ProblemType::Two)];
        let selected = select_quizzes(valid, 5, &[ProblemType::Two, ProblemType::Ox]);
        assert_eq!(selected.len(), 1);
    }
}
