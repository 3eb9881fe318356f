//! 按页并发执行与合并
//!
//! 所有页的任务同时启动，全部结束后按 pageKey 排序返回。
//! 单页失败（返回 `Err` 或 panic）由 `degrade` 转成占位结果，不影响其他页。

use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::future::join_all;
use futures_util::FutureExt;

use crate::application::error::WorkflowError;
use crate::domain::Page;

/// 单页结果
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<R> {
    pub page_key: i64,
    pub value: R,
    /// 是否为降级结果
    pub degraded: bool,
}

/// 对每页并发执行 `agent`，按 pageKey 升序返回
pub async fn fan_out_pages<'a, R, E, F, Fut, D>(
    pages: &'a [Page],
    agent: F,
    degrade: D,
) -> Vec<PageResult<R>>
where
    F: Fn(&'a Page) -> Fut,
    Fut: Future<Output = Result<R, E>>,
    E: Display,
    D: Fn(&Page, String) -> R,
{
    let tasks = pages
        .iter()
        .map(|page| AssertUnwindSafe(agent(page)).catch_unwind());
    let outcomes = join_all(tasks).await;

    let mut results: Vec<PageResult<R>> = pages
        .iter()
        .zip(outcomes)
        .map(|(page, outcome)| {
            let failure = match outcome {
                Ok(Ok(value)) => {
                    return PageResult {
                        page_key: page.page_key,
                        value,
                        degraded: false,
                    }
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => "page agent panicked".to_string(),
            };
            tracing::warn!(page_key = page.page_key, error = %failure, "Page agent failed, using degraded result");
            PageResult {
                page_key: page.page_key,
                value: degrade(page, failure),
                degraded: true,
            }
        })
        .collect();

    results.sort_by_key(|r| r.page_key);
    results
}

/// 为慢操作加截止时间，超时返回 `WorkflowError::Timeout`
pub async fn with_deadline<T, Fut>(deadline: Duration, fut: Fut) -> Result<T, WorkflowError>
where
    Fut: Future<Output = T>,
{
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| WorkflowError::Timeout {
            secs: deadline.as_secs(),
        })
}

/// 降级结果数量
pub fn degraded_count<R>(results: &[PageResult<R>]) -> usize {
    results.iter().filter(|r| r.degraded).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages() -> Vec<Page> {
        vec![
            Page::from_strs(3, &["three"]),
            Page::from_strs(1, &["one"]),
            Page::from_strs(2, &["two"]),
        ]
    }

    #[tokio::test]
    async fn test_results_sorted_by_page_key() {
        let pages = pages();
        let results = fan_out_pages(
            &pages,
            |page| async move { Ok::<_, WorkflowError>(page.joined_text().to_uppercase()) },
            |page, _| page.joined_text(),
        )
        .await;

        let keys: Vec<i64> = results.iter().map(|r| r.page_key).collect();
        assert_eq!(keys, vec![1, 2, 3]);
        assert_eq!(results[0].value, "ONE");
        assert_eq!(degraded_count(&results), 0);
    }

    #[tokio::test]
    async fn test_single_failure_does_not_affect_siblings() {
        let pages = pages();
        let results = fan_out_pages(
            &pages,
            |page| async move {
                if page.page_key == 2 {
                    Err(WorkflowError::agent("test", "boom"))
                } else {
                    Ok(format!("done {}", page.page_key))
                }
            },
            |page, _| format!("original {}", page.page_key),
        )
        .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].value, "done 1");
        assert!(!results[0].degraded);
        assert_eq!(results[1].value, "original 2");
        assert!(results[1].degraded);
        assert_eq!(results[2].value, "done 3");
    }

    #[tokio::test]
    async fn test_panicking_agent_is_degraded() {
        let pages = pages();
        let results = fan_out_pages(
            &pages,
            |page| async move {
                if page.page_key == 1 {
                    panic!("agent bug");
                }
                Ok::<_, WorkflowError>(page.page_key)
            },
            |_, _| -1,
        )
        .await;

        assert_eq!(results[0].value, -1);
        assert_eq!(results[1].value, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_deadline_times_out() {
        let result = with_deadline(Duration::from_secs(180), async {
            tokio::time::sleep(Duration::from_secs(600)).await;
            1
        })
        .await;
        assert!(matches!(result, Err(WorkflowError::Timeout { secs: 180 })));

        let ok = with_deadline(Duration::from_secs(1), async { 7 }).await;
        assert_eq!(ok.unwrap(), 7);
    }
}
