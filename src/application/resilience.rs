//! 带指数退避的重试
//!
//! 所有外部调用（LLM、向量化、检索、音频合成）共用同一个重试工具：
//! 由调用方提供错误分类函数，把每个错误映射为重试 / 短间隔重试 / 切换备用 / 失败。
//!
//! 第 n 次重试前等待 `base_delay * 2^n + jitter`，jitter 取 `[0, base_delay / 2)`，
//! 因此相邻等待时间严格递增。

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;

/// 错误分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// 限流 / 瞬时网络错误：指数退避重试
    Retry,
    /// 可能是瞬时问题（空回复、格式错误）：少量短间隔重试
    RetryTransient,
    /// 不再重试，交给调用方切换到备用供应商
    SwitchFallback,
    /// 立即失败
    Fail,
}

/// 重试策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// `Retry` 类错误的最大重试次数（不含首次调用）
    pub max_retries: u32,
    pub base_delay: Duration,
    /// `RetryTransient` 类错误的最大重试次数
    pub transient_retries: u32,
    pub transient_base_delay: Duration,
    /// 是否加随机抖动
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            transient_retries: 1,
            transient_base_delay: Duration::from_millis(500),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Default::default()
        }
    }

    pub fn with_transient(mut self, retries: u32, base_delay: Duration) -> Self {
        self.transient_retries = retries;
        self.transient_base_delay = base_delay;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// 不重试
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            transient_retries: 0,
            transient_base_delay: Duration::ZERO,
            jitter: false,
        }
    }

    /// 第 `retry` 次（从 0 开始）指数退避的等待时间
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        exponential(self.base_delay, retry, self.jitter)
    }

    /// 第 `retry` 次短间隔重试的等待时间
    pub fn transient_delay(&self, retry: u32) -> Duration {
        exponential(self.transient_base_delay, retry, self.jitter)
    }
}

fn exponential(base: Duration, retry: u32, jitter: bool) -> Duration {
    let factor = 2u32.saturating_pow(retry.min(16));
    let delay = base.saturating_mul(factor);
    if !jitter || base.is_zero() {
        return delay;
    }
    let max_jitter = base.as_secs_f64() / 2.0;
    let jitter = rand::thread_rng().gen_range(0.0..max_jitter);
    delay + Duration::from_secs_f64(jitter)
}

/// 重试失败
#[derive(Debug, Error)]
pub enum RetryError<E: Display> {
    /// 重试次数用尽
    #[error("retries exhausted after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    /// 分类函数要求切换备用供应商
    #[error("switching to fallback after {attempts} attempts: {last}")]
    SwitchFallback { attempts: u32, last: E },

    /// 不可重试的错误
    #[error("failed after {attempts} attempts: {last}")]
    Fatal { attempts: u32, last: E },
}

impl<E: Display> RetryError<E> {
    /// 总调用次数（含首次）
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. }
            | RetryError::SwitchFallback { attempts, .. }
            | RetryError::Fatal { attempts, .. } => *attempts,
        }
    }

    pub fn last_error(&self) -> &E {
        match self {
            RetryError::Exhausted { last, .. }
            | RetryError::SwitchFallback { last, .. }
            | RetryError::Fatal { last, .. } => last,
        }
    }

    pub fn into_last_error(self) -> E {
        match self {
            RetryError::Exhausted { last, .. }
            | RetryError::SwitchFallback { last, .. }
            | RetryError::Fatal { last, .. } => last,
        }
    }
}

/// 按策略执行 `op`，失败时依据 `classify` 决定是否重试
///
/// `op` 的参数是从 0 开始的调用序号
pub async fn retry_with_backoff<T, E, F, Fut, C>(
    policy: &RetryPolicy,
    label: &str,
    classify: C,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> RetryDecision,
{
    let mut attempts = 0u32;
    let mut retries = 0u32;
    let mut transient = 0u32;

    loop {
        let result = op(attempts).await;
        attempts += 1;

        let err = match result {
            Ok(value) => {
                if attempts > 1 {
                    tracing::debug!(call = %label, attempts = attempts, "Call succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let delay = match classify(&err) {
            RetryDecision::Fail => {
                return Err(RetryError::Fatal { attempts, last: err });
            }
            RetryDecision::SwitchFallback => {
                tracing::warn!(call = %label, attempts = attempts, error = %err, "Switching to fallback");
                return Err(RetryError::SwitchFallback { attempts, last: err });
            }
            RetryDecision::Retry => {
                if retries >= policy.max_retries {
                    tracing::warn!(call = %label, attempts = attempts, error = %err, "Retries exhausted");
                    return Err(RetryError::Exhausted { attempts, last: err });
                }
                let delay = policy.backoff_delay(retries);
                retries += 1;
                delay
            }
            RetryDecision::RetryTransient => {
                if transient >= policy.transient_retries {
                    tracing::warn!(call = %label, attempts = attempts, error = %err, "Transient retries exhausted");
                    return Err(RetryError::Exhausted { attempts, last: err });
                }
                let delay = policy.transient_delay(transient);
                transient += 1;
                delay
            }
        };

        tracing::info!(
            call = %label,
            attempt = attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Retrying after backoff"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    #[derive(Debug, Clone, PartialEq)]
    enum FakeError {
        RateLimited,
        Empty,
        BadRequest,
        Quota,
    }

    impl Display for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    fn classify(err: &FakeError) -> RetryDecision {
        match err {
            FakeError::RateLimited => RetryDecision::Retry,
            FakeError::Empty => RetryDecision::RetryTransient,
            FakeError::BadRequest => RetryDecision::Fail,
            FakeError::Quota => RetryDecision::SwitchFallback,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_makes_exactly_max_retries_plus_one_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        let calls: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));

        let recorder = calls.clone();
        let result: Result<(), _> = retry_with_backoff(&policy, "test", classify, |_| {
            let recorder = recorder.clone();
            async move {
                recorder.lock().unwrap().push(Instant::now());
                Err(FakeError::RateLimited)
            }
        })
        .await;

        let err = result.unwrap_err();
        assert!(matches!(err, RetryError::Exhausted { .. }));
        assert_eq!(err.attempts(), 4);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        let gaps: Vec<Duration> = calls.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(gaps.len(), 3);
        for pair in gaps.windows(2) {
            assert!(pair[1] > pair[0], "delays must strictly increase: {:?}", gaps);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_retry() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let result = retry_with_backoff(&policy, "test", classify, |attempt| async move {
            if attempt < 2 {
                Err(FakeError::RateLimited)
            } else {
                Ok(attempt)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_fails_fast() {
        let policy = RetryPolicy::new(5, Duration::from_millis(10));
        let result: Result<(), _> =
            retry_with_backoff(&policy, "test", classify, |_| async { Err(FakeError::BadRequest) })
                .await;
        let err = result.unwrap_err();
        assert!(matches!(err, RetryError::Fatal { attempts: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_fallback_is_immediate() {
        let policy = RetryPolicy::new(5, Duration::from_millis(10));
        let result: Result<(), _> =
            retry_with_backoff(&policy, "test", classify, |_| async { Err(FakeError::Quota) }).await;
        let err = result.unwrap_err();
        assert!(matches!(err, RetryError::SwitchFallback { attempts: 1, .. }));
        assert_eq!(err.into_last_error(), FakeError::Quota);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_use_smaller_budget() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100))
            .with_transient(1, Duration::from_millis(10));
        let result: Result<(), _> =
            retry_with_backoff(&policy, "test", classify, |_| async { Err(FakeError::Empty) }).await;
        assert_eq!(result.unwrap_err().attempts(), 2);
    }

    #[test]
    fn test_backoff_delay_strictly_increases_with_jitter() {
        let policy = RetryPolicy::new(6, Duration::from_millis(200));
        for _ in 0..50 {
            let delays: Vec<Duration> = (0..6).map(|n| policy.backoff_delay(n)).collect();
            for pair in delays.windows(2) {
                assert!(pair[1] > pair[0]);
            }
        }
    }

    #[test]
    fn test_backoff_without_jitter_is_exact() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100)).without_jitter();
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(400));
    }
}
