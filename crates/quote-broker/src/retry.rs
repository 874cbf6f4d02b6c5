//! 지수 백오프 재시도 정책.
//!
//! 재시도 여부는 호출자가 넘기는 분류 함수가 결정합니다
//! (보통 [`FetchError::is_retryable`](crate::FetchError::is_retryable)).

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// 재시도 정책.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 최대 시도 횟수 (첫 시도 포함)
    pub max_attempts: u32,
    /// 첫 실패 후 대기 시간
    pub initial_backoff: Duration,
    /// 대기 시간 상한
    pub max_backoff: Duration,
    /// 실패할 때마다 대기 시간에 곱하는 값
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::single()
    }
}

impl RetryPolicy {
    /// 지수 백오프 정책 (2배씩 증가, `max_backoff`에서 고정).
    pub fn exponential(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
            multiplier: 2,
        }
    }

    /// 대기 없이 즉시 재시도하는 정책.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            multiplier: 1,
        }
    }

    /// 재시도 없음 (한 번만 시도).
    pub fn single() -> Self {
        Self::immediate(1)
    }

    /// `failed_attempts`번 실패한 뒤의 대기 시간.
    pub fn backoff_after(&self, failed_attempts: u32) -> Duration {
        let mut backoff = self.initial_backoff;
        for _ in 1..failed_attempts {
            backoff = (backoff * self.multiplier).min(self.max_backoff);
        }
        backoff.min(self.max_backoff)
    }

    /// 정책에 따라 `operation`을 실행합니다.
    ///
    /// 성공하거나, 재시도 불가 에러가 나오거나, 시도 횟수를 소진하면 반환합니다.
    /// 마지막 에러를 그대로 돌려줍니다.
    pub async fn run<F, Fut, T, E>(
        &self,
        is_retryable: impl Fn(&E) -> bool,
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && is_retryable(&err) => {
                    let backoff = self.backoff_after(attempt);
                    warn!(
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "요청 실패, 재시도 대기"
                    );
                    if !backoff.is_zero() {
                        sleep(backoff).await;
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
