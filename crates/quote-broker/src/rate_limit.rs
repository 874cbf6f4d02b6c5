//! 요청 간 최소 간격 리미터.
//!
//! 클라이언트마다 하나씩 소유합니다. 호출은 거절되지 않고 간격이 찰 때까지 대기합니다.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// 최소 간격 기반 요청 리미터.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    /// 간격 제한 없는 리미터.
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    /// 직전 요청으로부터 최소 간격이 지날 때까지 대기한 뒤 현재 시각을 기록합니다.
    ///
    /// 대기하는 동안 잠금을 유지하므로 동시 호출자도 순서대로 간격을 지킵니다.
    pub async fn await_turn(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let ready_at = prev + self.min_interval;
            if Instant::now() < ready_at {
                sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_calls_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_millis(250));

        limiter.await_turn().await;
        let first = Instant::now();
        limiter.await_turn().await;
        let second = Instant::now();

        assert!(second - first >= Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let started = Instant::now();
        limiter.await_turn().await;
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_spacing() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(100)));
        let started = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.await_turn().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unlimited_never_sleeps() {
        let limiter = RateLimiter::unlimited();
        let started = Instant::now();
        for _ in 0..10 {
            limiter.await_turn().await;
        }
        assert!(started.elapsed() < Duration::from_millis(1));
    }
}
