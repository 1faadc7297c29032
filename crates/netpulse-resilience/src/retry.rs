//! 지수 백오프 재시도 정책.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use netpulse_core::error::TelemetryError;

/// 재시도 정책
///
/// 지연 = `min(base_delay × backoff_factor^attempt, max_delay)`에
/// [10%, 30%] 균등 지터를 더한다.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 첫 시도 이후 추가 시도 횟수
    pub max_retries: u32,
    /// 기본 지연
    pub base_delay: Duration,
    /// 지연 상한
    pub max_delay: Duration,
    /// 지수 배율
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// n번째 시도(0부터) 실패 후의 대기 시간 (지터 제외)
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        Duration::from_secs_f64(exp.min(self.max_delay.as_secs_f64()))
    }

    /// 지터를 더한 실제 대기 시간
    fn jittered_delay(&self, attempt: u32) -> Duration {
        let delay = self.backoff_delay(attempt);
        let jitter_ratio: f64 = rand::RngExt::random_range(&mut rand::rng(), 0.10..0.30);
        delay + delay.mul_f64(jitter_ratio)
    }

    /// 작업을 정책에 따라 재시도하며 실행
    ///
    /// [`TelemetryError::is_transient`]가 참인 에러만 재시도한다 —
    /// 설정/파싱류 에러는 반복해도 결과가 같다. 재시도 소진 시
    /// 마지막 에러를 그대로 반환한다.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, TelemetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TelemetryError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < self.max_retries && error.is_transient() => {
                    let delay = self.jittered_delay(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "작업 실패, 재시도 대기"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            backoff_factor: 2.0,
        }
    }

    #[test]
    fn backoff_is_exponential_and_capped() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
        };
        assert_eq!(policy.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(4), Duration::from_secs(16));
        // 상한에 걸리는 구간
        assert_eq!(policy.backoff_delay(10), Duration::from_secs(30));
    }

    #[test]
    fn jitter_stays_in_range() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            let base = policy.backoff_delay(1);
            let jittered = policy.jittered_delay(1);
            assert!(jittered >= base.mul_f64(1.10));
            assert!(jittered <= base.mul_f64(1.30));
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let attempts = AtomicU32::new(0);
        let result = fast_policy()
            .execute(|| {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(TelemetryError::Network("일시 오류".to_string()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_returns_last_error() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = fast_policy()
            .execute(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(TelemetryError::Storage("계속 실패".to_string())) }
            })
            .await;
        assert_matches!(result, Err(TelemetryError::Storage(_)));
        // 첫 시도 + 재시도 3회
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn non_transient_error_fails_fast() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = fast_policy()
            .execute(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(TelemetryError::Config("잘못된 주기".to_string())) }
            })
            .await;
        assert_matches!(result, Err(TelemetryError::Config(_)));
        // 반복해도 결과가 같은 에러는 한 번으로 끝
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn first_success_skips_retries() {
        let attempts = AtomicU32::new(0);
        let result = fast_policy()
            .execute(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Ok("done") }
            })
            .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
