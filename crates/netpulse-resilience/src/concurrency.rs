//! 동시성 제한과 배치 실행.
//!
//! 세마포어 두 개로 (a) 동시 처리 대상 수, (b) 동시 진행 서브 작업 수를
//! 제한한다. 획득 대기는 `acquire_timeout`까지, 초과 시 실패.

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

use netpulse_core::error::TelemetryError;

/// 동시성 제한 설정
#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyLimits {
    /// 동시 처리 대상 상한
    pub max_targets: usize,
    /// 동시 진행 서브 작업 상한
    pub max_operations: usize,
    /// 세마포어 획득 대기 상한
    pub acquire_timeout: Duration,
    /// 배치 크기
    pub batch_size: usize,
    /// 배치 간 휴지
    pub batch_pause: Duration,
}

impl Default for ConcurrencyLimits {
    fn default() -> Self {
        Self {
            max_targets: 50,
            max_operations: 100,
            acquire_timeout: Duration::from_secs(30),
            batch_size: 10,
            batch_pause: Duration::from_millis(100),
        }
    }
}

/// 수집 경로의 동시성 제어기
pub struct ConcurrencyController {
    targets: Arc<Semaphore>,
    operations: Arc<Semaphore>,
    limits: ConcurrencyLimits,
}

impl ConcurrencyController {
    /// 지정한 제한으로 생성
    pub fn new(limits: ConcurrencyLimits) -> Self {
        Self {
            targets: Arc::new(Semaphore::new(limits.max_targets)),
            operations: Arc::new(Semaphore::new(limits.max_operations)),
            limits,
        }
    }

    /// 대상 슬롯을 잡고 작업 실행
    pub async fn run_target<T, F, Fut>(&self, operation: F) -> Result<T, TelemetryError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, TelemetryError>>,
    {
        let _permit = self.acquire(&self.targets, "대상").await?;
        operation().await
    }

    /// 서브 작업 슬롯을 잡고 작업 실행
    pub async fn run_operation<T, F, Fut>(&self, operation: F) -> Result<T, TelemetryError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, TelemetryError>>,
    {
        let _permit = self.acquire(&self.operations, "서브 작업").await?;
        operation().await
    }

    async fn acquire(
        &self,
        semaphore: &Arc<Semaphore>,
        kind: &str,
    ) -> Result<tokio::sync::OwnedSemaphorePermit, TelemetryError> {
        tokio::time::timeout(self.limits.acquire_timeout, semaphore.clone().acquire_owned())
            .await
            .map_err(|_| {
                TelemetryError::Timeout(format!(
                    "{kind} 세마포어 획득 {}초 초과",
                    self.limits.acquire_timeout.as_secs()
                ))
            })?
            .map_err(|_| TelemetryError::Timeout(format!("{kind} 세마포어 닫힘")))
    }

    /// 항목들을 고정 크기 배치로 나눠 실행, 배치 간 짧은 휴지
    ///
    /// 결과는 입력 순서를 유지한다. 개별 실패는 해당 슬롯의 `Err`로 남는다.
    pub async fn run_batched<I, T, F, Fut>(
        &self,
        items: Vec<I>,
        operation: F,
    ) -> Vec<Result<T, TelemetryError>>
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, TelemetryError>>,
    {
        let total = items.len();
        let mut results = Vec::with_capacity(total);
        let mut batch_index = 0;
        let mut iter = items.into_iter().peekable();

        while iter.peek().is_some() {
            let batch: Vec<I> = iter.by_ref().take(self.limits.batch_size).collect();
            debug!(batch = batch_index, size = batch.len(), total, "배치 실행");
            let futures: Vec<_> = batch
                .into_iter()
                .map(|item| self.run_operation(|| operation(item)))
                .collect();
            results.extend(join_all(futures).await);
            batch_index += 1;

            if iter.peek().is_some() {
                tokio::time::sleep(self.limits.batch_pause).await;
            }
        }
        results
    }
}

impl Default for ConcurrencyController {
    fn default() -> Self {
        Self::new(ConcurrencyLimits::default())
    }
}
