//! # netpulse-resilience
//!
//! 수집/저장 경로를 보호하는 복원력 프리미티브.
//!
//! - [`circuit_breaker`] — 작업 이름별 회로 차단기와 레지스트리
//! - [`retry`] — 지수 백오프 + 지터 재시도 정책
//! - [`concurrency`] — 세마포어 기반 동시성 제한과 배치 실행
//! - [`worker_pool`] — 유한 큐를 소비하는 고정 워커 풀

pub mod circuit_breaker;
pub mod concurrency;
pub mod retry;
pub mod worker_pool;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState,
};
pub use concurrency::{ConcurrencyController, ConcurrencyLimits};
pub use retry::RetryPolicy;
pub use worker_pool::WorkerPool;
