//! 회로 차단기.
//!
//! 상태 기계: `CLOSED → OPEN → HALF_OPEN → {CLOSED | OPEN}`, 프로세스
//! 수명 동안 순환한다. 보호 작업 이름별로 하나씩, 레지스트리에서
//! 최초 사용 시 생성된다.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use netpulse_core::error::TelemetryError;

/// 회로 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// 정상 — 호출 통과
    Closed,
    /// 차단 — 호출 즉시 거부
    Open,
    /// 시험 — 제한된 호출로 회복 확인
    HalfOpen,
}

/// 차단기 설정
#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    /// OPEN 전환까지의 연속 실패 수
    pub failure_threshold: u32,
    /// OPEN에서 시험 호출 허용까지의 대기
    pub recovery_timeout: Duration,
    /// HALF_OPEN에서 CLOSED 복귀까지의 연속 성공 수
    pub success_threshold: u32,
    /// 감싼 호출의 타임아웃
    pub call_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
            success_threshold: 3,
            call_timeout: Duration::from_secs(10),
        }
    }
}

struct CircuitInner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure_time: Option<Instant>,
}

/// 이름 붙은 작업 하나를 보호하는 회로 차단기
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<CircuitInner>,
}

impl CircuitBreaker {
    /// 새 차단기 (CLOSED 상태로 시작)
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(CircuitInner {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                last_failure_time: None,
            }),
        }
    }

    /// 기본 설정으로 생성
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self::new(name, CircuitBreakerConfig::default())
    }

    /// 현재 상태
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// 작업을 차단기와 타임아웃 아래에서 실행
    ///
    /// OPEN 상태에서 회복 대기 중이면 작업을 호출하지 않고
    /// [`TelemetryError::CircuitOpen`]을 즉시 반환한다.
    pub async fn call<T, F, Fut>(&self, operation: F) -> Result<T, TelemetryError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, TelemetryError>>,
    {
        self.check_admission()?;

        let result = tokio::time::timeout(self.config.call_timeout, operation()).await;
        match result {
            Ok(Ok(value)) => {
                self.on_success();
                Ok(value)
            }
            Ok(Err(error)) => {
                self.on_failure();
                Err(error)
            }
            Err(_) => {
                self.on_failure();
                Err(TelemetryError::Timeout(format!(
                    "{}: {}초 초과",
                    self.name,
                    self.config.call_timeout.as_secs()
                )))
            }
        }
    }

    fn check_admission(&self) -> Result<(), TelemetryError> {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::Open {
            let elapsed = inner
                .last_failure_time
                .map(|at| at.elapsed())
                .unwrap_or(Duration::MAX);
            if elapsed < self.config.recovery_timeout {
                return Err(TelemetryError::CircuitOpen {
                    name: self.name.clone(),
                });
            }
            // 회복 대기 경과 — 시험 호출 허용
            info!(name = %self.name, "회로 HALF_OPEN 전환, 시험 호출 허용");
            inner.state = CircuitState::HalfOpen;
            inner.success_count = 0;
        }
        Ok(())
    }

    fn on_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::HalfOpen => {
                inner.success_count += 1;
                if inner.success_count >= self.config.success_threshold {
                    info!(name = %self.name, "회로 CLOSED 복귀");
                    inner.state = CircuitState::Closed;
                    inner.failure_count = 0;
                    inner.success_count = 0;
                }
            }
            // CLOSED에서 성공은 실패 누적을 끊는다
            _ => inner.failure_count = 0,
        }
    }

    fn on_failure(&self) {
        let mut inner = self.inner.lock();
        inner.last_failure_time = Some(Instant::now());
        match inner.state {
            CircuitState::HalfOpen => {
                warn!(name = %self.name, "시험 호출 실패, 회로 재차단");
                inner.state = CircuitState::Open;
                inner.success_count = 0;
            }
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    warn!(
                        name = %self.name,
                        failures = inner.failure_count,
                        "실패 임계 도달, 회로 OPEN"
                    );
                    inner.state = CircuitState::Open;
                }
            }
            CircuitState::Open => {}
        }
    }
}

/// 작업 이름별 차단기 레지스트리 (프로세스 전역 공유)
#[derive(Default)]
pub struct CircuitBreakerRegistry {
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreakerRegistry {
    /// 기본 설정의 레지스트리
    pub fn new() -> Self {
        Self::default()
    }

    /// 설정을 지정한 레지스트리
    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            breakers: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// 이름에 해당하는 차단기 — 최초 사용 시 생성
    pub fn get_or_create(&self, name: &str) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock();
        breakers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(name, self.config)))
            .clone()
    }
}
