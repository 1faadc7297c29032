//! NETPULSE 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 이 타입으로 매핑해 반환한다. 전파 정책:
//! - [`TelemetryError::Measurement`]는 오케스트레이터에서 흡수 (필드 부재로 강등)
//! - [`TelemetryError::Collection`]/[`TelemetryError::Storage`]는 사이클 레벨에서 로그 후 다음 주기로
//! - [`TelemetryError::Config`]는 시작 시점에 치명적

use thiserror::Error;

/// 텔레메트리 서비스 공통 에러.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// 단일 프로브(ping/traceroute/geo) 실패 — 해당 필드만 누락, 수집은 계속
    #[error("측정 실패: {0}")]
    Measurement(String),

    /// 대상의 모든 서브 프로브 실패 — 이번 사이클 기록 없음
    #[error("수집 실패: {target}: 유효한 서브 측정이 없음")]
    Collection {
        /// 수집 대상 호스트명
        target: String,
    },

    /// 저장소 쓰기/조회 실패
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 설정값 오류 (시작 시점 치명적)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 회로 차단기가 열린 상태에서의 호출 거부 (일시적 실패로 취급)
    #[error("회로 열림: {name}")]
    CircuitOpen {
        /// 보호 대상 작업 이름
        name: String,
    },

    /// 실행 타임아웃
    #[error("타임아웃: {0}")]
    Timeout(String),

    /// 네트워크 에러 (연결 실패, HTTP 에러 응답)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 외부 명령 출력 파싱 실패
    #[error("파싱 에러: {0}")]
    Parse(String),

    /// I/O 에러 (프로세스 실행 등)
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TelemetryError {
    /// 일시적 에러 여부 — 재시도 정책의 대상
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TelemetryError::Network(_)
                | TelemetryError::Timeout(_)
                | TelemetryError::Storage(_)
                | TelemetryError::CircuitOpen { .. }
        )
    }
}
