//! 네트워크 프로브 포트.

use async_trait::async_trait;

use crate::error::TelemetryError;
use crate::models::measurement::{PingStats, RouteSample};

/// 왕복 지연 측정 (ping)
#[async_trait]
pub trait LatencyProber: Send + Sync {
    /// 대상에 ping을 보내고 통계를 파싱한다
    ///
    /// 명령 실행 실패는 에러, 파싱이 일부만 성공하면 부분 통계를 반환한다.
    async fn measure(&self, target: &str) -> Result<PingStats, TelemetryError>;

    /// 단일 패킷으로 도달 가능 여부 확인 (헬스 체크용)
    async fn check_reachable(&self, target: &str) -> bool;
}

/// 경로 추적 (traceroute)
#[async_trait]
pub trait HopProber: Send + Sync {
    /// 대상까지의 홉 경로를 추적한다
    ///
    /// 타임아웃/실패는 빈 경로로 강등된다 (에러 아님).
    async fn trace(&self, target: &str) -> RouteSample;
}
