//! 지리 위치 수집 포트.

use async_trait::async_trait;

use crate::error::TelemetryError;
use crate::models::geo::GeoReport;

/// 대상/소스 양쪽 지리 정보 수집
#[async_trait]
pub trait GeoResolver: Send + Sync {
    /// 대상 DNS 해석 + 공인 IP 확인 + 위치 조회
    ///
    /// 대상 DNS 해석 실패만 에러다. 공인 IP나 위치 조회 실패는
    /// 해당 부분이 빠진 보고서로 강등된다.
    async fn collect(&self, target: &str) -> Result<GeoReport, TelemetryError>;
}
