//! 메트릭 저장소 포트.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::TelemetryError;
use crate::models::point::DataPoint;

/// 시계열 저장소
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// 저장소 연결 확인
    async fn ping(&self) -> Result<(), TelemetryError>;

    /// 데이터 포인트 1건 기록
    ///
    /// 필드가 하나도 없는 포인트는 거부한다.
    async fn write_point(&self, point: &DataPoint) -> Result<(), TelemetryError>;

    /// 질의 실행 — 행을 컬럼명→값 맵으로 반환
    async fn query(&self, query: &str) -> Result<Vec<HashMap<String, String>>, TelemetryError>;
}
