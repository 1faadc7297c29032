//! 헬스 체크.
//!
//! 전체 수집 사이클 없이 저장소 연결과 DNS 해석만 빠르게 확인한다.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::lookup_host;
use tracing::warn;

use netpulse_core::ports::MetricsStore;

/// 빠른 헬스 체크 결과
#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// 전체 판정
    pub healthy: bool,
    /// 저장소 연결 확인 여부
    pub storage_ok: bool,
    /// DNS 해석 확인 여부
    pub dns_ok: bool,
    /// 체크에 걸린 시간 (ms)
    pub response_time_ms: f64,
    /// 프로세스 기동 후 경과 시간 (초)
    pub uptime_seconds: f64,
    /// 확인한 대상 호스트명
    pub target: String,
}

/// 저장소 ping + 대상 DNS 해석으로 빠른 판정
///
/// `process_start`는 기동 시점 — 리포트의 업타임 계산에 쓰인다.
pub async fn quick_check(
    store: Arc<dyn MetricsStore>,
    target: &str,
    process_start: Instant,
) -> HealthReport {
    let started = Instant::now();

    let storage_ok = match store.ping().await {
        Ok(()) => true,
        Err(error) => {
            warn!(%error, "저장소 헬스 체크 실패");
            false
        }
    };

    let dns_ok = match lookup_host((target, 0)).await {
        Ok(mut addrs) => addrs.next().is_some(),
        Err(error) => {
            warn!(target_host = target, %error, "DNS 헬스 체크 실패");
            false
        }
    };

    HealthReport {
        healthy: storage_ok && dns_ok,
        storage_ok,
        dns_ok,
        response_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        uptime_seconds: process_start.elapsed().as_secs_f64(),
        target: target.to_string(),
    }
}
