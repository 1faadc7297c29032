//! 수집 사이클당 원시 측정값.
//!
//! 세 서브 측정(ping, traceroute, 지리 위치)은 각각 독립적으로 실패할 수 있다.
//! 실패한 쪽은 `None`으로 남고, 셋 모두 `None`이면 수집 실패로 폐기된다.

use serde::{Deserialize, Serialize};

use crate::models::geo::GeoReport;

/// ping 통계의 RTT 블록 (min/avg/max/mdev는 함께만 존재)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rtt {
    /// 최소 RTT (ms)
    pub min: f64,
    /// 평균 RTT (ms)
    pub avg: f64,
    /// 최대 RTT (ms)
    pub max: f64,
    /// RTT 표준편차 (ms)
    pub mdev: f64,
}

/// ping 출력에서 파싱한 통계
///
/// 파싱이 아무것도 찾지 못하면 모든 필드가 `None`인 값이 된다 (에러 아님).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PingStats {
    /// 패킷 손실률 (0–100 %)
    pub packet_loss: Option<f64>,
    /// 전송 패킷 수
    pub packets_transmitted: Option<u32>,
    /// 수신 패킷 수
    pub packets_received: Option<u32>,
    /// RTT 통계
    pub rtt: Option<Rtt>,
}

impl PingStats {
    /// 파싱 결과가 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.packet_loss.is_none()
            && self.packets_transmitted.is_none()
            && self.packets_received.is_none()
            && self.rtt.is_none()
    }
}

/// traceroute의 한 홉
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteHop {
    /// 홉 순번 (1부터)
    pub hop: u32,
    /// 홉의 IP 주소
    pub ip: String,
    /// 해당 홉의 평균 응답 시간 (ms)
    pub avg_time_ms: f64,
}

/// traceroute 결과 — 홉 순서대로 정렬된 경로
///
/// 타임아웃/실패 시 [`RouteSample::empty`]를 반환한다
/// (성공이지만 강등된 결과, 에러 아님).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteSample {
    /// 마지막으로 파싱된 홉 번호
    pub hop_count: u32,
    /// 홉 순서대로의 경로
    pub hops: Vec<RouteHop>,
}

impl RouteSample {
    /// 빈 경로 (강등 결과)
    pub fn empty() -> Self {
        Self::default()
    }
}

/// 한 대상에 대한 한 번의 수집 시도 결과
///
/// 생성 후 변경하지 않는다 — 파이프라인은 사이클당 순수 변환 체인이다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMeasurement {
    /// 수집 대상 호스트명
    pub target: String,
    /// 수집 시각 (unix 초)
    pub timestamp: i64,
    /// 수집에 걸린 시간 (초)
    pub collection_duration: f64,
    /// ping 서브 측정 (실패 시 None)
    pub ping: Option<PingStats>,
    /// traceroute 서브 측정 (실패 시 None)
    pub route: Option<RouteSample>,
    /// 지리 위치 서브 측정 (실패 시 None)
    pub geo: Option<GeoReport>,
}

impl RawMeasurement {
    /// 세 서브 측정이 모두 실패했는지 여부 — true면 수집 실패로 폐기
    pub fn is_empty(&self) -> bool {
        self.ping.is_none() && self.route.is_none() && self.geo.is_none()
    }

    /// 평균 RTT (ms)
    pub fn rtt_avg(&self) -> Option<f64> {
        self.ping.as_ref().and_then(|p| p.rtt).map(|r| r.avg)
    }

    /// 패킷 손실률 (%)
    pub fn packet_loss(&self) -> Option<f64> {
        self.ping.as_ref().and_then(|p| p.packet_loss)
    }

    /// 홉 수
    pub fn hop_count(&self) -> Option<u32> {
        self.route.as_ref().map(|r| r.hop_count)
    }
}
