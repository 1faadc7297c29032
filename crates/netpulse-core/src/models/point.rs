//! 저장 단위 데이터 포인트와 고정 필드 스키마.
//!
//! 필드 키는 문자열이 아니라 [`Metric`] enum으로 고정한다. 파생 엔진의
//! 각 단계가 서로 다른 variant만 쓰므로 키 충돌은 타입 수준에서 불가능하고
//! 키 오타는 컴파일 에러가 된다. 와이어 이름은 [`Metric::name`] 한 곳에서만 나간다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 모든 데이터 포인트가 쓰는 measurement 이름
pub const MEASUREMENT: &str = "network_telemetry";

/// 파생 엔진이 생산하는 전체 필드 스키마.
///
/// variant 순서는 파생 단계 순서를 따른다. `MinLatency` 등 4개는
/// 기존 대시보드가 참조하는 별칭 필드다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    // ---- 원시 ping 통과 필드 + 대시보드 별칭 ----
    RttMin,
    MinLatency,
    RttAvg,
    AvgLatency,
    RttMax,
    MaxLatency,
    RttMdev,
    StddevLatency,
    PacketLoss,
    PacketsTransmitted,
    PacketsReceived,
    HttpStatusCode,

    // ---- QoS ----
    JitterMs,
    QueueDepth,
    BufferUtilizationPct,
    VoiceQualityScore,
    VideoQualityScore,
    DataQualityScore,
    CongestionDropsPct,
    CongestionLevelPct,
    QosViolations,

    // ---- 가용성 ----
    ServiceAvailable,
    FailureCount,
    ResponseSuccess,
    ServiceQualityScore,
    ServiceDegraded,
    InRecovery,

    // ---- 처리량/대역폭 ----
    BytesPerSecond,
    BitsPerSecond,
    PacketsPerSecond,
    ThroughputKbps,
    ThroughputMbps,
    ThroughputGbps,
    BandwidthUtilizationPct,
    Interface1gbUtilPct,
    Interface1gbUsedMbps,
    Interface10gbUtilPct,
    Interface10gbUsedMbps,
    Interface100mbUtilPct,
    Interface100mbUsedMbps,
    NetworkEfficiencyPct,
    GoodputMbps,
    TrafficIntensity,
    TxQueueDepth,
    RxBufferUsagePct,
    BandwidthDelayProductMb,
    RttEfficiencyScore,

    // ---- 응답 시간 분해 ----
    DnsResolutionMs,
    DnsCacheHit,
    TcpHandshakeMs,
    AppResponseMs,
    AppType,
    DbQueryMs,
    QueryType,
    DbConnectionWaitMs,
    ResponseEfficiencyPct,
    TotalResponseMs,
    ResponseCategory,
    ResponseSlaViolation,

    // ---- 경로 ----
    HopCount,
    RoutePathLength,
    FirstHopIp,
    LastHopIp,

    // ---- 지리 위치 ----
    TargetIp,
    SourceIp,
    TargetLatitude,
    TargetLongitude,
    TargetCountry,
    TargetRegion,
    TargetCity,
    TargetTimezone,
    TargetIsp,
    SourceLatitude,
    SourceLongitude,
    SourceCountry,
    SourceRegion,
    SourceCity,
    SourceTimezone,
    SourceIsp,
    DistanceKm,

    // ---- 수집 메타 ----
    CollectionDuration,
}

impl Metric {
    /// InfluxDB 필드 키
    pub fn name(&self) -> &'static str {
        match self {
            Metric::RttMin => "rtt_min",
            Metric::MinLatency => "min_latency",
            Metric::RttAvg => "rtt_avg",
            Metric::AvgLatency => "avg_latency",
            Metric::RttMax => "rtt_max",
            Metric::MaxLatency => "max_latency",
            Metric::RttMdev => "rtt_mdev",
            Metric::StddevLatency => "stddev_latency",
            Metric::PacketLoss => "packet_loss",
            Metric::PacketsTransmitted => "packets_transmitted",
            Metric::PacketsReceived => "packets_received",
            Metric::HttpStatusCode => "http_status_code",

            Metric::JitterMs => "jitter_ms",
            Metric::QueueDepth => "queue_depth",
            Metric::BufferUtilizationPct => "buffer_utilization_pct",
            Metric::VoiceQualityScore => "voice_quality_score",
            Metric::VideoQualityScore => "video_quality_score",
            Metric::DataQualityScore => "data_quality_score",
            Metric::CongestionDropsPct => "congestion_drops_pct",
            Metric::CongestionLevelPct => "congestion_level_pct",
            Metric::QosViolations => "qos_violations",

            Metric::ServiceAvailable => "service_available",
            Metric::FailureCount => "failure_count",
            Metric::ResponseSuccess => "response_success",
            Metric::ServiceQualityScore => "service_quality_score",
            Metric::ServiceDegraded => "service_degraded",
            Metric::InRecovery => "in_recovery",

            Metric::BytesPerSecond => "bytes_per_second",
            Metric::BitsPerSecond => "bits_per_second",
            Metric::PacketsPerSecond => "packets_per_second",
            Metric::ThroughputKbps => "throughput_kbps",
            Metric::ThroughputMbps => "throughput_mbps",
            Metric::ThroughputGbps => "throughput_gbps",
            Metric::BandwidthUtilizationPct => "bandwidth_utilization_pct",
            Metric::Interface1gbUtilPct => "interface_1gb_util_pct",
            Metric::Interface1gbUsedMbps => "interface_1gb_used_mbps",
            Metric::Interface10gbUtilPct => "interface_10gb_util_pct",
            Metric::Interface10gbUsedMbps => "interface_10gb_used_mbps",
            Metric::Interface100mbUtilPct => "interface_100mb_util_pct",
            Metric::Interface100mbUsedMbps => "interface_100mb_used_mbps",
            Metric::NetworkEfficiencyPct => "network_efficiency_pct",
            Metric::GoodputMbps => "goodput_mbps",
            Metric::TrafficIntensity => "traffic_intensity",
            Metric::TxQueueDepth => "tx_queue_depth",
            Metric::RxBufferUsagePct => "rx_buffer_usage_pct",
            Metric::BandwidthDelayProductMb => "bandwidth_delay_product_mb",
            Metric::RttEfficiencyScore => "rtt_efficiency_score",

            Metric::DnsResolutionMs => "dns_resolution_ms",
            Metric::DnsCacheHit => "dns_cache_hit",
            Metric::TcpHandshakeMs => "tcp_handshake_ms",
            Metric::AppResponseMs => "app_response_ms",
            Metric::AppType => "app_type",
            Metric::DbQueryMs => "db_query_ms",
            Metric::QueryType => "query_type",
            Metric::DbConnectionWaitMs => "db_connection_wait_ms",
            Metric::ResponseEfficiencyPct => "response_efficiency_pct",
            Metric::TotalResponseMs => "total_response_ms",
            Metric::ResponseCategory => "response_category",
            Metric::ResponseSlaViolation => "response_sla_violation",

            Metric::HopCount => "hop_count",
            Metric::RoutePathLength => "route_path_length",
            Metric::FirstHopIp => "first_hop_ip",
            Metric::LastHopIp => "last_hop_ip",

            Metric::TargetIp => "target_ip",
            Metric::SourceIp => "source_ip",
            Metric::TargetLatitude => "target_latitude",
            Metric::TargetLongitude => "target_longitude",
            Metric::TargetCountry => "target_country",
            Metric::TargetRegion => "target_region",
            Metric::TargetCity => "target_city",
            Metric::TargetTimezone => "target_timezone",
            Metric::TargetIsp => "target_isp",
            Metric::SourceLatitude => "source_latitude",
            Metric::SourceLongitude => "source_longitude",
            Metric::SourceCountry => "source_country",
            Metric::SourceRegion => "source_region",
            Metric::SourceCity => "source_city",
            Metric::SourceTimezone => "source_timezone",
            Metric::SourceIsp => "source_isp",
            Metric::DistanceKm => "distance_km",

            Metric::CollectionDuration => "collection_duration",
        }
    }
}

/// 필드 값 — InfluxDB 라인 프로토콜의 세 타입
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// 실수 필드
    Float(f64),
    /// 정수 필드 (라인 프로토콜에서 `i` 접미사)
    Int(i64),
    /// 문자열 필드 (라인 프로토콜에서 따옴표)
    Str(String),
}

/// 한 데이터 포인트의 필드 집합
///
/// NaN/무한대 실수는 삽입 시점에 버린다. 키가 [`Metric`]이므로
/// 직렬화 순서는 variant 정의 순서로 결정적이다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSet {
    fields: BTreeMap<Metric, FieldValue>,
}

impl FieldSet {
    /// 빈 필드 집합
    pub fn new() -> Self {
        Self::default()
    }

    /// 실수 필드 삽입 — 비유한(NaN/inf) 값은 조용히 버린다
    pub fn insert_f64(&mut self, metric: Metric, value: f64) {
        if value.is_finite() {
            self.fields.insert(metric, FieldValue::Float(value));
        } else {
            tracing::debug!(metric = metric.name(), "비유한 필드 값 폐기");
        }
    }

    /// 정수 필드 삽입
    pub fn insert_int(&mut self, metric: Metric, value: i64) {
        self.fields.insert(metric, FieldValue::Int(value));
    }

    /// 문자열 필드 삽입
    pub fn insert_str(&mut self, metric: Metric, value: impl Into<String>) {
        self.fields.insert(metric, FieldValue::Str(value.into()));
    }

    /// 실수 필드 조회
    pub fn get_f64(&self, metric: Metric) -> Option<f64> {
        match self.fields.get(&metric) {
            Some(FieldValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    /// 정수 필드 조회
    pub fn get_int(&self, metric: Metric) -> Option<i64> {
        match self.fields.get(&metric) {
            Some(FieldValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// 문자열 필드 조회
    pub fn get_str(&self, metric: Metric) -> Option<&str> {
        match self.fields.get(&metric) {
            Some(FieldValue::Str(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// 필드 존재 여부
    pub fn contains(&self, metric: Metric) -> bool {
        self.fields.contains_key(&metric)
    }

    /// 필드 수
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// 필드가 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// (필드 키, 값) 순회 — 키 순서 결정적
    pub fn iter(&self) -> impl Iterator<Item = (&Metric, &FieldValue)> {
        self.fields.iter()
    }
}

/// 저장소에 기록되는 한 행
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// measurement 이름 (보통 [`MEASUREMENT`])
    pub measurement: String,
    /// 인덱싱 태그 (`target`은 항상 존재)
    pub tags: BTreeMap<String, String>,
    /// 필드 집합 (최소 1개)
    pub fields: FieldSet,
    /// 측정 시각 (unix 초)
    pub timestamp: i64,
}

impl DataPoint {
    /// `network_telemetry` measurement의 새 포인트 (`target` 태그 포함)
    pub fn new(target: &str, timestamp: i64) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert("target".to_string(), target.to_string());
        Self {
            measurement: MEASUREMENT.to_string(),
            tags,
            fields: FieldSet::new(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_floats_dropped() {
        let mut fields = FieldSet::new();
        fields.insert_f64(Metric::RttAvg, f64::NAN);
        fields.insert_f64(Metric::RttMax, f64::INFINITY);
        fields.insert_f64(Metric::RttMin, 1.25);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get_f64(Metric::RttMin), Some(1.25));
        assert!(!fields.contains(Metric::RttAvg));
    }

    #[test]
    fn typed_accessors_match_inserted_type() {
        let mut fields = FieldSet::new();
        fields.insert_int(Metric::HttpStatusCode, 200);
        fields.insert_str(Metric::TargetIp, "142.250.1.1");
        assert_eq!(fields.get_int(Metric::HttpStatusCode), Some(200));
        assert_eq!(fields.get_f64(Metric::HttpStatusCode), None);
        assert_eq!(fields.get_str(Metric::TargetIp), Some("142.250.1.1"));
    }

    #[test]
    fn point_carries_target_tag() {
        let point = DataPoint::new("google.com", 1_700_000_000);
        assert_eq!(point.measurement, MEASUREMENT);
        assert_eq!(
            point.tags.get("target").map(String::as_str),
            Some("google.com")
        );
        assert!(point.fields.is_empty());
    }

    #[test]
    fn alias_fields_have_distinct_keys() {
        // 별칭은 원본과 다른 와이어 키를 가져야 한다
        assert_ne!(Metric::RttMin.name(), Metric::MinLatency.name());
        assert_ne!(Metric::RttAvg.name(), Metric::AvgLatency.name());
        assert_ne!(Metric::RttMax.name(), Metric::MaxLatency.name());
        assert_ne!(Metric::RttMdev.name(), Metric::StddevLatency.name());
    }
}
