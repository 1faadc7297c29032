//! 메트릭 파생 엔진.
//!
//! [`RawMeasurement`] 하나를 저장 준비된 [`DataPoint`] 하나로 변환한다.
//! 단계는 의존 순서대로 실행된다 (뒤 단계가 앞 단계의 필드를 읽는다):
//! 통과/별칭 → HTTP 상태 → QoS → 가용성 → 처리량 → 응답 분해 → 경로 → 지리.
//! 주입된 분류기를 제외하면 입력에 대해 결정적이다.

pub mod availability;
pub mod classify;
pub mod qos;
pub mod response;
pub mod throughput;

pub use classify::{AppClass, FixedClassifier, QueryClass, RandomClassifier, WorkloadClassifier};

use crate::models::geo::GeoReport;
use crate::models::measurement::RawMeasurement;
use crate::models::point::{DataPoint, FieldSet, Metric};

/// 파생 엔진 — 분류기를 주입받아 구성한다
pub struct MetricsDeriver {
    classifier: Box<dyn WorkloadClassifier>,
}

impl Default for MetricsDeriver {
    fn default() -> Self {
        Self::new(RandomClassifier)
    }
}

impl MetricsDeriver {
    /// 지정한 분류기로 엔진 구성
    pub fn new(classifier: impl WorkloadClassifier + 'static) -> Self {
        Self {
            classifier: Box::new(classifier),
        }
    }

    /// 원시 측정 → 데이터 포인트 변환
    ///
    /// 서브 측정이 모두 실패한 입력(또는 필드가 하나도 안 나온 경우)은
    /// `None` — 호출자는 기록 없이 이번 사이클을 실패로 센다.
    pub fn process(&self, raw: &RawMeasurement) -> Option<DataPoint> {
        if raw.is_empty() {
            tracing::warn!(target_host = %raw.target, "서브 측정 전부 실패, 기록 생략");
            return None;
        }

        let mut point = DataPoint::new(&raw.target, raw.timestamp);
        let fields = &mut point.fields;

        passthrough(fields, raw);
        http_status(fields, raw);
        qos::derive(fields, raw);
        availability::derive(fields, raw);
        throughput::derive(fields, raw);
        response::derive(fields, raw, self.classifier.as_ref());
        route_fields(fields, raw);
        geo_fields(fields, raw.geo.as_ref());
        fields.insert_f64(Metric::CollectionDuration, raw.collection_duration);

        if point.fields.is_empty() {
            return None;
        }
        tracing::debug!(
            target_host = %raw.target,
            field_count = point.fields.len(),
            "파생 완료"
        );
        Some(point)
    }
}

/// 원시 ping 값 통과 + 대시보드 별칭
fn passthrough(fields: &mut FieldSet, raw: &RawMeasurement) {
    let Some(ping) = &raw.ping else {
        return;
    };
    if let Some(rtt) = ping.rtt {
        fields.insert_f64(Metric::RttMin, rtt.min);
        fields.insert_f64(Metric::MinLatency, rtt.min);
        fields.insert_f64(Metric::RttAvg, rtt.avg);
        fields.insert_f64(Metric::AvgLatency, rtt.avg);
        fields.insert_f64(Metric::RttMax, rtt.max);
        fields.insert_f64(Metric::MaxLatency, rtt.max);
        fields.insert_f64(Metric::RttMdev, rtt.mdev);
        fields.insert_f64(Metric::StddevLatency, rtt.mdev);
    }
    if let Some(loss) = ping.packet_loss {
        fields.insert_f64(Metric::PacketLoss, loss);
    }
    if let Some(transmitted) = ping.packets_transmitted {
        fields.insert_int(Metric::PacketsTransmitted, i64::from(transmitted));
    }
    if let Some(received) = ping.packets_received {
        fields.insert_int(Metric::PacketsReceived, i64::from(received));
    }
}

/// HTTP 상태 시뮬레이션 — 심각한 조건부터 첫 매치 우선
fn http_status(fields: &mut FieldSet, raw: &RawMeasurement) {
    let (Some(avg), Some(loss)) = (raw.rtt_avg(), raw.packet_loss()) else {
        return;
    };
    let status = if loss > 10.0 || avg > 1000.0 {
        503
    } else if loss > 5.0 || avg > 500.0 {
        504
    } else if loss > 1.0 || avg > 200.0 {
        408
    } else {
        200
    };
    fields.insert_int(Metric::HttpStatusCode, status);
}

/// 경로 필드 — 홉 수와 첫/마지막 홉 IP
fn route_fields(fields: &mut FieldSet, raw: &RawMeasurement) {
    let Some(route) = &raw.route else {
        return;
    };
    fields.insert_int(Metric::HopCount, i64::from(route.hop_count));
    if !route.hops.is_empty() {
        fields.insert_int(Metric::RoutePathLength, route.hops.len() as i64);
        if let Some(first) = route.hops.first() {
            fields.insert_str(Metric::FirstHopIp, first.ip.clone());
        }
        if let Some(last) = route.hops.last() {
            fields.insert_str(Metric::LastHopIp, last.ip.clone());
        }
    }
}

/// 지리 위치 통과 — 존재하는 필드만, 플레이스홀더 없음
fn geo_fields(fields: &mut FieldSet, geo: Option<&GeoReport>) {
    let Some(geo) = geo else {
        return;
    };
    if let Some(endpoint) = &geo.target {
        fields.insert_str(Metric::TargetIp, endpoint.ip.clone());
        if let Some(location) = &endpoint.location {
            fields.insert_f64(Metric::TargetLatitude, location.latitude);
            fields.insert_f64(Metric::TargetLongitude, location.longitude);
            insert_present(fields, Metric::TargetCountry, &location.country);
            insert_present(fields, Metric::TargetRegion, &location.region);
            insert_present(fields, Metric::TargetCity, &location.city);
            insert_present(fields, Metric::TargetTimezone, &location.timezone);
            insert_present(fields, Metric::TargetIsp, &location.isp);
        }
    }
    if let Some(endpoint) = &geo.source {
        fields.insert_str(Metric::SourceIp, endpoint.ip.clone());
        if let Some(location) = &endpoint.location {
            fields.insert_f64(Metric::SourceLatitude, location.latitude);
            fields.insert_f64(Metric::SourceLongitude, location.longitude);
            insert_present(fields, Metric::SourceCountry, &location.country);
            insert_present(fields, Metric::SourceRegion, &location.region);
            insert_present(fields, Metric::SourceCity, &location.city);
            insert_present(fields, Metric::SourceTimezone, &location.timezone);
            insert_present(fields, Metric::SourceIsp, &location.isp);
        }
    }
    if let Some(distance) = geo.distance_km {
        fields.insert_f64(Metric::DistanceKm, distance);
    }
}

/// 값이 실제로 있을 때만 문자열 필드 기록 (빈 문자열도 부재로 취급)
fn insert_present(fields: &mut FieldSet, metric: Metric, value: &Option<String>) {
    if let Some(value) = value {
        if !value.is_empty() {
            fields.insert_str(metric, value.clone());
        }
    }
}
