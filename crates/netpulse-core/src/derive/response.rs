//! 응답 시간 분해 단계.
//!
//! 전체 RTT 예산을 DNS / TCP 핸드셰이크 / 애플리케이션 / 네트워크
//! 오버헤드로 배분한다. 애플리케이션·쿼리 유형 선택은 주입된
//! [`WorkloadClassifier`]가 공급한다 — 이 단계의 유일한 비결정 지점.
//! `rtt_avg`가 없으면 단계 전체를 건너뛴다 (값 날조 없음).

use crate::derive::classify::{AppClass, WorkloadClassifier};
use crate::models::measurement::RawMeasurement;
use crate::models::point::{FieldSet, Metric};

/// 응답 시간 분해 필드를 계산해 `fields`에 추가한다
pub fn derive(fields: &mut FieldSet, raw: &RawMeasurement, classifier: &dyn WorkloadClassifier) {
    let Some(total_rtt) = raw.rtt_avg() else {
        return;
    };

    // DNS: RTT의 10% + 손실 1%당 2ms, 캐시 히트면 절반 (하한 1ms)
    let mut dns_time = total_rtt * 0.1;
    if let Some(loss) = raw.packet_loss() {
        dns_time += loss * 2.0;
    }
    let cache_hit = classifier.dns_cache_hit();
    if cache_hit {
        dns_time = (dns_time * 0.5).max(1.0);
    }
    fields.insert_f64(Metric::DnsResolutionMs, dns_time);
    fields.insert_int(Metric::DnsCacheHit, i64::from(cache_hit));

    // TCP 핸드셰이크: RTT의 20% + 5홉 초과 1.5ms/홉 + 혼잡 가산 (하한 0.5ms)
    let mut tcp_time = total_rtt * 0.2;
    if let Some(hops) = raw.hop_count() {
        tcp_time += ((hops as f64) - 5.0).max(0.0) * 1.5;
    }
    if let Some(congestion) = fields.get_f64(Metric::CongestionLevelPct) {
        tcp_time += congestion / 100.0 * 10.0;
    }
    let tcp_time = tcp_time.max(0.5);
    fields.insert_f64(Metric::TcpHandshakeMs, tcp_time);

    // 애플리케이션: 나머지 예산 (하한 10ms), HTTP 상태에 따라 가중
    let network_overhead = total_rtt * 0.1;
    let remaining = total_rtt - dns_time - tcp_time - network_overhead;
    let mut app_base = remaining.max(10.0);
    match fields.get_int(Metric::HttpStatusCode) {
        Some(status) if status >= 500 => app_base *= 2.0,
        Some(status) if status >= 400 => app_base *= 1.3,
        _ => {}
    }

    let (app_class, app_multiplier) = classifier.app_workload();
    let app_time = app_base * app_multiplier;
    fields.insert_f64(Metric::AppResponseMs, app_time);
    fields.insert_int(Metric::AppType, app_class.code());

    // DB 쿼리: DB 애플리케이션은 앱 시간의 80%, 그 외 30%
    let db_share = if app_class == AppClass::Database {
        0.8
    } else {
        0.3
    };
    let (query_class, query_multiplier) = classifier.query_workload();
    let db_time = app_time * db_share * query_multiplier;
    fields.insert_f64(Metric::DbQueryMs, db_time);
    fields.insert_int(Metric::QueryType, query_class.code());
    fields.insert_f64(
        Metric::DbConnectionWaitMs,
        classifier.connection_wait_ms(db_time > 100.0),
    );

    // 합계와 분류
    let total = dns_time + tcp_time + app_time + network_overhead;
    fields.insert_f64(Metric::TotalResponseMs, total);
    if total_rtt > 0.0 {
        fields.insert_f64(
            Metric::ResponseEfficiencyPct,
            (50.0 / total_rtt * 100.0).min(100.0),
        );
    }
    let category = if total < 100.0 {
        1
    } else if total < 300.0 {
        2
    } else if total < 1000.0 {
        3
    } else {
        4
    };
    fields.insert_int(Metric::ResponseCategory, category);
    fields.insert_int(Metric::ResponseSlaViolation, i64::from(total > 500.0));
}
