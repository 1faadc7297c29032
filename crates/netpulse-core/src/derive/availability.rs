//! 가용성/신뢰성 파생 단계.
//!
//! 앞 단계가 쓴 `http_status_code`와 `qos_violations`를 읽는다.

use crate::models::measurement::RawMeasurement;
use crate::models::point::{FieldSet, Metric};

/// 가용성 지표를 계산해 `fields`에 추가한다
pub fn derive(fields: &mut FieldSet, raw: &RawMeasurement) {
    let loss = raw.packet_loss();
    let avg = raw.rtt_avg();
    let status = fields.get_int(Metric::HttpStatusCode);

    // 서비스 가용: 손실 10% 초과, 지연 2000ms 초과, 5xx 중 하나라도 걸리면 불가용
    let mut failure_count = 0i64;
    if loss.is_some_and(|l| l > 10.0) {
        failure_count += 1;
    }
    if avg.is_some_and(|a| a > 2000.0) {
        failure_count += 1;
    }
    if status.is_some_and(|s| s >= 500) {
        failure_count += 1;
    }
    let available = failure_count == 0;
    fields.insert_int(Metric::ServiceAvailable, i64::from(available));
    fields.insert_int(Metric::FailureCount, failure_count);

    // 응답 성공: 업타임 계산용, 가용보다 엄격한 기준
    let response_success = !loss.is_some_and(|l| l > 1.0)
        && !avg.is_some_and(|a| a > 1000.0)
        && !status.is_some_and(|s| s >= 400);
    fields.insert_int(Metric::ResponseSuccess, i64::from(response_success));

    // 서비스 품질 점수: 손실/지연/QoS 위반으로 감쇠
    let mut quality = 100.0;
    if let Some(l) = loss {
        quality -= l * 2.0;
    }
    if let Some(a) = avg {
        if a > 100.0 {
            quality -= (a - 100.0) * 0.1;
        }
    }
    if let Some(v) = fields.get_int(Metric::QosViolations) {
        quality -= v as f64 * 10.0;
    }
    fields.insert_f64(Metric::ServiceQualityScore, quality.clamp(0.0, 100.0));

    // 성능 저하: 가용하지만 품질 기준 미달
    let degraded = available
        && (loss.is_some_and(|l| l > 1.0)
            || avg.is_some_and(|a| a > 500.0)
            || fields.get_int(Metric::QosViolations).is_some_and(|v| v > 0));
    fields.insert_int(Metric::ServiceDegraded, i64::from(degraded));

    // 회복 상태: 이력 없이 현재 지표가 충분히 좋으면 회복으로 본다
    // TODO: 직전 사이클 상태를 들고 있는 실제 회복 추적으로 교체
    let recovering = available
        && loss.is_some_and(|l| l < 0.5)
        && avg.is_some_and(|a| a < 100.0);
    fields.insert_int(Metric::InRecovery, i64::from(recovering));
}
