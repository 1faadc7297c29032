//! QoS 파생 단계 — 지터, 큐 깊이, 트래픽 클래스별 품질 점수, 혼잡 지표.

use crate::models::measurement::RawMeasurement;
use crate::models::point::{FieldSet, Metric};

/// QoS 필드를 계산해 `fields`에 추가한다
///
/// 입력이 빠진 계산은 해당 필드만 건너뛴다 (0 대체 없음).
pub fn derive(fields: &mut FieldSet, raw: &RawMeasurement) {
    let rtt = raw.ping.as_ref().and_then(|p| p.rtt);
    let loss = raw.packet_loss();

    // 지터는 ping의 mdev를 그대로 쓴다
    if let Some(rtt) = rtt {
        fields.insert_f64(Metric::JitterMs, rtt.mdev);
    }
    let jitter = fields.get_f64(Metric::JitterMs);

    // 큐 깊이: 기준 지연 10ms 초과분 5ms당 1, 버퍼 용량 50패킷 가정
    if let Some(avg) = raw.rtt_avg() {
        let queue_depth = (((avg - 10.0) / 5.0) as i64).max(0);
        fields.insert_int(Metric::QueueDepth, queue_depth);
        fields.insert_f64(
            Metric::BufferUtilizationPct,
            (queue_depth as f64 / 50.0 * 100.0).min(100.0),
        );
    }

    if let (Some(avg), Some(loss)) = (raw.rtt_avg(), loss) {
        // 음성: 지연 150ms, 손실 1% 초과에 민감
        let mut voice = 100.0;
        if avg > 150.0 {
            voice -= (avg - 150.0) * 0.5;
        }
        if loss > 1.0 {
            voice -= loss * 10.0;
        }
        fields.insert_f64(Metric::VoiceQualityScore, voice.clamp(0.0, 100.0));

        // 영상: 지연 200ms, 손실 0.5%, 지터 30ms 초과에 민감
        let mut video = 100.0;
        if avg > 200.0 {
            video -= (avg - 200.0) * 0.3;
        }
        if loss > 0.5 {
            video -= loss * 8.0;
        }
        if let Some(j) = jitter {
            if j > 30.0 {
                video -= (j - 30.0) * 0.5;
            }
        }
        fields.insert_f64(Metric::VideoQualityScore, video.clamp(0.0, 100.0));

        // 데이터: 재전송이 흡수하므로 가장 관대
        let mut data = 100.0;
        if avg > 500.0 {
            data -= (avg - 500.0) * 0.1;
        }
        if loss > 3.0 {
            data -= (loss - 3.0) * 5.0;
        }
        fields.insert_f64(Metric::DataQualityScore, data.clamp(0.0, 100.0));

        // 혼잡 드롭: 손실률과 지연 초과분의 합성, 실제 손실률을 상한으로
        let congestion_factor = loss / 100.0 + (avg - 50.0).max(0.0) / 1000.0;
        fields.insert_f64(
            Metric::CongestionDropsPct,
            (congestion_factor * 100.0).min(loss),
        );

        // 전체 혼잡 수준: 지연과 손실 둘 다 유의미할 때만 비영
        let congestion_level = if avg > 100.0 && loss > 1.0 {
            (avg / 10.0 + loss * 5.0).min(100.0)
        } else {
            0.0
        };
        fields.insert_f64(Metric::CongestionLevelPct, congestion_level);

        // 클래스별 임계 미달 카운트
        let mut violations = 0;
        if fields.get_f64(Metric::VoiceQualityScore).is_some_and(|v| v < 80.0) {
            violations += 1;
        }
        if fields.get_f64(Metric::VideoQualityScore).is_some_and(|v| v < 70.0) {
            violations += 1;
        }
        if fields.get_f64(Metric::DataQualityScore).is_some_and(|v| v < 60.0) {
            violations += 1;
        }
        fields.insert_int(Metric::QosViolations, violations);
    }
}
