//! 처리량/대역폭 파생 단계.
//!
//! 64바이트 ping 패킷 기준의 합성 처리량이다. 실측 SNMP/장비 카운터가
//! 아니라 지연·손실에서 유도한 추정치.

use crate::models::measurement::RawMeasurement;
use crate::models::point::{FieldSet, Metric};

/// 표준 ping 패킷 크기 (bytes)
const PACKET_SIZE_BYTES: f64 = 64.0;

/// 처리량 지표를 계산해 `fields`에 추가한다
pub fn derive(fields: &mut FieldSet, raw: &RawMeasurement) {
    let transmitted = raw
        .ping
        .as_ref()
        .and_then(|p| p.packets_transmitted)
        .unwrap_or(4) as f64;

    if let (Some(avg), Some(loss)) = (raw.rtt_avg(), raw.packet_loss()) {
        let successful_packets = transmitted * (1.0 - loss / 100.0);

        if avg > 0.0 {
            let transfer_time_sec = (avg / 1000.0 * transmitted).max(0.001);
            let bytes_transferred = successful_packets * PACKET_SIZE_BYTES;

            let bytes_per_second = bytes_transferred / transfer_time_sec;
            let bits_per_second = bytes_per_second * 8.0;
            fields.insert_f64(Metric::BytesPerSecond, bytes_per_second);
            fields.insert_f64(Metric::BitsPerSecond, bits_per_second);
            fields.insert_f64(
                Metric::PacketsPerSecond,
                successful_packets / transfer_time_sec,
            );
            fields.insert_f64(Metric::ThroughputKbps, bits_per_second / 1_000.0);
            fields.insert_f64(Metric::ThroughputMbps, bits_per_second / 1_000_000.0);
            fields.insert_f64(Metric::ThroughputGbps, bits_per_second / 1_000_000_000.0);
        }
    }

    // 링크 사용률 추정: 지연 기반 (상한 80) + 손실 혼잡 가산 (상한 20)
    if let Some(avg) = raw.rtt_avg() {
        let mut utilization = (avg / 10.0).min(80.0);
        if let Some(loss) = raw.packet_loss() {
            utilization += (loss * 5.0).min(20.0);
        }
        fields.insert_f64(
            Metric::BandwidthUtilizationPct,
            utilization.clamp(0.0, 100.0),
        );
    }

    // 인터페이스 용량별 환산 (1Gb/10Gb/100Mb)
    if let Some(utilization) = fields.get_f64(Metric::BandwidthUtilizationPct) {
        fields.insert_f64(Metric::Interface1gbUtilPct, utilization.min(100.0));
        fields.insert_f64(Metric::Interface1gbUsedMbps, utilization / 100.0 * 1000.0);

        let ten_gig_util = (utilization * 0.1).min(100.0);
        fields.insert_f64(Metric::Interface10gbUtilPct, ten_gig_util);
        fields.insert_f64(Metric::Interface10gbUsedMbps, ten_gig_util / 100.0 * 10_000.0);

        let hundred_mb_util = (utilization * 1.5).min(100.0);
        fields.insert_f64(Metric::Interface100mbUtilPct, hundred_mb_util);
        fields.insert_f64(
            Metric::Interface100mbUsedMbps,
            hundred_mb_util / 100.0 * 100.0,
        );
    }

    // 효율: 100Mbps 기준 대비 실효 처리량, goodput은 프로토콜 오버헤드 15% 제외
    if let Some(throughput_mbps) = fields.get_f64(Metric::ThroughputMbps) {
        if fields.contains(Metric::BandwidthUtilizationPct) {
            fields.insert_f64(
                Metric::NetworkEfficiencyPct,
                (throughput_mbps / 100.0 * 100.0).min(100.0),
            );
            fields.insert_f64(Metric::GoodputMbps, throughput_mbps * 0.85);
        }
    }

    // 트래픽 강도와 큐/버퍼 추정
    if let Some(pps) = fields.get_f64(Metric::PacketsPerSecond) {
        let intensity = if pps > 1000.0 {
            3
        } else if pps > 100.0 {
            2
        } else {
            1
        };
        fields.insert_int(Metric::TrafficIntensity, intensity);
        fields.insert_int(Metric::TxQueueDepth, ((pps / 10.0) as i64).min(100));
        fields.insert_f64(Metric::RxBufferUsagePct, (pps / 1000.0 * 100.0).min(100.0));
    }

    // 대역폭-지연 곱과 RTT 효율
    if let (Some(avg), Some(throughput_mbps)) =
        (raw.rtt_avg(), fields.get_f64(Metric::ThroughputMbps))
    {
        fields.insert_f64(
            Metric::BandwidthDelayProductMb,
            throughput_mbps * avg / 8000.0,
        );
        if avg > 0.0 {
            fields.insert_f64(Metric::RttEfficiencyScore, (100.0 / avg * 10.0).min(100.0));
        }
    }
}
