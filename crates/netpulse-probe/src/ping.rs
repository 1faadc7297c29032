//! ping 프로브.
//!
//! 시스템 `ping` 명령을 실행하고 통계 블록을 파싱한다. 명령 실패는
//! 에러, 파싱이 아무것도 못 찾으면 빈 통계 (로그만 남기고 에러 아님).

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;
use tracing::{error, warn};

use netpulse_core::error::TelemetryError;
use netpulse_core::models::measurement::{PingStats, Rtt};
use netpulse_core::ports::LatencyProber;

static LOSS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\d.]+)% packet loss").unwrap());
static TRANSMITTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+) packets transmitted").unwrap());
static RECEIVED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+) received").unwrap());
static RTT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"rtt min/avg/max/mdev = ([\d.]+)/([\d.]+)/([\d.]+)/([\d.]+) ms").unwrap()
});

/// 시스템 ping 기반 지연 프로브
pub struct PingProber {
    count: u32,
    timeout_secs: u64,
}

impl PingProber {
    /// 패킷 수와 타임아웃(초)으로 구성
    pub fn new(count: u32, timeout_secs: u64) -> Self {
        Self {
            count,
            timeout_secs,
        }
    }

    async fn run_ping(&self, target: &str, count: u32) -> Result<String, TelemetryError> {
        let output = Command::new("ping")
            .arg("-c")
            .arg(count.to_string())
            .arg("-W")
            // -W는 ms 단위를 받는 배포판 기준
            .arg((self.timeout_secs * 1000).to_string())
            .arg(target)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(target_host = target, %stderr, "ping 명령 실패");
            return Err(TelemetryError::Measurement(format!(
                "ping {target} 실패: {}",
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// ping 출력 텍스트에서 통계 추출
pub fn parse_ping_output(output: &str) -> PingStats {
    let mut stats = PingStats::default();

    if let Some(captures) = LOSS_RE.captures(output) {
        stats.packet_loss = captures[1].parse().ok();
    }
    if let Some(captures) = TRANSMITTED_RE.captures(output) {
        stats.packets_transmitted = captures[1].parse().ok();
    }
    if let Some(captures) = RECEIVED_RE.captures(output) {
        stats.packets_received = captures[1].parse().ok();
    }
    if let Some(captures) = RTT_RE.captures(output) {
        let parsed: Option<Rtt> = (|| {
            Some(Rtt {
                min: captures[1].parse().ok()?,
                avg: captures[2].parse().ok()?,
                max: captures[3].parse().ok()?,
                mdev: captures[4].parse().ok()?,
            })
        })();
        stats.rtt = parsed;
    }

    if stats.is_empty() {
        warn!("ping 출력에서 통계를 찾지 못함");
    }
    stats
}

#[async_trait]
impl LatencyProber for PingProber {
    async fn measure(&self, target: &str) -> Result<PingStats, TelemetryError> {
        let output = self.run_ping(target, self.count).await?;
        Ok(parse_ping_output(&output))
    }

    async fn check_reachable(&self, target: &str) -> bool {
        self.run_ping(target, 1).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINUX_OUTPUT: &str = "\
PING google.com (142.250.206.238) 56(84) bytes of data.
64 bytes from nrt12s46-in-f14.1e100.net (142.250.206.238): icmp_seq=1 ttl=115 time=23.1 ms
64 bytes from nrt12s46-in-f14.1e100.net (142.250.206.238): icmp_seq=2 ttl=115 time=23.7 ms

--- google.com ping statistics ---
5 packets transmitted, 5 received, 0% packet loss, time 4005ms
rtt min/avg/max/mdev = 22.812/23.403/24.112/0.489 ms
";

    #[test]
    fn parses_full_statistics_block() {
        let stats = parse_ping_output(LINUX_OUTPUT);
        assert_eq!(stats.packet_loss, Some(0.0));
        assert_eq!(stats.packets_transmitted, Some(5));
        assert_eq!(stats.packets_received, Some(5));
        let rtt = stats.rtt.unwrap();
        assert_eq!(rtt.min, 22.812);
        assert_eq!(rtt.avg, 23.403);
        assert_eq!(rtt.max, 24.112);
        assert_eq!(rtt.mdev, 0.489);
    }

    #[test]
    fn parses_lossy_run_without_rtt_line() {
        // 전 패킷 손실이면 rtt 라인이 없다
        let output = "\
--- unreachable.example ping statistics ---
5 packets transmitted, 0 received, 100% packet loss, time 4100ms
";
        let stats = parse_ping_output(output);
        assert_eq!(stats.packet_loss, Some(100.0));
        assert_eq!(stats.packets_received, Some(0));
        assert!(stats.rtt.is_none());
        assert!(!stats.is_empty());
    }

    #[test]
    fn parses_fractional_loss() {
        let output = "100 packets transmitted, 99 received, 1.5% packet loss, time 9000ms";
        let stats = parse_ping_output(output);
        assert_eq!(stats.packet_loss, Some(1.5));
    }

    #[test]
    fn garbage_yields_empty_stats() {
        let stats = parse_ping_output("ping: cannot resolve nosuchhost: Unknown host");
        assert!(stats.is_empty());
    }
}
