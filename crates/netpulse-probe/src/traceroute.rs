//! traceroute 프로브.
//!
//! 타임아웃(60초)이나 비정상 종료는 빈 경로로 강등된다 —
//! 이번 사이클에서 경로 필드만 빠질 뿐 수집 실패가 아니다.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tokio::process::Command;
use tracing::warn;

use netpulse_core::models::measurement::{RouteHop, RouteSample};
use netpulse_core::ports::HopProber;

/// 최대 탐색 홉 수
const MAX_HOPS: u32 = 30;
/// 전체 명령 타임아웃
const TRACE_TIMEOUT: Duration = Duration::from_secs(60);

static HOP_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)\s+(.+)$").unwrap());
static IP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+\.\d+\.\d+\.\d+)").unwrap());
static TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\d.]+) ms").unwrap());

/// 시스템 traceroute 기반 홉 프로브
#[derive(Default)]
pub struct TracerouteProber;

impl TracerouteProber {
    /// 새 프로브
    pub fn new() -> Self {
        Self
    }
}

/// traceroute 출력에서 홉 경로 추출
///
/// 첫 줄(헤더)은 건너뛴다. 홉 번호와 dotted-quad가 둘 다 보이는
/// 줄만 경로에 들어간다. `* * *` 줄은 무시된다.
pub fn parse_traceroute_output(output: &str) -> RouteSample {
    let mut hops = Vec::new();
    let mut hop_count = 0;

    for line in output.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let Some(captures) = HOP_LINE_RE.captures(line) else {
            continue;
        };
        let Ok(hop_num) = captures[1].parse::<u32>() else {
            continue;
        };
        let rest = &captures[2];
        let Some(ip) = IP_RE.captures(rest) else {
            continue;
        };

        let times: Vec<f64> = TIME_RE
            .captures_iter(rest)
            .filter_map(|c| c[1].parse().ok())
            .collect();
        let avg_time_ms = if times.is_empty() {
            0.0
        } else {
            times.iter().sum::<f64>() / times.len() as f64
        };

        hops.push(RouteHop {
            hop: hop_num,
            ip: ip[1].to_string(),
            avg_time_ms,
        });
        hop_count = hop_num;
    }

    RouteSample { hop_count, hops }
}

#[async_trait]
impl HopProber for TracerouteProber {
    async fn trace(&self, target: &str) -> RouteSample {
        let command = Command::new("traceroute")
            .arg("-m")
            .arg(MAX_HOPS.to_string())
            .arg(target)
            .output();

        match tokio::time::timeout(TRACE_TIMEOUT, command).await {
            Ok(Ok(output)) if output.status.success() => {
                parse_traceroute_output(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(Ok(output)) => {
                warn!(
                    target_host = target,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "traceroute 비정상 종료, 빈 경로로 강등"
                );
                RouteSample::empty()
            }
            Ok(Err(error)) => {
                warn!(target_host = target, %error, "traceroute 실행 실패, 빈 경로로 강등");
                RouteSample::empty()
            }
            Err(_) => {
                warn!(target_host = target, "traceroute 60초 타임아웃, 빈 경로로 강등");
                RouteSample::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_OUTPUT: &str = "\
traceroute to google.com (142.250.206.238), 30 hops max, 60 byte packets
 1  192.168.0.1 (192.168.0.1)  1.123 ms  0.987 ms  1.042 ms
 2  10.20.30.1 (10.20.30.1)  4.511 ms  4.320 ms  4.699 ms
 3  * * *
 4  203.0.113.45 (203.0.113.45)  12.801 ms  13.110 ms  12.950 ms
";

    #[test]
    fn parses_hops_and_averages_times() {
        let route = parse_traceroute_output(SAMPLE_OUTPUT);
        assert_eq!(route.hops.len(), 3);
        assert_eq!(route.hop_count, 4);

        let first = &route.hops[0];
        assert_eq!(first.hop, 1);
        assert_eq!(first.ip, "192.168.0.1");
        assert!((first.avg_time_ms - (1.123 + 0.987 + 1.042) / 3.0).abs() < 1e-9);

        // `* * *` 홉은 경로에서 빠지지만 번호는 이어진다
        let last = &route.hops[2];
        assert_eq!(last.hop, 4);
        assert_eq!(last.ip, "203.0.113.45");
    }

    #[test]
    fn header_only_output_is_empty_route() {
        let route =
            parse_traceroute_output("traceroute to x.example (192.0.2.1), 30 hops max\n");
        assert_eq!(route, RouteSample::empty());
    }

    #[test]
    fn hostname_line_uses_first_dotted_quad() {
        let output = "\
traceroute to example.com (93.184.216.34), 30 hops max
 1  gateway.local (172.16.0.1)  0.501 ms  0.433 ms  0.487 ms
";
        let route = parse_traceroute_output(output);
        assert_eq!(route.hops[0].ip, "172.16.0.1");
    }
}
