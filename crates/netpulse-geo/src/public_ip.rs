//! 공인 IP 확인.
//!
//! "내 IP" 엔드포인트 여러 개를 순서대로 시도해 첫 유효 dotted-quad
//! 응답을 쓴다. 전부 실패하면 `None` — 소스 쪽 지리 정보만 빠진다.

use std::net::Ipv4Addr;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// 기본 조회 엔드포인트 (순서대로 시도)
pub const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://api.ipify.org",
    "https://ifconfig.me/ip",
    "https://ipinfo.io/ip",
];

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// 공인 IP 확인기
pub struct PublicIpResolver {
    client: reqwest::Client,
    endpoints: Vec<String>,
}

impl PublicIpResolver {
    /// 기본 엔드포인트 목록으로 생성
    pub fn new() -> Self {
        Self::with_endpoints(DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect())
    }

    /// 엔드포인트를 지정해 생성 (테스트용)
    pub fn with_endpoints(endpoints: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .unwrap_or_default(),
            endpoints,
        }
    }

    /// 첫 유효 응답의 IP — 전부 실패하면 `None`
    pub async fn fetch(&self) -> Option<String> {
        for endpoint in &self.endpoints {
            match self.client.get(endpoint).send().await {
                Ok(response) if response.status().is_success() => {
                    let Ok(body) = response.text().await else {
                        continue;
                    };
                    let candidate = body.trim();
                    if Ipv4Addr::from_str(candidate).is_ok() {
                        debug!(endpoint, ip = candidate, "공인 IP 확인");
                        return Some(candidate.to_string());
                    }
                    warn!(endpoint, body = candidate, "유효하지 않은 IP 응답, 다음 엔드포인트");
                }
                Ok(response) => {
                    warn!(endpoint, status = %response.status(), "공인 IP 조회 거부");
                }
                Err(error) => {
                    warn!(endpoint, %error, "공인 IP 조회 실패, 다음 엔드포인트");
                }
            }
        }
        None
    }
}

impl Default for PublicIpResolver {
    fn default() -> Self {
        Self::new()
    }
}
