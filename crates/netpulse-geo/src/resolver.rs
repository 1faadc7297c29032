//! 지리 위치 수집기 — [`GeoResolver`] 포트 구현.
//!
//! 대상 DNS 해석 실패만 에러다. 공인 IP나 위치 조회의 실패는
//! 해당 부분이 빠진 보고서로 강등된다.

use async_trait::async_trait;
use tokio::net::lookup_host;
use tracing::warn;

use netpulse_core::error::TelemetryError;
use netpulse_core::models::geo::{GeoEndpoint, GeoReport};
use netpulse_core::ports::GeoResolver;

use crate::lookup::GeoLookup;
use crate::public_ip::PublicIpResolver;

/// DNS + 공인 IP + 위치 조회를 묶은 수집기
pub struct GeoCollector {
    lookup: GeoLookup,
    public_ip: PublicIpResolver,
}

impl GeoCollector {
    /// 프로덕션 엔드포인트로 생성
    pub fn new() -> Self {
        Self {
            lookup: GeoLookup::new(),
            public_ip: PublicIpResolver::new(),
        }
    }

    /// 구성 요소를 직접 주입 (테스트용)
    pub fn with_parts(lookup: GeoLookup, public_ip: PublicIpResolver) -> Self {
        Self { lookup, public_ip }
    }

    /// 호스트명 → 첫 IPv4 주소
    async fn resolve_target(&self, target: &str) -> Result<String, TelemetryError> {
        // lookup_host는 포트가 필요하다
        let addrs = lookup_host((target, 0))
            .await
            .map_err(|e| TelemetryError::Measurement(format!("DNS 해석 실패 {target}: {e}")))?;
        addrs
            .filter(|addr| addr.is_ipv4())
            .map(|addr| addr.ip().to_string())
            .next()
            .ok_or_else(|| {
                TelemetryError::Measurement(format!("{target}: IPv4 주소 없음"))
            })
    }
}

impl Default for GeoCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeoResolver for GeoCollector {
    async fn collect(&self, target: &str) -> Result<GeoReport, TelemetryError> {
        let target_ip = self.resolve_target(target).await?;
        let target_location = self.lookup.locate(&target_ip).await;

        let source = match self.public_ip.fetch().await {
            Some(source_ip) => {
                let location = self.lookup.locate(&source_ip).await;
                Some(GeoEndpoint {
                    ip: source_ip,
                    location,
                })
            }
            None => {
                warn!("공인 IP 확인 실패, 소스 지리 정보 생략");
                None
            }
        };

        Ok(GeoReport {
            target: Some(GeoEndpoint {
                ip: target_ip,
                location: target_location,
            }),
            source,
            distance_km: None,
        }
        .with_distance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo_body(lat: f64, lon: f64, city: &str) -> String {
        format!(
            r#"{{"status":"success","country":"Test","regionName":"Region",
                "city":"{city}","lat":{lat},"lon":{lon},"timezone":"UTC","isp":"TestNet"}}"#
        )
    }

    #[tokio::test]
    async fn collects_both_sides_and_distance() {
        let mut server = mockito::Server::new_async().await;
        // localhost 해석 결과는 127.0.0.1
        server
            .mock(
                "GET",
                mockito::Matcher::Regex(r"^/json/127\.0\.0\.1".to_string()),
            )
            .with_status(200)
            .with_body(geo_body(37.5665, 126.978, "Seoul"))
            .create_async()
            .await;
        server
            .mock(
                "GET",
                mockito::Matcher::Regex(r"^/json/203\.0\.113\.9".to_string()),
            )
            .with_status(200)
            .with_body(geo_body(35.6762, 139.6503, "Tokyo"))
            .create_async()
            .await;
        server
            .mock("GET", "/myip")
            .with_status(200)
            .with_body("203.0.113.9")
            .create_async()
            .await;

        let collector = GeoCollector::with_parts(
            GeoLookup::with_base_url(server.url()),
            PublicIpResolver::with_endpoints(vec![format!("{}/myip", server.url())]),
        );
        let report = collector.collect("localhost").await.unwrap();
        assert_eq!(report.target.as_ref().unwrap().ip, "127.0.0.1");
        assert_eq!(report.source.as_ref().unwrap().ip, "203.0.113.9");
        let distance = report.distance_km.unwrap();
        assert!(distance > 1100.0 && distance < 1220.0);
    }

    #[tokio::test]
    async fn public_ip_failure_degrades_to_target_only() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "GET",
                mockito::Matcher::Regex(r"^/json/127\.0\.0\.1".to_string()),
            )
            .with_status(200)
            .with_body(geo_body(37.5665, 126.978, "Seoul"))
            .create_async()
            .await;
        server
            .mock("GET", "/myip")
            .with_status(500)
            .create_async()
            .await;

        let collector = GeoCollector::with_parts(
            GeoLookup::with_base_url(server.url()),
            PublicIpResolver::with_endpoints(vec![format!("{}/myip", server.url())]),
        );
        let report = collector.collect("localhost").await.unwrap();
        assert!(report.target.is_some());
        assert!(report.source.is_none());
        assert!(report.distance_km.is_none());
    }

    #[tokio::test]
    async fn dns_failure_is_an_error() {
        let collector = GeoCollector::with_parts(
            GeoLookup::with_base_url("http://127.0.0.1:1"),
            PublicIpResolver::with_endpoints(vec![]),
        );
        let result = collector
            .collect("definitely-not-a-real-host.invalid")
            .await;
        assert!(result.is_err());
    }
}
