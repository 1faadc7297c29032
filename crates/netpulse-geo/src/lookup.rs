//! IP → 지리 위치 조회.
//!
//! ip-api.com 무료 엔드포인트를 쓴다. 어떤 실패(서비스 다운, 레이트
//! 리밋, 사설 IP)도 호출자에게 에러로 올라가지 않는다 — `None`이다.

use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

use netpulse_core::models::geo::GeoLocation;

/// 기본 조회 엔드포인트
pub const DEFAULT_BASE_URL: &str = "http://ip-api.com";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    country: Option<String>,
    #[serde(rename = "regionName", default)]
    region_name: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    isp: Option<String>,
}

/// 지리 위치 조회 클라이언트
pub struct GeoLookup {
    client: reqwest::Client,
    base_url: String,
}

impl GeoLookup {
    /// 기본 엔드포인트로 생성
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// 엔드포인트를 지정해 생성 (테스트용)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(LOOKUP_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    /// IP의 위치 정보 — 실패는 항상 `None`
    pub async fn locate(&self, ip: &str) -> Option<GeoLocation> {
        let url = format!(
            "{}/json/{ip}?fields=status,country,regionName,city,lat,lon,timezone,isp,query",
            self.base_url
        );
        let response = match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(ip, status = %response.status(), "지리 위치 조회 거부");
                return None;
            }
            Err(error) => {
                warn!(ip, %error, "지리 위치 조회 실패");
                return None;
            }
        };

        let body: IpApiResponse = match response.json().await {
            Ok(body) => body,
            Err(error) => {
                warn!(ip, %error, "지리 위치 응답 파싱 실패");
                return None;
            }
        };
        if body.status != "success" {
            warn!(ip, status = %body.status, "지리 위치 조회 실패 응답");
            return None;
        }

        Some(GeoLocation {
            latitude: body.lat?,
            longitude: body.lon?,
            country: body.country,
            region: body.region_name,
            city: body.city,
            timezone: body.timezone,
            isp: body.isp,
        })
    }
}

impl Default for GeoLookup {
    fn default() -> Self {
        Self::new()
    }
}
