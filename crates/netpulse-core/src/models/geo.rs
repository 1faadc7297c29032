//! 지리 위치 모델과 대원 거리(haversine) 계산.

use serde::{Deserialize, Serialize};

/// 지구 반지름 (km)
const EARTH_RADIUS_KM: f64 = 6371.0;

/// IP 하나에 대한 지리 위치 정보
///
/// 좌표는 필수, 문자열 속성은 조회 응답에 없을 수 있다 — 빈 문자열
/// 대체 없이 `None`으로 남긴다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// 위도
    pub latitude: f64,
    /// 경도
    pub longitude: f64,
    /// 국가
    pub country: Option<String>,
    /// 지역 (주/도)
    pub region: Option<String>,
    /// 도시
    pub city: Option<String>,
    /// 시간대
    pub timezone: Option<String>,
    /// 인터넷 서비스 제공자
    pub isp: Option<String>,
}

/// 측정의 한쪽 끝점 (대상 또는 소스)
///
/// IP는 확인됐지만 위치 조회가 실패할 수 있다 — 그 경우 `location`만 부재.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoEndpoint {
    /// 확인된 IP 주소 (dotted-quad)
    pub ip: String,
    /// 위치 정보 (조회 실패 시 None)
    pub location: Option<GeoLocation>,
}

/// 대상/소스 양쪽의 지리 정보 묶음
///
/// `distance_km`는 양쪽 모두 좌표가 있을 때만 존재한다.
/// 0은 유효한 거리이므로 "알 수 없음"과 혼동하지 않는다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoReport {
    /// 수집 대상 쪽 끝점
    pub target: Option<GeoEndpoint>,
    /// 수집자(공인 IP) 쪽 끝점
    pub source: Option<GeoEndpoint>,
    /// 두 지점 간 대원 거리 (km)
    pub distance_km: Option<f64>,
}

impl GeoReport {
    /// 양쪽 좌표가 모두 있으면 거리를 계산해 채운다
    pub fn with_distance(mut self) -> Self {
        self.distance_km = match (&self.target, &self.source) {
            (
                Some(GeoEndpoint {
                    location: Some(t), ..
                }),
                Some(GeoEndpoint {
                    location: Some(s), ..
                }),
            ) => Some(haversine_km(
                s.latitude,
                s.longitude,
                t.latitude,
                t.longitude,
            )),
            _ => None,
        };
        self
    }

    /// 아무 정보도 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.target.is_none() && self.source.is_none()
    }
}

/// 두 위경도 지점 간 대원 거리 (km)
///
/// haversine 공식: `a = sin²(Δlat/2) + cos(lat1)·cos(lat2)·sin²(Δlon/2)`,
/// `d = 2·asin(√a)·R`
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1) = (lat1.to_radians(), lon1.to_radians());
    let (lat2, lon2) = (lat2.to_radians(), lon2.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * a.sqrt().asin() * EARTH_RADIUS_KM
}
