//! 도메인 데이터 구조체.
//!
//! - [`measurement`] — 수집 사이클당 원시 측정값 ([`measurement::RawMeasurement`])
//! - [`geo`] — 지리 위치와 대원 거리 계산
//! - [`point`] — 저장 단위 ([`point::DataPoint`])와 고정 필드 스키마 ([`point::Metric`])

pub mod geo;
pub mod measurement;
pub mod point;
