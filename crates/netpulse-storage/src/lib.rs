//! # netpulse-storage
//!
//! 시계열 저장소 어댑터: InfluxDB 라인 프로토콜 인코딩과 v2 HTTP
//! 클라이언트. [`netpulse_core::ports::MetricsStore`] 포트를 구현한다.

pub mod influx;
pub mod line_protocol;

pub use influx::{InfluxConfig, InfluxStore};
