//! # netpulse-geo
//!
//! 지리 위치 어댑터: DNS 해석, 공인 IP 확인, IP → 위치 조회.
//! [`netpulse_core::ports::GeoResolver`] 포트를 구현한다.

pub mod lookup;
pub mod public_ip;
pub mod resolver;

pub use lookup::GeoLookup;
pub use public_ip::PublicIpResolver;
pub use resolver::GeoCollector;
