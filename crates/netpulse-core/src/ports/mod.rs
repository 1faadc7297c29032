//! 어댑터 경계 포트 (trait).
//!
//! 코어는 구현을 모른다 — 프로브/지리/저장소 어댑터 crate가 각 trait을
//! 구현하고, 앱 조립 시점에 주입된다. 테스트는 mock 구현을 주입한다.

pub mod geo;
pub mod probe;
pub mod store;

pub use geo::GeoResolver;
pub use probe::{HopProber, LatencyProber};
pub use store::MetricsStore;
