//! # netpulse-probe
//!
//! OS 네트워크 프로브(ping/traceroute) 어댑터.
//! [`netpulse_core::ports::LatencyProber`]와
//! [`netpulse_core::ports::HopProber`] 포트를 구현한다.

pub mod ping;
pub mod traceroute;

pub use ping::PingProber;
pub use traceroute::TracerouteProber;
