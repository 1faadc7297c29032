//! # netpulse-core
//!
//! NETPULSE 도메인 모델, 포트(trait) 정의, 파생 엔진, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`] — 도메인 데이터 구조체 (serde Serialize/Deserialize)
//! - [`ports`] — Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`derive`] — 원시 측정 → 파생 메트릭 변환 엔진
//! - [`error`] — 핵심 에러 타입 (thiserror)
//! - [`config`] — 환경 변수 기반 애플리케이션 설정

pub mod config;
pub mod derive;
pub mod error;
pub mod models;
pub mod ports;
