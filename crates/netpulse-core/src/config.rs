//! 애플리케이션 설정 구조체.
//!
//! 모든 설정은 환경 변수에서 로드한다 (`config` crate의 `Environment` 소스).
//! 유효성 검증 실패는 수집 시작 전에 치명적 에러로 전파된다.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::TelemetryError;

/// 최상위 애플리케이션 설정
///
/// 환경 변수 이름은 필드명의 대문자 형태 (`TARGET_FQDN`, `MONITORING_INTERVAL`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 단일 수집 대상 호스트명
    #[serde(default = "default_target_fqdn")]
    pub target_fqdn: String,
    /// 다중 수집 대상 (쉼표 구분, 설정 시 `target_fqdn`보다 우선)
    #[serde(default)]
    pub target_fqdns: Option<String>,
    /// 수집 주기 (초, 최소 10)
    #[serde(default = "default_monitoring_interval")]
    pub monitoring_interval: u64,
    /// ping 패킷 수 (최소 1)
    #[serde(default = "default_ping_count")]
    pub ping_count: u32,
    /// ping 타임아웃 (초, 최소 1)
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,

    /// InfluxDB 서버 URL
    #[serde(default = "default_influxdb_url")]
    pub influxdb_url: String,
    /// InfluxDB API 토큰 (없으면 무인증)
    #[serde(default)]
    pub influxdb_token: Option<String>,
    /// InfluxDB 조직
    #[serde(default = "default_influxdb_org")]
    pub influxdb_org: String,
    /// InfluxDB 버킷
    #[serde(default = "default_influxdb_bucket")]
    pub influxdb_bucket: String,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_fqdn: default_target_fqdn(),
            target_fqdns: None,
            monitoring_interval: default_monitoring_interval(),
            ping_count: default_ping_count(),
            ping_timeout: default_ping_timeout(),
            influxdb_url: default_influxdb_url(),
            influxdb_token: None,
            influxdb_org: default_influxdb_org(),
            influxdb_bucket: default_influxdb_bucket(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 환경 변수에서 설정 로드 및 검증
    pub fn from_env() -> Result<Self, TelemetryError> {
        let loaded = config::Config::builder()
            // 숫자 필드(MONITORING_INTERVAL 등)는 문자열에서 파싱
            .add_source(config::Environment::default().try_parsing(true))
            .build()
            .map_err(|e| TelemetryError::Config(format!("환경 변수 로드 실패: {e}")))?;

        let app: AppConfig = loaded
            .try_deserialize()
            .map_err(|e| TelemetryError::Config(format!("설정 역직렬화 실패: {e}")))?;

        app.validate()?;
        Ok(app)
    }

    /// 설정값 유효성 검증
    pub fn validate(&self) -> Result<(), TelemetryError> {
        if self.target_fqdn.is_empty() {
            return Err(TelemetryError::Config(
                "TARGET_FQDN은 비어 있을 수 없음".to_string(),
            ));
        }
        if self.monitoring_interval < 10 {
            return Err(TelemetryError::Config(
                "MONITORING_INTERVAL은 최소 10초".to_string(),
            ));
        }
        if self.ping_count < 1 {
            return Err(TelemetryError::Config("PING_COUNT는 최소 1".to_string()));
        }
        if self.ping_timeout < 1 {
            return Err(TelemetryError::Config("PING_TIMEOUT은 최소 1초".to_string()));
        }
        if self.influxdb_url.is_empty() {
            return Err(TelemetryError::Config(
                "INFLUXDB_URL은 비어 있을 수 없음".to_string(),
            ));
        }
        if self.influxdb_org.is_empty() {
            return Err(TelemetryError::Config(
                "INFLUXDB_ORG는 비어 있을 수 없음".to_string(),
            ));
        }
        if self.influxdb_bucket.is_empty() {
            return Err(TelemetryError::Config(
                "INFLUXDB_BUCKET은 비어 있을 수 없음".to_string(),
            ));
        }
        Ok(())
    }

    /// 수집 대상 목록
    ///
    /// `TARGET_FQDNS`(쉼표 구분)가 설정되어 있으면 그것을, 아니면 단일 대상을 반환한다.
    pub fn targets(&self) -> Vec<String> {
        match &self.target_fqdns {
            Some(list) if !list.trim().is_empty() => list
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            _ => vec![self.target_fqdn.clone()],
        }
    }

    /// 수집 주기
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.monitoring_interval)
    }
}

fn default_target_fqdn() -> String {
    "google.com".to_string()
}

fn default_monitoring_interval() -> u64 {
    60
}

fn default_ping_count() -> u32 {
    5
}

fn default_ping_timeout() -> u64 {
    10
}

fn default_influxdb_url() -> String {
    "http://localhost:8086".to_string()
}

fn default_influxdb_org() -> String {
    "nflx".to_string()
}

fn default_influxdb_bucket() -> String {
    "default".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
