//! InfluxDB v2 HTTP 클라이언트 — [`MetricsStore`] 포트 구현.
//!
//! 쓰기는 라인 프로토콜 POST (`precision=ns`), 질의는 Flux POST이며
//! annotated CSV 응답을 평탄한 행 맵으로 돌려준다.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error};

use netpulse_core::error::TelemetryError;
use netpulse_core::models::point::DataPoint;
use netpulse_core::ports::MetricsStore;

use crate::line_protocol;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// InfluxDB 접속 설정
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    /// 서버 URL
    pub url: String,
    /// API 토큰 (없으면 무인증)
    pub token: Option<String>,
    /// 조직
    pub org: String,
    /// 버킷
    pub bucket: String,
}

/// InfluxDB v2 저장소 클라이언트
pub struct InfluxStore {
    client: reqwest::Client,
    config: InfluxConfig,
}

impl InfluxStore {
    /// 설정으로 클라이언트 생성
    pub fn new(config: InfluxConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .unwrap_or_default(),
            config,
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.header("Authorization", format!("Token {token}")),
            None => request,
        }
    }

    /// 최근 `hours`시간의 포인트 조회 (최신순 100건)
    pub async fn recent(&self, hours: u32) -> Result<Vec<HashMap<String, String>>, TelemetryError> {
        let flux = format!(
            r#"from(bucket: "{}")
  |> range(start: -{hours}h)
  |> filter(fn: (r) => r._measurement == "network_telemetry")
  |> sort(columns: ["_time"], desc: true)
  |> limit(n: 100)"#,
            self.config.bucket
        );
        self.query(&flux).await
    }
}

/// annotated CSV 응답을 행 맵 목록으로 변환
///
/// `#`로 시작하는 어노테이션 줄은 건너뛰고, 각 테이블의 첫 줄을
/// 헤더로 쓴다. 빈 결과는 유효한 빈 목록이다.
fn parse_annotated_csv(body: &str) -> Vec<HashMap<String, String>> {
    let mut rows = Vec::new();
    let mut header: Option<Vec<String>> = None;

    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if line.starts_with('#') {
            continue;
        }
        if line.trim().is_empty() {
            // 빈 줄은 테이블 경계 — 다음 테이블은 새 헤더
            header = None;
            continue;
        }
        let cells: Vec<&str> = line.split(',').collect();
        match &header {
            None => header = Some(cells.iter().map(|c| c.to_string()).collect()),
            Some(columns) => {
                let row = columns
                    .iter()
                    .zip(cells.iter())
                    .filter(|(column, _)| !column.is_empty())
                    .map(|(column, cell)| (column.clone(), cell.to_string()))
                    .collect();
                rows.push(row);
            }
        }
    }
    rows
}

#[async_trait]
impl MetricsStore for InfluxStore {
    async fn ping(&self) -> Result<(), TelemetryError> {
        let url = format!("{}/ping", self.config.url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TelemetryError::Network(format!("InfluxDB ping 실패: {e}")))?;
        if response.status().as_u16() == 204 || response.status().is_success() {
            Ok(())
        } else {
            Err(TelemetryError::Storage(format!(
                "InfluxDB ping 응답 {}",
                response.status()
            )))
        }
    }

    async fn write_point(&self, point: &DataPoint) -> Result<(), TelemetryError> {
        let line = line_protocol::encode(point)?;
        debug!(%line, "라인 프로토콜 기록");

        let url = format!(
            "{}/api/v2/write?org={}&bucket={}&precision=ns",
            self.config.url, self.config.org, self.config.bucket
        );
        let response = self
            .authorize(self.client.post(&url))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(line)
            .send()
            .await
            .map_err(|e| TelemetryError::Network(format!("InfluxDB 쓰기 요청 실패: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "InfluxDB 쓰기 거부");
            Err(TelemetryError::Storage(format!(
                "InfluxDB 쓰기 거부 {status}: {body}"
            )))
        }
    }

    async fn query(&self, query: &str) -> Result<Vec<HashMap<String, String>>, TelemetryError> {
        let url = format!("{}/api/v2/query?org={}", self.config.url, self.config.org);
        let response = self
            .authorize(self.client.post(&url))
            .header("Content-Type", "application/vnd.flux")
            .header("Accept", "application/csv")
            .body(query.to_string())
            .send()
            .await
            .map_err(|e| TelemetryError::Network(format!("InfluxDB 질의 요청 실패: {e}")))?;

        if !response.status().is_success() {
            return Err(TelemetryError::Storage(format!(
                "InfluxDB 질의 거부 {}",
                response.status()
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| TelemetryError::Network(format!("InfluxDB 질의 응답 수신 실패: {e}")))?;
        Ok(parse_annotated_csv(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use netpulse_core::models::point::Metric;

    fn store(url: String, token: Option<&str>) -> InfluxStore {
        InfluxStore::new(InfluxConfig {
            url,
            token: token.map(str::to_string),
            org: "nflx".to_string(),
            bucket: "default".to_string(),
        })
    }

    fn sample_point() -> DataPoint {
        let mut point = DataPoint::new("google.com", 1_700_000_000);
        point.fields.insert_f64(Metric::RttAvg, 23.4);
        point
    }

    #[tokio::test]
    async fn ping_accepts_204() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/ping")
            .with_status(204)
            .create_async()
            .await;
        store(server.url(), None).ping().await.unwrap();
    }

    #[tokio::test]
    async fn write_sends_token_and_line_protocol() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/write?org=nflx&bucket=default&precision=ns")
            .match_header("Authorization", "Token secret")
            .match_body(mockito::Matcher::Regex(
                r"^network_telemetry,target=google\.com rtt_avg=23\.4 1700000000000000000$"
                    .to_string(),
            ))
            .with_status(204)
            .create_async()
            .await;

        store(server.url(), Some("secret"))
            .write_point(&sample_point())
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn write_rejection_is_storage_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", mockito::Matcher::Regex(r"^/api/v2/write".to_string()))
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let result = store(server.url(), None).write_point(&sample_point()).await;
        assert_matches!(result, Err(TelemetryError::Storage(_)));
    }

    #[tokio::test]
    async fn empty_point_never_reaches_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", mockito::Matcher::Regex(r"^/api/v2/write".to_string()))
            .with_status(204)
            .expect(0)
            .create_async()
            .await;

        let empty = DataPoint::new("google.com", 1_700_000_000);
        let result = store(server.url(), None).write_point(&empty).await;
        assert_matches!(result, Err(TelemetryError::Storage(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn query_parses_annotated_csv() {
        let body = "\
#datatype,string,long,dateTime:RFC3339,double,string\n\
#group,false,false,false,false,true\n\
#default,_result,,,,\n\
,result,table,_time,_value,_field\n\
,_result,0,2026-08-27T00:00:00Z,23.4,rtt_avg\n\
,_result,0,2026-08-27T00:01:00Z,24.1,rtt_avg\n";
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v2/query?org=nflx")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let rows = store(server.url(), None)
            .query("from(bucket: \"default\")")
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("_value").map(String::as_str), Some("23.4"));
        assert_eq!(rows[1].get("_field").map(String::as_str), Some("rtt_avg"));
    }

    #[tokio::test]
    async fn empty_query_result_is_ok() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", mockito::Matcher::Regex(r"^/api/v2/query".to_string()))
            .with_status(200)
            .with_body("\r\n")
            .create_async()
            .await;

        let rows = store(server.url(), None).query("...").await.unwrap();
        assert!(rows.is_empty());
    }
}
