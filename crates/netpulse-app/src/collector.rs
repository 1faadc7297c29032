//! 수집 오케스트레이터.
//!
//! 한 대상에 대해 ping/traceroute/지리 세 서브 측정을 동시에 띄우고,
//! 부분 실패를 허용하며 병합한 뒤 파생 엔진과 저장소로 넘긴다.
//! 저장 경로는 회로 차단기와 재시도 정책 아래에서 실행된다.

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use netpulse_core::derive::MetricsDeriver;
use netpulse_core::error::TelemetryError;
use netpulse_core::models::measurement::RawMeasurement;
use netpulse_core::ports::{GeoResolver, HopProber, LatencyProber, MetricsStore};
use netpulse_resilience::{CircuitBreakerRegistry, RetryPolicy};

/// 저장 경로를 보호하는 회로 차단기 이름
const WRITE_BREAKER: &str = "influx_write";

/// 대상 하나의 수집 파이프라인
pub struct Collector {
    latency: Arc<dyn LatencyProber>,
    hops: Arc<dyn HopProber>,
    geo: Arc<dyn GeoResolver>,
    store: Arc<dyn MetricsStore>,
    deriver: Arc<MetricsDeriver>,
    breakers: Arc<CircuitBreakerRegistry>,
    retry: RetryPolicy,
}

impl Collector {
    /// 포트 구현을 주입해 구성
    pub fn new(
        latency: Arc<dyn LatencyProber>,
        hops: Arc<dyn HopProber>,
        geo: Arc<dyn GeoResolver>,
        store: Arc<dyn MetricsStore>,
        deriver: Arc<MetricsDeriver>,
        breakers: Arc<CircuitBreakerRegistry>,
    ) -> Self {
        Self {
            latency,
            hops,
            geo,
            store,
            deriver,
            breakers,
            retry: RetryPolicy::default(),
        }
    }

    /// 재시도 정책 교체
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// 한 사이클: 측정 → 병합 → 파생 → 기록
    ///
    /// 서브 측정이 전부 실패하면 [`TelemetryError::Collection`],
    /// 기록 실패는 저장 경로의 에러가 그대로 올라간다.
    pub async fn collect_and_store(&self, target: &str) -> Result<(), TelemetryError> {
        let raw = self.collect(target).await?;
        let Some(point) = self.deriver.process(&raw) else {
            return Err(TelemetryError::Collection {
                target: target.to_string(),
            });
        };
        let field_count = point.fields.len();

        let breaker = self.breakers.get_or_create(WRITE_BREAKER);
        self.retry
            .execute(|| {
                let point = point.clone();
                let breaker = breaker.clone();
                let store = self.store.clone();
                async move { breaker.call(|| store.write_point(&point)).await }
            })
            .await?;

        info!(
            target_host = target,
            fields = field_count,
            duration_s = format!("{:.2}", raw.collection_duration),
            "수집 사이클 완료"
        );
        Ok(())
    }

    /// 세 서브 측정을 동시에 실행하고 병합
    ///
    /// 각 서브 측정의 실패는 해당 부분의 부재로 강등되며, 셋 모두
    /// 실패했을 때만 에러다.
    pub async fn collect(&self, target: &str) -> Result<RawMeasurement, TelemetryError> {
        let started = Instant::now();

        let (ping, route, geo) = tokio::join!(
            self.latency.measure(target),
            self.hops.trace(target),
            self.geo.collect(target),
        );

        let ping = match ping {
            Ok(stats) if !stats.is_empty() => Some(stats),
            Ok(_) => {
                warn!(target_host = target, "ping 통계 비어 있음");
                None
            }
            Err(error) => {
                warn!(target_host = target, %error, "ping 서브 측정 실패");
                None
            }
        };
        let geo = match geo {
            Ok(report) if !report.is_empty() => Some(report),
            Ok(_) => None,
            Err(error) => {
                warn!(target_host = target, %error, "지리 서브 측정 실패");
                None
            }
        };

        let raw = RawMeasurement {
            target: target.to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            collection_duration: started.elapsed().as_secs_f64(),
            ping,
            // 빈 경로도 성공한 서브 측정
            route: Some(route),
            geo,
        };
        if raw.ping.is_none()
            && raw.geo.is_none()
            && raw
                .route
                .as_ref()
                .is_some_and(|r| r.hops.is_empty() && r.hop_count == 0)
        {
            // 실질적 결과가 전혀 없으면 수집 실패로 취급
            return Err(TelemetryError::Collection {
                target: target.to_string(),
            });
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use netpulse_core::derive::FixedClassifier;
    use netpulse_core::models::geo::{GeoEndpoint, GeoReport};
    use netpulse_core::models::measurement::{PingStats, RouteHop, RouteSample, Rtt};
    use netpulse_core::models::point::DataPoint;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    struct MockLatency {
        fail: bool,
    }

    #[async_trait]
    impl LatencyProber for MockLatency {
        async fn measure(&self, target: &str) -> Result<PingStats, TelemetryError> {
            if self.fail {
                return Err(TelemetryError::Measurement(format!("ping {target} 실패")));
            }
            Ok(PingStats {
                packet_loss: Some(0.0),
                packets_transmitted: Some(5),
                packets_received: Some(5),
                rtt: Some(Rtt {
                    min: 22.8,
                    avg: 23.4,
                    max: 24.1,
                    mdev: 0.5,
                }),
            })
        }

        async fn check_reachable(&self, _target: &str) -> bool {
            !self.fail
        }
    }

    struct MockHops {
        empty: bool,
    }

    #[async_trait]
    impl HopProber for MockHops {
        async fn trace(&self, _target: &str) -> RouteSample {
            if self.empty {
                return RouteSample::empty();
            }
            RouteSample {
                hop_count: 2,
                hops: vec![
                    RouteHop {
                        hop: 1,
                        ip: "192.168.0.1".to_string(),
                        avg_time_ms: 1.0,
                    },
                    RouteHop {
                        hop: 2,
                        ip: "10.0.0.1".to_string(),
                        avg_time_ms: 4.2,
                    },
                ],
            }
        }
    }

    struct MockGeo {
        fail: bool,
    }

    #[async_trait]
    impl GeoResolver for MockGeo {
        async fn collect(&self, target: &str) -> Result<GeoReport, TelemetryError> {
            if self.fail {
                return Err(TelemetryError::Measurement(format!("DNS {target} 실패")));
            }
            Ok(GeoReport {
                target: Some(GeoEndpoint {
                    ip: "142.250.1.1".to_string(),
                    location: None,
                }),
                source: None,
                distance_km: None,
            })
        }
    }

    #[derive(Default)]
    struct MockStore {
        written: Mutex<Vec<DataPoint>>,
        fail_writes: bool,
    }

    #[async_trait]
    impl MetricsStore for MockStore {
        async fn ping(&self) -> Result<(), TelemetryError> {
            Ok(())
        }

        async fn write_point(&self, point: &DataPoint) -> Result<(), TelemetryError> {
            if self.fail_writes {
                return Err(TelemetryError::Storage("쓰기 거부".to_string()));
            }
            self.written.lock().push(point.clone());
            Ok(())
        }

        async fn query(
            &self,
            _query: &str,
        ) -> Result<Vec<HashMap<String, String>>, TelemetryError> {
            Ok(Vec::new())
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 1,
            base_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(2),
            backoff_factor: 2.0,
        }
    }

    fn collector(
        ping_fail: bool,
        route_empty: bool,
        geo_fail: bool,
        store: Arc<MockStore>,
    ) -> Collector {
        Collector::new(
            Arc::new(MockLatency { fail: ping_fail }),
            Arc::new(MockHops { empty: route_empty }),
            Arc::new(MockGeo { fail: geo_fail }),
            store,
            Arc::new(MetricsDeriver::new(FixedClassifier::default())),
            Arc::new(CircuitBreakerRegistry::new()),
        )
        .with_retry(fast_retry())
    }

    #[tokio::test]
    async fn full_pipeline_writes_one_point() {
        let store = Arc::new(MockStore::default());
        collector(false, false, false, store.clone())
            .collect_and_store("google.com")
            .await
            .unwrap();

        let written = store.written.lock();
        assert_eq!(written.len(), 1);
        let point = &written[0];
        assert_eq!(point.measurement, "network_telemetry");
        assert_eq!(
            point.tags.get("target").map(String::as_str),
            Some("google.com")
        );
        assert!(!point.fields.is_empty());
    }

    #[tokio::test]
    async fn partial_failure_still_writes() {
        // ping과 geo가 실패해도 경로만으로 기록된다
        let store = Arc::new(MockStore::default());
        collector(true, false, true, store.clone())
            .collect_and_store("google.com")
            .await
            .unwrap();
        assert_eq!(store.written.lock().len(), 1);
    }

    #[tokio::test]
    async fn all_probes_failed_is_collection_error() {
        let store = Arc::new(MockStore::default());
        let result = collector(true, true, true, store.clone())
            .collect_and_store("google.com")
            .await;
        assert_matches!(result, Err(TelemetryError::Collection { .. }));
        assert!(store.written.lock().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_propagates_after_retries() {
        let store = Arc::new(MockStore {
            fail_writes: true,
            ..MockStore::default()
        });
        let result = collector(false, false, false, store)
            .collect_and_store("google.com")
            .await;
        assert_matches!(result, Err(TelemetryError::Storage(_)));
    }
}
