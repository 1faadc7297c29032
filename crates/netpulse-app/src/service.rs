//! 서비스 루프.
//!
//! 고정 주기로 대상 집합을 수집한다. 순차 모드는 대상 간 짧은 휴지를
//! 두고 차례로, 병렬 모드는 워커 풀과 동시성 제한 아래에서 동시에
//! 처리한다. 중지 신호는 사이클 사이에서 협조적으로 확인된다 —
//! 진행 중인 사이클은 자체 타임아웃까지 완주한다.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use netpulse_core::config::AppConfig;
use netpulse_core::error::TelemetryError;
use netpulse_resilience::{ConcurrencyController, WorkerPool};

use crate::collector::Collector;

/// 대상 간 휴지 (순차 모드)
const INTER_TARGET_PAUSE: Duration = Duration::from_secs(3);
/// 사이클 실패 후 재시도 대기
const FAILURE_BACKOFF: Duration = Duration::from_secs(10);
/// 병렬 모드에서 대상 집합 전체의 타임아웃
const GROUP_TIMEOUT: Duration = Duration::from_secs(300);

/// 주기 수집 서비스
pub struct MonitoringService {
    config: AppConfig,
    collector: Arc<Collector>,
    parallel: bool,
}

impl MonitoringService {
    /// 서비스 구성
    pub fn new(config: AppConfig, collector: Arc<Collector>, parallel: bool) -> Self {
        Self {
            config,
            collector,
            parallel,
        }
    }

    /// 중지 신호를 받을 때까지 주기 수집 실행
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.config.interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(
            interval_s = self.config.monitoring_interval,
            targets = ?self.config.targets(),
            parallel = self.parallel,
            "수집 서비스 시작"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let ok = self.run_cycle().await;
                    if !ok {
                        warn!(backoff_s = FAILURE_BACKOFF.as_secs(), "사이클 실패, 대기 후 재개");
                        tokio::time::sleep(FAILURE_BACKOFF).await;
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("중지 신호 수신, 수집 서비스 종료");
                        return;
                    }
                }
            }
        }
    }

    /// 한 사이클 — 모든 대상이 성공했을 때만 true
    pub async fn run_cycle(&self) -> bool {
        let targets = self.config.targets();
        let results = if self.parallel {
            self.collect_parallel(&targets).await
        } else {
            self.collect_sequential(&targets).await
        };

        let mut all_ok = true;
        for (target, result) in targets.iter().zip(results) {
            if let Err(error) = result {
                error!(target_host = %target, %error, "대상 수집 실패");
                all_ok = false;
            }
        }
        all_ok
    }

    async fn collect_sequential(&self, targets: &[String]) -> Vec<Result<(), TelemetryError>> {
        let mut results = Vec::with_capacity(targets.len());
        for (index, target) in targets.iter().enumerate() {
            results.push(self.collector.collect_and_store(target).await);
            if index + 1 < targets.len() {
                tokio::time::sleep(INTER_TARGET_PAUSE).await;
            }
        }
        results
    }

    /// 병렬 수집 — 워커 풀에 대상별 작업 제출, 그룹 타임아웃으로 회수
    ///
    /// 그룹 타임아웃에 걸리면 아직 끝나지 않은 대상들은 개별
    /// [`TelemetryError::Timeout`]으로 보고된다 (배치 전체 유실 없음).
    async fn collect_parallel(&self, targets: &[String]) -> Vec<Result<(), TelemetryError>> {
        let controller = Arc::new(ConcurrencyController::default());
        let pool = WorkerPool::new(targets.len().clamp(1, 8), targets.len().max(1));

        let mut receivers = Vec::with_capacity(targets.len());
        for target in targets {
            let collector = self.collector.clone();
            let controller = controller.clone();
            let target = target.clone();
            let submitted = pool
                .submit(async move {
                    controller
                        .run_target(|| collector.collect_and_store(&target))
                        .await
                })
                .await;
            receivers.push(submitted);
        }

        let deadline = tokio::time::Instant::now() + GROUP_TIMEOUT;
        let mut results = Vec::with_capacity(targets.len());
        for (target, submitted) in targets.iter().zip(receivers) {
            let result = match submitted {
                Ok(receiver) => {
                    match tokio::time::timeout_at(deadline, receiver).await {
                        Ok(Ok(result)) => result,
                        Ok(Err(_)) => Err(TelemetryError::Collection {
                            target: target.clone(),
                        }),
                        // 그룹 타임아웃 — 이 대상만 타임아웃 처리
                        Err(_) => Err(TelemetryError::Timeout(format!(
                            "{target}: 그룹 타임아웃 {}초",
                            GROUP_TIMEOUT.as_secs()
                        ))),
                    }
                }
                Err(error) => Err(error),
            };
            results.push(result);
        }

        pool.shutdown().await;
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use netpulse_core::derive::{FixedClassifier, MetricsDeriver};
    use netpulse_core::models::geo::{GeoEndpoint, GeoReport};
    use netpulse_core::models::measurement::{PingStats, RouteHop, RouteSample, Rtt};
    use netpulse_core::models::point::DataPoint;
    use netpulse_core::ports::{GeoResolver, HopProber, LatencyProber, MetricsStore};
    use netpulse_resilience::CircuitBreakerRegistry;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    // 대상 이름으로 동작을 가르는 모의 포트:
    // - "down.example"  — 즉시 실패
    // - "slow.example"  — 그룹 타임아웃보다 오래 걸린 뒤 실패
    // - 그 외          — 정상 측정

    struct ScriptedLatency;

    #[async_trait]
    impl LatencyProber for ScriptedLatency {
        async fn measure(&self, target: &str) -> Result<PingStats, TelemetryError> {
            match target {
                "down.example" => Err(TelemetryError::Measurement("응답 없음".to_string())),
                "slow.example" => {
                    tokio::time::sleep(GROUP_TIMEOUT + Duration::from_secs(100)).await;
                    Err(TelemetryError::Measurement("응답 없음".to_string()))
                }
                _ => Ok(PingStats {
                    packet_loss: Some(0.0),
                    packets_transmitted: Some(5),
                    packets_received: Some(5),
                    rtt: Some(Rtt {
                        min: 22.8,
                        avg: 23.4,
                        max: 24.1,
                        mdev: 0.5,
                    }),
                }),
            }
        }

        async fn check_reachable(&self, target: &str) -> bool {
            target != "down.example"
        }
    }

    struct ScriptedHops;

    #[async_trait]
    impl HopProber for ScriptedHops {
        async fn trace(&self, target: &str) -> RouteSample {
            if target == "down.example" || target == "slow.example" {
                return RouteSample::empty();
            }
            RouteSample {
                hop_count: 1,
                hops: vec![RouteHop {
                    hop: 1,
                    ip: "192.168.0.1".to_string(),
                    avg_time_ms: 1.0,
                }],
            }
        }
    }

    struct ScriptedGeo;

    #[async_trait]
    impl GeoResolver for ScriptedGeo {
        async fn collect(&self, target: &str) -> Result<GeoReport, TelemetryError> {
            if target == "down.example" || target == "slow.example" {
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
    struct RecordingStore {
        written: Mutex<Vec<DataPoint>>,
    }

    #[async_trait]
    impl MetricsStore for RecordingStore {
        async fn ping(&self) -> Result<(), TelemetryError> {
            Ok(())
        }

        async fn write_point(&self, point: &DataPoint) -> Result<(), TelemetryError> {
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

    fn service(targets: &str, parallel: bool, store: Arc<RecordingStore>) -> MonitoringService {
        let config = AppConfig {
            target_fqdns: Some(targets.to_string()),
            ..AppConfig::default()
        };
        let collector = Arc::new(Collector::new(
            Arc::new(ScriptedLatency),
            Arc::new(ScriptedHops),
            Arc::new(ScriptedGeo),
            store,
            Arc::new(MetricsDeriver::new(FixedClassifier::default())),
            Arc::new(CircuitBreakerRegistry::new()),
        ));
        MonitoringService::new(config, collector, parallel)
    }

    #[tokio::test(start_paused = true)]
    async fn group_timeout_maps_stragglers_to_per_target_timeouts() {
        let store = Arc::new(RecordingStore::default());
        let service = service("fast.example,slow.example", true, store.clone());

        let targets = service.config.targets();
        let results = service.collect_parallel(&targets).await;

        assert!(results[0].is_ok());
        // 느린 대상만 타임아웃으로 보고되고 배치 전체가 유실되지 않는다
        assert_matches!(results[1], Err(TelemetryError::Timeout(_)));
        assert_eq!(store.written.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cycle_reports_failure_when_any_target_fails() {
        let store = Arc::new(RecordingStore::default());
        let service = service("fast.example,down.example", false, store.clone());

        assert!(!service.run_cycle().await);
        // 성공한 대상의 기록은 남는다
        assert_eq!(store.written.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cycle_succeeds_when_all_targets_ok() {
        let store = Arc::new(RecordingStore::default());
        let service = service("a.example,b.example", false, store.clone());

        assert!(service.run_cycle().await);
        assert_eq!(store.written.lock().len(), 2);
    }
}
