//! # netpulse-app
//!
//! NETPULSE 수집기 바이너리 진입점.
//! DI 컨테이너 역할 — 어댑터를 조립해 서비스 루프에 주입한다.

mod collector;
mod health;
mod service;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use netpulse_core::config::AppConfig;
use netpulse_core::derive::MetricsDeriver;
use netpulse_core::ports::{LatencyProber, MetricsStore};
use netpulse_geo::GeoCollector;
use netpulse_probe::{PingProber, TracerouteProber};
use netpulse_resilience::CircuitBreakerRegistry;
use netpulse_storage::{InfluxConfig, InfluxStore};

use crate::collector::Collector;
use crate::service::MonitoringService;

/// NETPULSE 네트워크 텔레메트리 수집기
///
/// 대상 호스트들의 지연/손실/경로/지리 정보를 주기적으로 수집해
/// 파생 메트릭과 함께 InfluxDB에 기록한다.
#[derive(Parser, Debug)]
#[command(name = "netpulse")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 한 사이클만 수집하고 종료
    #[arg(long)]
    once: bool,

    /// 빠른 헬스 체크만 수행하고 종료
    #[arg(long)]
    health_check: bool,

    /// 다중 대상을 병렬로 수집
    #[arg(long, short = 'p')]
    parallel: bool,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l')]
    log_level: Option<String>,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let process_start = std::time::Instant::now();
    let args = Args::parse();

    let config = AppConfig::from_env().context("설정 로드 실패")?;
    init_tracing(args.log_level.as_deref().unwrap_or(&config.log_level));
    info!(version = env!("CARGO_PKG_VERSION"), "NETPULSE 시작");

    let store = Arc::new(InfluxStore::new(InfluxConfig {
        url: config.influxdb_url.clone(),
        token: config.influxdb_token.clone(),
        org: config.influxdb_org.clone(),
        bucket: config.influxdb_bucket.clone(),
    }));

    if args.health_check {
        let target = config
            .targets()
            .into_iter()
            .next()
            .context("수집 대상이 비어 있음")?;
        let report = health::quick_check(store, &target, process_start).await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        if !report.healthy {
            std::process::exit(1);
        }
        return Ok(());
    }

    let latency = Arc::new(PingProber::new(config.ping_count, config.ping_timeout));

    // 시작 점검: 저장소 연결 + 첫 대상 도달성. 실패해도 경고만 남기고
    // 수집은 시작한다 (일시 장애는 사이클 단위로 회복).
    if let Err(check_error) = store.ping().await {
        warn!(error = %check_error, "시작 시 저장소 연결 확인 실패");
    }
    let targets = config.targets();
    if let Some(first) = targets.first() {
        if !latency.check_reachable(first).await {
            warn!(target_host = %first, "시작 시 대상 도달성 확인 실패");
        }
    }

    let collector = Arc::new(Collector::new(
        latency,
        Arc::new(TracerouteProber::new()),
        Arc::new(GeoCollector::new()),
        store,
        Arc::new(MetricsDeriver::default()),
        Arc::new(CircuitBreakerRegistry::new()),
    ));

    let service = MonitoringService::new(config, collector, args.parallel);

    if args.once {
        let ok = service.run_cycle().await;
        if !ok {
            error!("단발 수집 실패");
            std::process::exit(1);
        }
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C 수신, 종료 요청");
            let _ = shutdown_tx.send(true);
        }
    });

    service.run(shutdown_rx).await;
    info!("NETPULSE 종료");
    Ok(())
}
