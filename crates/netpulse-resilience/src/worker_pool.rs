//! 고정 워커 풀.
//!
//! 장수명 워커들이 유한 큐를 소비한다. 제출은 해당 작업을 집어간 워커가
//! 완료 시 resolve하는 수신기를 돌려준다. 종료는 워커당 센티넬 하나를
//! 큐에 넣고 전원 합류를 기다린다 — 이미 큐에 들어간 작업은 센티넬보다
//! 앞에 있으므로 버려지지 않는다.

use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use netpulse_core::error::TelemetryError;

enum Task {
    Run(BoxFuture<'static, ()>),
    Shutdown,
}

/// 고정 크기 워커 풀
pub struct WorkerPool {
    sender: mpsc::Sender<Task>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// `worker_count`개 워커와 `queue_capacity` 길이 큐로 풀 시작
    pub fn new(worker_count: usize, queue_capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<Task>(queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..worker_count)
            .map(|id| {
                let receiver = receiver.clone();
                tokio::spawn(async move {
                    loop {
                        let task = receiver.lock().await.recv().await;
                        match task {
                            Some(Task::Run(future)) => future.await,
                            Some(Task::Shutdown) | None => {
                                debug!(worker = id, "워커 종료");
                                break;
                            }
                        }
                    }
                })
            })
            .collect();

        Self { sender, workers }
    }

    /// 작업 제출 — 완료 값을 받을 수신기를 반환
    ///
    /// 큐가 닫혔으면 (종료 후 제출) 에러.
    pub async fn submit<T, F>(&self, future: F) -> Result<oneshot::Receiver<T>, TelemetryError>
    where
        T: Send + 'static,
        F: std::future::Future<Output = T> + Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        let task = Task::Run(Box::pin(async move {
            // 수신 측이 포기했으면 결과는 버린다
            let _ = result_tx.send(future.await);
        }));
        self.sender
            .send(task)
            .await
            .map_err(|_| TelemetryError::Measurement("워커 풀이 이미 종료됨".to_string()))?;
        Ok(result_rx)
    }

    /// 큐에 남은 작업까지 처리한 뒤 모든 워커를 종료
    pub async fn shutdown(mut self) {
        info!(workers = self.workers.len(), "워커 풀 종료 시작");
        for _ in 0..self.workers.len() {
            if self.sender.send(Task::Shutdown).await.is_err() {
                break;
            }
        }
        for handle in self.workers.drain(..) {
            let _ = handle.await;
        }
        info!("워커 풀 종료 완료");
    }
}
