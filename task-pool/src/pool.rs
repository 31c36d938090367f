use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::task::{PoolTask, TaskSink};

type TaskQueue = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Arc<dyn PoolTask>>>>;

/// Fixed-width worker pool. Every accepted task is executed exactly once
/// on some worker, or reported cancelled if the pool stops first.
pub struct WorkerPool {
    tx: mpsc::UnboundedSender<Arc<dyn PoolTask>>,
    cancel: CancellationToken,
    threads: usize,
}

impl WorkerPool {
    pub fn new(sink: Arc<dyn TaskSink>, threads: usize) -> anyhow::Result<Self> {
        anyhow::ensure!(threads > 0, "worker pool needs at least one thread");

        let (tx, rx) = mpsc::unbounded_channel();
        let rx: TaskQueue = Arc::new(tokio::sync::Mutex::new(rx));
        let cancel = CancellationToken::new();
        for id in 0..threads {
            let rx = Arc::clone(&rx);
            let sink = Arc::clone(&sink);
            let cancel = cancel.clone();
            tokio::spawn(async move { worker_loop(id, rx, sink, cancel).await });
        }
        log::info!("worker pool started, {} threads", threads);

        Ok(Self {
            tx,
            cancel,
            threads,
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Non-blocking enqueue. Fails once the pool has been stopped.
    pub fn queue_task(&self, task: Arc<dyn PoolTask>) -> anyhow::Result<()> {
        if self.cancel.is_cancelled() {
            anyhow::bail!("worker pool stopped");
        }
        self.tx
            .send(task)
            .map_err(|_| anyhow::anyhow!("worker pool stopped"))
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn worker_loop(id: usize, rx: TaskQueue, sink: Arc<dyn TaskSink>, cancel: CancellationToken) {
    loop {
        let task = {
            let mut rx = rx.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    // Tasks that never reached a worker still get their one
                    // completion report.
                    while let Ok(task) = rx.try_recv() {
                        sink.on_task_cancelled(task.as_ref());
                    }
                    break;
                }
                task = rx.recv() => match task {
                    Some(task) => task,
                    None => break,
                },
            }
        };

        let body = Arc::clone(&task);
        match tokio::task::spawn_blocking(move || body.execute()).await {
            Ok(Ok(())) => sink.on_task_executed(task.as_ref()),
            Ok(Err(e)) => {
                log::error!("worker {}: task error: {:#}", id, e);
                sink.on_task_executed(task.as_ref());
            }
            Err(e) => {
                log::error!("worker {}: task panicked: {}", id, e);
                sink.on_task_cancelled(task.as_ref());
            }
        }
    }
    log::debug!("worker {} exited", id);
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod pool_test;
