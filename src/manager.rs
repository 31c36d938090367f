use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::Notify;

use task_pool::pool::WorkerPool;
use task_pool::task::{PoolTask, TaskSink};

use crate::config::LayerConfig;
use crate::context::EncoderContext;
use crate::task::{EncodeVariant, MapUpdateTask, SliceEncodeTask, TaskKind};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Constructed from a context with no configured layers
    #[error("encoder context has no layers")]
    MissingContext,
    /// Worker pool could not be brought up
    #[error("allocation failed: {0}")]
    Alloc(String),
    /// Enqueue refused mid-cycle, the pool is already stopped
    #[error("worker pool rejected task: {0}")]
    Pool(String),
}

/// The dispatch contract shared by [`TaskManager`] and the single-threaded
/// [`crate::serial::SerialTaskManager`], so frame drivers are
/// interchangeable between the two.
#[allow(async_fn_in_trait)]
pub trait TaskDispatch {
    /// Selects the layer for this frame and runs the slice-map-update pass
    /// when the context flags the layer for re-slicing.
    async fn init_frame(&mut self, layer: usize) -> Result<(), DispatchError>;

    /// Runs one barrier pass over the selected layer's task list of the
    /// given kind; returns once every dispatched task has reported.
    async fn execute_tasks(&mut self, kind: TaskKind) -> Result<(), DispatchError>;

    fn uninit(&mut self);
}

/// Counts the outstanding tasks of the active dispatch cycle and parks the
/// frame driver until the count drains.
///
/// The decrement and the zero check share one critical section, and the
/// event is signalled only on the transition to zero, so a redundant
/// report past zero cannot re-signal and leak a stale permit into the next
/// cycle. `Notify` carries the auto-reset behavior the reuse across frames
/// relies on: one stored permit, consumed by exactly one wait.
pub(crate) struct DispatchBarrier {
    outstanding: Mutex<i64>,
    done: Notify,
}

impl DispatchBarrier {
    fn new() -> Self {
        Self {
            outstanding: Mutex::new(0),
            done: Notify::new(),
        }
    }

    /// Arms the barrier for a cycle of `count` tasks.
    fn arm(&self, count: usize) {
        *self.outstanding.lock() = count as i64;
    }

    fn complete_one(&self) {
        let mut outstanding = self.outstanding.lock();
        *outstanding -= 1;
        if *outstanding == 0 {
            self.done.notify_one();
        }
    }

    async fn wait(&self) {
        self.done.notified().await;
    }

    fn outstanding(&self) -> i64 {
        *self.outstanding.lock()
    }
}

/// Executed and cancelled both release the barrier; a task's own failure
/// is not the barrier's concern.
impl TaskSink for DispatchBarrier {
    fn on_task_executed(&self, _task: &dyn PoolTask) {
        self.complete_one();
    }

    fn on_task_cancelled(&self, _task: &dyn PoolTask) {
        self.complete_one();
    }
}

struct LayerTasks {
    task_count: usize,
    map_update: Vec<Arc<dyn PoolTask>>,
    encode: Vec<Arc<dyn PoolTask>>,
}

/// Fan-out/fan-in dispatcher for the frame loop: one barrier cycle per
/// (layer, kind) pass, over task lists built once at creation and reused
/// for every frame.
pub struct TaskManager {
    ctx: Arc<EncoderContext>,
    pool: WorkerPool,
    barrier: Arc<DispatchBarrier>,
    layers: Vec<LayerTasks>,
    cur_layer: usize,
}

impl TaskManager {
    pub fn create(ctx: Arc<EncoderContext>) -> Result<Self, DispatchError> {
        if ctx.config().layers.is_empty() {
            return Err(DispatchError::MissingContext);
        }

        let barrier = Arc::new(DispatchBarrier::new());
        let threads = ctx.config().threads;
        let pool = WorkerPool::new(Arc::clone(&barrier) as Arc<dyn TaskSink>, threads)
            .map_err(|e| DispatchError::Alloc(e.to_string()))?;

        let layers: Vec<LayerTasks> = ctx
            .config()
            .layers
            .iter()
            .enumerate()
            .map(|(did, layer)| Self::create_layer_tasks(&ctx, did, layer))
            .collect();
        log::info!("task manager: {} threads, {} layers", threads, layers.len());

        Ok(Self {
            ctx,
            pool,
            barrier,
            layers,
            cur_layer: 0,
        })
    }

    fn create_layer_tasks(ctx: &Arc<EncoderContext>, did: usize, layer: &LayerConfig) -> LayerTasks {
        let task_count = layer.task_count(ctx.config().threads);
        let variant = EncodeVariant::select(layer, ctx.config().load_balancing);

        let map_update = (0..task_count)
            .map(|idx| Arc::new(MapUpdateTask::new(Arc::clone(ctx), did, idx)) as Arc<dyn PoolTask>)
            .collect();
        let encode = (0..task_count)
            .map(|idx| {
                Arc::new(SliceEncodeTask::new(Arc::clone(ctx), did, idx, variant))
                    as Arc<dyn PoolTask>
            })
            .collect();
        log::debug!(
            "layer {}: {} tasks per pass, {:?} encoding",
            did,
            task_count,
            variant
        );

        LayerTasks {
            task_count,
            map_update,
            encode,
        }
    }

    pub fn task_count(&self, layer: usize) -> usize {
        self.layers.get(layer).map(|l| l.task_count).unwrap_or(0)
    }

    async fn run_barrier(&mut self, kind: TaskKind) -> Result<(), DispatchError> {
        let Some(layer) = self.layers.get(self.cur_layer) else {
            log::warn!("dispatch on unconfigured layer {}", self.cur_layer);
            return Ok(());
        };

        // The loop bound must come from this snapshot: the shared counter
        // starts draining as soon as the first task lands on a worker.
        let count = layer.task_count;
        if count == 0 {
            return Ok(());
        }

        self.barrier.arm(count);
        let list = match kind {
            TaskKind::MapUpdate => &layer.map_update,
            TaskKind::Encode => &layer.encode,
        };
        for task in list.iter().take(count) {
            self.pool
                .queue_task(Arc::clone(task))
                .map_err(|e| DispatchError::Pool(e.to_string()))?;
        }
        self.barrier.wait().await;
        debug_assert!(self.barrier.outstanding() <= 0);

        Ok(())
    }
}

impl TaskDispatch for TaskManager {
    async fn init_frame(&mut self, layer: usize) -> Result<(), DispatchError> {
        self.cur_layer = layer;
        if self.ctx.needs_slicing_adjustment(layer) {
            self.run_barrier(TaskKind::MapUpdate).await?;
        }
        Ok(())
    }

    async fn execute_tasks(&mut self, kind: TaskKind) -> Result<(), DispatchError> {
        self.run_barrier(kind).await
    }

    fn uninit(&mut self) {
        self.pool.stop();
        self.layers.clear();
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.uninit();
    }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod manager_test;
