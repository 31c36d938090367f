use std::collections::VecDeque;
use std::sync::Arc;

use task_pool::task::PoolTask;

use crate::context::EncoderContext;
use crate::manager::{DispatchError, TaskDispatch};
use crate::task::{EncodeVariant, SliceEncodeTask, TaskKind};

/// Single-threaded reference manager: runs the base layer's encode tasks
/// in list order on the calling thread, discarding each after execution.
/// Same contract as [`crate::manager::TaskManager`], none of the
/// machinery; validates task logic independent of concurrency.
pub struct SerialTaskManager {
    tasks: VecDeque<Arc<dyn PoolTask>>,
}

impl SerialTaskManager {
    pub fn create(ctx: Arc<EncoderContext>) -> Result<Self, DispatchError> {
        let Some(layer) = ctx.config().layers.first() else {
            return Err(DispatchError::MissingContext);
        };

        let task_count = layer.task_count(ctx.config().threads);
        let variant = EncodeVariant::select(layer, ctx.config().load_balancing);
        let tasks = (0..task_count)
            .map(|idx| {
                Arc::new(SliceEncodeTask::new(Arc::clone(&ctx), 0, idx, variant))
                    as Arc<dyn PoolTask>
            })
            .collect();

        Ok(Self { tasks })
    }

    pub fn remaining(&self) -> usize {
        self.tasks.len()
    }
}

impl TaskDispatch for SerialTaskManager {
    async fn init_frame(&mut self, _layer: usize) -> Result<(), DispatchError> {
        Ok(())
    }

    async fn execute_tasks(&mut self, _kind: TaskKind) -> Result<(), DispatchError> {
        while let Some(task) = self.tasks.pop_front() {
            if let Err(e) = task.execute() {
                log::error!("serial task error: {:#}", e);
            }
        }
        Ok(())
    }

    fn uninit(&mut self) {
        self.tasks.clear();
    }
}

#[cfg(test)]
#[path = "serial_test.rs"]
mod serial_test;
