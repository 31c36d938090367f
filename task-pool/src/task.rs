/// One unit of pool work. Task objects are built once and re-executed
/// across frames, so `execute` takes `&self`; any mutable per-slice state
/// lives behind the implementor's own synchronization.
pub trait PoolTask: Send + Sync {
    /// Runs the task body on a worker thread. An `Err` is the task's own
    /// business to surface; the pool logs it and moves on.
    fn execute(&self) -> anyhow::Result<()>;
}

/// Completion callbacks, invoked from worker context exactly once per
/// accepted task: `on_task_executed` after the body ran (successfully or
/// not), `on_task_cancelled` when the pool dropped the task on shutdown.
pub trait TaskSink: Send + Sync {
    fn on_task_executed(&self, task: &dyn PoolTask);
    fn on_task_cancelled(&self, task: &dyn PoolTask);
}
