mod http;
mod inmemory;

pub use http::HttpTaskQueue;
pub use inmemory::InMemoryTaskQueue;
use serde_json::Value;

/// A delayed callback to hand to the external task queue. The queue
/// POSTs `payload` to `target_url` at `scheduled_at`; `task_id` is a
/// caller-chosen deterministic key so the queue can de-duplicate
/// repeated enqueues of the same work.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueTask {
    pub task_id: String,
    pub payload: Value,
    /// Unix millis; must be strictly in the future or the queue rejects
    /// the task
    pub scheduled_at: i64,
    pub target_url: String,
}

#[async_trait::async_trait]
pub trait ITaskQueue: Send + Sync {
    /// Returns the queue-side id of the created task
    async fn enqueue(&self, task: QueueTask) -> anyhow::Result<String>;
    async fn dequeue(&self, external_task_id: &str) -> anyhow::Result<()>;
}
