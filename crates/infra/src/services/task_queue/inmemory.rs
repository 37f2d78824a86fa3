use super::{ITaskQueue, QueueTask};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Records enqueued tasks instead of talking to a real queue. Tests can
/// script failures per task id and inspect what is currently queued.
pub struct InMemoryTaskQueue {
    pub tasks: Mutex<Vec<(String, QueueTask)>>,
    pub failing_task_ids: Mutex<Vec<String>>,
    pub fail_dequeue: Mutex<bool>,
    counter: AtomicUsize,
}

impl InMemoryTaskQueue {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(vec![]),
            failing_task_ids: Mutex::new(vec![]),
            fail_dequeue: Mutex::new(false),
            counter: AtomicUsize::new(0),
        }
    }

    pub fn task_count(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ITaskQueue for InMemoryTaskQueue {
    async fn enqueue(&self, task: QueueTask) -> anyhow::Result<String> {
        if self
            .failing_task_ids
            .lock()
            .unwrap()
            .contains(&task.task_id)
        {
            anyhow::bail!("Task queue rejected enqueue of task {}", task.task_id);
        }
        let external_task_id = format!("queued-{}", self.counter.fetch_add(1, Ordering::SeqCst));
        self.tasks
            .lock()
            .unwrap()
            .push((external_task_id.clone(), task));
        Ok(external_task_id)
    }

    async fn dequeue(&self, external_task_id: &str) -> anyhow::Result<()> {
        if *self.fail_dequeue.lock().unwrap() {
            anyhow::bail!("Task queue rejected dequeue of task {}", external_task_id);
        }
        let mut tasks = self.tasks.lock().unwrap();
        match tasks.iter().position(|(id, _)| id == external_task_id) {
            Some(index) => {
                tasks.remove(index);
                Ok(())
            }
            None => anyhow::bail!("Task queue does not know task {}", external_task_id),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn task(task_id: &str) -> QueueTask {
        QueueTask {
            task_id: task_id.into(),
            payload: serde_json::json!({}),
            scheduled_at: 1000,
            target_url: "http://localhost/cb".into(),
        }
    }

    #[tokio::test]
    async fn enqueue_and_dequeue_round_trip() {
        let queue = InMemoryTaskQueue::new();
        let external_task_id = queue.enqueue(task("t-1")).await.unwrap();
        assert_eq!(queue.task_count(), 1);

        queue.dequeue(&external_task_id).await.unwrap();
        assert_eq!(queue.task_count(), 0);

        assert!(queue.dequeue(&external_task_id).await.is_err());
    }

    #[tokio::test]
    async fn scripted_failures_reject_enqueue() {
        let queue = InMemoryTaskQueue::new();
        queue.failing_task_ids.lock().unwrap().push("t-bad".into());

        assert!(queue.enqueue(task("t-bad")).await.is_err());
        assert!(queue.enqueue(task("t-good")).await.is_ok());
        assert_eq!(queue.task_count(), 1);
    }
}
