use super::{ITaskQueue, QueueTask};
use crate::config::QueueConfig;
use serde::{Deserialize, Serialize};

pub struct HttpTaskQueue {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpTaskQueue {
    pub fn new(config: &QueueConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnqueueBody<'a> {
    task_id: &'a str,
    payload: &'a serde_json::Value,
    scheduled_time: i64,
    target_url: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnqueueResponse {
    task_id: String,
}

#[async_trait::async_trait]
impl ITaskQueue for HttpTaskQueue {
    async fn enqueue(&self, task: QueueTask) -> anyhow::Result<String> {
        let body = EnqueueBody {
            task_id: &task.task_id,
            payload: &task.payload,
            scheduled_time: task.scheduled_at,
            target_url: &task.target_url,
        };
        let res = self
            .authorize(self.client.post(format!("{}/tasks", self.base_url)))
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            anyhow::bail!(
                "Task queue rejected enqueue of task {} with status: {}",
                task.task_id,
                res.status()
            );
        }
        let res: EnqueueResponse = res.json().await?;
        Ok(res.task_id)
    }

    async fn dequeue(&self, external_task_id: &str) -> anyhow::Result<()> {
        let res = self
            .authorize(
                self.client
                    .delete(format!("{}/tasks/{}", self.base_url, external_task_id)),
            )
            .send()
            .await?;
        if !res.status().is_success() {
            anyhow::bail!(
                "Task queue rejected dequeue of task {} with status: {}",
                external_task_id,
                res.status()
            );
        }
        Ok(())
    }
}
