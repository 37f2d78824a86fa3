mod alerting;
mod channels;
mod task_queue;

pub use alerting::ErrorAlerter;
pub use channels::{ChatChannel, INotificationChannel, WebhookChannel};
pub use task_queue::{HttpTaskQueue, ITaskQueue, InMemoryTaskQueue, QueueTask};
