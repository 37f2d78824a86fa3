mod config;
mod repos;
mod services;
mod system;

pub use config::{Config, QueueConfig, WebhookChannelConfig};
pub use repos::{DeleteResult, Repos};
pub use services::{
    ChatChannel, ErrorAlerter, HttpTaskQueue, INotificationChannel, ITaskQueue, InMemoryTaskQueue,
    QueueTask, WebhookChannel,
};
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
pub use system::ISys;
use system::RealSys;

#[derive(Clone)]
pub struct Context {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub task_queue: Arc<dyn ITaskQueue>,
    pub channels: Vec<Arc<dyn INotificationChannel>>,
    pub alerter: Arc<ErrorAlerter>,
}

struct ContextParams {
    pub postgres_connection_string: String,
}

impl Context {
    async fn create(params: ContextParams) -> Self {
        let repos = Repos::create_postgres(&params.postgres_connection_string)
            .await
            .expect("Postgres credentials must be set and valid");
        let config = Config::new();
        let task_queue = Arc::new(HttpTaskQueue::new(&config.queue));

        let mut channels: Vec<Arc<dyn INotificationChannel>> = Vec::new();
        if let Some(webhook_channel) = &config.webhook_channel {
            channels.push(Arc::new(WebhookChannel::new(webhook_channel)));
        }
        if let Some(chat_webhook_url) = &config.chat_webhook_url {
            channels.push(Arc::new(ChatChannel::new(chat_webhook_url.clone())));
        }

        let alerter = Arc::new(ErrorAlerter::new(config.alert_webhook_url.clone()));

        Self {
            repos,
            config,
            sys: Arc::new(RealSys {}),
            task_queue,
            channels,
            alerter,
        }
    }

    /// Context backed entirely by in-memory fakes. Tests replace the
    /// pieces they need to script or observe.
    pub fn create_inmemory() -> Self {
        let config = Config::new();
        let alerter = Arc::new(ErrorAlerter::new(None));
        Self {
            repos: Repos::create_inmemory(),
            config,
            sys: Arc::new(RealSys {}),
            task_queue: Arc::new(InMemoryTaskQueue::new()),
            channels: Vec::new(),
            alerter,
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> Context {
    Context::create(ContextParams {
        postgres_connection_string: get_psql_connection_string(),
    })
    .await
}

fn get_psql_connection_string() -> String {
    const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

    std::env::var(PSQL_CONNECTION_STRING)
        .unwrap_or_else(|_| panic!("{} env var to be present.", PSQL_CONNECTION_STRING))
}

pub async fn run_migration() -> Result<(), MigrateError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&get_psql_connection_string())
        .await
        .expect("TO CONNECT TO POSTGRES");

    sqlx::migrate!().run(&pool).await
}
