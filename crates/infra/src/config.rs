use awaytix_utils::create_random_secret;
use chrono_tz::Tz;
use tracing::{info, warn};

const API_KEY_LEN: usize = 30;

/// All runtime configuration, read from the environment exactly once.
/// Components receive this struct through the context instead of
/// reaching into process-wide environment state themselves.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    /// Secret expected in the `awaytix-api-key` header on admin routes
    pub api_key: String,
    /// Base url the external task queue calls back into. Scheduling
    /// notifications is impossible without it.
    pub callback_base_url: Option<String>,
    /// Timezone of the ticketing sites; wall-clock notification targets
    /// are resolved against it
    pub timezone: Tz,
    /// Coordinates of the external delayed-callback task queue
    pub queue: QueueConfig,
    /// Fan-out webhook channel, if configured
    pub webhook_channel: Option<WebhookChannelConfig>,
    /// Chat-app incoming-webhook channel, if configured
    pub chat_webhook_url: Option<String>,
    /// Ops webhook for terminal delivery failures (best effort)
    pub alert_webhook_url: Option<String>,
    /// Total delivery attempts per callback before a notification is
    /// marked failed
    pub delivery_max_attempts: u32,
    /// Base for the exponential backoff between delivery attempts.
    /// Tests set this to zero so retries do not sleep.
    pub delivery_backoff_base_millis: u64,
    /// How close to its target instant a scheduled notification must be
    /// for the sweep to pick it up
    pub pending_sweep_window_millis: i64,
    /// Tickets whose match date is further in the past than this are
    /// removed by the retention job
    pub ticket_retention_millis: i64,
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WebhookChannelConfig {
    pub url: String,
    pub key: String,
}

impl Config {
    pub fn new() -> Self {
        let api_key = match std::env::var("API_KEY") {
            Ok(key) => key,
            Err(_) => {
                info!("Did not find API_KEY environment variable. Going to create one.");
                let key = create_random_secret(API_KEY_LEN);
                info!("Admin api key was generated and set to: {}", key);
                key
            }
        };

        let default_port = "5000";
        let port = std::env::var("PORT").unwrap_or_else(|_| default_port.into());
        let port = match port.parse::<usize>() {
            Ok(port) => port,
            Err(_) => {
                warn!(
                    "The given PORT: {} is not valid, falling back to the default port: {}.",
                    port, default_port
                );
                default_port.parse::<usize>().unwrap()
            }
        };

        let callback_base_url = std::env::var("NOTIFICATION_CALLBACK_BASE_URL").ok();
        if callback_base_url.is_none() {
            warn!(
                "NOTIFICATION_CALLBACK_BASE_URL is not set. Notifications cannot be scheduled until it is."
            );
        }

        let default_timezone = "Asia/Tokyo";
        let timezone = std::env::var("SCHEDULE_TIMEZONE").unwrap_or_else(|_| default_timezone.into());
        let timezone = match timezone.parse::<Tz>() {
            Ok(timezone) => timezone,
            Err(_) => {
                warn!(
                    "The given SCHEDULE_TIMEZONE: {} is not valid, falling back to: {}.",
                    timezone, default_timezone
                );
                default_timezone.parse::<Tz>().unwrap()
            }
        };

        let queue = QueueConfig {
            base_url: std::env::var("TASK_QUEUE_URL")
                .unwrap_or_else(|_| "http://localhost:8123".into()),
            auth_token: std::env::var("TASK_QUEUE_TOKEN").ok(),
        };

        let webhook_channel = std::env::var("WEBHOOK_CHANNEL_URL").ok().map(|url| {
            let key = match std::env::var("WEBHOOK_CHANNEL_KEY") {
                Ok(key) => key,
                Err(_) => {
                    info!("Did not find WEBHOOK_CHANNEL_KEY environment variable. Going to create one.");
                    let key = create_random_secret(API_KEY_LEN);
                    info!("Webhook channel key was generated and set to: {}", key);
                    key
                }
            };
            WebhookChannelConfig { url, key }
        });

        Self {
            port,
            api_key,
            callback_base_url,
            timezone,
            queue,
            webhook_channel,
            chat_webhook_url: std::env::var("CHAT_WEBHOOK_URL").ok(),
            alert_webhook_url: std::env::var("ALERT_WEBHOOK_URL").ok(),
            delivery_max_attempts: 3,
            delivery_backoff_base_millis: 1000,
            pending_sweep_window_millis: 1000 * 60 * 5,
            ticket_retention_millis: 1000 * 60 * 60 * 24 * 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
