use serde::Serialize;
use tracing::error;

/// Best-effort out-of-band alerting for terminal failures. A failing
/// alert is logged and never escalated, so it cannot mask the original
/// error.
pub struct ErrorAlerter {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct AlertBody<'a> {
    text: &'a str,
}

impl ErrorAlerter {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }

    pub async fn alert(&self, message: &str) {
        let webhook_url = match &self.webhook_url {
            Some(webhook_url) => webhook_url,
            None => return,
        };
        match self
            .client
            .post(webhook_url)
            .json(&AlertBody { text: message })
            .send()
            .await
        {
            Ok(res) if !res.status().is_success() => {
                error!(
                    "Error alert webhook returned status: {}. Alert was: {}",
                    res.status(),
                    message
                );
            }
            Ok(_) => {}
            Err(e) => {
                error!("Unable to post error alert: {:?}. Alert was: {}", e, message);
            }
        }
    }
}
