//! Slack notifications for refresh outcomes
//!
//! Best effort: a failed post is logged and never changes the outcome of
//! the refresh it reports on.

use std::time::Duration;

use serde_json::{Value, json};

use crate::error::{ApiError, Result};
use crate::store::RefreshStats;

const POST_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts refresh results to a Slack incoming webhook
pub struct SlackNotifier {
    http: reqwest::Client,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(POST_TIMEOUT)
            .user_agent(concat!("fipesync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::from)?;
        Ok(Self {
            http,
            webhook_url: webhook_url.into(),
        })
    }

    pub async fn notify_success(&self, stats: &RefreshStats, duration: Duration) {
        if let Err(e) = self.post(&success_message(stats, duration)).await {
            log::warn!("Failed to send Slack notification: {}", e);
        }
    }

    pub async fn notify_failure(&self, error: &str) {
        if let Err(e) = self.post(&failure_message(error)).await {
            log::warn!("Failed to send Slack error notification: {}", e);
        }
    }

    async fn post(&self, message: &Value) -> Result<()> {
        let response = self
            .http
            .post(&self.webhook_url)
            .json(message)
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(
                ApiError::ServerError(format!("Slack returned {}: {}", status, body)).into(),
            );
        }
        log::debug!("Slack notification delivered");
        Ok(())
    }
}

fn section(text: String) -> Value {
    json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": text }
    })
}

fn success_message(stats: &RefreshStats, duration: Duration) -> Value {
    let text = format!(
        "*FIPE refresh completed*\n\n\
         *Stats:*\n\
         • Brands: {}\n\
         • Models: {}\n\
         • Years: {}\n\
         • Values: {}\n\n\
         *Duration:* {:.2} seconds",
        stats.brands,
        stats.models,
        stats.years,
        stats.values,
        duration.as_secs_f64()
    );
    json!({
        "text": "FIPE refresh completed",
        "blocks": [section(text)]
    })
}

fn failure_message(error: &str) -> Value {
    let text = format!(
        "*FIPE refresh failed*\n\n*Error:* {}\n\nCheck the updater logs for details.",
        error
    );
    json!({
        "text": "FIPE refresh failed",
        "blocks": [section(text)]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn stats() -> RefreshStats {
        RefreshStats {
            brands: 90,
            models: 40,
            years: 120,
            values: 118,
        }
    }

    #[test]
    fn test_success_message_body() {
        let msg = success_message(&stats(), Duration::from_millis(12_346));
        let text = msg["blocks"][0]["text"]["text"].as_str().unwrap();
        assert!(text.contains("Brands: 90"));
        assert!(text.contains("Values: 118"));
        assert!(text.contains("12.35 seconds"));
        assert_eq!(msg["text"], "FIPE refresh completed");
    }

    #[test]
    fn test_failure_message_body() {
        let msg = failure_message("brand list unavailable");
        let text = msg["blocks"][0]["text"]["text"].as_str().unwrap();
        assert!(text.contains("brand list unavailable"));
        assert_eq!(msg["blocks"][0]["type"], "section");
    }

    #[tokio::test]
    async fn test_notify_success_posts_to_webhook() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({"text": "FIPE refresh completed"})))
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let notifier = SlackNotifier::new(format!("{}/hook", server.url())).unwrap();
        notifier.notify_success(&stats(), Duration::from_secs(3)).await;

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_notify_failure_swallows_webhook_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .with_status(500)
            .with_body("invalid_payload")
            .create_async()
            .await;

        let notifier = SlackNotifier::new(format!("{}/hook", server.url())).unwrap();
        notifier.notify_failure("boom").await;

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_reports_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/hook")
            .with_status(403)
            .with_body("no_service")
            .create_async()
            .await;

        let notifier = SlackNotifier::new(format!("{}/hook", server.url())).unwrap();
        let err = notifier.post(&failure_message("x")).await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
