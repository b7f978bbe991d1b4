// crates/server/src/mailer.rs
//! Outbound mail for change alerts.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use watchtower_core::ChangeEvent;

pub const ALERT_SUBJECT: &str = "File Event Notification";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl MailMessage {
    /// The alert sent to a target's recipient for one change.
    pub fn alert(to: impl Into<String>, event: &ChangeEvent) -> Self {
        Self {
            to: to.into(),
            subject: ALERT_SUBJECT.to_string(),
            body: event.summary(),
        }
    }
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Mail endpoint rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}

/// Writes messages to the log instead of delivering them.
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        info!(
            from = %self.from,
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "mail (log transport)"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// POSTs each message as JSON to an HTTP mail relay.
pub struct WebhookMailer {
    client: reqwest::Client,
    endpoint: String,
    from: String,
}

impl WebhookMailer {
    pub fn new(endpoint: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            from: from.into(),
        }
    }
}

#[async_trait]
impl Mailer for WebhookMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        let payload = WebhookPayload {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        };

        let resp = self.client.post(&self.endpoint).json(&payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use chrono::{DateTime, Utc};
    use std::sync::{Arc, Mutex};
    use watchtower_core::ChangeKind;

    #[test]
    fn test_alert_message() {
        let ts = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let event = ChangeEvent::new("/w/a.txt", ChangeKind::Modified, ts);
        let msg = MailMessage::alert("ops@example.com", &event);

        assert_eq!(msg.to, "ops@example.com");
        assert_eq!(msg.subject, "File Event Notification");
        assert_eq!(
            msg.body,
            "File modified on /w/a.txt at 2024-05-01T12:00:00+00:00"
        );
    }

    #[tokio::test]
    async fn test_log_mailer_never_fails() {
        let mailer = LogMailer::new("watchtower@localhost");
        let event = ChangeEvent::now("/w/a", ChangeKind::Created);
        assert!(mailer.send(&MailMessage::alert("x@y.z", &event)).await.is_ok());
    }

    async fn spawn_relay(status: StatusCode) -> (String, Arc<Mutex<Vec<serde_json::Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let app = Router::new().route(
            "/send",
            post(move |Json(body): Json<serde_json::Value>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(body);
                    status
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/send"), seen)
    }

    #[tokio::test]
    async fn test_webhook_mailer_posts_json() {
        let (endpoint, seen) = spawn_relay(StatusCode::OK).await;
        let mailer = WebhookMailer::new(endpoint, "watchtower@localhost");
        let msg = MailMessage {
            to: "ops@example.com".into(),
            subject: ALERT_SUBJECT.into(),
            body: "File created on /w/a".into(),
        };

        mailer.send(&msg).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["from"], "watchtower@localhost");
        assert_eq!(seen[0]["to"], "ops@example.com");
        assert_eq!(seen[0]["subject"], "File Event Notification");
        assert_eq!(seen[0]["text"], "File created on /w/a");
    }

    #[tokio::test]
    async fn test_webhook_mailer_reports_rejection() {
        let (endpoint, _seen) = spawn_relay(StatusCode::SERVICE_UNAVAILABLE).await;
        let mailer = WebhookMailer::new(endpoint, "watchtower@localhost");
        let msg = MailMessage {
            to: "ops@example.com".into(),
            subject: ALERT_SUBJECT.into(),
            body: "body".into(),
        };

        let err = mailer.send(&msg).await.unwrap_err();
        assert!(matches!(err, MailError::Rejected { status: 503, .. }));
    }
}
