//! Alerting layer for tracing.
//!
//! Forwards severe events to an alert channel (console or webhook). The
//! frequency engine fails open on counter store outages, so the warnings it
//! emits are the only signal that capping is degraded; those are forwarded
//! alongside every ERROR. Resolver warnings about malformed campaign settings
//! repeat on every check and stay in the logs only.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{Layer, layer::Context};

/// Alert message containing event details.
#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub level: String,
    pub message: String,
    pub target: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub fields: Vec<(String, String)>,
}

/// Configuration for the alert layer.
#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// Events at or above this level alert from any target.
    pub min_level: Level,
    /// Targets whose events alert from `watched_level` up.
    pub watched_targets: Vec<String>,
    pub watched_level: Level,
    /// Channel buffer size; alerts beyond it are dropped.
    pub buffer_size: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            min_level: Level::ERROR,
            watched_targets: vec!["popcap_core::frequency::engine".to_string()],
            watched_level: Level::WARN,
            buffer_size: 100,
        }
    }
}

impl AlertConfig {
    fn should_alert(&self, level: &Level, target: &str) -> bool {
        // More severe levels compare lower
        if *level <= self.min_level {
            return true;
        }
        *level <= self.watched_level
            && self
                .watched_targets
                .iter()
                .any(|prefix| target.starts_with(prefix.as_str()))
    }
}

/// Trait for alert senders - implement this for different backends.
#[async_trait::async_trait]
pub trait AlertSender: Send + Sync {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Failed to send alert: {0}")]
    SendError(String),
}

/// Console alert sender - writes alerts to stderr (for development).
pub struct ConsoleAlertSender;

#[async_trait::async_trait]
impl AlertSender for ConsoleAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        eprintln!(
            "[ALERT] {} {} {}: {} {:?}",
            alert.timestamp.to_rfc3339(),
            alert.level,
            alert.target,
            alert.message,
            alert.fields
        );
        Ok(())
    }
}

/// Webhook alert sender - posts alerts to a chat webhook URL.
pub struct WebhookAlertSender {
    url: String,
    client: reqwest::Client,
}

impl WebhookAlertSender {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl AlertSender for WebhookAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        let details = alert
            .fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        let payload = serde_json::json!({
            "text": format!(
                "*popup-api {}*\n*Target:* {}\n*Message:* {}\n*Fields:* {}\n*Time:* {}",
                alert.level, alert.target, alert.message, details, alert.timestamp
            )
        });

        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| AlertError::SendError(e.to_string()))?;

        Ok(())
    }
}

/// Tracing layer that dispatches alerts for severe events.
pub struct AlertLayer {
    sender: mpsc::Sender<AlertMessage>,
    config: AlertConfig,
}

impl AlertLayer {
    /// Create a new alert layer. Must be called inside a tokio runtime.
    pub fn new(alert_sender: Arc<dyn AlertSender>, config: AlertConfig) -> Self {
        let (tx, mut rx) = mpsc::channel::<AlertMessage>(config.buffer_size);

        tokio::spawn(async move {
            while let Some(alert) = rx.recv().await {
                if let Err(e) = alert_sender.send(alert).await {
                    eprintln!("Failed to send alert: {}", e);
                }
            }
        });

        Self { sender: tx, config }
    }

    /// Create an alert layer that logs to console.
    pub fn console(config: AlertConfig) -> Self {
        Self::new(Arc::new(ConsoleAlertSender), config)
    }

    /// Create an alert layer that sends to a webhook.
    pub fn webhook(url: String, config: AlertConfig) -> Self {
        Self::new(Arc::new(WebhookAlertSender::new(url)), config)
    }
}

/// Visitor to extract fields from events.
#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields
                .push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !self.config.should_alert(metadata.level(), metadata.target()) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let alert = AlertMessage {
            level: metadata.level().to_string(),
            message: visitor.message,
            target: metadata.target().to_string(),
            timestamp: chrono::Utc::now(),
            fields: visitor.fields,
        };

        // Non-blocking send
        let _ = self.sender.try_send(alert);
    }
}
