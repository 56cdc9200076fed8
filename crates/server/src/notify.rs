//! Newsletter notification fired for every created event.

use anyhow::Result;
use async_trait::async_trait;
use shared::domain::Event;
use storage::Storage;
use tracing::info;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publishes one message to every subscriber; returns how many were reached.
    async fn publish(&self, subject: &str, message: &str) -> Result<usize>;
}

/// Delivers to the stored subscriptions by logging one line per recipient.
pub struct SubscriberLogNotifier {
    storage: Storage,
}

impl SubscriberLogNotifier {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Notifier for SubscriberLogNotifier {
    async fn publish(&self, subject: &str, message: &str) -> Result<usize> {
        let subscriptions = self.storage.list_subscriptions().await?;
        for subscription in &subscriptions {
            info!(
                email = %subscription.email,
                subscription_id = %subscription.subscription_id,
                subject,
                "newsletter delivered"
            );
        }
        info!(subject, recipients = subscriptions.len(), %message, "newsletter published");
        Ok(subscriptions.len())
    }
}

pub fn event_created_message(event: &Event) -> String {
    [
        "New Event Created:".to_string(),
        format!("Title: {}", event.title),
        format!("Date: {}", event.date),
        format!("Location: {}", event.location),
        format!(
            "Description: {}",
            event.description.as_deref().unwrap_or_default()
        ),
    ]
    .join("\n")
}
