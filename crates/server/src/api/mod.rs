use std::sync::Arc;

use serde_json::{Map, Value};
use shared::{
    domain::Event,
    error::{ApiError, ApiException, ErrorCode},
    protocol::REQUIRED_EVENT_FIELDS,
};
use storage::{NewEvent, Storage};
use tracing::info;

use crate::notify::{event_created_message, Notifier};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub notifier: Arc<dyn Notifier>,
    pub email_subject: String,
}

pub async fn list_events(ctx: &ApiContext) -> Result<Vec<Event>, ApiError> {
    ctx.storage.list_events().await.map_err(internal)
}

/// Validates and stores an event, then notifies subscribers.
///
/// The event stays stored when publishing fails; the caller still sees the
/// publish error.
pub async fn create_event(ctx: &ApiContext, body: &[u8]) -> Result<Event, ApiError> {
    let payload = parse_object(body)?;
    let new_event = validate_event(&payload)?;
    let event = ctx.storage.insert_event(new_event).await.map_err(internal)?;

    let message = event_created_message(&event);
    let reached = ctx
        .notifier
        .publish(&ctx.email_subject, &message)
        .await
        .map_err(internal)?;
    info!(
        event_id = event.id.as_deref().unwrap_or_default(),
        recipients = reached,
        "event created"
    );
    Ok(event)
}

/// Records a pending subscription and returns its id.
pub async fn subscribe(ctx: &ApiContext, body: &[u8]) -> Result<String, ApiError> {
    let payload = parse_object(body)?;
    let email = field_text(&payload, "email")
        .ok_or_else(|| ApiError::validation("Email is required"))?;
    let subscription_id = ctx
        .storage
        .insert_subscription(&email)
        .await
        .map_err(internal)?;
    info!(%subscription_id, "subscription pending confirmation");
    Ok(subscription_id)
}

/// An empty body reads as `{}`.
fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::validation("Request body must be a JSON object")),
        Err(err) => Err(ApiError::validation(format!("Invalid JSON body: {err}"))),
    }
}

fn validate_event(payload: &Map<String, Value>) -> Result<NewEvent, ApiException> {
    let missing: Vec<&str> = REQUIRED_EVENT_FIELDS
        .iter()
        .copied()
        .filter(|field| field_text(payload, field).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(ApiException::new(
            ErrorCode::Validation,
            format!("Missing fields: {}", missing.join(", ")),
        ));
    }

    let text = |field: &str| field_text(payload, field).unwrap_or_default();
    Ok(NewEvent {
        title: text("title"),
        date: text("date"),
        location: text("location"),
        description: text("description"),
    })
}

/// Non-empty strings and numbers count as present; everything else is missing.
fn field_text(payload: &Map<String, Value>, field: &str) -> Option<String> {
    match payload.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::internal(err.to_string())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
