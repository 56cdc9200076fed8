use serde::{Deserialize, Serialize};

use crate::domain::Event;

pub const EVENTS_ROUTE: &str = "/events";
pub const SUBSCRIBE_ROUTE: &str = "/subscribe";
pub const HEALTHZ_ROUTE: &str = "/healthz";

/// Fields a creation request must carry with non-empty values, in report order.
pub const REQUIRED_EVENT_FIELDS: [&str; 4] = ["title", "date", "location", "description"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCreatedResponse {
    pub message: String,
    pub event: Event,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub message: String,
    #[serde(rename = "subscriptionArn")]
    pub subscription_id: String,
}
