//! Client side of the community events board: an HTTP client for the events
//! API and the view controller that binds it to a rendering surface.

pub mod api;
pub mod controller;
pub mod error;

pub use api::{ApiConfig, EventsApi, HttpEventsApi};
pub use controller::{
    EventView, FormKind, SubmitOutcome, ViewController, CREATE_FAILED_ALERT, EVENTS_LIST_ID,
    REFRESH_BUTTON_ID, SUBSCRIBE_CONFIRM_ALERT,
};
pub use error::ClientError;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
