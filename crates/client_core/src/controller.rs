//! View controller: wires user actions to API calls and re-renders the list.
//!
//! Each operation is a stateless request/response/render cycle. Overlapping
//! operations are not sequenced against each other; whichever list load
//! resolves last determines what is shown.

use reqwest::StatusCode;
use shared::domain::FormPayload;
use tracing::{info, warn};

use crate::{api::EventsApi, error::ClientError};

pub const EVENTS_LIST_ID: &str = "events";
pub const REFRESH_BUTTON_ID: &str = "refresh";

pub const CREATE_FAILED_ALERT: &str = "Failed to create event";
pub const SUBSCRIBE_CONFIRM_ALERT: &str = "Check your email to confirm subscription";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    CreateEvent,
    Subscribe,
}

impl FormKind {
    pub fn element_id(self) -> &'static str {
        match self {
            FormKind::CreateEvent => "eventForm",
            FormKind::Subscribe => "subscribeForm",
        }
    }
}

/// Rendering surface driven by [`ViewController`].
pub trait EventView {
    /// Replaces the whole rendered list with `lines`, in order.
    fn render_events(&self, lines: &[String]);
    /// Blocking user-visible notification.
    fn alert(&self, message: &str);
    /// Restores the form's fields to their defaults.
    fn reset_form(&self, form: FormKind);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted(StatusCode),
    Rejected(StatusCode),
}

impl SubmitOutcome {
    fn from_status(status: StatusCode) -> Self {
        if status.is_success() {
            SubmitOutcome::Accepted(status)
        } else {
            SubmitOutcome::Rejected(status)
        }
    }

    pub fn is_accepted(self) -> bool {
        matches!(self, SubmitOutcome::Accepted(_))
    }
}

pub struct ViewController<A, V> {
    api: A,
    view: V,
}

impl<A: EventsApi, V: EventView> ViewController<A, V> {
    pub fn new(api: A, view: V) -> Self {
        Self { api, view }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Initial load once the surface is ready. Listener binding belongs to the
    /// platform layer that owns the elements.
    pub async fn initialize(&self) {
        let _ = self.load_events().await;
    }

    /// Fetches and renders the list. Failures leave the rendered list as it
    /// was and are only logged.
    pub async fn load_events(&self) -> Result<usize, ClientError> {
        let list = match self.api.list_events().await {
            Ok(list) => list,
            Err(error) => {
                warn!(%error, "failed to load events");
                return Err(error);
            }
        };
        let lines = list.render_lines();
        self.view.render_events(&lines);
        Ok(lines.len())
    }

    /// Alert on a non-2xx status, then reload, then reset the form.
    ///
    /// A transport failure on the POST stops the flow without any feedback,
    /// and so does a failed reload, which leaves the form filled in.
    pub async fn create_event(&self, payload: &FormPayload) -> Result<SubmitOutcome, ClientError> {
        let status = match self.api.create_event(payload).await {
            Ok(status) => status,
            Err(error) => {
                warn!(%error, "event creation request failed");
                return Err(error);
            }
        };

        let outcome = SubmitOutcome::from_status(status);
        if outcome.is_accepted() {
            info!(%status, "event created");
        } else {
            warn!(%status, "event creation rejected");
            self.view.alert(CREATE_FAILED_ALERT);
        }

        self.load_events().await?;
        self.view.reset_form(FormKind::CreateEvent);
        Ok(outcome)
    }

    /// Confirms a 2xx subscription. Any other outcome is silent and keeps the
    /// form as typed.
    pub async fn subscribe(&self, payload: &FormPayload) -> Result<SubmitOutcome, ClientError> {
        let status = match self.api.subscribe(payload).await {
            Ok(status) => status,
            Err(error) => {
                warn!(%error, "subscription request failed");
                return Err(error);
            }
        };

        let outcome = SubmitOutcome::from_status(status);
        if outcome.is_accepted() {
            self.view.alert(SUBSCRIBE_CONFIRM_ALERT);
        } else {
            warn!(%status, "subscription rejected");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
