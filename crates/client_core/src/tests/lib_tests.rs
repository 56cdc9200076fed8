use super::*;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use shared::domain::FormPayload;
use std::{
    cell::RefCell,
    sync::{Arc, Mutex},
};
use tokio::net::TcpListener;

type Journal = Arc<Mutex<Vec<String>>>;

#[derive(Clone)]
struct ServerState {
    journal: Journal,
    list_status: StatusCode,
    list_body: &'static str,
    create_status: StatusCode,
    subscribe_status: StatusCode,
}

impl ServerState {
    fn new(journal: Journal) -> Self {
        Self {
            journal,
            list_status: StatusCode::OK,
            list_body: r#"{"events":[{"title":"Launch","date":"2024-01-01","location":"HQ"}]}"#,
            create_status: StatusCode::CREATED,
            subscribe_status: StatusCode::ACCEPTED,
        }
    }
}

fn record(state: &ServerState, entry: String) {
    state.journal.lock().expect("journal").push(entry);
}

async fn handle_list(State(state): State<ServerState>) -> impl IntoResponse {
    record(&state, "GET /events".into());
    (
        state.list_status,
        [(header::CONTENT_TYPE, "application/json")],
        state.list_body,
    )
}

async fn handle_create(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    record(&state, format!("POST /events [{content_type}] {body}"));
    state.create_status
}

async fn handle_subscribe(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    record(&state, format!("POST /subscribe [{content_type}] {body}"));
    state.subscribe_status
}

async fn spawn_events_server(state: ServerState) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/events", get(handle_list).post(handle_create))
        .route("/subscribe", post(handle_subscribe))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

struct JournalView {
    journal: Journal,
    rendered: RefCell<Vec<String>>,
}

impl EventView for JournalView {
    fn render_events(&self, lines: &[String]) {
        self.journal
            .lock()
            .expect("journal")
            .push(format!("render {}", lines.len()));
        *self.rendered.borrow_mut() = lines.to_vec();
    }

    fn alert(&self, message: &str) {
        self.journal
            .lock()
            .expect("journal")
            .push(format!("alert {message}"));
    }

    fn reset_form(&self, form: FormKind) {
        self.journal
            .lock()
            .expect("journal")
            .push(format!("reset {}", form.element_id()));
    }
}

fn journal_controller(
    base_url: String,
    journal: &Journal,
) -> ViewController<HttpEventsApi, JournalView> {
    ViewController::new(
        HttpEventsApi::new(ApiConfig::new(base_url)),
        JournalView {
            journal: journal.clone(),
            rendered: RefCell::new(Vec::new()),
        },
    )
}

#[test]
fn config_joins_routes_onto_base() {
    assert_eq!(
        ApiConfig::new("https://api.example.com/").endpoint("/events"),
        "https://api.example.com/events"
    );
    assert_eq!(
        ApiConfig::new("https://api.example.com/prod").endpoint("/subscribe"),
        "https://api.example.com/prod/subscribe"
    );
    assert_eq!(ApiConfig::same_origin().endpoint("/events"), "/events");
}

#[tokio::test]
async fn lists_events_over_http() {
    let journal = Journal::default();
    let base_url = spawn_events_server(ServerState::new(journal.clone())).await;
    let api = HttpEventsApi::new(ApiConfig::new(base_url));

    let list = api.list_events().await.expect("list");

    assert_eq!(list.render_lines(), vec!["Launch - 2024-01-01 @ HQ"]);
}

#[tokio::test]
async fn non_success_list_status_is_an_error() {
    let journal = Journal::default();
    let mut state = ServerState::new(journal.clone());
    state.list_status = StatusCode::INTERNAL_SERVER_ERROR;
    state.list_body = r#"{"error":"boom"}"#;
    let base_url = spawn_events_server(state).await;
    let api = HttpEventsApi::new(ApiConfig::new(base_url));

    let err = api.list_events().await.expect_err("must fail");

    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
}

#[tokio::test]
async fn non_json_list_body_is_a_decode_error() {
    let journal = Journal::default();
    let mut state = ServerState::new(journal.clone());
    state.list_body = "<html>oops</html>";
    let base_url = spawn_events_server(state).await;
    let api = HttpEventsApi::new(ApiConfig::new(base_url));

    let err = api.list_events().await.expect_err("must fail");

    assert!(matches!(err, ClientError::Decode { .. }), "got {err}");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let api = HttpEventsApi::new(ApiConfig::new(format!("http://{addr}")));

    let err = api.list_events().await.expect_err("must fail");

    assert!(matches!(err, ClientError::Transport { .. }), "got {err}");
}

#[tokio::test]
async fn create_flow_over_http_is_post_then_get_then_reset() {
    let journal = Journal::default();
    let base_url = spawn_events_server(ServerState::new(journal.clone())).await;
    let controller = journal_controller(base_url, &journal);
    let payload: FormPayload = [("title", "Launch"), ("date", "2024-01-01"), ("location", "HQ")]
        .into_iter()
        .collect();

    let outcome = controller.create_event(&payload).await.expect("create");

    assert_eq!(outcome, SubmitOutcome::Accepted(StatusCode::CREATED));
    assert_eq!(
        *journal.lock().expect("journal"),
        vec![
            r#"POST /events [application/json] {"title":"Launch","date":"2024-01-01","location":"HQ"}"#,
            "GET /events",
            "render 1",
            "reset eventForm",
        ]
    );
    assert_eq!(
        *controller.view().rendered.borrow(),
        vec!["Launch - 2024-01-01 @ HQ"]
    );
}

#[tokio::test]
async fn rejected_create_over_http_alerts_before_reload() {
    let journal = Journal::default();
    let mut state = ServerState::new(journal.clone());
    state.create_status = StatusCode::BAD_REQUEST;
    let base_url = spawn_events_server(state).await;
    let controller = journal_controller(base_url, &journal);

    controller
        .create_event(&FormPayload::new())
        .await
        .expect("create flow completes");

    assert_eq!(
        *journal.lock().expect("journal"),
        vec![
            "POST /events [application/json] {}",
            "alert Failed to create event",
            "GET /events",
            "render 1",
            "reset eventForm",
        ]
    );
}

#[tokio::test]
async fn subscription_over_http_confirms_only_on_success() {
    let journal = Journal::default();
    let base_url = spawn_events_server(ServerState::new(journal.clone())).await;
    let controller = journal_controller(base_url, &journal);
    let payload: FormPayload = [("email", "alice@example.com")].into_iter().collect();

    controller.subscribe(&payload).await.expect("subscribe");

    assert_eq!(
        *journal.lock().expect("journal"),
        vec![
            r#"POST /subscribe [application/json] {"email":"alice@example.com"}"#,
            "alert Check your email to confirm subscription",
        ]
    );

    let rejected_journal = Journal::default();
    let mut state = ServerState::new(rejected_journal.clone());
    state.subscribe_status = StatusCode::INTERNAL_SERVER_ERROR;
    let base_url = spawn_events_server(state).await;
    let controller = journal_controller(base_url, &rejected_journal);

    let outcome = controller.subscribe(&payload).await.expect("subscribe");

    assert!(!outcome.is_accepted());
    assert_eq!(rejected_journal.lock().expect("journal").len(), 1);
}
