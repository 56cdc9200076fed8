use std::{net::SocketAddr, path::Path, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use shared::{
    domain::EventList,
    error::ApiError,
    protocol::{
        EventCreatedResponse, SubscriptionResponse, EVENTS_ROUTE, HEALTHZ_ROUTE, SUBSCRIBE_ROUTE,
    },
};
use storage::Storage;
use tower_http::{
    limit::RequestBodyLimitLayer, services::ServeDir, set_header::SetResponseHeaderLayer,
};
use tracing::{error, info, warn};

mod api;
mod config;
mod notify;

use api::ApiContext;
use config::{load_settings, normalize_database_url, Settings};
use notify::SubscriberLogNotifier;

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

/// Headers stamped on every response, errors included.
#[derive(Debug, Clone)]
struct CorsHeaders {
    allow_origin: HeaderValue,
    allow_credentials: bool,
}

impl CorsHeaders {
    fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let allow_origin = settings.allow_origin();
        Ok(Self {
            allow_credentials: allow_origin != "*",
            allow_origin: HeaderValue::from_str(&allow_origin)?,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext {
        storage: storage.clone(),
        notifier: Arc::new(SubscriberLogNotifier::new(storage)),
        email_subject: settings.email_subject.clone(),
    };

    let cors = CorsHeaders::from_settings(&settings)?;
    let app = build_router(
        Arc::new(AppState { api }),
        &cors,
        settings.static_dir.as_deref().map(Path::new),
    );

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, allow_origin = ?cors.allow_origin, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, cors: &CorsHeaders, static_dir: Option<&Path>) -> Router {
    let mut router = Router::new()
        .route(HEALTHZ_ROUTE, get(healthz))
        .route(
            EVENTS_ROUTE,
            get(http_list_events)
                .post(http_create_event)
                .options(preflight),
        )
        .route(SUBSCRIBE_ROUTE, post(http_subscribe).options(preflight))
        .with_state(state);

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router = router
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            cors.allow_origin.clone(),
        ));
    if cors.allow_credentials {
        router = router.layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        ));
    }
    router
}

fn error_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status =
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(%status, error = %err.message, "request failed");
    } else {
        warn!(%status, error = %err.message, "request rejected");
    }
    (status, Json(err))
}

async fn healthz(
    State(state): State<Arc<AppState>>,
) -> Result<&'static str, (StatusCode, Json<ApiError>)> {
    state
        .api
        .storage
        .health_check()
        .await
        .map_err(|e| error_response(ApiError::internal(e.to_string())))?;
    Ok("ok")
}

async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
}

async fn http_list_events(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EventList>, (StatusCode, Json<ApiError>)> {
    let events = api::list_events(&state.api).await.map_err(error_response)?;
    Ok(Json(EventList { events }))
}

async fn http_create_event(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<EventCreatedResponse>), (StatusCode, Json<ApiError>)> {
    let event = api::create_event(&state.api, &body)
        .await
        .map_err(error_response)?;
    Ok((
        StatusCode::CREATED,
        Json(EventCreatedResponse {
            message: "Event created".into(),
            event,
        }),
    ))
}

async fn http_subscribe(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<SubscriptionResponse>), (StatusCode, Json<ApiError>)> {
    let subscription_id = api::subscribe(&state.api, &body)
        .await
        .map_err(error_response)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(SubscriptionResponse {
            message: "Subscription pending confirmation".into(),
            subscription_id,
        }),
    ))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
