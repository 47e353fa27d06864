use std::{net::SocketAddr, str::FromStr, sync::Arc};

use anyhow::Context;
use arbiter::{ControlSurface, SurfaceError};
use axum::{
    extract::{Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use shared::{
    domain::{WorkerKind, WorkerModes},
    error::{ApiError, ErrorCode},
    protocol::{
        PvReading, ReleaseResponse, ServerEvent, SurfaceSnapshot, WriteOutcome, WriteRequest,
        WriteResponse,
    },
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, validate_settings};

const MAX_WRITE_BODY_BYTES: usize = 64 * 1024;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    validate_settings(&settings)?;
    let surface = ControlSurface::new(settings.surface_config()).map_err(|error| {
        error!(%error, "failed to build control surface");
        error
    })?;
    info!(
        max_length = settings.orbit_max_length,
        n_samples = settings.orbit_n_samples,
        "control surface ready"
    );

    let state = AppState::new(surface, settings.event_capacity);
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address {}", settings.server_bind))?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/pvs", get(http_snapshot))
        .route("/pvs/:name", get(http_read_pv).put(http_write_pv))
        .route("/workers", get(http_workers))
        .route("/workers/:worker/release", post(http_release_worker))
        .route("/ws", get(ws_handler))
        .layer(RequestBodyLimitLayer::new(MAX_WRITE_BODY_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_snapshot(State(state): State<Arc<AppState>>) -> Json<SurfaceSnapshot> {
    Json(state.surface.lock().await.snapshot())
}

async fn http_workers(State(state): State<Arc<AppState>>) -> Json<WorkerModes> {
    Json(state.surface.lock().await.modes())
}

async fn http_read_pv(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<PvReading>> {
    let value = state.surface.lock().await.read(&name).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ApiError::new(
                ErrorCode::NotFound,
                format!("{name} has no value"),
            )),
        )
    })?;
    Ok(Json(PvReading { name, value }))
}

async fn http_write_pv(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<WriteRequest>,
) -> ApiResult<Json<WriteResponse>> {
    let (report, workers) = {
        let mut surface = state.surface.lock().await;
        let report = surface
            .write(&name, req.value.clone())
            .map_err(surface_error)?;
        (report, surface.modes())
    };

    let at = Utc::now();
    match report.outcome {
        WriteOutcome::Rejected => {
            if let Some(code) = report.error_code {
                let _ = state.events.send(ServerEvent::WriteRejected {
                    name: name.clone(),
                    code,
                    at,
                });
            }
        }
        WriteOutcome::Applied => {
            let _ = state.events.send(ServerEvent::PvWritten {
                name: name.clone(),
                value: req.value,
                at,
            });
            if report.interrupted {
                let _ = state.events.send(ServerEvent::MeasurementInterrupted { at });
            }
            let _ = state.events.send(ServerEvent::ModesChanged { workers });
        }
        WriteOutcome::PassedThrough => {
            let _ = state.events.send(ServerEvent::PvWritten {
                name: name.clone(),
                value: req.value,
                at,
            });
        }
    }

    Ok(Json(report.into_response(name)))
}

async fn http_release_worker(
    State(state): State<Arc<AppState>>,
    Path(worker): Path<String>,
) -> ApiResult<Json<ReleaseResponse>> {
    let worker = WorkerKind::from_str(&worker).map_err(|e| {
        (
            StatusCode::NOT_FOUND,
            Json(ApiError::new(ErrorCode::NotFound, e.to_string())),
        )
    })?;

    let (promoted, workers) = {
        let mut surface = state.surface.lock().await;
        let promoted = surface.release(worker);
        (promoted, surface.modes())
    };
    let _ = state.events.send(ServerEvent::ModesChanged { workers });

    Ok(Json(ReleaseResponse {
        worker,
        workers,
        promoted,
    }))
}

fn surface_error(err: SurfaceError) -> (StatusCode, Json<ApiError>) {
    let (status, code) = match err {
        SurfaceError::InvalidValue { .. } => (StatusCode::BAD_REQUEST, ErrorCode::Validation),
        SurfaceError::ReadOnly(_) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
        SurfaceError::InvalidConfig(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Internal)
        }
    };
    (status, Json(ApiError::new(code, err.to_string())))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, socket: axum::extract::ws::WebSocket) {
    use axum::extract::ws::Message;
    use futures::{SinkExt, StreamExt};

    let (mut sender, mut receiver) = socket.split();
    let mut events_rx = state.events.subscribe();

    let send_task = tokio::spawn(async move {
        while let Ok(event) = events_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
