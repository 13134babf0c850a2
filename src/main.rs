use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use jobscout::core::app_state::ensure_engine;
use jobscout::records::{self, StoredJob};
use jobscout::types::*;
use jobscout::{AppState, EngineError};

fn parse_port_from_args() -> Option<u16> {
    let mut args = std::env::args().peekable();
    while let Some(a) = args.next() {
        if a == "--port" {
            if let Some(v) = args.next() {
                if let Ok(p) = v.parse::<u16>() {
                    return Some(p);
                }
            }
        } else if let Some(rest) = a.strip_prefix("--port=") {
            if let Ok(p) = rest.parse::<u16>() {
                return Some(p);
            }
        }
    }
    None
}

fn port_from_env() -> Option<u16> {
    for k in ["JOBSCOUT_PORT", "PORT"] {
        if let Ok(v) = std::env::var(k) {
            if let Ok(p) = v.trim().parse::<u16>() {
                return Some(p);
            }
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=warn"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    info!("Starting jobscout API");

    let config = jobscout::core::config::load_config();
    let state = Arc::new(AppState::new(config));

    let app = Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/api/auth", post(auth_handler))
        .route("/api/user-info", get(user_info_handler))
        .route("/api/scrape-jobs", post(scrape_jobs_handler))
        .route("/api/jobs", get(list_jobs_handler).delete(clear_jobs_handler))
        .route("/api/jobs/export-csv", get(export_csv_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let port: u16 = parse_port_from_args().or_else(port_from_env).unwrap_or(8000);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            anyhow::bail!(
                "Address already in use: {}. Stop the existing process or run with --port {} (or set PORT/JOBSCOUT_PORT).",
                bind_addr,
                port.saturating_add(1)
            )
        }
        Err(e) => return Err(e.into()),
    };
    info!("jobscout API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await?;

    Ok(())
}

async fn shutdown_signal(state: Arc<AppState>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).ok();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = async {
                if let Some(ref mut s) = sigterm {
                    s.recv().await;
                } else {
                    futures::future::pending::<()>().await;
                }
            } => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    // Scoped teardown: release the browsing surface on every exit path.
    if let Some(engine) = state.engine.lock().await.take() {
        engine.close().await;
    }
    info!("Shutdown complete");
}

fn engine_error_response(e: EngineError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &e {
        EngineError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        EngineError::BrowserInit(_) | EngineError::Navigation(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse { error: e.to_string() }))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "jobscout",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// `POST /api/auth` — the three auth actions. Anything else is a
/// client-input error, rejected before the browser is touched.
async fn auth_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AuthRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    match request.action.as_str() {
        "check_status" | "login" | "logout" => {}
        other => {
            return Err(engine_error_response(EngineError::InvalidInput(format!(
                "invalid action '{}'. Valid actions are: check_status, login, logout",
                other
            ))))
        }
    }

    let mut slot = state.engine.lock().await;
    let engine = ensure_engine(&mut slot, state.config.clone())
        .await
        .map_err(engine_error_response)?;

    let result = match request.action.as_str() {
        "check_status" => engine
            .status_report()
            .await
            .map(|r| serde_json::to_value(r).unwrap_or_default()),
        "login" => engine.login().await.map(|outcome| {
            serde_json::json!({
                "success": outcome.success,
                "logged_in": outcome.success,
                "message": outcome.message,
                "user": outcome.user,
            })
        }),
        "logout" => engine
            .logout()
            .await
            .map(|r| serde_json::to_value(r).unwrap_or_default()),
        _ => unreachable!("validated above"),
    };

    match result {
        Ok(value) => Ok(Json(value)),
        Err(e) => {
            error!("auth action '{}' failed: {}", request.action, e);
            Err(engine_error_response(e))
        }
    }
}

/// `GET /api/user-info` — requires a fresh authoritative LoggedIn state.
async fn user_info_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let mut slot = state.engine.lock().await;
    let engine = ensure_engine(&mut slot, state.config.clone())
        .await
        .map_err(engine_error_response)?;

    match engine.user_info().await {
        Ok(user) => Ok(Json(serde_json::json!({ "success": true, "user": user }))),
        Err(e) => Err(engine_error_response(e)),
    }
}

/// `POST /api/scrape-jobs` — one bounded extraction run; successful records
/// are handed to the record store before the response goes out.
async fn scrape_jobs_handler(
    State(state): State<Arc<AppState>>,
    Json(filter): Json<JobFilter>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let outcome = {
        let mut slot = state.engine.lock().await;
        let engine = ensure_engine(&mut slot, state.config.clone())
            .await
            .map_err(engine_error_response)?;
        engine
            .scrape_jobs(&filter)
            .await
            .map_err(engine_error_response)?
    };

    if !outcome.success {
        warn!("scrape run failed: {}", outcome.message);
        return Ok(Json(serde_json::json!({
            "success": false,
            "message": outcome.message,
            "jobs": [],
            "total_found": 0,
        })));
    }

    let stored: Vec<StoredJob> = outcome
        .jobs
        .into_iter()
        .map(StoredJob::from_listing)
        .collect();
    let total = stored.len();
    state.records.insert_many(stored.clone());

    Ok(Json(serde_json::json!({
        "success": true,
        "message": outcome.message,
        "jobs": stored,
        "total_found": total,
    })))
}

#[derive(Debug, Deserialize)]
struct JobsQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

async fn list_jobs_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<JobsQuery>,
) -> Json<serde_json::Value> {
    let limit = q.limit.unwrap_or(100);
    let offset = q.offset.unwrap_or(0);
    let jobs = state.records.page(limit, offset);
    Json(serde_json::json!({
        "success": true,
        "jobs": jobs,
        "total": state.records.len(),
        "offset": offset,
        "limit": limit,
    }))
}

async fn export_csv_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let jobs = state.records.all();
    if jobs.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No jobs found to export".to_string(),
            }),
        ));
    }

    let csv = records::to_csv(&jobs);
    let filename = format!("jobs_{}.csv", chrono::Utc::now().format("%Y%m%d_%H%M%S"));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    ))
}

async fn clear_jobs_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let deleted = state.records.clear();
    Json(serde_json::json!({
        "success": true,
        "message": format!("Deleted {} jobs", deleted),
    }))
}
