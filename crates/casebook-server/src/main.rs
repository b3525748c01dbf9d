//! Casebook Server
//!
//! JSON API behind the business-case dashboard: clients, their business
//! cases, cost and revenue items, and item timing schedules.
//!
//! Persists to SQLite when a database URL is configured, otherwise keeps
//! everything in process memory.

mod config;
mod error;
mod extractors;
mod handlers;
mod services;
mod storage;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use casebook_core::ports::EntityStore;
use casebook_core::ItemKind;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::ServerConfig;
use error::ApiError;
use services::{CaseService, ClientService, ItemService, TimingService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub clients: Arc<ClientService>,
    pub cases: Arc<CaseService>,
    pub cost_items: Arc<ItemService>,
    pub revenue_items: Arc<ItemService>,
    pub cost_timing: Arc<TimingService>,
    pub revenue_timing: Arc<TimingService>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            clients: Arc::new(ClientService::new(store.clone())),
            cases: Arc::new(CaseService::new(store.clone())),
            cost_items: Arc::new(ItemService::new(store.clone(), ItemKind::Cost)),
            revenue_items: Arc::new(ItemService::new(store.clone(), ItemKind::Revenue)),
            cost_timing: Arc::new(TimingService::new(store.clone(), ItemKind::Cost)),
            revenue_timing: Arc::new(TimingService::new(store.clone(), ItemKind::Revenue)),
            store,
        }
    }
}

#[tokio::main]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    // Initialize tracing; RUST_LOG overrides the default filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("casebook_server=info,tower_http=info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting Casebook Server v{}", env!("CARGO_PKG_VERSION"));
    info!("PID: {}", std::process::id());

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    info!("Loading configuration...");
    let config = ServerConfig::load().context("Failed to load configuration")?;
    info!(
        "Config loaded: bind={}, database={}, static_dir={:?}",
        config.bind_address,
        if config.database_url.is_some() {
            "configured"
        } else {
            "none"
        },
        config.static_dir
    );

    let store = storage::connect(&config).await?;
    info!("Storage ready: {} backend", store.backend());

    let state = AppState::new(store);
    let app = build_router(state, config.static_dir.as_deref());

    let addr: SocketAddr = config
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Server ready to accept connections");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new().nest("/api", api_routes(&state));

    if let Some(dir) = static_dir {
        info!("Serving dashboard from: {}", dir.display());
        // SPA fallback - unknown paths outside /api serve index.html
        let index = ServeFile::new(dir.join("index.html"));
        app = app.fallback_service(ServeDir::new(dir).fallback(index));
    }

    app.layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

fn api_routes(state: &AppState) -> Router<AppState> {
    use handlers::{cases, clients, items, timing};

    Router::new()
        .route("/health", get(handlers::health))
        .route("/clients", get(clients::list).post(clients::create))
        .route(
            "/clients/:id",
            get(clients::get).put(clients::update).delete(clients::delete),
        )
        .route("/cases", get(cases::list).post(cases::create))
        .route(
            "/cases/:id",
            get(cases::get).put(cases::update).delete(cases::delete),
        )
        .nest("/cost-items", items::routes(state.cost_items.clone()))
        .nest("/revenue-items", items::routes(state.revenue_items.clone()))
        .nest("/cost-timing", timing::routes(state.cost_timing.clone()))
        .nest("/revenue-timing", timing::routes(state.revenue_timing.clone()))
        .fallback(api_not_found)
}

async fn api_not_found() -> ApiError {
    ApiError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Database, MemoryStore};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn memory_app() -> Router {
        build_router(AppState::new(Arc::new(MemoryStore::new())), None)
    }

    async fn send_raw(app: &Router, method: &str, uri: &str, body: Option<String>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(text) => {
                builder = builder.header("content-type", "application/json");
                Body::from(text)
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        send_raw(app, method, uri, body.map(|b| b.to_string())).await
    }

    #[tokio::test]
    async fn test_health_reports_backend() {
        let (status, body) = send(&memory_app(), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true, "db": false }));

        let db = Database::in_memory().await.unwrap();
        let app = build_router(AppState::new(Arc::new(db)), None);
        let (status, body) = send(&app, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true, "db": true }));
    }

    #[tokio::test]
    async fn test_dashboard_flow() {
        let app = memory_app();

        let (status, body) = send(&app, "POST", "/api/clients", Some(json!({ "name": "Acme" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        let client_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            "/api/cases",
            Some(json!({
                "client_id": client_id,
                "title": "Migration",
                "status": "Active",
                "duration_unit": "quarters",
                "tags": ["q1", "infra", "q1"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let case_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "GET", &format!("/api/cases/{case_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["client_name"], "Acme");
        assert_eq!(body["data"]["tags"], json!(["infra", "q1"]));
        assert_eq!(body["data"]["status"], "Active");
        assert_eq!(body["data"]["duration_unit"], "quarters");

        let (status, body) = send(
            &app,
            "POST",
            "/api/cost-items",
            Some(json!({ "case_id": case_id, "name": "Licences", "amount": 19.99 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["amount"], "19.99");
        let item_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            "/api/cost-timing",
            Some(json!({ "cost_item_id": item_id, "start_date": "2025-01-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["cost_item_id"], item_id.as_str());
        assert_eq!(body["data"]["start_date"], "2025-01-01");

        let (_, body) = send(
            &app,
            "GET",
            &format!("/api/cost-timing?cost_item_id={item_id}"),
            None,
        )
        .await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (_, body) = send(&app, "GET", &format!("/api/cost-items?case_id={case_id}"), None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, body) = send(&app, "DELETE", &format!("/api/clients/{client_id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (status, body) = send(&app, "GET", &format!("/api/cases/{case_id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not found" }));

        let (_, body) = send(&app, "GET", "/api/cost-items", None).await;
        assert_eq!(body, json!({ "data": [] }));
    }

    #[tokio::test]
    async fn test_validation_errors_are_400() {
        let app = memory_app();

        let (status, body) = send(&app, "POST", "/api/clients", Some(json!({ "notes": "x" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "name is required" }));

        let (status, body) = send(&app, "POST", "/api/cases", Some(json!({ "title": "T" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "client_id and title are required");

        let (status, body) = send(&app, "POST", "/api/revenue-timing", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "revenue_item_id is required");

        let (status, body) =
            send_raw(&app, "POST", "/api/clients", Some("{not json".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_integrity_errors_are_400_on_both_backends() {
        let db = Database::in_memory().await.unwrap();
        for app in [memory_app(), build_router(AppState::new(Arc::new(db)), None)] {
            let (status, body) = send(
                &app,
                "POST",
                "/api/cases",
                Some(json!({ "client_id": "missing", "title": "Ghost" })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["error"].is_string());

            let (_, body) = send(&app, "GET", "/api/cases", None).await;
            assert_eq!(body, json!({ "data": [] }));
        }
    }

    #[tokio::test]
    async fn test_invalid_status_update_is_rejected() {
        let app = memory_app();
        let (_, body) = send(&app, "POST", "/api/clients", Some(json!({ "name": "Acme" }))).await;
        let client_id = body["data"]["id"].as_str().unwrap().to_string();
        let (_, body) = send(
            &app,
            "POST",
            "/api/cases",
            Some(json!({ "client_id": client_id, "title": "Migration" })),
        )
        .await;
        let case_id = body["data"]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/cases/{case_id}");
        let (status, _) = send(&app, "PUT", &uri, Some(json!({ "status": "Done" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(body["data"]["status"], "Planning");
    }

    #[tokio::test]
    async fn test_exact_numbers_and_case_delete_on_both_backends() {
        let db = Database::in_memory().await.unwrap();
        for app in [memory_app(), build_router(AppState::new(Arc::new(db)), None)] {
            let (_, body) = send(&app, "POST", "/api/clients", Some(json!({ "name": "Acme" }))).await;
            let client_id = body["data"]["id"].as_str().unwrap().to_string();

            let (status, body) = send_raw(
                &app,
                "POST",
                "/api/cases",
                Some(format!(
                    r#"{{"client_id": "{client_id}", "title": "Pilot", "duration_value": 1.5, "tags": ["q1"]}}"#
                )),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["data"]["duration_value"], json!(1.5));
            let case_id = body["data"]["id"].as_str().unwrap().to_string();

            let (status, body) = send_raw(
                &app,
                "POST",
                "/api/revenue-items",
                Some(format!(
                    r#"{{"case_id": "{case_id}", "name": "Fleet", "amount": 1234567890123.4567}}"#
                )),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["data"]["amount"], "1234567890123.4567");
            let item_id = body["data"]["id"].as_str().unwrap().to_string();

            let (_, body) = send(&app, "GET", &format!("/api/revenue-items/{item_id}"), None).await;
            assert_eq!(body["data"]["amount"], "1234567890123.4567");

            let (status, _) = send(&app, "DELETE", &format!("/api/cases/{case_id}"), None).await;
            assert_eq!(status, StatusCode::NO_CONTENT);
            let (status, _) = send(&app, "DELETE", &format!("/api/cases/{case_id}"), None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);

            let (status, _) = send(&app, "GET", &format!("/api/revenue-items/{item_id}"), None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            let (_, body) = send(&app, "GET", &format!("/api/cases?client_id={client_id}"), None).await;
            assert_eq!(body["data"], json!([]));
        }
    }

    #[tokio::test]
    async fn test_missing_records_are_404() {
        let app = memory_app();

        let (status, body) = send(&app, "DELETE", "/api/clients/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not found" }));

        let (status, _) = send(
            &app,
            "PUT",
            "/api/revenue-items/nope",
            Some(json!({ "name": "Renamed" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, "GET", "/api/no-such-route", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not found" }));
    }

    #[tokio::test]
    async fn test_static_dir_serves_index_fallback() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("index.html"), "<html>casebook</html>").unwrap();
        let app = build_router(
            AppState::new(Arc::new(MemoryStore::new())),
            Some(temp_dir.path()),
        );

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/cases/123").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"<html>casebook</html>");

        let (status, _) = send(&app, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
