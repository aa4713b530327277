//! Application state and router assembly.
//!
//! State is constructed once at startup and injected into handlers;
//! keeping the router here (rather than in `main`) lets the integration
//! tests drive the exact same wiring over a real listener.

use crate::api::{products, users};
use crate::auth::{self, authenticate, require_admin, TokenService};
use crate::config::Config;
use crate::realtime::{self, ChangeNotifier};
use crate::store::{ProductStore, UserStore};
use anyhow::Result;
use axum::{
    body::Body,
    extract::{FromRef, Request},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserStore>,
    pub products: Arc<ProductStore>,
    pub tokens: Arc<TokenService>,
    pub notifier: ChangeNotifier,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            users: Arc::new(UserStore::new(&config.db_path, &config.admin_password)?),
            products: Arc::new(ProductStore::new(&config.db_path)?),
            tokens: Arc::new(TokenService::new(&config.jwt_secret, config.token_ttl)),
            notifier: ChangeNotifier::new(256),
        })
    }
}

impl FromRef<AppState> for ChangeNotifier {
    fn from_ref(state: &AppState) -> Self {
        state.notifier.clone()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// GET /api/health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Server is running".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Endpoint not found" })),
    )
        .into_response()
}

/// Log method, path, status, and latency for every request.
async fn request_logging(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    // Skip health checks to reduce noise.
    if path == "/api/health" {
        return next.run(request).await;
    }

    let start = Instant::now();
    let response = next.run(request).await;
    let latency = start.elapsed();
    let status = response.status().as_u16();

    if status >= 500 {
        warn!(
            method = %method,
            path = %path,
            status = status,
            latency_ms = latency.as_millis(),
            "Request failed (5xx)"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status = status,
            latency_ms = latency.as_millis(),
            "Request completed"
        );
    }

    response
}

/// Assemble the full application router.
pub fn build_router(state: AppState) -> Router {
    // Public: health, login, product reads, and the change-event socket.
    let public_routes = Router::new()
        .route("/api/health", get(health))
        .route("/api/auth", post(auth::api::login))
        .route("/api/products", get(products::list_products))
        .route("/api/products/:id", get(products::get_product))
        .route("/ws", get(realtime::ws_handler))
        .with_state(state.clone());

    // Bearer token required, any role.
    let authed_routes = Router::new()
        .route("/api/auth/me", get(auth::api::me))
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            authenticate,
        ))
        .with_state(state.clone());

    // Bearer token + admin role.
    let admin_routes = Router::new()
        .route("/api/products", post(products::create_product))
        .route(
            "/api/products/:id",
            axum::routing::put(products::update_product).delete(products::delete_product),
        )
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            authenticate,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(authed_routes)
        .merge(admin_routes)
        .fallback(not_found)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

/// Bind and serve until shutdown.
pub async fn serve(router: Router, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);
    axum::serve(listener, router).await?;
    Ok(())
}
