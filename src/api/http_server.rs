// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::analyze::analyze_handler;
use crate::config::Settings;
use crate::service::MarketplaceSearchService;
use crate::version;

/// Room for multipart framing on top of the upload limit
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub search_service: Arc<MarketplaceSearchService>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(search_service: MarketplaceSearchService, settings: Settings) -> Self {
        Self {
            search_service: Arc::new(search_service),
            settings: Arc::new(settings),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let body_limit = state
        .settings
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let max_concurrent = state.settings.max_concurrent_uploads;

    Router::new()
        .route("/", get(root_handler))
        // Health check
        .route("/health", get(health_handler))
        // Photo analysis
        .route(
            "/api/analyze",
            post(analyze_handler).layer(ConcurrencyLimitLayer::new(max_concurrent)),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr = state.settings.listen_addr().parse::<SocketAddr>()?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down Photo to Marketplace Search API...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "message": "Photo to Marketplace Search API",
        "version": version::VERSION_NUMBER,
        "analyze": "/api/analyze",
    }))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": version::VERSION_NUMBER,
        "link_validation": state.search_service.validation_enabled(),
    }))
}
