/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Health Check Module
//!
//! HTTP endpoints used by Kubernetes probes and Prometheus.
//!
//! ## Endpoints
//!
//! - `GET /healthz`: liveness, 200 while the process runs
//! - `GET /readyz`: readiness, 200 when the database answers, 503 otherwise
//! - `GET /health`: JSON status with database state, uptime and version
//! - `GET /metrics`: Prometheus text exposition

use crate::db::ConnectionPool;
use crate::metrics;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use gitops_utils::logging::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Something that can tell whether the service's backing store is reachable.
pub trait ReadinessProbe: Send + Sync {
    fn check(&self) -> Result<(), String>;
}

impl ReadinessProbe for ConnectionPool {
    fn check(&self) -> Result<(), String> {
        self.ping().map_err(|e| e.to_string())
    }
}

/// Shared state for health endpoints
#[derive(Clone)]
pub struct HealthState {
    pub database: Arc<dyn ReadinessProbe>,
    pub start_time: Instant,
}

impl HealthState {
    pub fn new(database: Arc<dyn ReadinessProbe>) -> Self {
        Self {
            database,
            start_time: Instant::now(),
        }
    }

    async fn check_database(&self) -> Result<(), String> {
        let probe = self.database.clone();
        tokio::task::spawn_blocking(move || probe.check())
            .await
            .map_err(|e| format!("readiness check panicked: {}", e))?
    }
}

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    database: DatabaseStatus,
    uptime_seconds: u64,
    version: String,
    timestamp: String,
}

#[derive(Serialize)]
struct DatabaseStatus {
    connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Configures and returns the health check router
pub fn configure_health_routes(state: HealthState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readyz(State(state): State<HealthState>) -> impl IntoResponse {
    match state.check_database().await {
        Ok(()) => (StatusCode::OK, "Ready"),
        Err(e) => {
            error!("Database readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Database unavailable")
        }
    }
}

async fn health(State(state): State<HealthState>) -> impl IntoResponse {
    let (connected, error) = match state.check_database().await {
        Ok(()) => (true, None),
        Err(e) => (false, Some(e)),
    };
    let status_code = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let status = HealthStatus {
        status: if connected { "healthy" } else { "unhealthy" }.to_string(),
        database: DatabaseStatus { connected, error },
        uptime_seconds: state.start_time.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    (status_code, Json(status))
}

async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        metrics::encode_metrics(),
    )
}
