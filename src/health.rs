// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP status surface and internal self-health sampling.
//!
//! Endpoints:
//! - `GET /health`: full status document; 503 when the last pass failed
//! - `GET /health/ready`: 503 until the observer's initial sync is done
//!   and the zone cache is populated
//! - `GET /health/live`: 200 while the process is responsive
//! - `GET /metrics`: Prometheus text format
//!
//! The surface is read-only; it never mutates engine state.

use crate::constants::HEALTH_SERVER_BIND_ADDRESS;
use crate::metrics;
use crate::model::PassOutcome;
use crate::sync::status::{StatusDocument, StatusPublisher};
use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
struct AppState {
    status: Arc<StatusPublisher>,
}

/// Build the status router.
fn router(status: Arc<StatusPublisher>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .route("/health/live", get(live))
        .route("/metrics", get(metrics_text))
        .with_state(AppState { status })
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<StatusDocument>) {
    let code = if state.status.last_outcome().await == Some(PassOutcome::Failed) {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (code, Json(state.status.document().await))
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    if state.status.ready().await {
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "service": "epictetus",
                "timestamp": Utc::now().to_rfc3339(),
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "not_ready",
                "reason": "initial sync incomplete or no zones discovered",
                "service": "epictetus",
                "timestamp": Utc::now().to_rfc3339(),
            })),
        )
    }
}

async fn live() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "alive",
            "service": "epictetus",
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

async fn metrics_text() -> (StatusCode, String) {
    match metrics::gather_metrics() {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => {
            error!(error = %e, "failed to gather metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                String::from("# Error gathering metrics\n"),
            )
        }
    }
}

/// Serve the status surface until shutdown.
///
/// When `enabled` is false the task idles until shutdown so the supervisor
/// sees a uniform task set.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(
    enabled: bool,
    port: u16,
    status: Arc<StatusPublisher>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    if !enabled {
        info!("status server disabled by configuration");
        while !*shutdown.borrow() {
            if shutdown.changed().await.is_err() {
                break;
            }
        }
        return Ok(());
    }

    let bind_addr = format!("{HEALTH_SERVER_BIND_ADDRESS}:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("status server listening on http://{bind_addr}");

    axum::serve(listener, router(status))
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await?;

    Ok(())
}

/// Periodically sample the status snapshot and log degradation.
///
/// A warning fires when the last pass was not clean or when the last clean
/// pass is older than three sync intervals.
///
/// # Errors
///
/// Never fails; the `Result` keeps the task signature uniform.
pub async fn run_sampler(
    status: Arc<StatusPublisher>,
    interval: Duration,
    sync_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let staleness_limit = sync_interval * 3;

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return Ok(());
                }
            }
            () = tokio::time::sleep(interval) => {}
        }

        let document = status.document().await;
        let stale = status.last_successful_sync_at().await.is_some_and(|at| {
            Utc::now().signed_duration_since(at).num_seconds() > staleness_limit.as_secs() as i64
        });

        match document.last_outcome {
            Some(PassOutcome::Clean) if !stale => {
                debug!(status = %document.status, "self-health check passed");
            }
            None => {
                debug!("self-health check: no pass completed yet");
            }
            _ => {
                warn!(
                    status = %document.status,
                    last_successful_sync_at = ?document.last_successful_sync_at,
                    failed_operations = document.operations_failed_last_pass,
                    stale = stale,
                    "self-health check indicates degradation"
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod health_tests;
