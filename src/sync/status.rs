// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared status state between the engine and the health surface.
//!
//! The publisher is the read side of the engine: the engine writes one
//! summary per pass, watch tasks flip the readiness flags, and the HTTP
//! handlers serialize a point-in-time document. Only a clean pass advances
//! `lastSuccessfulSyncAt`.

use crate::model::{PassOutcome, PassReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct StatusInner {
    observer_synced: bool,
    zones: Vec<String>,
    last_pass: Option<PassReport>,
    last_successful_sync_at: Option<DateTime<Utc>>,
}

/// Read-only observable state of the controller.
#[derive(Debug, Default)]
pub struct StatusPublisher {
    inner: RwLock<StatusInner>,
}

/// JSON document served by the status endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDocument {
    /// `starting` | `healthy` | `degraded` | `unhealthy`
    pub status: String,
    pub service: &'static str,
    pub last_successful_sync_at: Option<String>,
    pub last_pass_at: Option<String>,
    pub last_outcome: Option<PassOutcome>,
    pub zone_count: usize,
    pub zones: Vec<String>,
    pub active_spec_count: usize,
    pub eligible_node_count: usize,
    pub records_created_last_pass: usize,
    pub records_deleted_last_pass: usize,
    pub operations_failed_last_pass: usize,
    pub errors: Vec<String>,
}

impl StatusPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a finished pass.
    pub async fn publish_pass(&self, report: &PassReport) {
        let mut inner = self.inner.write().await;
        if report.outcome == PassOutcome::Clean {
            inner.last_successful_sync_at = Some(report.started_at);
        }
        inner.last_pass = Some(report.clone());
    }

    /// Update the known zone list shown in the status document.
    pub async fn set_zones(&self, zones: Vec<String>) {
        self.inner.write().await.zones = zones;
    }

    /// Mark the observer's initial synchronization as complete.
    pub async fn set_observer_synced(&self) {
        self.inner.write().await.observer_synced = true;
    }

    /// Readiness: initial observer sync complete AND zone list populated.
    pub async fn ready(&self) -> bool {
        let inner = self.inner.read().await;
        inner.observer_synced && !inner.zones.is_empty()
    }

    pub async fn last_outcome(&self) -> Option<PassOutcome> {
        self.inner.read().await.last_pass.as_ref().map(|p| p.outcome)
    }

    pub async fn last_successful_sync_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.last_successful_sync_at
    }

    /// Serialize the current state for the HTTP surface.
    pub async fn document(&self) -> StatusDocument {
        let inner = self.inner.read().await;
        let last_pass = inner.last_pass.as_ref();

        let status = match last_pass.map(|p| p.outcome) {
            None => "starting",
            Some(PassOutcome::Clean) => "healthy",
            Some(PassOutcome::Partial) => "degraded",
            Some(PassOutcome::Failed) => "unhealthy",
        };

        StatusDocument {
            status: status.to_string(),
            service: "epictetus",
            last_successful_sync_at: inner.last_successful_sync_at.map(|t| t.to_rfc3339()),
            last_pass_at: last_pass.map(|p| p.started_at.to_rfc3339()),
            last_outcome: last_pass.map(|p| p.outcome),
            zone_count: inner.zones.len(),
            zones: inner.zones.clone(),
            active_spec_count: last_pass.map_or(0, |p| p.active_specs),
            eligible_node_count: last_pass.map_or(0, |p| p.eligible_nodes),
            records_created_last_pass: last_pass.map_or(0, |p| p.records_created),
            records_deleted_last_pass: last_pass.map_or(0, |p| p.records_deleted),
            operations_failed_last_pass: last_pass.map_or(0, |p| p.operations_failed),
            errors: last_pass.map_or_else(Vec::new, |p| p.errors.clone()),
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
