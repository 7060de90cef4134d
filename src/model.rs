// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Core data model for the controller.
//!
//! These types flow between the cluster observer, the desired-state builder,
//! and the reconciliation engine. The uniqueness key for a managed A record
//! is `(hostname, ipv4)`; TTL and proxied are non-key attributes healed by
//! delete-then-create.

use crate::constants::{TAINT_DELETION_CANDIDATE, TAINT_TO_BE_DELETED};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Observed state of one cluster node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeState {
    /// Node name (unique within the cluster)
    pub name: String,
    /// External IPv4 address, when the node advertises one
    pub external_ipv4: Option<Ipv4Addr>,
    /// Keys of all taints currently on the node
    pub taints: BTreeSet<String>,
}

impl NodeState {
    /// Whether this node should receive DNS records.
    ///
    /// A node is eligible iff it has an external IPv4 address and is NOT
    /// marked with both autoscaler deletion taints at once. A single
    /// deletion taint does not disqualify: the autoscaler marks candidates
    /// speculatively and often backs off.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.external_ipv4.is_some() && !self.has_both_deletion_taints()
    }

    /// Whether both autoscaler deletion taints are present simultaneously.
    #[must_use]
    pub fn has_both_deletion_taints(&self) -> bool {
        self.taints.contains(TAINT_DELETION_CANDIDATE) && self.taints.contains(TAINT_TO_BE_DELETED)
    }
}

/// Reference to the Service a hostname spec came from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServiceRef {
    pub namespace: String,
    pub name: String,
}

impl fmt::Display for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Validated DNS configuration of one annotated Service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostnameSpec {
    /// Normalized FQDN (lowercased, trailing dot stripped)
    pub hostname: String,
    /// Record TTL in seconds
    pub ttl: u32,
    /// Whether created records are proxied through the provider
    pub proxied: bool,
    /// The Service that declared this hostname
    pub owner: ServiceRef,
}

/// A DNS zone the credential has access to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Opaque provider-assigned zone id
    pub id: String,
    /// Zone apex, e.g. `example.com`
    pub name: String,
}

/// An A record that should exist, derived from cluster state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DesiredRecord {
    pub hostname: String,
    pub ipv4: Ipv4Addr,
    pub ttl: u32,
    pub proxied: bool,
    /// Zone owning `hostname`, resolved by longest-suffix match
    pub zone_id: String,
}

impl DesiredRecord {
    /// Uniqueness key within the controller's scope.
    #[must_use]
    pub fn key(&self) -> (&str, Ipv4Addr) {
        (&self.hostname, self.ipv4)
    }
}

/// An A record that exists at the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualRecord {
    /// Provider-assigned record id, required for deletion
    pub provider_id: String,
    pub hostname: String,
    pub ipv4: Ipv4Addr,
    pub ttl: u32,
    pub proxied: bool,
    pub zone_id: String,
}

impl ActualRecord {
    /// Uniqueness key within the controller's scope.
    #[must_use]
    pub fn key(&self) -> (&str, Ipv4Addr) {
        (&self.hostname, self.ipv4)
    }
}

/// Outcome class of one reconciliation pass.
///
/// Only a `Clean` pass advances the last-successful-sync watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PassOutcome {
    /// Every operation succeeded
    Clean,
    /// At least one operation failed or was skipped, but some progress was made
    Partial,
    /// The pass could not process any touched zone
    Failed,
}

impl fmt::Display for PassOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Partial => write!(f, "partial"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Summary of one end-to-end reconciliation pass.
#[derive(Debug, Clone)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub outcome: PassOutcome,
    /// Zones the pass attempted to reconcile
    pub zones_touched: usize,
    pub records_created: usize,
    pub records_deleted: usize,
    pub operations_failed: usize,
    /// Operations skipped because shutdown was requested mid-pass
    pub operations_skipped: usize,
    pub eligible_nodes: usize,
    pub total_nodes: usize,
    pub active_specs: usize,
    /// One entry per failed operation or zone fetch
    pub errors: Vec<String>,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod model_tests;
