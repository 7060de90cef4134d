// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Epictetus controller.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Service Annotation Surface
// ============================================================================

/// Annotation that opts a Service into DNS management (must be `"true"`)
pub const ANNOTATION_DNS_ENABLED: &str = "epictetus.io/dns-enabled";

/// Annotation carrying the FQDN to publish for the Service
pub const ANNOTATION_HOSTNAME: &str = "epictetus.io/hostname";

/// Annotation carrying the record TTL in seconds (optional)
pub const ANNOTATION_TTL: &str = "epictetus.io/ttl";

/// Annotation carrying the Cloudflare proxied flag (optional)
pub const ANNOTATION_PROXIED: &str = "epictetus.io/proxied";

// ============================================================================
// Node Eligibility
// ============================================================================

/// First cluster-autoscaler deletion taint; alone it does NOT disqualify a node
pub const TAINT_DELETION_CANDIDATE: &str = "DeletionCandidateOfClusterAutoscaler";

/// Second cluster-autoscaler deletion taint; a node is only excluded when it
/// carries this AND [`TAINT_DELETION_CANDIDATE`] at the same time
pub const TAINT_TO_BE_DELETED: &str = "ToBeDeletedByClusterAutoscaler";

/// Node annotation used as an external IPv4 fallback when the node status
/// carries no `ExternalIP` address (Flannel publishes the public IP here)
pub const ANNOTATION_FLANNEL_PUBLIC_IP: &str = "flannel.alpha.coreos.com/public-ip";

// ============================================================================
// DNS Record Defaults
// ============================================================================

/// Default TTL for managed A records (5 minutes)
pub const DEFAULT_RECORD_TTL_SECS: u32 = 300;

/// Largest accepted TTL annotation value (2^31 - 1 seconds)
pub const MAX_RECORD_TTL_SECS: u32 = i32::MAX as u32;

// ============================================================================
// Reconciliation Cadence
// ============================================================================

/// Default interval between periodic full synchronization passes
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 60;

/// Smallest accepted `DNS_SYNC_INTERVAL`
pub const MIN_SYNC_INTERVAL_SECS: u64 = 10;

/// Default minimum gap between two consecutive passes (none)
pub const DEFAULT_SYNC_MIN_GAP_SECS: u64 = 0;

/// Zones fetched and reconciled concurrently within one pass
pub const ZONE_CONCURRENCY: usize = 4;

/// Record create/delete operations in flight per zone
pub const RECORD_OP_CONCURRENCY: usize = 4;

// ============================================================================
// Provider Retry Policy
// ============================================================================

/// Default bounded-attempt count for provider calls
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base backoff between provider retries
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

/// Cap on the exponentially growing retry interval
pub const RETRY_MAX_INTERVAL_SECS: u64 = 30;

/// Randomization factor applied to retry intervals (±10%)
pub const RETRY_RANDOMIZATION_FACTOR: f64 = 0.1;

// ============================================================================
// Cloudflare API
// ============================================================================

/// Cloudflare v4 API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Page size for zone and record list calls
pub const CLOUDFLARE_PAGE_SIZE: u32 = 100;

/// Per-attempt timeout for provider HTTP requests
pub const PROVIDER_REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Health / Status Server
// ============================================================================

/// Default TCP port for the status surface
pub const DEFAULT_HEALTH_PORT: u16 = 8080;

/// Bind address for the status HTTP server
pub const HEALTH_SERVER_BIND_ADDRESS: &str = "0.0.0.0";

/// Default cadence for internal self-health sampling
pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: u64 = 30;

/// Smallest accepted `HEALTH_CHECK_INTERVAL`
pub const MIN_HEALTH_CHECK_INTERVAL_SECS: u64 = 5;

// ============================================================================
// Runtime
// ============================================================================

/// Number of worker threads for the Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Bounded window granted to in-flight work after a shutdown signal
pub const SHUTDOWN_GRACE_SECS: u64 = 30;
