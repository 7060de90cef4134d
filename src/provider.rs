// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Capability interface over the external DNS provider.
//!
//! The reconciliation engine and the zone resolver depend on this trait
//! rather than on the Cloudflare client directly, so tests can substitute
//! an in-memory fake.

use crate::errors::ProviderError;
use crate::model::{ActualRecord, Zone};
use std::net::Ipv4Addr;

/// Operations the controller needs from an authoritative DNS provider.
///
/// Implementations carry their own retry policy; callers treat every method
/// as a single logical operation.
#[async_trait::async_trait]
pub trait DnsProvider: Send + Sync {
    /// List all zones the credential has access to.
    async fn list_zones(&self) -> Result<Vec<Zone>, ProviderError>;

    /// List all A records in a zone, paginating internally.
    async fn list_a_records(&self, zone_id: &str) -> Result<Vec<ActualRecord>, ProviderError>;

    /// Create an A record and return the provider-assigned id.
    async fn create_a_record(
        &self,
        zone_id: &str,
        hostname: &str,
        ipv4: Ipv4Addr,
        ttl: u32,
        proxied: bool,
    ) -> Result<String, ProviderError>;

    /// Delete an A record by provider id.
    ///
    /// Deleting a record that no longer exists is success (idempotence).
    async fn delete_a_record(&self, zone_id: &str, provider_id: &str)
        -> Result<(), ProviderError>;
}
