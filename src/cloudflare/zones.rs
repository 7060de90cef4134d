// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Hostname-to-zone resolution with a refreshable cache.
//!
//! The resolver answers "which zone owns this hostname?" by longest-suffix
//! match over the zones the credential can see. `example.com` is a suffix of
//! `api.example.com`; `api.example.com` is NOT a suffix of `api.other.com`.
//!
//! The cache is guarded by a mutex with a single-flight guarantee on
//! refresh: concurrent cache misses trigger at most one zone list call, and
//! late missers piggyback on the winner's result.

use crate::errors::ProviderError;
use crate::model::Zone;
use crate::provider::DnsProvider;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

struct ZoneCache {
    zones: Vec<Zone>,
    /// Bumped on every successful refresh; lets a miss detect that another
    /// task already refreshed while it waited for the lock
    generation: u64,
}

/// Resolves hostnames to the zone that owns them.
pub struct ZoneResolver<P> {
    provider: Arc<P>,
    cache: Mutex<ZoneCache>,
}

impl<P: DnsProvider> ZoneResolver<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            cache: Mutex::new(ZoneCache {
                zones: Vec::new(),
                generation: 0,
            }),
        }
    }

    /// Resolve the zone id owning `hostname`.
    ///
    /// On a cache miss the resolver refreshes once and retries; a second
    /// miss yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error when the refresh triggered by a miss fails at the
    /// provider.
    pub async fn resolve(&self, hostname: &str) -> Result<Option<String>, ProviderError> {
        let seen_generation = {
            let cache = self.cache.lock().await;
            if let Some(zone) = longest_suffix_match(&cache.zones, hostname) {
                return Ok(Some(zone.id.clone()));
            }
            cache.generation
        };

        self.refresh_if_stale(seen_generation).await?;

        let cache = self.cache.lock().await;
        match longest_suffix_match(&cache.zones, hostname) {
            Some(zone) => Ok(Some(zone.id.clone())),
            None => {
                debug!(hostname = hostname, "hostname matches no known zone");
                Ok(None)
            }
        }
    }

    /// Refresh the zone cache from the provider unconditionally.
    ///
    /// # Errors
    ///
    /// Returns the provider error when the zone list call fails; the cache
    /// keeps its previous contents.
    pub async fn refresh(&self) -> Result<(), ProviderError> {
        let generation = self.cache.lock().await.generation;
        self.refresh_if_stale(generation).await
    }

    /// Refresh unless another task already did since `seen_generation`.
    ///
    /// The provider call happens while holding the cache lock, which is what
    /// makes the refresh single-flight.
    async fn refresh_if_stale(&self, seen_generation: u64) -> Result<(), ProviderError> {
        let mut cache = self.cache.lock().await;
        if cache.generation != seen_generation {
            return Ok(());
        }

        let zones = self.provider.list_zones().await?;
        info!(zones = zones.len(), "refreshed zone cache");
        cache.zones = zones;
        cache.generation += 1;
        Ok(())
    }

    /// Names of the cached zones, sorted.
    pub async fn zone_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .cache
            .lock()
            .await
            .zones
            .iter()
            .map(|z| z.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Whether at least one refresh has completed.
    pub async fn is_populated(&self) -> bool {
        self.cache.lock().await.generation > 0
    }
}

/// Pick the zone whose name is the longest DNS suffix of `hostname`.
///
/// Ties (impossible under standard zone rules) are broken by longest name,
/// then lexicographically smallest.
fn longest_suffix_match<'a>(zones: &'a [Zone], hostname: &str) -> Option<&'a Zone> {
    zones
        .iter()
        .filter(|zone| is_dns_suffix(&zone.name, hostname))
        .max_by(|a, b| {
            a.name
                .len()
                .cmp(&b.name.len())
                .then_with(|| b.name.cmp(&a.name))
        })
}

/// Proper DNS suffix test: equal, or hostname ends with `.{zone}`.
fn is_dns_suffix(zone_name: &str, hostname: &str) -> bool {
    hostname == zone_name
        || (hostname.len() > zone_name.len()
            && hostname.ends_with(zone_name)
            && hostname.as_bytes()[hostname.len() - zone_name.len() - 1] == b'.')
}

#[cfg(test)]
#[path = "zones_tests.rs"]
mod zones_tests;
