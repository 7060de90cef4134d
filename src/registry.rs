// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Projection of per-Service specs into the active hostname spec set.
//!
//! Two Services declaring the same hostname with identical (ttl, proxied)
//! are merged. When they conflict, the Service with the lexicographically
//! lowest namespace/name wins, deterministically, and every losing peer is
//! warned about.

use crate::model::HostnameSpec;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Collapse per-Service specs into one spec per hostname.
#[must_use]
pub fn active_specs(mut specs: Vec<HostnameSpec>) -> Vec<HostnameSpec> {
    // Lowest owner first, so the first spec seen per hostname is the winner.
    specs.sort_by(|a, b| a.owner.cmp(&b.owner));

    let mut by_hostname: BTreeMap<String, HostnameSpec> = BTreeMap::new();
    for spec in specs {
        match by_hostname.get(&spec.hostname) {
            None => {
                by_hostname.insert(spec.hostname.clone(), spec);
            }
            Some(winner) if winner.ttl == spec.ttl && winner.proxied == spec.proxied => {
                debug!(
                    hostname = %spec.hostname,
                    winner = %winner.owner,
                    peer = %spec.owner,
                    "merged duplicate hostname declaration"
                );
            }
            Some(winner) => {
                warn!(
                    hostname = %spec.hostname,
                    winner = %winner.owner,
                    winner_ttl = winner.ttl,
                    winner_proxied = winner.proxied,
                    loser = %spec.owner,
                    loser_ttl = spec.ttl,
                    loser_proxied = spec.proxied,
                    "conflicting (ttl, proxied) for hostname, keeping lowest owner"
                );
            }
        }
    }

    by_hostname.into_values().collect()
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod registry_tests;
