// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired-state builder.
//!
//! A pure function from (eligible nodes, hostname specs, resolved zones) to
//! the set of A records that should exist. Hostnames that resolved to no
//! zone are reported back as diagnostics rather than aborting the build.

use crate::model::{DesiredRecord, HostnameSpec, NodeState};
use std::collections::{BTreeMap, BTreeSet};

/// Result of one desired-state computation.
#[derive(Debug, Default)]
pub struct BuildOutput {
    /// Records that should exist, keyed by (hostname, ipv4)
    pub records: BTreeSet<DesiredRecord>,
    /// Spec hostnames omitted because no zone owns them
    pub unresolved: Vec<String>,
}

/// Cross eligible nodes with hostname specs.
///
/// `zones_by_hostname` carries the resolver's answers for every spec
/// hostname; a missing entry means the hostname matched no known zone.
#[must_use]
pub fn build(
    eligible: &[NodeState],
    specs: &[HostnameSpec],
    zones_by_hostname: &BTreeMap<String, String>,
) -> BuildOutput {
    let mut output = BuildOutput::default();

    for spec in specs {
        let Some(zone_id) = zones_by_hostname.get(&spec.hostname) else {
            output.unresolved.push(spec.hostname.clone());
            continue;
        };

        for node in eligible {
            let Some(ipv4) = node.external_ipv4 else {
                continue;
            };
            output.records.insert(DesiredRecord {
                hostname: spec.hostname.clone(),
                ipv4,
                ttl: spec.ttl,
                proxied: spec.proxied,
                zone_id: zone_id.clone(),
            });
        }
    }

    output
}

#[cfg(test)]
#[path = "desired_tests.rs"]
mod desired_tests;
