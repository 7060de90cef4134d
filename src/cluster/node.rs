// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Projection of Kubernetes Node objects into [`NodeState`].
//!
//! External IPv4 detection:
//! 1. `status.addresses` entry of type `ExternalIP`, parsed as IPv4
//! 2. fallback to the `flannel.alpha.coreos.com/public-ip` annotation
//!
//! Values that do not parse as IPv4 are ignored (A records only).

use crate::constants::ANNOTATION_FLANNEL_PUBLIC_IP;
use crate::model::NodeState;
use k8s_openapi::api::core::v1::Node;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use tracing::debug;

/// Extract the fields the controller cares about from a Node object.
#[must_use]
pub fn project_node(node: &Node) -> NodeState {
    let name = node.metadata.name.clone().unwrap_or_default();

    let mut external_ipv4: Option<Ipv4Addr> = node
        .status
        .as_ref()
        .and_then(|status| status.addresses.as_ref())
        .and_then(|addresses| {
            addresses
                .iter()
                .find(|addr| addr.type_ == "ExternalIP")
                .and_then(|addr| addr.address.parse().ok())
        });

    if external_ipv4.is_none() {
        external_ipv4 = node
            .metadata
            .annotations
            .as_ref()
            .and_then(|annotations| annotations.get(ANNOTATION_FLANNEL_PUBLIC_IP))
            .and_then(|value| value.parse().ok());
        if let Some(ip) = external_ipv4 {
            debug!(node = %name, external_ipv4 = %ip, "using flannel public-ip annotation");
        }
    }

    if external_ipv4.is_none() {
        debug!(node = %name, "node has no external IPv4 address");
    }

    let taints: BTreeSet<String> = node
        .spec
        .as_ref()
        .and_then(|spec| spec.taints.as_ref())
        .map(|taints| taints.iter().map(|taint| taint.key.clone()).collect())
        .unwrap_or_default();

    NodeState {
        name,
        external_ipv4,
        taints,
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod node_tests;
