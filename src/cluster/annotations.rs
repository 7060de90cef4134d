// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Parsing of `epictetus.io/*` Service annotations into [`HostnameSpec`].
//!
//! Parsing never fails a Service outright: unparseable optional fields fall
//! back to defaults with a warning, and only a missing/empty hostname (or a
//! non-truthy enable flag) omits the spec entirely.

use crate::constants::{
    ANNOTATION_DNS_ENABLED, ANNOTATION_HOSTNAME, ANNOTATION_PROXIED, ANNOTATION_TTL,
    DEFAULT_RECORD_TTL_SECS, MAX_RECORD_TTL_SECS,
};
use crate::model::{HostnameSpec, ServiceRef};
use std::collections::BTreeMap;
use tracing::warn;

/// Build a spec from a Service's annotations, or `None` when the Service is
/// not managed.
#[must_use]
pub fn parse_service_dns_config(
    owner: ServiceRef,
    annotations: &BTreeMap<String, String>,
) -> Option<HostnameSpec> {
    let enabled = annotations
        .get(ANNOTATION_DNS_ENABLED)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));
    if !enabled {
        return None;
    }

    let hostname = annotations
        .get(ANNOTATION_HOSTNAME)
        .map(|raw| normalize_hostname(raw))
        .unwrap_or_default();
    if hostname.is_empty() {
        warn!(
            service = %owner,
            "service enables DNS management but carries no hostname; ignoring"
        );
        return None;
    }

    let ttl = match annotations.get(ANNOTATION_TTL) {
        None => DEFAULT_RECORD_TTL_SECS,
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(value) if value >= 1 && value <= i64::from(MAX_RECORD_TTL_SECS) => value as u32,
            _ => {
                warn!(
                    service = %owner,
                    hostname = %hostname,
                    ttl = %raw,
                    default = DEFAULT_RECORD_TTL_SECS,
                    "unparseable or out-of-range ttl annotation, using default"
                );
                DEFAULT_RECORD_TTL_SECS
            }
        },
    };

    let proxied = match annotations.get(ANNOTATION_PROXIED) {
        None => false,
        Some(raw) if raw.trim().eq_ignore_ascii_case("true") => true,
        Some(raw) if raw.trim().eq_ignore_ascii_case("false") => false,
        Some(raw) => {
            warn!(
                service = %owner,
                hostname = %hostname,
                proxied = %raw,
                "unparseable proxied annotation, using default false"
            );
            false
        }
    };

    Some(HostnameSpec {
        hostname,
        ttl,
        proxied,
        owner,
    })
}

/// Lowercase and strip trailing dots, the canonical hostname form used for
/// all key comparisons.
#[must_use]
pub fn normalize_hostname(raw: &str) -> String {
    raw.trim().trim_end_matches('.').to_lowercase()
}

#[cfg(test)]
#[path = "annotations_tests.rs"]
mod annotations_tests;
