// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired-vs-actual diff for one zone.
//!
//! Records are keyed by (hostname, ipv4). A key present on both sides with
//! differing (ttl, proxied) is healed by delete-then-create; the apply step
//! guarantees the delete completes before the create is issued.

use crate::model::{ActualRecord, DesiredRecord};
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

/// Operations required to converge one zone.
#[derive(Debug, Default)]
pub struct ZoneDiff {
    pub to_create: Vec<DesiredRecord>,
    pub to_delete: Vec<ActualRecord>,
    /// Keys present on both sides whose attributes differed
    pub replaced: usize,
}

impl ZoneDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

/// Diff the desired records of a zone against its owned actual records.
///
/// `actual` must already be filtered to records the controller owns; nothing
/// outside it is ever proposed for mutation.
#[must_use]
pub fn compute(desired: &[DesiredRecord], actual: &[ActualRecord]) -> ZoneDiff {
    let mut diff = ZoneDiff::default();

    let mut actual_by_key: BTreeMap<(&str, Ipv4Addr), &ActualRecord> = BTreeMap::new();
    for record in actual {
        if let Some(duplicate) = actual_by_key.insert(record.key(), record) {
            // Same (hostname, ipv4) under two provider ids; keep one.
            diff.to_delete.push(duplicate.clone());
        }
    }

    let desired_keys: BTreeSet<(&str, Ipv4Addr)> = desired.iter().map(DesiredRecord::key).collect();

    for record in desired {
        match actual_by_key.get(&record.key()) {
            None => diff.to_create.push(record.clone()),
            Some(existing) if existing.ttl != record.ttl || existing.proxied != record.proxied => {
                diff.to_delete.push((*existing).clone());
                diff.to_create.push(record.clone());
                diff.replaced += 1;
            }
            Some(_) => {}
        }
    }

    for record in actual_by_key.values() {
        if !desired_keys.contains(&record.key()) {
            diff.to_delete.push((*record).clone());
        }
    }

    diff
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod diff_tests;
