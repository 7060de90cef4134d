// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `model.rs`

#[cfg(test)]
mod tests {
    use super::super::{NodeState, ServiceRef};
    use crate::constants::{TAINT_DELETION_CANDIDATE, TAINT_TO_BE_DELETED};
    use std::collections::BTreeSet;

    fn node(ip: Option<&str>, taints: &[&str]) -> NodeState {
        NodeState {
            name: "worker-1".to_string(),
            external_ipv4: ip.map(|s| s.parse().unwrap()),
            taints: taints.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    #[test]
    fn test_node_with_ip_and_no_taints_is_eligible() {
        assert!(node(Some("1.2.3.4"), &[]).is_eligible());
    }

    #[test]
    fn test_node_without_external_ip_is_never_eligible() {
        assert!(!node(None, &[]).is_eligible());
        assert!(!node(None, &[TAINT_DELETION_CANDIDATE]).is_eligible());
    }

    #[test]
    fn test_single_deletion_taint_does_not_disqualify() {
        assert!(
            node(Some("1.2.3.4"), &[TAINT_DELETION_CANDIDATE]).is_eligible(),
            "DeletionCandidate alone must not disqualify"
        );
        assert!(
            node(Some("1.2.3.4"), &[TAINT_TO_BE_DELETED]).is_eligible(),
            "ToBeDeleted alone must not disqualify"
        );
    }

    #[test]
    fn test_both_deletion_taints_disqualify() {
        let n = node(
            Some("1.2.3.4"),
            &[TAINT_DELETION_CANDIDATE, TAINT_TO_BE_DELETED],
        );
        assert!(n.has_both_deletion_taints());
        assert!(!n.is_eligible());
    }

    #[test]
    fn test_unrelated_taints_do_not_disqualify() {
        let n = node(
            Some("1.2.3.4"),
            &["node.kubernetes.io/unreachable", "dedicated"],
        );
        assert!(n.is_eligible());
    }

    #[test]
    fn test_eligibility_matches_truth_table() {
        // eligible(N) <=> has_ip AND NOT (both taints present)
        let cases: &[(Option<&str>, &[&str], bool)] = &[
            (Some("10.0.0.1"), &[], true),
            (Some("10.0.0.1"), &[TAINT_DELETION_CANDIDATE], true),
            (Some("10.0.0.1"), &[TAINT_TO_BE_DELETED], true),
            (
                Some("10.0.0.1"),
                &[TAINT_DELETION_CANDIDATE, TAINT_TO_BE_DELETED],
                false,
            ),
            (None, &[], false),
            (None, &[TAINT_DELETION_CANDIDATE, TAINT_TO_BE_DELETED], false),
        ];

        for (ip, taints, expected) in cases {
            let n = node(*ip, taints);
            assert_eq!(
                n.is_eligible(),
                *expected,
                "ip={ip:?} taints={taints:?} expected eligible={expected}"
            );
        }
    }

    #[test]
    fn test_service_ref_orders_by_namespace_then_name() {
        let a = ServiceRef {
            namespace: "default".to_string(),
            name: "api".to_string(),
        };
        let b = ServiceRef {
            namespace: "default".to_string(),
            name: "web".to_string(),
        };
        let c = ServiceRef {
            namespace: "prod".to_string(),
            name: "api".to_string(),
        };

        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.to_string(), "default/api");
    }

    #[test]
    fn test_taint_set_deduplicates() {
        let mut taints = BTreeSet::new();
        taints.insert(TAINT_DELETION_CANDIDATE.to_string());
        taints.insert(TAINT_DELETION_CANDIDATE.to_string());
        assert_eq!(taints.len(), 1);
    }
}
