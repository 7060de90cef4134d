// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `desired.rs`

#[cfg(test)]
mod tests {
    use super::super::build;
    use crate::model::{HostnameSpec, NodeState, ServiceRef};
    use std::collections::BTreeMap;

    fn node(name: &str, ip: Option<&str>) -> NodeState {
        NodeState {
            name: name.to_string(),
            external_ipv4: ip.map(|s| s.parse().unwrap()),
            taints: Default::default(),
        }
    }

    fn spec(hostname: &str, ttl: u32, proxied: bool) -> HostnameSpec {
        HostnameSpec {
            hostname: hostname.to_string(),
            ttl,
            proxied,
            owner: ServiceRef {
                namespace: "default".to_string(),
                name: "svc".to_string(),
            },
        }
    }

    fn zones(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(h, z)| ((*h).to_string(), (*z).to_string()))
            .collect()
    }

    #[test]
    fn test_cross_product_of_nodes_and_specs() {
        let eligible = [node("n1", Some("1.1.1.1")), node("n2", Some("2.2.2.2"))];
        let specs = [
            spec("a.example.com", 300, false),
            spec("b.example.com", 60, true),
        ];
        let zones = zones(&[("a.example.com", "z1"), ("b.example.com", "z1")]);

        let output = build(&eligible, &specs, &zones);

        assert_eq!(output.records.len(), 4, "2 nodes x 2 specs");
        assert!(output.unresolved.is_empty());

        let b_records: Vec<_> = output
            .records
            .iter()
            .filter(|r| r.hostname == "b.example.com")
            .collect();
        assert_eq!(b_records.len(), 2);
        assert!(b_records.iter().all(|r| r.ttl == 60 && r.proxied));
    }

    #[test]
    fn test_unresolved_hostname_is_omitted_with_diagnostic() {
        let eligible = [node("n1", Some("1.1.1.1"))];
        let specs = [
            spec("a.example.com", 300, false),
            spec("b.nowhere.test", 300, false),
        ];
        let zones = zones(&[("a.example.com", "z1")]);

        let output = build(&eligible, &specs, &zones);

        assert_eq!(output.records.len(), 1);
        assert_eq!(output.unresolved, vec!["b.nowhere.test".to_string()]);
    }

    #[test]
    fn test_nodes_without_ip_contribute_nothing() {
        let eligible = [node("n1", Some("1.1.1.1")), node("n2", None)];
        let specs = [spec("a.example.com", 300, false)];
        let zones = zones(&[("a.example.com", "z1")]);

        let output = build(&eligible, &specs, &zones);
        assert_eq!(output.records.len(), 1);
    }

    #[test]
    fn test_zone_id_is_attached_per_hostname() {
        let eligible = [node("n1", Some("1.1.1.1"))];
        let specs = [
            spec("a.example.com", 300, false),
            spec("b.other.org", 300, false),
        ];
        let zones = zones(&[("a.example.com", "z-example"), ("b.other.org", "z-other")]);

        let output = build(&eligible, &specs, &zones);

        for record in &output.records {
            let expected = if record.hostname == "a.example.com" {
                "z-example"
            } else {
                "z-other"
            };
            assert_eq!(record.zone_id, expected);
        }
    }

    #[test]
    fn test_deterministic_for_fixed_inputs() {
        let eligible = [node("n2", Some("2.2.2.2")), node("n1", Some("1.1.1.1"))];
        let specs = [spec("a.example.com", 300, false)];
        let zones = zones(&[("a.example.com", "z1")]);

        let first = build(&eligible, &specs, &zones);
        let second = build(&eligible, &specs, &zones);
        assert_eq!(first.records, second.records);
    }

    #[test]
    fn test_empty_inputs_build_nothing() {
        let output = build(&[], &[], &BTreeMap::new());
        assert!(output.records.is_empty());
        assert!(output.unresolved.is_empty());
    }
}
