// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `diff.rs`

#[cfg(test)]
mod tests {
    use super::super::compute;
    use crate::model::{ActualRecord, DesiredRecord};

    fn desired(hostname: &str, ip: &str, ttl: u32, proxied: bool) -> DesiredRecord {
        DesiredRecord {
            hostname: hostname.to_string(),
            ipv4: ip.parse().unwrap(),
            ttl,
            proxied,
            zone_id: "z1".to_string(),
        }
    }

    fn actual(id: &str, hostname: &str, ip: &str, ttl: u32, proxied: bool) -> ActualRecord {
        ActualRecord {
            provider_id: id.to_string(),
            hostname: hostname.to_string(),
            ipv4: ip.parse().unwrap(),
            ttl,
            proxied,
            zone_id: "z1".to_string(),
        }
    }

    #[test]
    fn test_missing_records_are_created() {
        let diff = compute(
            &[desired("api.example.com", "1.2.3.4", 300, false)],
            &[],
        );

        assert_eq!(diff.to_create.len(), 1);
        assert!(diff.to_delete.is_empty());
        assert_eq!(diff.replaced, 0);
    }

    #[test]
    fn test_stale_records_are_deleted() {
        let diff = compute(
            &[],
            &[actual("r1", "api.example.com", "1.2.3.4", 300, false)],
        );

        assert!(diff.to_create.is_empty());
        assert_eq!(diff.to_delete.len(), 1);
        assert_eq!(diff.to_delete[0].provider_id, "r1");
    }

    #[test]
    fn test_matching_records_are_untouched() {
        let diff = compute(
            &[desired("api.example.com", "1.2.3.4", 300, false)],
            &[actual("r1", "api.example.com", "1.2.3.4", 300, false)],
        );

        assert!(diff.is_empty(), "converged zone must produce no operations");
    }

    #[test]
    fn test_ttl_mismatch_is_replaced() {
        let diff = compute(
            &[desired("api.example.com", "1.2.3.4", 60, false)],
            &[actual("r1", "api.example.com", "1.2.3.4", 300, false)],
        );

        assert_eq!(diff.to_delete.len(), 1);
        assert_eq!(diff.to_create.len(), 1);
        assert_eq!(diff.replaced, 1);
        assert_eq!(diff.to_create[0].ttl, 60);
    }

    #[test]
    fn test_proxied_mismatch_is_replaced() {
        let diff = compute(
            &[desired("api.example.com", "1.2.3.4", 300, true)],
            &[actual("r1", "api.example.com", "1.2.3.4", 300, false)],
        );

        assert_eq!(diff.replaced, 1);
    }

    #[test]
    fn test_mixed_zone_converges_in_one_diff() {
        let diff = compute(
            &[
                desired("api.example.com", "1.1.1.1", 300, false),
                desired("api.example.com", "3.3.3.3", 300, false),
            ],
            &[
                actual("r1", "api.example.com", "1.1.1.1", 300, false),
                actual("r2", "api.example.com", "2.2.2.2", 300, false),
            ],
        );

        assert_eq!(diff.to_create.len(), 1);
        assert_eq!(diff.to_create[0].ipv4, "3.3.3.3".parse::<std::net::Ipv4Addr>().unwrap());
        assert_eq!(diff.to_delete.len(), 1);
        assert_eq!(diff.to_delete[0].provider_id, "r2");
    }

    #[test]
    fn test_duplicate_provider_records_are_trimmed() {
        // Same (hostname, ipv4) under two provider ids: one survives.
        let diff = compute(
            &[desired("api.example.com", "1.2.3.4", 300, false)],
            &[
                actual("r1", "api.example.com", "1.2.3.4", 300, false),
                actual("r2", "api.example.com", "1.2.3.4", 300, false),
            ],
        );

        assert_eq!(diff.to_delete.len(), 1, "one duplicate must be deleted");
        assert!(diff.to_create.is_empty());
    }

    #[test]
    fn test_key_is_hostname_and_ip_not_attributes() {
        // Same hostname, different IPs: two independent keys.
        let diff = compute(
            &[
                desired("api.example.com", "1.1.1.1", 300, false),
                desired("api.example.com", "2.2.2.2", 300, false),
            ],
            &[actual("r1", "api.example.com", "1.1.1.1", 300, false)],
        );

        assert_eq!(diff.to_create.len(), 1);
        assert!(diff.to_delete.is_empty());
        assert_eq!(diff.replaced, 0);
    }
}
