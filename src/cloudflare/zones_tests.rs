// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `zones.rs`

#[cfg(test)]
mod tests {
    use super::super::ZoneResolver;
    use crate::errors::ProviderError;
    use crate::model::{ActualRecord, Zone};
    use crate::provider::DnsProvider;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Provider fake that serves a fixed zone list and counts list calls.
    struct StaticZones {
        zones: Vec<Zone>,
        list_calls: AtomicUsize,
    }

    impl StaticZones {
        fn new(zones: &[(&str, &str)]) -> Self {
            Self {
                zones: zones
                    .iter()
                    .map(|(id, name)| Zone {
                        id: (*id).to_string(),
                        name: (*name).to_string(),
                    })
                    .collect(),
                list_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl DnsProvider for StaticZones {
        async fn list_zones(&self) -> Result<Vec<Zone>, ProviderError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.zones.clone())
        }

        async fn list_a_records(&self, _: &str) -> Result<Vec<ActualRecord>, ProviderError> {
            Ok(Vec::new())
        }

        async fn create_a_record(
            &self,
            _: &str,
            _: &str,
            _: Ipv4Addr,
            _: u32,
            _: bool,
        ) -> Result<String, ProviderError> {
            unreachable!("zone resolver never creates records")
        }

        async fn delete_a_record(&self, _: &str, _: &str) -> Result<(), ProviderError> {
            unreachable!("zone resolver never deletes records")
        }
    }

    fn resolver(zones: &[(&str, &str)]) -> (ZoneResolver<StaticZones>, Arc<StaticZones>) {
        let provider = Arc::new(StaticZones::new(zones));
        (ZoneResolver::new(provider.clone()), provider)
    }

    #[tokio::test]
    async fn test_resolves_by_suffix_match() {
        let (resolver, _) = resolver(&[("z1", "example.com")]);

        let zone = resolver.resolve("api.example.com").await.unwrap();
        assert_eq!(zone.as_deref(), Some("z1"));
    }

    #[tokio::test]
    async fn test_apex_hostname_matches_its_zone() {
        let (resolver, _) = resolver(&[("z1", "example.com")]);

        let zone = resolver.resolve("example.com").await.unwrap();
        assert_eq!(zone.as_deref(), Some("z1"));
    }

    #[tokio::test]
    async fn test_prefix_overlap_is_not_a_suffix() {
        // "api.example.com" must not claim "api.other.com", and a bare
        // substring match like "ple.com" must not claim "example.com" hosts.
        let (resolver, _) = resolver(&[("z1", "api.example.com"), ("z2", "ple.com")]);

        assert_eq!(resolver.resolve("api.other.com").await.unwrap(), None);
        assert_eq!(resolver.resolve("www.example.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_longest_suffix_wins() {
        let (resolver, _) = resolver(&[("parent", "example.com"), ("child", "sub.example.com")]);

        let zone = resolver.resolve("api.sub.example.com").await.unwrap();
        assert_eq!(
            zone.as_deref(),
            Some("child"),
            "the more specific zone must own the hostname"
        );

        let zone = resolver.resolve("api.example.com").await.unwrap();
        assert_eq!(zone.as_deref(), Some("parent"));
    }

    #[tokio::test]
    async fn test_equal_length_tie_breaks_lexicographically() {
        let (resolver, _) = resolver(&[("zb", "bbb.com"), ("za", "aaa.com")]);

        // Hypothetical: hostname matching only one of them behaves normally;
        // the tie rule is only observable with equal-length matching names,
        // which cannot overlap as suffixes, so resolve each side directly.
        assert_eq!(resolver.resolve("x.aaa.com").await.unwrap().as_deref(), Some("za"));
        assert_eq!(resolver.resolve("x.bbb.com").await.unwrap().as_deref(), Some("zb"));
    }

    #[tokio::test]
    async fn test_miss_refreshes_once_then_gives_up() {
        let (resolver, provider) = resolver(&[("z1", "example.com")]);

        let zone = resolver.resolve("api.unknown.net").await.unwrap();
        assert_eq!(zone, None);
        assert_eq!(
            provider.list_calls.load(Ordering::SeqCst),
            1,
            "a miss must refresh exactly once"
        );

        // A second miss for the same hostname refreshes again (separate call)
        let zone = resolver.resolve("api.unknown.net").await.unwrap();
        assert_eq!(zone, None);
        assert_eq!(provider.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_does_not_touch_provider() {
        let (resolver, provider) = resolver(&[("z1", "example.com")]);
        resolver.refresh().await.unwrap();
        assert_eq!(provider.list_calls.load(Ordering::SeqCst), 1);

        for _ in 0..5 {
            let zone = resolver.resolve("api.example.com").await.unwrap();
            assert_eq!(zone.as_deref(), Some("z1"));
        }
        assert_eq!(
            provider.list_calls.load(Ordering::SeqCst),
            1,
            "cache hits must not refresh"
        );
    }

    #[tokio::test]
    async fn test_concurrent_misses_single_flight() {
        let (resolver, provider) = resolver(&[("z1", "example.com")]);
        let resolver = Arc::new(resolver);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let resolver = resolver.clone();
            handles.push(tokio::spawn(async move {
                resolver.resolve("api.example.com").await
            }));
        }
        for handle in handles {
            let zone = handle.await.unwrap().unwrap();
            assert_eq!(zone.as_deref(), Some("z1"));
        }

        assert_eq!(
            provider.list_calls.load(Ordering::SeqCst),
            1,
            "concurrent misses must coalesce into one refresh"
        );
    }

    #[tokio::test]
    async fn test_populated_flag_flips_after_refresh() {
        let (resolver, _) = resolver(&[("z1", "example.com")]);

        assert!(!resolver.is_populated().await);
        resolver.refresh().await.unwrap();
        assert!(resolver.is_populated().await);
        assert_eq!(resolver.zone_names().await, vec!["example.com".to_string()]);
    }
}
