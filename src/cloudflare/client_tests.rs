// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the Cloudflare client's pure parts (wire mapping, error
//! classification). The HTTP path itself is exercised against the live API
//! shape only in deployments; the engine tests cover the provider contract
//! through the in-memory fake.

#[cfg(test)]
mod tests {
    use super::super::types::{ApiErrorObject, ApiResponse, DnsRecordObject};
    use super::super::{envelope_error, normalize_zone_name, record_from_wire};
    use crate::errors::ProviderError;

    fn wire_record(record_type: &str, content: &str) -> DnsRecordObject {
        DnsRecordObject {
            id: "372e67954025e0ba6aaa6d586b9e0b59".to_string(),
            name: "api.example.com".to_string(),
            record_type: record_type.to_string(),
            content: content.to_string(),
            ttl: 300,
            proxied: false,
        }
    }

    #[test]
    fn test_a_record_projects_into_model() {
        let record = record_from_wire("zone-1", wire_record("A", "192.0.2.10"))
            .expect("valid A record should project");

        assert_eq!(record.hostname, "api.example.com");
        assert_eq!(record.ipv4, "192.0.2.10".parse::<std::net::Ipv4Addr>().unwrap());
        assert_eq!(record.ttl, 300);
        assert!(!record.proxied);
        assert_eq!(record.zone_id, "zone-1");
    }

    #[test]
    fn test_non_a_records_are_dropped() {
        assert!(record_from_wire("zone-1", wire_record("AAAA", "2001:db8::1")).is_none());
        assert!(record_from_wire("zone-1", wire_record("CNAME", "other.example.com")).is_none());
        assert!(record_from_wire("zone-1", wire_record("TXT", "v=spf1 -all")).is_none());
    }

    #[test]
    fn test_malformed_content_is_dropped() {
        assert!(
            record_from_wire("zone-1", wire_record("A", "not-an-ip")).is_none(),
            "A record with unparseable content must be ignored"
        );
    }

    #[test]
    fn test_record_hostname_is_lowercased() {
        let mut wire = wire_record("A", "192.0.2.10");
        wire.name = "API.Example.COM".to_string();
        let record = record_from_wire("zone-1", wire).unwrap();
        assert_eq!(record.hostname, "api.example.com");
    }

    #[test]
    fn test_envelope_error_surfaces_first_provider_error() {
        let errors = vec![
            ApiErrorObject {
                code: 81057,
                message: "The record already exists.".to_string(),
            },
            ApiErrorObject {
                code: 1004,
                message: "DNS Validation Error".to_string(),
            },
        ];

        match envelope_error(&errors) {
            ProviderError::Api { code, message } => {
                assert_eq!(code, 81057);
                assert!(message.contains("already exists"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_envelope_error_without_detail() {
        match envelope_error(&[]) {
            ProviderError::Api { code, .. } => assert_eq!(code, 0),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_zone_name_normalization() {
        assert_eq!(normalize_zone_name("Example.COM."), "example.com");
        assert_eq!(normalize_zone_name(" example.com "), "example.com");
        assert_eq!(normalize_zone_name("example.com"), "example.com");
    }

    #[test]
    fn test_envelope_deserializes_with_missing_optional_fields() {
        let json = r#"{"success": true, "result": [{"id": "z1", "name": "example.com"}]}"#;
        let parsed: ApiResponse<Vec<super::super::types::ZoneObject>> =
            serde_json::from_str(json).expect("envelope without errors/result_info must parse");

        assert!(parsed.success);
        assert!(parsed.errors.is_empty());
        assert!(parsed.result_info.is_none());
        assert_eq!(parsed.result.unwrap().len(), 1);
    }

    #[test]
    fn test_record_without_proxied_field_defaults_to_false() {
        let json = r#"{
            "id": "abc123",
            "name": "api.example.com",
            "type": "A",
            "content": "192.0.2.1",
            "ttl": 120
        }"#;
        let record: DnsRecordObject = serde_json::from_str(json).unwrap();
        assert!(!record.proxied);
    }
}
