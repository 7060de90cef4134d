// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed Cloudflare API client.
//!
//! A thin wrapper over the Cloudflare v4 HTTP API implementing
//! [`DnsProvider`]: list A records in a zone, create an A record, delete an
//! A record by id, list zones. Every operation is wrapped with the
//! configured bounded-attempt retry; pagination is handled internally.
//!
//! Error mapping is centralized in [`crate::errors::ProviderError`], and a
//! 404 on delete is reported as success so deletes are idempotent.

pub mod types;
pub mod zones;

use crate::constants::{CLOUDFLARE_API_BASE, CLOUDFLARE_PAGE_SIZE, PROVIDER_REQUEST_TIMEOUT_SECS};
use crate::errors::ProviderError;
use crate::model::{ActualRecord, Zone};
use crate::provider::DnsProvider;
use crate::retry::{with_retry, RetryPolicy};
use reqwest::{Client as HttpClient, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, info};
use types::{ApiErrorObject, ApiResponse, CreateRecordRequest, DnsRecordObject, ZoneObject};

/// Cloudflare v4 API client with retry and pagination.
pub struct CloudflareApi {
    http: HttpClient,
    token: String,
    base_url: String,
    retry: RetryPolicy,
}

impl CloudflareApi {
    /// Build a client for the given API token.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(token: &str, retry: RetryPolicy) -> Result<Self, ProviderError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(PROVIDER_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            token: token.to_string(),
            base_url: CLOUDFLARE_API_BASE.to_string(),
            retry,
        })
    }

    /// Perform one request and decode the Cloudflare envelope.
    async fn request<T, B>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse<T>, ProviderError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        let mut request = self.http.request(method, url).bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::from_status(status, &text));
        }

        let parsed: ApiResponse<T> =
            serde_json::from_str(&text).map_err(|e| ProviderError::Decode(e.to_string()))?;

        if !parsed.success {
            return Err(envelope_error(&parsed.errors));
        }

        Ok(parsed)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<ApiResponse<T>, ProviderError> {
        self.request::<T, ()>(Method::GET, url, None).await
    }

    /// Fetch every page of a list endpoint, with per-page retry.
    async fn list_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        operation_name: &str,
    ) -> Result<Vec<T>, ProviderError> {
        let separator = if path.contains('?') { '&' } else { '?' };
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let url = format!(
                "{}{path}{separator}page={page}&per_page={CLOUDFLARE_PAGE_SIZE}",
                self.base_url
            );
            let response: ApiResponse<Vec<T>> =
                with_retry(&self.retry, operation_name, || self.get(&url)).await?;

            let batch = response.result.unwrap_or_default();
            debug!(
                operation = operation_name,
                page = page,
                items = batch.len(),
                "fetched provider page"
            );
            items.extend(batch);

            match response.result_info {
                Some(info) if info.page < info.total_pages => page = info.page + 1,
                _ => break,
            }
        }

        Ok(items)
    }
}

#[async_trait::async_trait]
impl DnsProvider for CloudflareApi {
    async fn list_zones(&self) -> Result<Vec<Zone>, ProviderError> {
        let zones: Vec<ZoneObject> = self.list_paginated("/zones", "list zones").await?;
        Ok(zones
            .into_iter()
            .map(|z| Zone {
                id: z.id,
                name: normalize_zone_name(&z.name),
            })
            .collect())
    }

    async fn list_a_records(&self, zone_id: &str) -> Result<Vec<ActualRecord>, ProviderError> {
        let path = format!("/zones/{zone_id}/dns_records?type=A");
        let records: Vec<DnsRecordObject> = self.list_paginated(&path, "list records").await?;
        Ok(records
            .into_iter()
            .filter_map(|r| record_from_wire(zone_id, r))
            .collect())
    }

    async fn create_a_record(
        &self,
        zone_id: &str,
        hostname: &str,
        ipv4: Ipv4Addr,
        ttl: u32,
        proxied: bool,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/zones/{zone_id}/dns_records", self.base_url);
        let body = CreateRecordRequest {
            record_type: "A",
            name: hostname,
            content: ipv4.to_string(),
            ttl,
            proxied,
        };

        let response: ApiResponse<DnsRecordObject> = with_retry(&self.retry, "create record", || {
            self.request(Method::POST, &url, Some(&body))
        })
        .await?;

        let record = response
            .result
            .ok_or_else(|| ProviderError::Decode("create response carried no record".to_string()))?;

        info!(
            hostname = hostname,
            ipv4 = %ipv4,
            zone_id = zone_id,
            record_id = %record.id,
            ttl = ttl,
            proxied = proxied,
            "created DNS record"
        );
        Ok(record.id)
    }

    async fn delete_a_record(
        &self,
        zone_id: &str,
        provider_id: &str,
    ) -> Result<(), ProviderError> {
        let url = format!("{}/zones/{zone_id}/dns_records/{provider_id}", self.base_url);

        let result: Result<ApiResponse<serde_json::Value>, ProviderError> =
            with_retry(&self.retry, "delete record", || {
                self.request::<serde_json::Value, ()>(Method::DELETE, &url, None)
            })
            .await;

        match result {
            Ok(_) => {
                info!(record_id = provider_id, zone_id = zone_id, "deleted DNS record");
                Ok(())
            }
            // The record is already gone; the delete achieved its goal.
            Err(ProviderError::NotFound) => {
                debug!(
                    record_id = provider_id,
                    zone_id = zone_id,
                    "record already absent on delete"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Map an envelope with `success: false` to the error taxonomy.
pub(crate) fn envelope_error(errors: &[ApiErrorObject]) -> ProviderError {
    match errors.first() {
        Some(first) => ProviderError::Api {
            code: first.code,
            message: first.message.clone(),
        },
        None => ProviderError::Api {
            code: 0,
            message: "provider reported failure without detail".to_string(),
        },
    }
}

/// Project a wire record into the model, dropping anything that is not a
/// well-formed IPv4 A record.
pub(crate) fn record_from_wire(zone_id: &str, record: DnsRecordObject) -> Option<ActualRecord> {
    if record.record_type != "A" {
        return None;
    }
    let ipv4: Ipv4Addr = record.content.parse().ok()?;
    Some(ActualRecord {
        provider_id: record.id,
        hostname: record.name.to_lowercase(),
        ipv4,
        ttl: record.ttl,
        proxied: record.proxied,
        zone_id: zone_id.to_string(),
    })
}

/// Zone apexes are compared as DNS suffixes; keep them lowercase and undotted.
pub(crate) fn normalize_zone_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_lowercase()
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;
