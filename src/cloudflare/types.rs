// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Wire types for the Cloudflare v4 API.
//!
//! Only the fields the controller consumes are modeled; everything else in
//! the payloads is ignored by serde.

use serde::{Deserialize, Serialize};

/// Standard Cloudflare response envelope.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiErrorObject>,
    pub result: Option<T>,
    #[serde(default)]
    pub result_info: Option<ResultInfo>,
}

/// One entry of the envelope's `errors` array.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorObject {
    pub code: i64,
    pub message: String,
}

/// Pagination metadata on list responses.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResultInfo {
    pub page: u32,
    pub total_pages: u32,
}

/// A zone object from `GET /zones`.
#[derive(Debug, Deserialize)]
pub struct ZoneObject {
    pub id: String,
    pub name: String,
}

/// A DNS record object from `GET /zones/{id}/dns_records`.
#[derive(Debug, Deserialize)]
pub struct DnsRecordObject {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record data; the IPv4 address for A records
    pub content: String,
    pub ttl: u32,
    /// Absent for record types that cannot be proxied
    #[serde(default)]
    pub proxied: bool,
}

/// Body of `POST /zones/{id}/dns_records`.
#[derive(Debug, Serialize)]
pub struct CreateRecordRequest<'a> {
    #[serde(rename = "type")]
    pub record_type: &'static str,
    pub name: &'a str,
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
}
