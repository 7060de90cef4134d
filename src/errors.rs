// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS provider error taxonomy.
//!
//! Every provider operation returns a [`ProviderError`] instead of a raw HTTP
//! error, so callers can branch on semantics (retry, drop, treat as success)
//! without parsing error strings. The retryable/non-retryable classification
//! lives here, centralized in [`ProviderError::is_retryable`].

use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the DNS provider client.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Provider rate limiting (HTTP 429); retryable.
    #[error("provider rate limited the request (HTTP 429)")]
    RateLimited,

    /// Provider-side failure (HTTP 5xx); retryable.
    #[error("provider unavailable (HTTP {status})")]
    Unavailable {
        /// The 5xx status code returned
        status: u16,
    },

    /// Connection, DNS, TLS, or timeout failure before a response arrived; retryable.
    #[error("transport error talking to provider: {0}")]
    Transport(String),

    /// Credential rejected (HTTP 401/403); not retryable.
    #[error("provider rejected credentials (HTTP {status}): {message}")]
    Auth {
        /// 401 or 403
        status: u16,
        /// Provider error payload, for diagnostics
        message: String,
    },

    /// Request rejected (HTTP 4xx other than 401/403/404/429); not retryable.
    #[error("provider rejected the request (HTTP {status}): {message}")]
    Rejected {
        /// The 4xx status code returned
        status: u16,
        /// Provider error payload, for diagnostics
        message: String,
    },

    /// Target zone or record does not exist (HTTP 404).
    ///
    /// The client maps this to success on delete (idempotence); everywhere
    /// else it is a permanent error.
    #[error("zone or record not found (HTTP 404)")]
    NotFound,

    /// HTTP layer succeeded but the API envelope reported `success: false`.
    #[error("provider API error {code}: {message}")]
    Api {
        /// Provider-assigned error code
        code: i64,
        /// Provider error message
        message: String,
    },

    /// Response body did not match the expected wire shape.
    #[error("failed to decode provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Whether the operation should be retried with backoff.
    ///
    /// Retryable: rate limiting (429), server errors (5xx), transport
    /// failures. Everything else fails fast.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Unavailable { .. } | Self::Transport(_)
        )
    }

    /// Classify a non-2xx HTTP status into the taxonomy.
    #[must_use]
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = truncate_body(body);
        match status {
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth {
                status: status.as_u16(),
                message,
            },
            s if s.is_server_error() => Self::Unavailable {
                status: s.as_u16(),
            },
            s => Self::Rejected {
                status: s.as_u16(),
                message,
            },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Keep provider payloads in diagnostics without flooding the logs.
fn truncate_body(body: &str) -> String {
    const MAX: usize = 512;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
