// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Environment-variable configuration.
//!
//! Everything is read once at startup. A missing credential or an
//! out-of-range value is fatal: the process refuses to start rather than
//! run with a configuration it cannot honor.

use crate::constants::{
    DEFAULT_HEALTH_CHECK_INTERVAL_SECS, DEFAULT_HEALTH_PORT, DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_DELAY_SECS, DEFAULT_SYNC_INTERVAL_SECS, DEFAULT_SYNC_MIN_GAP_SECS,
    MIN_HEALTH_CHECK_INTERVAL_SECS, MIN_SYNC_INTERVAL_SECS,
};
use crate::retry::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Startup-time configuration errors; all of them are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("CLOUDFLARE_API_TOKEN is required")]
    MissingToken,

    #[error("{name} must be a positive integer, got {value:?}")]
    InvalidInteger { name: &'static str, value: String },

    #[error("{name} must be at least {min} seconds, got {value}")]
    IntervalTooShort {
        name: &'static str,
        min: u64,
        value: u64,
    },
}

/// Runtime configuration assembled from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cloudflare API token (`CLOUDFLARE_API_TOKEN`, required)
    pub cloudflare_api_token: String,
    /// Periodic reconciliation interval (`DNS_SYNC_INTERVAL`, >= 10s)
    pub sync_interval: Duration,
    /// Minimum gap between passes (`DNS_SYNC_MIN_GAP`, default 0)
    pub sync_min_gap: Duration,
    /// Self-health sampling cadence (`HEALTH_CHECK_INTERVAL`, >= 5s)
    pub health_check_interval: Duration,
    /// Whether to serve the HTTP status surface (`ENABLE_HEALTH_SERVER`)
    pub enable_health_server: bool,
    /// Status surface port (`HEALTH_PORT`)
    pub health_port: u16,
    /// Kubeconfig path (`K8S_CONFIG_PATH`); empty means in-cluster
    pub kubeconfig_path: Option<PathBuf>,
    /// Bounded-attempt count for provider calls (`MAX_RETRIES`)
    pub max_retries: u32,
    /// Base backoff between provider retries (`RETRY_DELAY`)
    pub retry_delay: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] on a missing credential or invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary lookup (used by tests).
    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let cloudflare_api_token = lookup("CLOUDFLARE_API_TOKEN")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let sync_interval_secs = parse_u64(
            &lookup,
            "DNS_SYNC_INTERVAL",
            DEFAULT_SYNC_INTERVAL_SECS,
        )?;
        if sync_interval_secs < MIN_SYNC_INTERVAL_SECS {
            return Err(ConfigError::IntervalTooShort {
                name: "DNS_SYNC_INTERVAL",
                min: MIN_SYNC_INTERVAL_SECS,
                value: sync_interval_secs,
            });
        }

        let sync_min_gap_secs = parse_u64(&lookup, "DNS_SYNC_MIN_GAP", DEFAULT_SYNC_MIN_GAP_SECS)?;

        let health_check_interval_secs = parse_u64(
            &lookup,
            "HEALTH_CHECK_INTERVAL",
            DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
        )?;
        if health_check_interval_secs < MIN_HEALTH_CHECK_INTERVAL_SECS {
            return Err(ConfigError::IntervalTooShort {
                name: "HEALTH_CHECK_INTERVAL",
                min: MIN_HEALTH_CHECK_INTERVAL_SECS,
                value: health_check_interval_secs,
            });
        }

        let enable_health_server = lookup("ENABLE_HEALTH_SERVER")
            .map_or(true, |value| value.trim().eq_ignore_ascii_case("true"));

        let health_port = match lookup("HEALTH_PORT") {
            None => DEFAULT_HEALTH_PORT,
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidInteger {
                name: "HEALTH_PORT",
                value: raw,
            })?,
        };

        let kubeconfig_path = lookup("K8S_CONFIG_PATH")
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        let max_retries = match lookup("MAX_RETRIES") {
            None => DEFAULT_MAX_RETRIES,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(value) if value >= 1 => value,
                _ => {
                    return Err(ConfigError::InvalidInteger {
                        name: "MAX_RETRIES",
                        value: raw,
                    })
                }
            },
        };

        let retry_delay_secs = parse_u64(&lookup, "RETRY_DELAY", DEFAULT_RETRY_DELAY_SECS)?;

        Ok(Self {
            cloudflare_api_token,
            sync_interval: Duration::from_secs(sync_interval_secs),
            sync_min_gap: Duration::from_secs(sync_min_gap_secs),
            health_check_interval: Duration::from_secs(health_check_interval_secs),
            enable_health_server,
            health_port,
            kubeconfig_path,
            max_retries,
            retry_delay: Duration::from_secs(retry_delay_secs),
        })
    }

    /// Retry policy for the provider client.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_delay)
    }
}

fn parse_u64(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidInteger { name, value: raw }),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
