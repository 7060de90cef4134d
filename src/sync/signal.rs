// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Coalesced wake-up signal between the observer and the engine.
//!
//! A single-slot pending flag: any number of raises while a pass is running
//! collapse into one pending reconciliation. The engine clears the flag when
//! it begins a pass and re-checks it when it returns to idle.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Single-slot, burst-collapsing wake-up.
#[derive(Default)]
pub struct SyncSignal {
    pending: AtomicBool,
    notify: Notify,
}

impl SyncSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a reconciliation as pending and wake the engine if it is idle.
    pub fn raise(&self) {
        if !self.pending.swap(true, Ordering::SeqCst) {
            self.notify.notify_one();
        }
    }

    /// Wait until a reconciliation is pending.
    ///
    /// Stale notify permits (left over from an already-consumed raise) are
    /// absorbed by re-checking the flag.
    pub async fn wait(&self) {
        loop {
            if self.pending.load(Ordering::SeqCst) {
                return;
            }
            self.notify.notified().await;
        }
    }

    /// Consume the pending flag; returns whether one was set.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod signal_tests;
