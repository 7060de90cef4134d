// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The reconciliation engine.
//!
//! A single task owns the loop: it wakes on the periodic timer, on the
//! coalesced observer signal, and once at startup. Each pass snapshots the
//! cluster, derives the desired record set, diffs it per zone against the
//! provider, and applies deletes before creates with bounded concurrency.
//! Operation errors are folded into the pass report; nothing escapes the
//! loop except shutdown.
//!
//! Passes are strictly serialized. Events arriving mid-pass set the pending
//! flag and influence the next pass, never the current one.

pub mod desired;
pub mod diff;
pub mod signal;
pub mod status;

use crate::cloudflare::zones::ZoneResolver;
use crate::cluster::ClusterView;
use crate::constants::{RECORD_OP_CONCURRENCY, ZONE_CONCURRENCY};
use crate::metrics;
use crate::model::{DesiredRecord, PassOutcome, PassReport};
use crate::provider::DnsProvider;
use crate::registry;
use anyhow::Result;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use signal::SyncSignal;
use status::StatusPublisher;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Result of one create or delete against the provider.
enum OpResult {
    Done,
    /// Not attempted because shutdown was requested
    Skipped,
    Failed(String),
}

/// What happened to one zone during a pass.
#[derive(Default)]
struct ZoneOutcome {
    /// Whether the actual state could be fetched at all
    fetched: bool,
    created: usize,
    deleted: usize,
    failed: usize,
    skipped: usize,
    errors: Vec<String>,
}

impl ZoneOutcome {
    fn absorb(&mut self, results: Vec<OpResult>, counter: fn(&mut Self)) {
        for result in results {
            match result {
                OpResult::Done => counter(self),
                OpResult::Skipped => self.skipped += 1,
                OpResult::Failed(message) => {
                    self.failed += 1;
                    self.errors.push(message);
                }
            }
        }
    }
}

/// Serialized reconciliation loop over injected collaborators.
pub struct Engine<P, C> {
    cluster: Arc<C>,
    resolver: Arc<ZoneResolver<P>>,
    provider: Arc<P>,
    status: Arc<StatusPublisher>,
    sync_interval: Duration,
    /// Minimum gap between two consecutive passes (0 = none)
    min_pass_gap: Duration,
}

impl<P, C> Engine<P, C>
where
    P: DnsProvider,
    C: ClusterView,
{
    #[must_use]
    pub fn new(
        cluster: Arc<C>,
        resolver: Arc<ZoneResolver<P>>,
        provider: Arc<P>,
        status: Arc<StatusPublisher>,
        sync_interval: Duration,
        min_pass_gap: Duration,
    ) -> Self {
        Self {
            cluster,
            resolver,
            provider,
            status,
            sync_interval,
            min_pass_gap,
        }
    }

    /// Run the reconciliation loop until shutdown.
    ///
    /// The first timer tick fires immediately, giving the startup pass.
    ///
    /// # Errors
    ///
    /// Never returns an error under normal operation; pass failures are
    /// absorbed into the published status.
    pub async fn run(
        &self,
        signal: Arc<SyncSignal>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut ticker = tokio::time::interval(self.sync_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_secs = self.sync_interval.as_secs(),
            "starting reconciliation loop"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("periodic reconciliation tick");
                }
                () = signal.wait() => {
                    debug!("coalesced reconciliation signal");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("reconciliation loop stopping");
                        return Ok(());
                    }
                    continue;
                }
            }

            // Entering Running: consume the pending flag so a burst of
            // events costs at most one extra pass.
            signal.take();

            let report = self.run_pass(&shutdown).await;
            match report.outcome {
                PassOutcome::Clean => info!(
                    duration_ms = report.duration.as_millis() as u64,
                    zones = report.zones_touched,
                    created = report.records_created,
                    deleted = report.records_deleted,
                    "reconciliation pass clean"
                ),
                PassOutcome::Partial => warn!(
                    duration_ms = report.duration.as_millis() as u64,
                    zones = report.zones_touched,
                    created = report.records_created,
                    deleted = report.records_deleted,
                    failed = report.operations_failed,
                    skipped = report.operations_skipped,
                    "reconciliation pass partial"
                ),
                PassOutcome::Failed => error!(
                    duration_ms = report.duration.as_millis() as u64,
                    errors = report.errors.len(),
                    "reconciliation pass failed"
                ),
            }

            metrics::observe_pass(&report);
            self.status.publish_pass(&report).await;
            let zones = self.resolver.zone_names().await;
            metrics::set_known_zones(zones.len());
            self.status.set_zones(zones).await;

            if !self.min_pass_gap.is_zero() {
                tokio::time::sleep(self.min_pass_gap).await;
            }
        }
    }

    /// Execute one reconciliation pass end to end.
    pub(crate) async fn run_pass(&self, shutdown: &watch::Receiver<bool>) -> PassReport {
        let started_at = Utc::now();
        let started = Instant::now();

        // 1. Atomic snapshot; mid-pass events affect the next pass.
        let snapshot = self.cluster.snapshot().await;
        let specs = registry::active_specs(snapshot.specs);
        let eligible: Vec<_> = snapshot
            .nodes
            .iter()
            .filter(|node| node.is_eligible())
            .cloned()
            .collect();
        debug!(
            nodes = snapshot.nodes.len(),
            eligible = eligible.len(),
            specs = specs.len(),
            "pass snapshot taken"
        );

        let mut errors: Vec<String> = Vec::new();

        // 2. Resolve each spec hostname to its owning zone. A hostname with
        // no zone is a configuration problem: logged and dropped from this
        // pass without demoting the outcome.
        let mut zones_by_hostname: BTreeMap<String, String> = BTreeMap::new();
        let mut resolver_failed = false;
        for spec in &specs {
            if zones_by_hostname.contains_key(&spec.hostname) {
                continue;
            }
            match self.resolver.resolve(&spec.hostname).await {
                Ok(Some(zone_id)) => {
                    zones_by_hostname.insert(spec.hostname.clone(), zone_id);
                }
                Ok(None) => {
                    warn!(
                        hostname = %spec.hostname,
                        owner = %spec.owner,
                        "hostname matches no accessible zone, skipping"
                    );
                }
                Err(e) => {
                    resolver_failed = true;
                    errors.push(format!("resolve {}: {e}", spec.hostname));
                    warn!(hostname = %spec.hostname, error = %e, "zone resolution failed");
                }
            }
        }

        // 3. Desired state, partitioned by zone. Every resolved zone is
        // touched even when its desired set is empty, so records of fully
        // drained hostnames still get deleted.
        let build = desired::build(&eligible, &specs, &zones_by_hostname);
        let mut zone_work: BTreeMap<String, Vec<_>> = zones_by_hostname
            .values()
            .map(|zone_id| (zone_id.clone(), Vec::new()))
            .collect();
        for record in build.records {
            if let Some(records) = zone_work.get_mut(&record.zone_id) {
                records.push(record);
            }
        }

        let owned_hostnames: BTreeSet<String> =
            specs.iter().map(|spec| spec.hostname.clone()).collect();

        // 4. Reconcile zones concurrently, bounded.
        let zone_outcomes: Vec<ZoneOutcome> = stream::iter(zone_work)
            .map(|(zone_id, desired_records)| {
                let owned = &owned_hostnames;
                let shutdown = shutdown.clone();
                async move { self.sync_zone(zone_id, desired_records, owned, shutdown).await }
            })
            .buffer_unordered(ZONE_CONCURRENCY)
            .collect()
            .await;

        // 5. Fold everything into the pass report.
        let zones_touched = zone_outcomes.len();
        let zones_fetched = zone_outcomes.iter().filter(|o| o.fetched).count();
        let records_created = zone_outcomes.iter().map(|o| o.created).sum::<usize>();
        let records_deleted = zone_outcomes.iter().map(|o| o.deleted).sum::<usize>();
        let operations_failed = zone_outcomes.iter().map(|o| o.failed).sum::<usize>();
        let operations_skipped = zone_outcomes.iter().map(|o| o.skipped).sum::<usize>();
        for outcome in &zone_outcomes {
            errors.extend(outcome.errors.iter().cloned());
        }

        let outcome = if (zones_touched > 0 && zones_fetched == 0)
            || (resolver_failed && zones_touched == 0)
        {
            PassOutcome::Failed
        } else if operations_failed > 0
            || operations_skipped > 0
            || zones_fetched < zones_touched
            || resolver_failed
        {
            PassOutcome::Partial
        } else {
            PassOutcome::Clean
        };

        PassReport {
            started_at,
            duration: started.elapsed(),
            outcome,
            zones_touched,
            records_created,
            records_deleted,
            operations_failed,
            operations_skipped,
            eligible_nodes: eligible.len(),
            total_nodes: snapshot.nodes.len(),
            active_specs: specs.len(),
            errors,
        }
    }

    /// Fetch, diff, and converge a single zone.
    ///
    /// Deletes are applied first and fully settled before any create is
    /// issued, which enforces the delete-before-create ordering for
    /// attribute replacements keyed on the same (hostname, ipv4).
    async fn sync_zone(
        &self,
        zone_id: String,
        desired_records: Vec<DesiredRecord>,
        owned_hostnames: &BTreeSet<String>,
        shutdown: watch::Receiver<bool>,
    ) -> ZoneOutcome {
        let mut outcome = ZoneOutcome::default();

        let actual = match self.provider.list_a_records(&zone_id).await {
            Ok(records) => records,
            Err(e) => {
                error!(zone_id = %zone_id, error = %e, "failed to fetch zone records");
                outcome.errors.push(format!("list zone {zone_id}: {e}"));
                return outcome;
            }
        };
        outcome.fetched = true;

        // Only records whose hostname belongs to a spec are ours; everything
        // else in the zone is invisible to the diff and never mutated.
        let owned_actual: Vec<_> = actual
            .into_iter()
            .filter(|record| owned_hostnames.contains(&record.hostname))
            .collect();

        let zone_diff = diff::compute(&desired_records, &owned_actual);
        if zone_diff.is_empty() {
            debug!(zone_id = %zone_id, "zone already converged");
            return outcome;
        }
        debug!(
            zone_id = %zone_id,
            creates = zone_diff.to_create.len(),
            deletes = zone_diff.to_delete.len(),
            replaced = zone_diff.replaced,
            "applying zone diff"
        );

        let zone = zone_id.as_str();

        let delete_results: Vec<OpResult> = stream::iter(zone_diff.to_delete)
            .map(|record| {
                let shutdown = shutdown.clone();
                async move {
                    if *shutdown.borrow() {
                        return OpResult::Skipped;
                    }
                    match self
                        .provider
                        .delete_a_record(zone, &record.provider_id)
                        .await
                    {
                        Ok(()) => {
                            info!(
                                hostname = %record.hostname,
                                ipv4 = %record.ipv4,
                                zone_id = %zone,
                                "removed record"
                            );
                            OpResult::Done
                        }
                        Err(e) => {
                            error!(
                                hostname = %record.hostname,
                                ipv4 = %record.ipv4,
                                zone_id = %zone,
                                error = %e,
                                "failed to delete record"
                            );
                            metrics::record_operation_failure("delete");
                            OpResult::Failed(format!(
                                "delete {} {} in {}: {e}",
                                record.hostname, record.ipv4, zone
                            ))
                        }
                    }
                }
            })
            .buffer_unordered(RECORD_OP_CONCURRENCY)
            .collect()
            .await;
        outcome.absorb(delete_results, |o| o.deleted += 1);

        let create_results: Vec<OpResult> = stream::iter(zone_diff.to_create)
            .map(|record| {
                let shutdown = shutdown.clone();
                async move {
                    if *shutdown.borrow() {
                        return OpResult::Skipped;
                    }
                    match self
                        .provider
                        .create_a_record(
                            zone,
                            &record.hostname,
                            record.ipv4,
                            record.ttl,
                            record.proxied,
                        )
                        .await
                    {
                        Ok(_) => OpResult::Done,
                        Err(e) => {
                            error!(
                                hostname = %record.hostname,
                                ipv4 = %record.ipv4,
                                zone_id = %zone,
                                error = %e,
                                "failed to create record"
                            );
                            metrics::record_operation_failure("create");
                            OpResult::Failed(format!(
                                "create {} {} in {}: {e}",
                                record.hostname, record.ipv4, zone
                            ))
                        }
                    }
                }
            })
            .buffer_unordered(RECORD_OP_CONCURRENCY)
            .collect()
            .await;
        outcome.absorb(create_results, |o| o.created += 1);

        outcome
    }
}
