// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Live view of the cluster: nodes and DNS-annotated Services.
//!
//! The observer runs one watch task per resource kind. Each task performs an
//! initial list (replacing its snapshot atomically) and then follows the
//! event stream, re-listing on any transport error. The watch task is the
//! sole writer of its snapshot; everyone else reads immutable copies taken
//! at pass start, so missed events during a watch gap are harmless.
//!
//! Every observed change raises the coalesced sync signal; a burst of events
//! collapses into at most one extra reconciliation pass.

pub mod annotations;
pub mod node;

use crate::model::{HostnameSpec, NodeState, ServiceRef};
use crate::sync::signal::SyncSignal;
use crate::sync::status::StatusPublisher;
use anyhow::Result;
use futures::StreamExt;
use futures::TryStreamExt;
use k8s_openapi::api::core::v1::{Node, Service};
use kube::runtime::watcher::Event;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Client};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

/// Read access to the observer's state, taken as an immutable copy.
#[async_trait::async_trait]
pub trait ClusterView: Send + Sync {
    async fn snapshot(&self) -> ClusterSnapshot;
}

/// Point-in-time copy of the observed cluster state.
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    pub nodes: Vec<NodeState>,
    /// One entry per managed Service; hostname conflicts are resolved later
    /// by the registry
    pub specs: Vec<HostnameSpec>,
}

/// Indexed snapshots behind a reader-writer discipline.
struct ClusterCache {
    nodes: RwLock<BTreeMap<String, NodeState>>,
    services: RwLock<BTreeMap<ServiceRef, HostnameSpec>>,
    node_watch_synced: AtomicBool,
    service_watch_synced: AtomicBool,
}

impl ClusterCache {
    fn new() -> Self {
        Self {
            nodes: RwLock::new(BTreeMap::new()),
            services: RwLock::new(BTreeMap::new()),
            node_watch_synced: AtomicBool::new(false),
            service_watch_synced: AtomicBool::new(false),
        }
    }

    async fn snapshot(&self) -> ClusterSnapshot {
        let nodes = self.nodes.read().await.values().cloned().collect();
        let specs = self.services.read().await.values().cloned().collect();
        ClusterSnapshot { nodes, specs }
    }

    /// Replace the node snapshot wholesale; returns whether anything changed.
    async fn replace_nodes(&self, next: BTreeMap<String, NodeState>) -> bool {
        let mut nodes = self.nodes.write().await;
        let changed = *nodes != next;
        *nodes = next;
        changed
    }

    async fn upsert_node(&self, state: NodeState) -> bool {
        let mut nodes = self.nodes.write().await;
        let previous = nodes.insert(state.name.clone(), state.clone());
        previous.as_ref() != Some(&state)
    }

    async fn remove_node(&self, name: &str) -> bool {
        self.nodes.write().await.remove(name).is_some()
    }

    async fn replace_services(&self, next: BTreeMap<ServiceRef, HostnameSpec>) -> bool {
        let mut services = self.services.write().await;
        let changed = *services != next;
        *services = next;
        changed
    }

    /// Apply a projected Service; `None` means the Service is not (or no
    /// longer) managed. Returns whether the snapshot changed.
    async fn apply_service(&self, owner: ServiceRef, spec: Option<HostnameSpec>) -> bool {
        let mut services = self.services.write().await;
        match spec {
            Some(spec) => {
                let previous = services.insert(owner, spec.clone());
                previous.as_ref() != Some(&spec)
            }
            None => services.remove(&owner).is_some(),
        }
    }

    /// Mark one watch's initial list as complete; true on the first call.
    fn mark_node_watch_synced(&self) -> bool {
        !self.node_watch_synced.swap(true, Ordering::SeqCst)
    }

    fn mark_service_watch_synced(&self) -> bool {
        !self.service_watch_synced.swap(true, Ordering::SeqCst)
    }

    fn synced(&self) -> bool {
        self.node_watch_synced.load(Ordering::SeqCst)
            && self.service_watch_synced.load(Ordering::SeqCst)
    }
}

/// Maintains the node and service snapshots and feeds the engine's signal.
pub struct ClusterObserver {
    client: Client,
    cache: ClusterCache,
    status: Arc<StatusPublisher>,
}

#[async_trait::async_trait]
impl ClusterView for ClusterObserver {
    async fn snapshot(&self) -> ClusterSnapshot {
        self.cache.snapshot().await
    }
}

impl ClusterObserver {
    #[must_use]
    pub fn new(client: Client, status: Arc<StatusPublisher>) -> Self {
        Self {
            client,
            cache: ClusterCache::new(),
            status,
        }
    }

    /// Whether both initial lists have completed at least once.
    #[must_use]
    pub fn synced(&self) -> bool {
        self.cache.synced()
    }

    /// Watch cluster nodes, keeping the node snapshot current.
    ///
    /// # Errors
    ///
    /// Returns an error only if the watch stream terminates, which the
    /// backoff wrapper should prevent.
    pub async fn run_node_watch(
        &self,
        signal: Arc<SyncSignal>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        info!("starting node watch");
        let api: Api<Node> = Api::all(self.client.clone());
        let mut stream = watcher(api, watcher::Config::default())
            .default_backoff()
            .boxed();
        let mut relist: BTreeMap<String, NodeState> = BTreeMap::new();

        loop {
            let event = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("node watch stopping");
                        return Ok(());
                    }
                    continue;
                }
                event = stream.try_next() => event,
            };

            match event {
                Ok(Some(Event::Init)) => {
                    debug!("node relist started");
                    relist.clear();
                }
                Ok(Some(Event::InitApply(node_obj))) => {
                    let state = node::project_node(&node_obj);
                    relist.insert(state.name.clone(), state);
                }
                Ok(Some(Event::InitDone)) => {
                    let count = relist.len();
                    let changed = self.cache.replace_nodes(std::mem::take(&mut relist)).await;
                    let first = self.cache.mark_node_watch_synced();
                    if self.synced() {
                        self.status.set_observer_synced().await;
                    }
                    info!(nodes = count, "node list synchronized");
                    if changed || first {
                        signal.raise();
                    }
                }
                Ok(Some(Event::Apply(node_obj))) => {
                    let state = node::project_node(&node_obj);
                    let name = state.name.clone();
                    if self.cache.upsert_node(state).await {
                        debug!(node = %name, "node changed");
                        signal.raise();
                    }
                }
                Ok(Some(Event::Delete(node_obj))) => {
                    let name = node_obj.metadata.name.clone().unwrap_or_default();
                    if self.cache.remove_node(&name).await {
                        debug!(node = %name, "node removed");
                        signal.raise();
                    }
                }
                Ok(None) => anyhow::bail!("node watch stream ended unexpectedly"),
                Err(e) => {
                    warn!(error = %e, "node watch error, stream will relist");
                }
            }
        }
    }

    /// Watch Services, keeping the managed-hostname snapshot current.
    ///
    /// # Errors
    ///
    /// Returns an error only if the watch stream terminates.
    pub async fn run_service_watch(
        &self,
        signal: Arc<SyncSignal>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        info!("starting service watch");
        let api: Api<Service> = Api::all(self.client.clone());
        let mut stream = watcher(api, watcher::Config::default())
            .default_backoff()
            .boxed();
        let mut relist: BTreeMap<ServiceRef, HostnameSpec> = BTreeMap::new();

        loop {
            let event = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("service watch stopping");
                        return Ok(());
                    }
                    continue;
                }
                event = stream.try_next() => event,
            };

            match event {
                Ok(Some(Event::Init)) => {
                    debug!("service relist started");
                    relist.clear();
                }
                Ok(Some(Event::InitApply(service))) => {
                    let (owner, spec) = project_service(&service);
                    if let Some(spec) = spec {
                        relist.insert(owner, spec);
                    }
                }
                Ok(Some(Event::InitDone)) => {
                    let count = relist.len();
                    let changed = self
                        .cache
                        .replace_services(std::mem::take(&mut relist))
                        .await;
                    let first = self.cache.mark_service_watch_synced();
                    if self.synced() {
                        self.status.set_observer_synced().await;
                    }
                    info!(managed_services = count, "service list synchronized");
                    if changed || first {
                        signal.raise();
                    }
                }
                Ok(Some(Event::Apply(service))) => {
                    let (owner, spec) = project_service(&service);
                    let name = owner.to_string();
                    if self.cache.apply_service(owner, spec).await {
                        debug!(service = %name, "service DNS configuration changed");
                        signal.raise();
                    }
                }
                Ok(Some(Event::Delete(service))) => {
                    let (owner, _) = project_service(&service);
                    let name = owner.to_string();
                    if self.cache.apply_service(owner, None).await {
                        debug!(service = %name, "managed service removed");
                        signal.raise();
                    }
                }
                Ok(None) => anyhow::bail!("service watch stream ended unexpectedly"),
                Err(e) => {
                    warn!(error = %e, "service watch error, stream will relist");
                }
            }
        }
    }
}

/// Project a Service into its owner ref and, when managed, a hostname spec.
fn project_service(service: &Service) -> (ServiceRef, Option<HostnameSpec>) {
    let owner = ServiceRef {
        namespace: service.metadata.namespace.clone().unwrap_or_default(),
        name: service.metadata.name.clone().unwrap_or_default(),
    };
    let spec = match service.metadata.annotations.as_ref() {
        Some(meta) => annotations::parse_service_dns_config(owner.clone(), meta),
        None => None,
    };
    (owner, spec)
}
