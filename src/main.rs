// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use epictetus::cloudflare::zones::ZoneResolver;
use epictetus::cloudflare::CloudflareApi;
use epictetus::cluster::ClusterObserver;
use epictetus::config::Config;
use epictetus::constants::{SHUTDOWN_GRACE_SECS, TOKIO_WORKER_THREADS};
use epictetus::health;
use epictetus::metrics;
use epictetus::sync::signal::SyncSignal;
use epictetus::sync::status::StatusPublisher;
use epictetus::sync::Engine;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("epictetus-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// Initialize logging with custom format
///
/// Respects `RUST_LOG` if set, falling back to `LOG_LEVEL` (default info).
/// Respects `LOG_FORMAT` for the output format (json or text).
fn initialize_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        tracing_subscriber::EnvFilter::new(level.to_lowercase())
    });

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting Epictetus DNS controller");
    debug!("Logging initialized");
}

/// Build the Kubernetes client from `K8S_CONFIG_PATH` or in-cluster config.
async fn build_kube_client(config: &Config) -> Result<Client> {
    match &config.kubeconfig_path {
        Some(path) => {
            info!(path = %path.display(), "loading kubeconfig from file");
            let kubeconfig = Kubeconfig::read_from(path)?;
            let client_config =
                kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await?;
            Ok(Client::try_from(client_config)?)
        }
        None => {
            info!("using in-cluster Kubernetes configuration");
            Ok(Client::try_default().await?)
        }
    }
}

async fn wait_for_sigterm() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        sigterm.recv().await;
        Ok(())
    }
    #[cfg(not(unix))]
    {
        // On non-Unix platforms, just wait forever
        std::future::pending::<()>().await;
        Ok(())
    }
}

async fn async_main() -> Result<()> {
    initialize_logging();

    let config = Config::from_env()?;
    info!(
        sync_interval_secs = config.sync_interval.as_secs(),
        health_check_interval_secs = config.health_check_interval.as_secs(),
        health_server = config.enable_health_server,
        max_retries = config.max_retries,
        "configuration loaded"
    );

    let client = build_kube_client(&config).await?;

    let provider = Arc::new(CloudflareApi::new(
        &config.cloudflare_api_token,
        config.retry_policy(),
    )?);
    let resolver = Arc::new(ZoneResolver::new(provider.clone()));

    // Populate the zone cache up front. An unusable credential surfaces
    // here and refuses to start the controller.
    resolver
        .refresh()
        .await
        .map_err(|e| anyhow::anyhow!("initial zone discovery failed: {e}"))?;
    let zones = resolver.zone_names().await;
    info!(zones = zones.len(), "discovered accessible zones");
    metrics::set_known_zones(zones.len());

    let status = Arc::new(StatusPublisher::new());
    status.set_zones(zones).await;

    let observer = Arc::new(ClusterObserver::new(client, status.clone()));
    let signal = Arc::new(SyncSignal::new());
    let engine = Arc::new(Engine::new(
        observer.clone(),
        resolver.clone(),
        provider.clone(),
        status.clone(),
        config.sync_interval,
        config.sync_min_gap,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut tasks: JoinSet<(&'static str, Result<()>)> = JoinSet::new();
    {
        let observer = observer.clone();
        let signal = signal.clone();
        let shutdown = shutdown_rx.clone();
        tasks.spawn(async move { ("node watch", observer.run_node_watch(signal, shutdown).await) });
    }
    {
        let observer = observer.clone();
        let signal = signal.clone();
        let shutdown = shutdown_rx.clone();
        tasks.spawn(
            async move { ("service watch", observer.run_service_watch(signal, shutdown).await) },
        );
    }
    {
        let engine = engine.clone();
        let signal = signal.clone();
        let shutdown = shutdown_rx.clone();
        tasks.spawn(async move { ("reconciliation loop", engine.run(signal, shutdown).await) });
    }
    {
        let status = status.clone();
        let shutdown = shutdown_rx.clone();
        let enabled = config.enable_health_server;
        let port = config.health_port;
        tasks.spawn(async move {
            ("status server", health::serve(enabled, port, status, shutdown).await)
        });
    }
    {
        let status = status.clone();
        let shutdown = shutdown_rx.clone();
        let interval = config.health_check_interval;
        let sync_interval = config.sync_interval;
        tasks.spawn(async move {
            (
                "health sampler",
                health::run_sampler(status, interval, sync_interval, shutdown).await,
            )
        });
    }

    supervise(tasks, shutdown_tx).await?;
    info!("Graceful shutdown completed successfully");
    Ok(())
}

/// Wait for a shutdown signal or an unexpected task exit, then drain.
///
/// On SIGINT/SIGTERM the shutdown flag is flipped and every task gets a
/// bounded window to finish its current operation before the process exits.
async fn supervise(
    mut tasks: JoinSet<(&'static str, Result<()>)>,
    shutdown_tx: watch::Sender<bool>,
) -> Result<()> {
    // First event wins: a signal, or a task exiting on its own.
    let early_exit: Option<(&'static str, Result<()>)> = tokio::select! {
        result = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
            result?;
            None
        }
        result = wait_for_sigterm() => {
            info!("Received SIGTERM (pod termination), initiating graceful shutdown...");
            result?;
            None
        }
        joined = tasks.join_next() => match joined {
            Some(Ok((name, result))) => Some((name, result)),
            Some(Err(e)) => Some(("unknown", Err(anyhow::Error::from(e)))),
            None => None,
        }
    };

    // Stop everything; in-flight passes finish their current operation and
    // skip the rest.
    let _ = shutdown_tx.send(true);

    let drained = tokio::time::timeout(Duration::from_secs(SHUTDOWN_GRACE_SECS), async {
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, Ok(()))) => debug!(task = name, "task stopped"),
                Ok((name, Err(e))) => {
                    error!(task = name, error = %e, "task exited with error during shutdown");
                }
                Err(e) => error!(error = %e, "task panicked during shutdown"),
            }
        }
    })
    .await;
    if drained.is_err() {
        warn!("shutdown grace period elapsed, aborting remaining tasks");
        tasks.abort_all();
    }

    match early_exit {
        None => Ok(()),
        Some((name, Ok(()))) => {
            error!("CRITICAL: {name} task exited unexpectedly");
            anyhow::bail!("{name} task exited unexpectedly without error")
        }
        Some((name, Err(e))) => {
            error!("CRITICAL: {name} task exited unexpectedly: {e:?}");
            Err(e)
        }
    }
}
