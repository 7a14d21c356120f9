/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use crate::dal::DAL;
use crate::db::{create_shared_connection_pool, ConnectionPool};
use crate::health::{self, HealthState};
use crate::k8s::{ClusterClient, KubeClientFactory, KubeClusterClient};
use crate::metrics;
use crate::reconciler::{start_reconciler_task, Reconciler, SweepPolicy};
use gitops_utils::config::Settings;
use gitops_utils::logging::prelude::*;
use gitops_utils::ReloadableConfig;
use std::sync::Arc;
use tokio::signal;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

fn connect_database(settings: &Settings) -> Result<ConnectionPool, Box<dyn std::error::Error>> {
    info!("Creating database connection pool");
    let pool = create_shared_connection_pool(
        &settings.database.url,
        settings.database.max_connections,
        settings.database.schema.as_deref(),
    )?;
    info!("Database connection pool created successfully");
    Ok(pool)
}

async fn build_reconciler(
    settings: &Settings,
    pool: ConnectionPool,
) -> Result<Arc<Reconciler>, Box<dyn std::error::Error>> {
    info!("Connecting to Kubernetes");
    let local: Arc<dyn ClusterClient> = Arc::new(
        KubeClusterClient::connect(settings.kubernetes.kubeconfig_path.as_deref()).await?,
    );
    let factory = Arc::new(KubeClientFactory::new(local.clone()));
    let dal = DAL::new_allow_unsafe(pool);
    Ok(Arc::new(Reconciler::new(Arc::new(dal), local, factory)))
}

/// Applies pending migrations.
pub fn migrate(config: &ReloadableConfig) -> CommandResult {
    let pool = connect_database(config.static_config())?;
    info!("Running pending database migrations");
    let applied = pool.run_migrations()?;
    info!("Applied {} migration(s)", applied);
    Ok(())
}

/// Runs one sweep cycle and exits. Fails when any family failed.
pub async fn sweep(config: &ReloadableConfig) -> CommandResult {
    let settings = config.static_config();
    let pool = connect_database(settings)?;
    let reconciler = build_reconciler(settings, pool).await?;

    let report = reconciler.run_cycle(&SweepPolicy::from_config(config)).await;
    for (family, result) in &report.families {
        match result {
            Ok(r) => info!("{}: {}", family, r),
            Err(e) => error!("{}: {}", family, e),
        }
    }

    let failed = report.failed_families();
    if failed.is_empty() {
        Ok(())
    } else {
        Err(format!("{} families failed: {:?}", failed.len(), failed).into())
    }
}

/// Applies a configuration reload and the log level it carries.
fn reload_config(config: &ReloadableConfig) {
    match config.reload() {
        Ok(changes) if changes.is_empty() => {
            info!("Configuration reloaded with no changes detected");
        }
        Ok(changes) => {
            info!(
                "Configuration reloaded with {} change(s): {:?}",
                changes.len(),
                changes.iter().map(|c| &c.key).collect::<Vec<_>>()
            );
            if changes.iter().any(|c| c.key == "log.level") {
                if let Err(e) = gitops_utils::logging::update_log_level(&config.log_level()) {
                    error!("Failed to apply new log level: {}", e);
                }
            }
        }
        Err(e) => error!("Failed to reload configuration: {}", e),
    }
}

#[cfg(unix)]
fn spawn_reload_listener(config: ReloadableConfig) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to listen for SIGHUP, reload disabled: {}", e);
                return;
            }
        };
        while hangup.recv().await.is_some() {
            info!("SIGHUP received, reloading configuration");
            reload_config(&config);
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_listener(_config: ReloadableConfig) {
    warn!("Configuration reload on SIGHUP is only supported on unix");
}

/// Runs migrations, starts the periodic reconciler and serves the health
/// endpoints until interrupted.
pub async fn serve(config: &ReloadableConfig) -> CommandResult {
    info!("Starting GitOps backend");
    let settings = config.static_config();

    let pool = connect_database(settings)?;
    info!("Running pending database migrations");
    let applied = pool.run_migrations()?;
    info!("Database migrations completed successfully ({} applied)", applied);

    metrics::init();
    let reconciler = build_reconciler(settings, pool.clone()).await?;
    let reconciler_task = start_reconciler_task(reconciler, config.clone());
    spawn_reload_listener(config.clone());

    let health_state = HealthState::new(Arc::new(pool));
    let health_router = health::configure_health_routes(health_state);
    let addr = format!("0.0.0.0:{}", settings.server.health_port);
    info!("Starting health check server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for ctrl+c: {}", e);
            return;
        }
        info!("Shutdown signal received");
        shutdown_tx.send(()).ok();
    });

    info!("GitOps backend is now running");
    axum::serve(listener, health_router)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .await?;

    reconciler_task.abort();
    gitops_utils::telemetry::shutdown();
    info!("GitOps backend stopped");
    Ok(())
}
