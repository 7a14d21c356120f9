/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Sweep cycles and the periodic reconciler task.

use crate::metrics;
use crate::reconciler::{CycleReport, Family, ReconcileError, Reconciler, SweepPolicy, SweepReport};
use chrono::Utc;
use gitops_utils::logging::prelude::*;
use gitops_utils::ReloadableConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::instrument;

impl Reconciler {
    pub async fn sweep_family(
        &self,
        family: Family,
        policy: &SweepPolicy,
    ) -> Result<SweepReport, ReconcileError> {
        match family {
            Family::DeploymentMapping => self.sweep_deployment_mappings(policy).await,
            Family::ApiCrMapping => self.sweep_api_cr_mappings(policy).await,
            Family::Application => self.sweep_applications(policy).await,
            Family::RepositoryCredentials => self.sweep_repository_credentials(policy).await,
            Family::SyncOperation => self.sweep_sync_operations(policy).await,
            Family::ManagedEnvironment => self.sweep_managed_environments(policy).await,
            Family::Operation => self.sweep_operations(policy).await,
            Family::ClusterUser => self.sweep_cluster_users(policy).await,
            Family::ClusterCredentials => self.sweep_cluster_credentials(policy).await,
        }
    }

    /// Sweeps every family in order. A failing family is logged and the
    /// cycle moves on.
    #[instrument(skip_all)]
    pub async fn run_cycle(&self, policy: &SweepPolicy) -> CycleReport {
        let started_at = Utc::now();
        let cycle_start = Instant::now();
        let mut families = Vec::with_capacity(Family::SWEEP_ORDER.len());

        for family in Family::SWEEP_ORDER {
            let timer = metrics::SWEEP_DURATION_SECONDS
                .with_label_values(&[family.as_str()])
                .start_timer();
            let result = self.sweep_family(family, policy).await;
            timer.observe_duration();

            match &result {
                Ok(report) if !report.is_noop() => info!("{} sweep finished: {}", family, report),
                Ok(_) => {}
                Err(e) => error!("{} sweep failed: {}", family, e),
            }
            families.push((family, result.map_err(|e| e.to_string())));
        }

        let report = CycleReport {
            started_at,
            duration: cycle_start.elapsed(),
            families,
        };
        metrics::record_cycle_completed();
        info!(
            "Reconciler cycle completed in {}ms: {}",
            report.duration.as_millis(),
            report.totals()
        );
        report
    }
}

/// Starts the periodic reconciler.
///
/// The sweep interval and grace window are read from `config` before every
/// cycle, so a reload takes effect on the next tick.
pub fn start_reconciler_task(reconciler: Arc<Reconciler>, config: ReloadableConfig) -> JoinHandle<()> {
    info!(
        "Starting reconciler task (interval: {}s, wait time for row delete: {}s)",
        config.interval_seconds(),
        config.wait_time_for_row_delete_seconds()
    );

    tokio::spawn(async move {
        loop {
            let policy = SweepPolicy::from_config(&config);
            let report = reconciler.run_cycle(&policy).await;
            let failed = report.failed_families();
            if !failed.is_empty() {
                warn!("{} families failed this cycle: {:?}", failed.len(), failed);
            }

            let interval = config.interval_seconds().max(1);
            tokio::time::sleep(Duration::from_secs(interval)).await;
        }
    })
}
