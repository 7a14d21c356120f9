/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Cross-store Reconciler
//!
//! Keeps the shadow database consistent with the cluster. Each cycle sweeps
//! the entity families in a fixed order:
//!
//! ```text
//! DTAM -> ACTDM -> Application -> RepositoryCredentials -> SyncOperation
//!      -> ManagedEnvironment -> Operation -> ClusterUser -> ClusterCredentials
//! ```
//!
//! The [`scanner`] classifies rows, the [`cascade`] module turns orphans into
//! ordered delete/decouple plans, and [`operations`] creates the Operations
//! that tell the cluster agent about deletions and garbage-collects old ones.
//! [`driver`] runs the cycle and the periodic background task.
//!
//! Only an authoritative not-found or a UID mismatch deletes anything. Any
//! other cluster failure, including a call exceeding
//! `cluster_call_timeout`, leaves the row for a later cycle.

use crate::dal::{DatabaseQueries, DbError};
use crate::k8s::{ClusterClient, ClusterClientFactory, ClusterError};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use gitops_utils::ReloadableConfig;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod cascade;
pub mod driver;
pub mod operations;
pub mod scanner;

pub use driver::start_reconciler_task;
pub use scanner::{Classification, OrphanReason};

/// A family-level failure, e.g. the initial list query failed.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Database(#[from] DbError),
    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

/// The entity families swept by a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    DeploymentMapping,
    ApiCrMapping,
    Application,
    RepositoryCredentials,
    SyncOperation,
    ManagedEnvironment,
    Operation,
    ClusterUser,
    ClusterCredentials,
}

impl Family {
    pub const SWEEP_ORDER: [Family; 9] = [
        Family::DeploymentMapping,
        Family::ApiCrMapping,
        Family::Application,
        Family::RepositoryCredentials,
        Family::SyncOperation,
        Family::ManagedEnvironment,
        Family::Operation,
        Family::ClusterUser,
        Family::ClusterCredentials,
    ];

    /// Metric label for the family.
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::DeploymentMapping => "deployment_to_application_mapping",
            Family::ApiCrMapping => "api_cr_to_database_mapping",
            Family::Application => "application",
            Family::RepositoryCredentials => "repository_credentials",
            Family::SyncOperation => "sync_operation",
            Family::ManagedEnvironment => "managed_environment",
            Family::Operation => "operation",
            Family::ClusterUser => "cluster_user",
            Family::ClusterCredentials => "cluster_credentials",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one family sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub deleted: usize,
    pub decoupled: usize,
    pub skipped: usize,
    pub deferred: usize,
    pub undetermined: usize,
    pub operations_created: usize,
    pub crs_recreated: usize,
}

impl SweepReport {
    pub fn absorb(&mut self, other: &SweepReport) {
        self.examined += other.examined;
        self.deleted += other.deleted;
        self.decoupled += other.decoupled;
        self.skipped += other.skipped;
        self.deferred += other.deferred;
        self.undetermined += other.undetermined;
        self.operations_created += other.operations_created;
        self.crs_recreated += other.crs_recreated;
    }

    /// True when the sweep changed nothing.
    pub fn is_noop(&self) -> bool {
        self.deleted == 0
            && self.decoupled == 0
            && self.operations_created == 0
            && self.crs_recreated == 0
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "examined={} deleted={} decoupled={} skipped={} deferred={} undetermined={} operations_created={} crs_recreated={}",
            self.examined,
            self.deleted,
            self.decoupled,
            self.skipped,
            self.deferred,
            self.undetermined,
            self.operations_created,
            self.crs_recreated
        )
    }
}

/// Outcome of one full cycle. A family that failed carries its error message.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub families: Vec<(Family, Result<SweepReport, String>)>,
}

impl CycleReport {
    pub fn report_for(&self, family: Family) -> Option<&SweepReport> {
        self.families
            .iter()
            .find(|(f, _)| *f == family)
            .and_then(|(_, result)| result.as_ref().ok())
    }

    pub fn failed_families(&self) -> Vec<Family> {
        self.families
            .iter()
            .filter(|(_, result)| result.is_err())
            .map(|(f, _)| *f)
            .collect()
    }

    pub fn totals(&self) -> SweepReport {
        let mut total = SweepReport::default();
        for (_, result) in &self.families {
            if let Ok(report) = result {
                total.absorb(report);
            }
        }
        total
    }
}

/// Time-based knobs for one cycle.
#[derive(Debug, Clone)]
pub struct SweepPolicy {
    /// Minimum age before an unreferenced root row may be deleted.
    pub wait_time_for_row_delete: ChronoDuration,
    pub cluster_call_timeout: Duration,
    /// How long terminal operations are kept.
    pub operation_retention: ChronoDuration,
    /// Age after which a waiting operation gets its resource checked.
    pub self_heal_after: ChronoDuration,
    pub honor_gc_expiration_hint: bool,
}

impl Default for SweepPolicy {
    fn default() -> Self {
        Self {
            wait_time_for_row_delete: ChronoDuration::hours(1),
            cluster_call_timeout: Duration::from_secs(30),
            operation_retention: ChronoDuration::hours(24),
            self_heal_after: ChronoDuration::minutes(60),
            honor_gc_expiration_hint: false,
        }
    }
}

impl SweepPolicy {
    /// Reads the current policy. The grace window is hot-reloadable.
    pub fn from_config(config: &ReloadableConfig) -> Self {
        let settings = config.static_config();
        // Out-of-range settings saturate instead of wrapping negative.
        let wait_seconds =
            i64::try_from(config.wait_time_for_row_delete_seconds()).unwrap_or(i64::MAX);
        Self {
            wait_time_for_row_delete: ChronoDuration::try_seconds(wait_seconds)
                .unwrap_or(ChronoDuration::MAX),
            cluster_call_timeout: Duration::from_secs(
                settings.reconciler.cluster_call_timeout_seconds,
            ),
            operation_retention: ChronoDuration::hours(settings.operations.retention_hours),
            self_heal_after: ChronoDuration::minutes(settings.operations.self_heal_after_minutes),
            honor_gc_expiration_hint: settings.operations.honor_gc_expiration_hint,
        }
    }
}

/// Runs `call`, turning an elapsed `timeout` into a transient error.
pub(crate) async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, ClusterError>
where
    F: Future<Output = Result<T, ClusterError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(ClusterError::Transient(format!(
            "cluster call timed out after {:?}",
            timeout
        ))),
    }
}

/// The reconciler: database access, the local cluster client used to read
/// API resources, and the factory for engine-instance clients.
pub struct Reconciler {
    db: Arc<dyn DatabaseQueries>,
    local: Arc<dyn ClusterClient>,
    factory: Arc<dyn ClusterClientFactory>,
}

impl Reconciler {
    pub fn new(
        db: Arc<dyn DatabaseQueries>,
        local: Arc<dyn ClusterClient>,
        factory: Arc<dyn ClusterClientFactory>,
    ) -> Self {
        Self { db, local, factory }
    }

    pub fn db(&self) -> &dyn DatabaseQueries {
        self.db.as_ref()
    }
}
