/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Operations
//!
//! Operations tell the cluster agent that an engine-side object needs
//! attention. Each one is a database row plus an `Operation` custom resource
//! named `operation-<id>` in the engine instance's namespace.
//!
//! The reconciler creates them after cascade deletions and garbage-collects
//! them by age. State transitions are driven by the agent; a Waiting
//! operation whose resource went missing gets it recreated.

use crate::dal::DbError;
use crate::k8s::{ClusterClient, ClusterError, ResourceKind};
use crate::metrics;
use crate::reconciler::cascade::Notification;
use crate::reconciler::{with_timeout, Family, ReconcileError, Reconciler, SweepPolicy, SweepReport};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use gitops_models::models::{GitopsEngineInstance, Operation, OperationState};
use gitops_utils::logging::prelude::*;
use std::sync::Arc;

/// What the garbage collector does with one operation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationDisposition {
    Retain,
    Delete,
    /// Waiting long enough that its resource should be checked.
    SelfHeal,
}

/// Retention applied to a terminal operation.
fn retention_for(op: &Operation, policy: &SweepPolicy) -> ChronoDuration {
    match op.gc_expiration_time {
        Some(seconds) if seconds > 0 && policy.honor_gc_expiration_hint => {
            ChronoDuration::seconds(i64::from(seconds))
        }
        _ => policy.operation_retention,
    }
}

pub fn operation_disposition(
    op: &Operation,
    now: DateTime<Utc>,
    policy: &SweepPolicy,
) -> OperationDisposition {
    let age = now - op.created_on;
    match op.state {
        OperationState::Completed | OperationState::Failed => {
            if age > retention_for(op, policy) {
                OperationDisposition::Delete
            } else {
                OperationDisposition::Retain
            }
        }
        OperationState::Waiting if age > policy.self_heal_after => OperationDisposition::SelfHeal,
        OperationState::Waiting | OperationState::InProgress => OperationDisposition::Retain,
    }
}

impl Reconciler {
    /// Resolves the engine instance and a client for the cluster hosting it.
    pub(crate) async fn client_for_instance(
        &self,
        instance_id: &str,
        policy: &SweepPolicy,
    ) -> Result<(GitopsEngineInstance, Arc<dyn ClusterClient>), ReconcileError> {
        let instance = self.db().get_gitops_engine_instance(instance_id)?;
        let engine_cluster = self.db().get_gitops_engine_cluster(&instance.enginecluster_id)?;
        let credentials = self
            .db()
            .get_cluster_credentials(&engine_cluster.clustercredentials_id)?;
        let client = with_timeout(
            policy.cluster_call_timeout,
            self.factory
                .client_for_engine_instance(&instance, &credentials),
        )
        .await?;
        Ok((instance, client))
    }

    /// Inserts a Waiting operation owned by the special user and creates its
    /// resource.
    ///
    /// The row is the source of truth: if the resource cannot be created now,
    /// the self-heal pass recreates it later.
    pub async fn create_operation(
        &self,
        notification: &Notification,
        policy: &SweepPolicy,
    ) -> Result<Operation, ReconcileError> {
        let owner = self.db().get_or_create_special_cluster_user()?;
        let op = Operation::new(
            &notification.instance_id,
            &notification.resource_id,
            notification.resource_type,
            &owner.clusteruser_id,
        )
        .map_err(DbError::from)?;
        let op = self.db().create_operation(&op)?;
        metrics::record_operation_created(notification.resource_type.as_str());
        info!(
            "Created operation {} for {} {} on engine instance {}",
            op.operation_id, op.resource_type, op.resource_id, op.instance_id
        );

        if let Err(e) = self.create_operation_resource(&op, policy).await {
            warn!(
                "Could not create resource for operation {}, leaving it to self-heal: {}",
                op.operation_id, e
            );
        }
        Ok(op)
    }

    async fn create_operation_resource(
        &self,
        op: &Operation,
        policy: &SweepPolicy,
    ) -> Result<(), ReconcileError> {
        let (instance, client) = self.client_for_instance(&op.instance_id, policy).await?;
        with_timeout(
            policy.cluster_call_timeout,
            client.create_operation(&instance.namespace_name, &op.cr_name(), &op.operation_id),
        )
        .await?;
        Ok(())
    }

    /// Recreates the resource of a long-waiting operation when it is missing.
    /// Returns whether it was recreated.
    async fn self_heal(&self, op: &Operation, policy: &SweepPolicy) -> Result<bool, ReconcileError> {
        let (instance, client) = self.client_for_instance(&op.instance_id, policy).await?;
        let name = op.cr_name();
        let observed = with_timeout(
            policy.cluster_call_timeout,
            client.get(ResourceKind::Operation, &instance.namespace_name, &name),
        )
        .await;

        match observed {
            Ok(Some(_)) => Ok(false),
            Ok(None) | Err(ClusterError::NotFound(_)) => {
                with_timeout(
                    policy.cluster_call_timeout,
                    client.create_operation(&instance.namespace_name, &name, &op.operation_id),
                )
                .await?;
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Garbage-collects terminal operations and self-heals waiting ones.
    pub async fn sweep_operations(
        &self,
        policy: &SweepPolicy,
    ) -> Result<SweepReport, ReconcileError> {
        let family = Family::Operation;
        let mut report = SweepReport::default();
        let now = Utc::now();

        for op in self.db().list_all_operations()? {
            report.examined += 1;
            match operation_disposition(&op, now, policy) {
                OperationDisposition::Retain => {}
                OperationDisposition::Delete => match self.db().delete_operation(&op.operation_id) {
                    Ok(rows) => {
                        if rows > 0 {
                            debug!("Deleted {} operation {}", op.state, op.operation_id);
                        }
                        report.deleted += rows;
                        metrics::record_deleted(family.as_str(), rows);
                    }
                    Err(e) => {
                        error!("Failed to delete operation {}: {}", op.operation_id, e);
                        report.skipped += 1;
                        metrics::record_skipped(family.as_str(), "step_failed");
                    }
                },
                OperationDisposition::SelfHeal => match self.self_heal(&op, policy).await {
                    Ok(true) => {
                        info!(
                            "Recreated missing resource {} for waiting operation",
                            op.cr_name()
                        );
                        report.crs_recreated += 1;
                        metrics::record_cr_recreated();
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Could not check resource of operation {}: {}", op.operation_id, e);
                        report.undetermined += 1;
                    }
                },
            }
        }

        Ok(report)
    }

    /// Moves an operation to `new_state`. Terminal states are final.
    pub fn transition_operation(
        &self,
        operation_id: &str,
        new_state: OperationState,
        human_readable_state: Option<String>,
    ) -> Result<Operation, ReconcileError> {
        let op = self
            .db()
            .update_operation_state(operation_id, new_state, human_readable_state)?;
        debug!("Operation {} is now {}", op.operation_id, op.state);
        Ok(op)
    }
}
