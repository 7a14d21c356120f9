/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Orphan Scanner
//!
//! One sweep per entity family. Mapping families (DTAM, ACTDM) compare each
//! row against the live API resource it names; a row is live only when a
//! resource with the recorded UID exists. Root families have no cluster
//! counterpart: a row is a candidate when nothing maps to it, and is acted on
//! only once it is older than the grace window.

use crate::k8s::{ClusterError, ObservedObject, ResourceKind};
use crate::reconciler::cascade::{self, CascadePlan};
use crate::reconciler::{with_timeout, Family, ReconcileError, Reconciler, SweepPolicy, SweepReport};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use gitops_models::models::mappings::{ApiResourceType, DbRelationType};
use gitops_utils::logging::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanReason {
    /// The API resource does not exist.
    Missing,
    /// A resource with the same name exists but it is a different object.
    UidMismatch,
    /// No mapping row references the root row.
    Unreferenced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Live,
    Orphaned(OrphanReason),
    /// Inside the grace window.
    Deferred,
    /// The cluster could not give an authoritative answer.
    Undetermined,
}

/// Classifies a mapping row from the result of fetching its resource.
pub fn classify_observation(
    expected_uid: &str,
    observed: &Result<Option<ObservedObject>, ClusterError>,
) -> Classification {
    match observed {
        Ok(Some(obj)) if obj.uid == expected_uid => Classification::Live,
        Ok(Some(_)) => Classification::Orphaned(OrphanReason::UidMismatch),
        Ok(None) | Err(ClusterError::NotFound(_)) => Classification::Orphaned(OrphanReason::Missing),
        Err(_) => Classification::Undetermined,
    }
}

/// Classifies a root row by whether it is referenced and how old it is.
pub fn classify_root(
    created_on: DateTime<Utc>,
    now: DateTime<Utc>,
    referenced: bool,
    grace: ChronoDuration,
) -> Classification {
    if referenced {
        Classification::Live
    } else if now - created_on > grace {
        Classification::Orphaned(OrphanReason::Unreferenced)
    } else {
        Classification::Deferred
    }
}

impl Reconciler {
    async fn observe(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        policy: &SweepPolicy,
    ) -> Result<Option<ObservedObject>, ClusterError> {
        with_timeout(
            policy.cluster_call_timeout,
            self.local.get(kind, namespace, name),
        )
        .await
    }

    /// Executes `plan` and sends its notifications when the trigger row went away.
    pub(crate) async fn apply_plan(
        &self,
        family: Family,
        plan: &CascadePlan,
        policy: &SweepPolicy,
        report: &mut SweepReport,
    ) {
        let outcome = cascade::execute(self.db(), family, plan);
        report.deleted += outcome.deleted;
        report.decoupled += outcome.decoupled;
        report.skipped += outcome.skipped;

        if !outcome.triggered(plan) {
            return;
        }
        for notification in &plan.notifications {
            match self.create_operation(notification, policy).await {
                Ok(_) => report.operations_created += 1,
                Err(e) => warn!(
                    "Failed to create {} operation for {}: {}",
                    notification.resource_type, notification.resource_id, e
                ),
            }
        }
    }

    /// Records a root-row classification, running the plan for orphans.
    async fn handle_root<F>(
        &self,
        family: Family,
        key: &str,
        classification: Classification,
        policy: &SweepPolicy,
        report: &mut SweepReport,
        plan: F,
    ) where
        F: FnOnce() -> CascadePlan,
    {
        match classification {
            Classification::Live => {}
            Classification::Deferred => {
                debug!("{} {} is unreferenced but inside the grace window", family, key);
                report.deferred += 1;
            }
            Classification::Undetermined => report.undetermined += 1,
            Classification::Orphaned(reason) => {
                info!("{} {} is orphaned ({:?})", family, key, reason);
                let plan = plan();
                self.apply_plan(family, &plan, policy, report).await;
            }
        }
    }

    /// DTAM rows whose `GitOpsDeployment` is gone or replaced.
    pub async fn sweep_deployment_mappings(
        &self,
        policy: &SweepPolicy,
    ) -> Result<SweepReport, ReconcileError> {
        let family = Family::DeploymentMapping;
        let mut report = SweepReport::default();

        for mapping in self.db().list_all_deployment_to_application_mappings()? {
            report.examined += 1;
            let observed = self
                .observe(
                    ResourceKind::GitOpsDeployment,
                    &mapping.namespace,
                    &mapping.name,
                    policy,
                )
                .await;

            match classify_observation(&mapping.deploymenttoapplicationmapping_uid_id, &observed) {
                Classification::Live => {}
                Classification::Orphaned(reason) => {
                    info!(
                        "GitOpsDeployment {}/{} for application {} is gone ({:?})",
                        mapping.namespace, mapping.name, mapping.application_id, reason
                    );
                    let plan = cascade::plan_for_deployment_mapping(self.db(), &mapping);
                    self.apply_plan(family, &plan, policy, &mut report).await;
                }
                Classification::Undetermined | Classification::Deferred => {
                    if let Err(e) = &observed {
                        warn!(
                            "Could not check GitOpsDeployment {}/{}: {}",
                            mapping.namespace, mapping.name, e
                        );
                    }
                    report.undetermined += 1;
                }
            }
        }

        Ok(report)
    }

    /// ACTDM rows whose API resource is gone or replaced.
    pub async fn sweep_api_cr_mappings(
        &self,
        policy: &SweepPolicy,
    ) -> Result<SweepReport, ReconcileError> {
        let family = Family::ApiCrMapping;
        let mut report = SweepReport::default();

        for mapping in self.db().list_all_api_cr_to_database_mappings()? {
            report.examined += 1;
            let resource_type: ApiResourceType = match mapping.resource_type() {
                Ok(t) => t,
                Err(e) => {
                    warn!("Skipping mapping {}: {}", mapping.short_string(), e);
                    report.skipped += 1;
                    crate::metrics::record_skipped(family.as_str(), "unknown_resource_type");
                    continue;
                }
            };

            let observed = self
                .observe(
                    ResourceKind::from(resource_type),
                    &mapping.api_resource_namespace,
                    &mapping.api_resource_name,
                    policy,
                )
                .await;

            match classify_observation(&mapping.api_resource_uid, &observed) {
                Classification::Live => {}
                Classification::Orphaned(reason) => {
                    info!(
                        "{} {}/{} is gone ({:?})",
                        resource_type,
                        mapping.api_resource_namespace,
                        mapping.api_resource_name,
                        reason
                    );
                    let plan = cascade::plan_for_api_cr_mapping(self.db(), &mapping);
                    self.apply_plan(family, &plan, policy, &mut report).await;
                }
                Classification::Undetermined | Classification::Deferred => {
                    if let Err(e) = &observed {
                        warn!("Could not check {}: {}", mapping.short_string(), e);
                    }
                    report.undetermined += 1;
                }
            }
        }

        Ok(report)
    }

    /// Whether any ACTDM row of `relation` points at `key`. `None` when the
    /// lookup failed.
    fn has_api_cr_mapping(&self, relation: DbRelationType, key: &str) -> Option<bool> {
        match self
            .db()
            .list_api_cr_to_database_mappings_by_relation(relation.as_str(), key)
        {
            Ok(mappings) => Some(!mappings.is_empty()),
            Err(e) => {
                warn!("Failed to look up {} mappings for {}: {}", relation, key, e);
                None
            }
        }
    }

    fn classify_mapped_root(
        &self,
        created_on: DateTime<Utc>,
        referenced: Option<bool>,
        policy: &SweepPolicy,
    ) -> Classification {
        match referenced {
            Some(referenced) => classify_root(
                created_on,
                Utc::now(),
                referenced,
                policy.wait_time_for_row_delete,
            ),
            None => Classification::Undetermined,
        }
    }

    /// Applications no DTAM points at.
    pub async fn sweep_applications(
        &self,
        policy: &SweepPolicy,
    ) -> Result<SweepReport, ReconcileError> {
        let family = Family::Application;
        let mut report = SweepReport::default();

        for app in self.db().list_all_applications()? {
            report.examined += 1;
            let referenced = match self
                .db()
                .get_deployment_to_application_mapping_by_application(&app.application_id)
            {
                Ok(_) => Some(true),
                Err(e) if e.is_not_found() => Some(false),
                Err(e) => {
                    warn!(
                        "Failed to look up deployment mapping for application {}: {}",
                        app.application_id, e
                    );
                    None
                }
            };
            let classification = self.classify_mapped_root(app.created_on, referenced, policy);
            self.handle_root(
                family,
                &app.application_id,
                classification,
                policy,
                &mut report,
                || cascade::plan_for_application(&app),
            )
            .await;
        }

        Ok(report)
    }

    pub async fn sweep_repository_credentials(
        &self,
        policy: &SweepPolicy,
    ) -> Result<SweepReport, ReconcileError> {
        let family = Family::RepositoryCredentials;
        let mut report = SweepReport::default();

        for creds in self.db().list_all_repository_credentials()? {
            report.examined += 1;
            let referenced = self.has_api_cr_mapping(
                DbRelationType::RepositoryCredential,
                &creds.repositorycredentials_id,
            );
            let classification = self.classify_mapped_root(creds.created_on, referenced, policy);
            self.handle_root(
                family,
                &creds.repositorycredentials_id,
                classification,
                policy,
                &mut report,
                || cascade::plan_for_repository_credentials(&creds),
            )
            .await;
        }

        Ok(report)
    }

    pub async fn sweep_sync_operations(
        &self,
        policy: &SweepPolicy,
    ) -> Result<SweepReport, ReconcileError> {
        let family = Family::SyncOperation;
        let mut report = SweepReport::default();

        for op in self.db().list_all_sync_operations()? {
            report.examined += 1;
            let referenced =
                self.has_api_cr_mapping(DbRelationType::SyncOperation, &op.syncoperation_id);
            let classification = self.classify_mapped_root(op.created_on, referenced, policy);
            self.handle_root(
                family,
                &op.syncoperation_id,
                classification,
                policy,
                &mut report,
                || cascade::plan_for_sync_operation(self.db(), &op),
            )
            .await;
        }

        Ok(report)
    }

    pub async fn sweep_managed_environments(
        &self,
        policy: &SweepPolicy,
    ) -> Result<SweepReport, ReconcileError> {
        let family = Family::ManagedEnvironment;
        let mut report = SweepReport::default();

        for env in self.db().list_all_managed_environments()? {
            report.examined += 1;
            let referenced = self.has_api_cr_mapping(
                DbRelationType::ManagedEnvironment,
                &env.managedenvironment_id,
            );
            let classification = self.classify_mapped_root(env.created_on, referenced, policy);
            self.handle_root(
                family,
                &env.managedenvironment_id,
                classification,
                policy,
                &mut report,
                || cascade::plan_for_managed_environment(self.db(), &env),
            )
            .await;
        }

        Ok(report)
    }

    /// Cluster users past the grace window; the usage guards decide.
    pub async fn sweep_cluster_users(
        &self,
        policy: &SweepPolicy,
    ) -> Result<SweepReport, ReconcileError> {
        let family = Family::ClusterUser;
        let mut report = SweepReport::default();

        for user in self.db().list_all_cluster_users()? {
            report.examined += 1;
            if user.is_special() {
                continue;
            }
            let classification = self.classify_mapped_root(user.created_on, Some(false), policy);
            self.handle_root(
                family,
                &user.clusteruser_id,
                classification,
                policy,
                &mut report,
                || cascade::plan_for_cluster_user(self.db(), &user),
            )
            .await;
        }

        Ok(report)
    }

    /// Cluster credentials past the grace window; the usage guards decide.
    pub async fn sweep_cluster_credentials(
        &self,
        policy: &SweepPolicy,
    ) -> Result<SweepReport, ReconcileError> {
        let family = Family::ClusterCredentials;
        let mut report = SweepReport::default();

        for creds in self.db().list_all_cluster_credentials()? {
            report.examined += 1;
            let classification = self.classify_mapped_root(creds.created_on, Some(false), policy);
            self.handle_root(
                family,
                &creds.clustercredentials_cred_id,
                classification,
                policy,
                &mut report,
                || cascade::plan_for_cluster_credentials(self.db(), &creds),
            )
            .await;
        }

        Ok(report)
    }
}
