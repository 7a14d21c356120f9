/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Cascade Resolver
//!
//! Turns an orphaned root row into a [`CascadePlan`]: an ordered list of
//! [`Step`]s where dependents come first, the root row next and the mapping
//! row last. A plan that stops half-way therefore leaves the mapping behind
//! and the next sweep picks the root up again.
//!
//! Guards are predicates over the database. Deletion proceeds only when every
//! guard agrees; a guard that blocks, or that could not be evaluated, turns
//! the plan into a single `Skip`.
//!
//! Each step is one statement whose rows-affected count is checked. Zero rows
//! means another path already handled the row; more rows than expected is
//! logged as a warning.

use crate::dal::{DatabaseQueries, DbError};
use crate::metrics;
use crate::reconciler::Family;
use gitops_models::models::mappings::{
    ApiCrToDatabaseMapping, DbRelationType, DeploymentToApplicationMapping,
    K8S_RELATION_MANAGED_ENVIRONMENT,
};
use gitops_models::models::{
    Application, ClusterCredentials, ClusterUser, ManagedEnvironment, OperationResourceType,
    RepositoryCredentials, SyncOperation, SPECIAL_CLUSTER_USER_NAME,
};
use gitops_utils::logging::prelude::*;
use std::collections::BTreeSet;
use std::fmt;

/// A row, or set of rows, a step deletes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Application(String),
    ApplicationState(String),
    /// Every owner row of the application.
    ApplicationOwners(String),
    DeploymentMapping(String),
    ApiCrMapping(ApiCrToDatabaseMapping),
    ManagedEnvironment(String),
    RepositoryCredentials(String),
    SyncOperation(String),
    ClusterUser(String),
    ClusterCredentials(String),
}

impl Target {
    /// Upper bound of rows the delete should touch, if there is one.
    pub fn expected_rows(&self) -> Option<usize> {
        match self {
            Target::ApplicationOwners(_) => None,
            _ => Some(1),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Application(id) => write!(f, "Application {}", id),
            Target::ApplicationState(id) => write!(f, "ApplicationState {}", id),
            Target::ApplicationOwners(id) => write!(f, "ApplicationOwners of {}", id),
            Target::DeploymentMapping(uid) => write!(f, "DeploymentToApplicationMapping {}", uid),
            Target::ApiCrMapping(m) => write!(f, "APICRToDatabaseMapping ({})", m.short_string()),
            Target::ManagedEnvironment(id) => write!(f, "ManagedEnvironment {}", id),
            Target::RepositoryCredentials(id) => write!(f, "RepositoryCredentials {}", id),
            Target::SyncOperation(id) => write!(f, "SyncOperation {}", id),
            Target::ClusterUser(id) => write!(f, "ClusterUser {}", id),
            Target::ClusterCredentials(id) => write!(f, "ClusterCredentials {}", id),
        }
    }
}

/// A reference cleared instead of deleting the row holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decouple {
    /// `syncoperation.application_id` of the given sync operation.
    SyncOperationApplication(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The named guard blocked deletion.
    Guard(&'static str),
    /// The named guard could not be evaluated.
    GuardUnavailable(&'static str),
    /// A lookup needed to build the plan failed.
    LookupFailed(String),
}

impl SkipReason {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::Guard(name) => *name,
            SkipReason::GuardUnavailable(_) => "guard_error",
            SkipReason::LookupFailed(_) => "lookup_error",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Guard(name) => write!(f, "blocked by {}", name),
            SkipReason::GuardUnavailable(name) => write!(f, "guard {} could not be evaluated", name),
            SkipReason::LookupFailed(msg) => write!(f, "lookup failed: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Delete(Target),
    Decouple(Decouple),
    Skip(SkipReason),
}

/// An Operation to create once the plan's trigger row is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub instance_id: String,
    pub resource_id: String,
    pub resource_type: OperationResourceType,
}

impl Notification {
    pub fn new(
        instance_id: impl Into<String>,
        resource_id: impl Into<String>,
        resource_type: OperationResourceType,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            resource_id: resource_id.into(),
            resource_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadePlan {
    pub steps: Vec<Step>,
    /// Notifications are only sent when deleting this target removed a row.
    pub trigger: Option<Target>,
    pub notifications: Vec<Notification>,
}

impl CascadePlan {
    fn deleting(steps: Vec<Step>) -> Self {
        Self {
            steps,
            trigger: None,
            notifications: Vec::new(),
        }
    }

    fn skip(reason: SkipReason) -> Self {
        Self::deleting(vec![Step::Skip(reason)])
    }

    fn notify(mut self, trigger: Target, notifications: Vec<Notification>) -> Self {
        self.trigger = Some(trigger);
        self.notifications = notifications;
        self
    }

    pub fn is_skip(&self) -> bool {
        matches!(self.steps.as_slice(), [Step::Skip(_)])
    }
}

/// Usage guards protecting rows without a mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    ReferencedByClusterAccess,
    ReferencedByRepositoryCredentials,
    ReferencedByOperation,
    ReferencedByK8sResourceMapping,
    ReferencedByManagedEnvironment,
    ReferencedByEngineCluster,
    IsSpecialClusterUser,
}

impl Guard {
    pub fn name(&self) -> &'static str {
        match self {
            Guard::ReferencedByClusterAccess => "referenced_by_cluster_access",
            Guard::ReferencedByRepositoryCredentials => "referenced_by_repository_credentials",
            Guard::ReferencedByOperation => "referenced_by_operation",
            Guard::ReferencedByK8sResourceMapping => "referenced_by_k8s_resource_mapping",
            Guard::ReferencedByManagedEnvironment => "referenced_by_managed_environment",
            Guard::ReferencedByEngineCluster => "referenced_by_engine_cluster",
            Guard::IsSpecialClusterUser => "is_special_cluster_user",
        }
    }

    /// Returns true when the guard blocks deleting the row keyed by `key`.
    pub fn blocks(&self, db: &dyn DatabaseQueries, key: &str) -> Result<bool, DbError> {
        match self {
            Guard::ReferencedByClusterAccess => referenced_by_cluster_access(db, key),
            Guard::ReferencedByRepositoryCredentials => {
                referenced_by_repository_credentials(db, key)
            }
            Guard::ReferencedByOperation => referenced_by_operation(db, key),
            Guard::ReferencedByK8sResourceMapping => referenced_by_k8s_resource_mapping(db, key),
            Guard::ReferencedByManagedEnvironment => referenced_by_managed_environment(db, key),
            Guard::ReferencedByEngineCluster => referenced_by_engine_cluster(db, key),
            Guard::IsSpecialClusterUser => Ok(is_special_cluster_user(key)),
        }
    }
}

pub fn referenced_by_cluster_access(db: &dyn DatabaseQueries, user_id: &str) -> Result<bool, DbError> {
    Ok(db.count_cluster_access_by_user(user_id)? > 0)
}

pub fn referenced_by_repository_credentials(
    db: &dyn DatabaseQueries,
    user_id: &str,
) -> Result<bool, DbError> {
    Ok(db.count_repository_credentials_by_user(user_id)? > 0)
}

pub fn referenced_by_operation(db: &dyn DatabaseQueries, user_id: &str) -> Result<bool, DbError> {
    Ok(db.count_operations_by_owner(user_id)? > 0)
}

pub fn referenced_by_k8s_resource_mapping(
    db: &dyn DatabaseQueries,
    managed_environment_id: &str,
) -> Result<bool, DbError> {
    Ok(db.count_kubernetes_resource_mappings_by_relation(
        K8S_RELATION_MANAGED_ENVIRONMENT,
        managed_environment_id,
    )? > 0)
}

pub fn referenced_by_managed_environment(
    db: &dyn DatabaseQueries,
    credentials_id: &str,
) -> Result<bool, DbError> {
    Ok(db.count_managed_environments_by_credentials(credentials_id)? > 0)
}

pub fn referenced_by_engine_cluster(
    db: &dyn DatabaseQueries,
    credentials_id: &str,
) -> Result<bool, DbError> {
    Ok(db.count_engine_clusters_by_credentials(credentials_id)? > 0)
}

pub fn is_special_cluster_user(user_id: &str) -> bool {
    user_id == SPECIAL_CLUSTER_USER_NAME
}

/// Evaluates `guards` in order; the first one that blocks, or fails, wins.
fn check_guards(db: &dyn DatabaseQueries, guards: &[Guard], key: &str) -> Option<SkipReason> {
    for guard in guards {
        match guard.blocks(db, key) {
            Ok(false) => {}
            Ok(true) => return Some(SkipReason::Guard(guard.name())),
            Err(e) => {
                warn!("Guard {} failed for {}: {}", guard.name(), key, e);
                return Some(SkipReason::GuardUnavailable(guard.name()));
            }
        }
    }
    None
}

fn guarded(db: &dyn DatabaseQueries, guards: &[Guard], key: &str, steps: Vec<Step>) -> CascadePlan {
    match check_guards(db, guards, key) {
        Some(reason) => CascadePlan::skip(reason),
        None => CascadePlan::deleting(steps),
    }
}

/// The deployment behind a DTAM is gone: remove the application and its
/// dependents, keep sync operations but clear their application reference.
pub fn plan_for_deployment_mapping(
    db: &dyn DatabaseQueries,
    mapping: &DeploymentToApplicationMapping,
) -> CascadePlan {
    let app_id = &mapping.application_id;

    let sync_ops = match db.list_sync_operations_by_application(app_id) {
        Ok(ops) => ops,
        Err(e) => return CascadePlan::skip(SkipReason::LookupFailed(e.to_string())),
    };
    let notifications = match db.get_application(app_id) {
        Ok(app) => vec![Notification::new(
            app.engine_instance_inst_id,
            app_id.clone(),
            OperationResourceType::Application,
        )],
        Err(e) if e.is_not_found() => Vec::new(),
        Err(e) => return CascadePlan::skip(SkipReason::LookupFailed(e.to_string())),
    };

    let mut steps: Vec<Step> = sync_ops
        .into_iter()
        .map(|op| Step::Decouple(Decouple::SyncOperationApplication(op.syncoperation_id)))
        .collect();
    steps.push(Step::Delete(Target::ApplicationState(app_id.clone())));
    steps.push(Step::Delete(Target::ApplicationOwners(app_id.clone())));
    steps.push(Step::Delete(Target::Application(app_id.clone())));
    steps.push(Step::Delete(Target::DeploymentMapping(
        mapping.deploymenttoapplicationmapping_uid_id.clone(),
    )));

    CascadePlan::deleting(steps).notify(Target::Application(app_id.clone()), notifications)
}

/// The API resource behind an ACTDM is gone: remove the row it points at.
pub fn plan_for_api_cr_mapping(
    db: &dyn DatabaseQueries,
    mapping: &ApiCrToDatabaseMapping,
) -> CascadePlan {
    let key = mapping.db_relation_key.clone();
    let mapping_step = Step::Delete(Target::ApiCrMapping(mapping.clone()));

    match mapping.relation_type() {
        Ok(DbRelationType::ManagedEnvironment) => {
            let notifications = match managed_environment_notifications(db, &key) {
                Ok(notifications) => notifications,
                Err(e) => return CascadePlan::skip(SkipReason::LookupFailed(e.to_string())),
            };
            CascadePlan::deleting(vec![
                Step::Delete(Target::ManagedEnvironment(key.clone())),
                mapping_step,
            ])
            .notify(Target::ManagedEnvironment(key), notifications)
        }
        Ok(DbRelationType::RepositoryCredential) => {
            let notifications = match db.get_repository_credentials(&key) {
                Ok(creds) => vec![Notification::new(
                    creds.repo_cred_engine_id,
                    key.clone(),
                    OperationResourceType::RepositoryCredentials,
                )],
                Err(e) if e.is_not_found() => Vec::new(),
                Err(e) => return CascadePlan::skip(SkipReason::LookupFailed(e.to_string())),
            };
            CascadePlan::deleting(vec![
                Step::Delete(Target::RepositoryCredentials(key.clone())),
                mapping_step,
            ])
            .notify(Target::RepositoryCredentials(key), notifications)
        }
        Ok(DbRelationType::SyncOperation) => {
            let notifications = match sync_operation_notification(db, &key) {
                Ok(notification) => notification.into_iter().collect(),
                Err(e) => return CascadePlan::skip(SkipReason::LookupFailed(e.to_string())),
            };
            CascadePlan::deleting(vec![
                Step::Delete(Target::SyncOperation(key.clone())),
                mapping_step,
            ])
            .notify(Target::SyncOperation(key), notifications)
        }
        Err(e) => {
            warn!("{}; removing only the mapping row", e);
            CascadePlan::deleting(vec![mapping_step])
        }
    }
}

/// One notification per distinct engine instance running an application on
/// the environment. Applications lose their reference once the row is
/// deleted, so this must run before the delete.
fn managed_environment_notifications(
    db: &dyn DatabaseQueries,
    managed_environment_id: &str,
) -> Result<Vec<Notification>, DbError> {
    let instances: BTreeSet<String> = db
        .list_applications_by_managed_environment(managed_environment_id)?
        .into_iter()
        .map(|app| app.engine_instance_inst_id)
        .collect();
    Ok(instances
        .into_iter()
        .map(|instance| {
            Notification::new(
                instance,
                managed_environment_id,
                OperationResourceType::ManagedEnvironment,
            )
        })
        .collect())
}

/// The sync operation's application's engine instance, when there is one.
fn sync_operation_notification(
    db: &dyn DatabaseQueries,
    sync_operation_id: &str,
) -> Result<Option<Notification>, DbError> {
    let sync_op = match db.get_sync_operation(sync_operation_id) {
        Ok(op) => op,
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(e),
    };
    let Some(app_id) = sync_op.application() else {
        return Ok(None);
    };
    match db.get_application(app_id) {
        Ok(app) => Ok(Some(Notification::new(
            app.engine_instance_inst_id,
            sync_operation_id,
            OperationResourceType::SyncOperation,
        ))),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn plan_for_application(app: &Application) -> CascadePlan {
    let id = &app.application_id;
    CascadePlan::deleting(vec![
        Step::Delete(Target::ApplicationState(id.clone())),
        Step::Delete(Target::ApplicationOwners(id.clone())),
        Step::Delete(Target::Application(id.clone())),
    ])
    .notify(
        Target::Application(id.clone()),
        vec![Notification::new(
            app.engine_instance_inst_id.clone(),
            id.clone(),
            OperationResourceType::Application,
        )],
    )
}

pub fn plan_for_repository_credentials(creds: &RepositoryCredentials) -> CascadePlan {
    let id = &creds.repositorycredentials_id;
    CascadePlan::deleting(vec![Step::Delete(Target::RepositoryCredentials(id.clone()))]).notify(
        Target::RepositoryCredentials(id.clone()),
        vec![Notification::new(
            creds.repo_cred_engine_id.clone(),
            id.clone(),
            OperationResourceType::RepositoryCredentials,
        )],
    )
}

pub fn plan_for_sync_operation(db: &dyn DatabaseQueries, op: &SyncOperation) -> CascadePlan {
    let id = &op.syncoperation_id;
    let notifications = match sync_operation_notification(db, id) {
        Ok(notification) => notification.into_iter().collect(),
        Err(e) => return CascadePlan::skip(SkipReason::LookupFailed(e.to_string())),
    };
    CascadePlan::deleting(vec![Step::Delete(Target::SyncOperation(id.clone()))])
        .notify(Target::SyncOperation(id.clone()), notifications)
}

pub fn plan_for_managed_environment(
    db: &dyn DatabaseQueries,
    env: &ManagedEnvironment,
) -> CascadePlan {
    let id = &env.managedenvironment_id;
    let plan = guarded(
        db,
        &[Guard::ReferencedByK8sResourceMapping],
        id,
        vec![Step::Delete(Target::ManagedEnvironment(id.clone()))],
    );
    if plan.is_skip() {
        return plan;
    }
    match managed_environment_notifications(db, id) {
        Ok(notifications) => plan.notify(Target::ManagedEnvironment(id.clone()), notifications),
        Err(e) => CascadePlan::skip(SkipReason::LookupFailed(e.to_string())),
    }
}

pub fn plan_for_cluster_user(db: &dyn DatabaseQueries, user: &ClusterUser) -> CascadePlan {
    if user.is_special() {
        return CascadePlan::skip(SkipReason::Guard(Guard::IsSpecialClusterUser.name()));
    }
    let id = &user.clusteruser_id;
    guarded(
        db,
        &[
            Guard::ReferencedByClusterAccess,
            Guard::ReferencedByRepositoryCredentials,
            Guard::ReferencedByOperation,
        ],
        id,
        vec![Step::Delete(Target::ClusterUser(id.clone()))],
    )
}

pub fn plan_for_cluster_credentials(
    db: &dyn DatabaseQueries,
    creds: &ClusterCredentials,
) -> CascadePlan {
    let id = &creds.clustercredentials_cred_id;
    guarded(
        db,
        &[
            Guard::ReferencedByManagedEnvironment,
            Guard::ReferencedByEngineCluster,
        ],
        id,
        vec![Step::Delete(Target::ClusterCredentials(id.clone()))],
    )
}

/// What executing a plan did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub deleted: usize,
    pub decoupled: usize,
    pub skipped: usize,
    /// Targets whose delete removed at least one row.
    pub removed: Vec<Target>,
    /// A step failed and the remaining steps were not run.
    pub aborted: bool,
}

impl ExecutionOutcome {
    /// Whether the plan's notifications should be sent.
    pub fn triggered(&self, plan: &CascadePlan) -> bool {
        !self.aborted
            && plan
                .trigger
                .as_ref()
                .is_some_and(|trigger| self.removed.contains(trigger))
    }
}

fn delete_target(db: &dyn DatabaseQueries, target: &Target) -> Result<usize, DbError> {
    match target {
        Target::Application(id) => db.delete_application(id),
        Target::ApplicationState(id) => db.delete_application_state(id),
        Target::ApplicationOwners(id) => db.delete_application_owners(id),
        Target::DeploymentMapping(uid) => db.delete_deployment_to_application_mapping(uid),
        Target::ApiCrMapping(mapping) => db.delete_api_cr_to_database_mapping(mapping),
        Target::ManagedEnvironment(id) => db.delete_managed_environment(id),
        Target::RepositoryCredentials(id) => db.delete_repository_credentials(id),
        Target::SyncOperation(id) => db.delete_sync_operation(id),
        Target::ClusterUser(id) => db.delete_cluster_user(id),
        Target::ClusterCredentials(id) => db.delete_cluster_credentials(id),
    }
}

fn check_rows_affected(what: &dyn fmt::Display, rows: usize, expected: Option<usize>) {
    if rows == 0 {
        debug!("{} was already handled, no rows affected", what);
    } else if let Some(max) = expected {
        if rows > max {
            warn!(
                "Unexpected number of rows affected for {}: expected {}, got {}",
                what, max, rows
            );
        }
    }
}

/// Runs `plan` step by step. A failing step stops the plan.
pub fn execute(db: &dyn DatabaseQueries, family: Family, plan: &CascadePlan) -> ExecutionOutcome {
    let mut outcome = ExecutionOutcome::default();

    for step in &plan.steps {
        match step {
            Step::Delete(target) => match delete_target(db, target) {
                Ok(rows) => {
                    check_rows_affected(target, rows, target.expected_rows());
                    if rows > 0 {
                        info!("Deleted {}", target);
                        outcome.removed.push(target.clone());
                    }
                    outcome.deleted += rows;
                    metrics::record_deleted(family.as_str(), rows);
                }
                Err(e) => {
                    error!("Failed to delete {}: {}", target, e);
                    outcome.aborted = true;
                    outcome.skipped += 1;
                    metrics::record_skipped(family.as_str(), "step_failed");
                    break;
                }
            },
            Step::Decouple(Decouple::SyncOperationApplication(id)) => {
                match db.clear_sync_operation_application(id) {
                    Ok(rows) => {
                        let what = format!("application reference of SyncOperation {}", id);
                        check_rows_affected(&what, rows, Some(1));
                        outcome.decoupled += rows;
                        metrics::record_decoupled(family.as_str(), rows);
                    }
                    Err(e) => {
                        error!("Failed to clear application of SyncOperation {}: {}", id, e);
                        outcome.aborted = true;
                        outcome.skipped += 1;
                        metrics::record_skipped(family.as_str(), "step_failed");
                        break;
                    }
                }
            }
            Step::Skip(reason) => {
                debug!("Skipping {} candidate: {}", family, reason);
                outcome.skipped += 1;
                metrics::record_skipped(family.as_str(), reason.label());
            }
        }
    }

    outcome
}
