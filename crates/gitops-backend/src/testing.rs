/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! In-memory stand-ins for the database and the cluster, used by unit tests.

use crate::dal::{DatabaseQueries, DbError};
use crate::k8s::{ClusterClient, ClusterClientFactory, ClusterError, ObservedObject, ResourceKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use gitops_models::models::{
    ApiCrToDatabaseMapping, Application, ApplicationOwner, ApplicationState, ClusterAccess,
    ClusterCredentials, ClusterUser, DeploymentToApplicationMapping, GitopsEngineCluster,
    GitopsEngineInstance, KubernetesToDbResourceMapping, ManagedEnvironment, Operation,
    OperationState, RepositoryCredentials, SyncOperation, SPECIAL_CLUSTER_USER_NAME,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Store {
    cluster_users: Vec<ClusterUser>,
    cluster_credentials: Vec<ClusterCredentials>,
    engine_clusters: Vec<GitopsEngineCluster>,
    engine_instances: Vec<GitopsEngineInstance>,
    managed_environments: Vec<ManagedEnvironment>,
    cluster_access: Vec<ClusterAccess>,
    applications: Vec<Application>,
    application_states: Vec<ApplicationState>,
    application_owners: Vec<ApplicationOwner>,
    deployment_mappings: Vec<DeploymentToApplicationMapping>,
    api_cr_mappings: Vec<ApiCrToDatabaseMapping>,
    k8s_mappings: Vec<KubernetesToDbResourceMapping>,
    sync_operations: Vec<SyncOperation>,
    repository_credentials: Vec<RepositoryCredentials>,
    operations: Vec<Operation>,
}

/// A [`DatabaseQueries`] implementation over plain vectors.
///
/// Mirrors the constraints of the real schema that the reconciler relies on:
/// deleting a managed environment clears application references and removes
/// cluster access rows, and the special cluster user is never deleted.
#[derive(Default)]
pub struct InMemoryDb {
    store: Mutex<Store>,
    failures: Mutex<HashSet<&'static str>>,
}

fn remove_where<T>(rows: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> usize {
    let before = rows.len();
    rows.retain(|row| !pred(row));
    before - rows.len()
}

fn found<T: Clone>(
    rows: &[T],
    entity: &'static str,
    key: &str,
    pred: impl Fn(&T) -> bool,
) -> Result<T, DbError> {
    rows.iter()
        .find(|row| pred(row))
        .cloned()
        .ok_or_else(|| DbError::not_found(entity, key))
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call to `method` fail with a query error.
    pub fn fail_on(&self, method: &'static str) {
        self.failures
            .lock()
            .expect("failures lock poisoned")
            .insert(method);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().expect("failures lock poisoned").clear();
    }

    fn check(&self, method: &'static str) -> Result<(), DbError> {
        if self
            .failures
            .lock()
            .expect("failures lock poisoned")
            .contains(method)
        {
            return Err(DbError::Query(DieselError::DatabaseError(
                DatabaseErrorKind::UnableToSendCommand,
                Box::new(format!("injected failure in {}", method)),
            )));
        }
        Ok(())
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().expect("store lock poisoned")
    }

    pub fn has_application_state(&self, application_id: &str) -> bool {
        self.store()
            .application_states
            .iter()
            .any(|s| s.applicationstate_application_id == application_id)
    }

    pub fn count_application_owners(&self, application_id: &str) -> usize {
        self.store()
            .application_owners
            .iter()
            .filter(|o| o.application_owner_application_id == application_id)
            .count()
    }

    pub fn backdate_managed_environment(&self, id: &str, created_on: DateTime<Utc>) {
        if let Some(env) = self
            .store()
            .managed_environments
            .iter_mut()
            .find(|e| e.managedenvironment_id == id)
        {
            env.created_on = created_on;
        }
    }

    pub fn backdate_cluster_credentials(&self, id: &str, created_on: DateTime<Utc>) {
        if let Some(creds) = self
            .store()
            .cluster_credentials
            .iter_mut()
            .find(|c| c.clustercredentials_cred_id == id)
        {
            creds.created_on = created_on;
        }
    }

    pub fn backdate_operation(&self, id: &str, created_on: DateTime<Utc>) {
        if let Some(op) = self
            .store()
            .operations
            .iter_mut()
            .find(|o| o.operation_id == id)
        {
            op.created_on = created_on;
        }
    }
}

impl DatabaseQueries for InMemoryDb {
    fn create_cluster_user(&self, user: &ClusterUser) -> Result<ClusterUser, DbError> {
        self.check("create_cluster_user")?;
        self.store().cluster_users.push(user.clone());
        Ok(user.clone())
    }

    fn get_cluster_user(&self, id: &str) -> Result<ClusterUser, DbError> {
        self.check("get_cluster_user")?;
        found(&self.store().cluster_users, "ClusterUser", id, |u| {
            u.clusteruser_id == id
        })
    }

    fn get_or_create_special_cluster_user(&self) -> Result<ClusterUser, DbError> {
        self.check("get_or_create_special_cluster_user")?;
        let mut store = self.store();
        if let Some(user) = store.cluster_users.iter().find(|u| u.is_special()) {
            return Ok(user.clone());
        }
        let user = ClusterUser::special();
        store.cluster_users.push(user.clone());
        Ok(user)
    }

    fn list_all_cluster_users(&self) -> Result<Vec<ClusterUser>, DbError> {
        self.check("list_all_cluster_users")?;
        Ok(self.store().cluster_users.clone())
    }

    fn delete_cluster_user(&self, id: &str) -> Result<usize, DbError> {
        self.check("delete_cluster_user")?;
        Ok(remove_where(&mut self.store().cluster_users, |u| {
            u.clusteruser_id == id && u.user_name != SPECIAL_CLUSTER_USER_NAME
        }))
    }

    fn create_cluster_credentials(
        &self,
        creds: &ClusterCredentials,
    ) -> Result<ClusterCredentials, DbError> {
        self.check("create_cluster_credentials")?;
        self.store().cluster_credentials.push(creds.clone());
        Ok(creds.clone())
    }

    fn get_cluster_credentials(&self, id: &str) -> Result<ClusterCredentials, DbError> {
        self.check("get_cluster_credentials")?;
        found(
            &self.store().cluster_credentials,
            "ClusterCredentials",
            id,
            |c| c.clustercredentials_cred_id == id,
        )
    }

    fn list_all_cluster_credentials(&self) -> Result<Vec<ClusterCredentials>, DbError> {
        self.check("list_all_cluster_credentials")?;
        Ok(self.store().cluster_credentials.clone())
    }

    fn delete_cluster_credentials(&self, id: &str) -> Result<usize, DbError> {
        self.check("delete_cluster_credentials")?;
        Ok(remove_where(&mut self.store().cluster_credentials, |c| {
            c.clustercredentials_cred_id == id
        }))
    }

    fn create_gitops_engine_cluster(
        &self,
        cluster: &GitopsEngineCluster,
    ) -> Result<GitopsEngineCluster, DbError> {
        self.check("create_gitops_engine_cluster")?;
        self.store().engine_clusters.push(cluster.clone());
        Ok(cluster.clone())
    }

    fn get_gitops_engine_cluster(&self, id: &str) -> Result<GitopsEngineCluster, DbError> {
        self.check("get_gitops_engine_cluster")?;
        found(
            &self.store().engine_clusters,
            "GitopsEngineCluster",
            id,
            |c| c.gitopsenginecluster_id == id,
        )
    }

    fn count_engine_clusters_by_credentials(&self, creds_id: &str) -> Result<i64, DbError> {
        self.check("count_engine_clusters_by_credentials")?;
        Ok(self
            .store()
            .engine_clusters
            .iter()
            .filter(|c| c.clustercredentials_id == creds_id)
            .count() as i64)
    }

    fn create_gitops_engine_instance(
        &self,
        instance: &GitopsEngineInstance,
    ) -> Result<GitopsEngineInstance, DbError> {
        self.check("create_gitops_engine_instance")?;
        self.store().engine_instances.push(instance.clone());
        Ok(instance.clone())
    }

    fn get_gitops_engine_instance(&self, id: &str) -> Result<GitopsEngineInstance, DbError> {
        self.check("get_gitops_engine_instance")?;
        found(
            &self.store().engine_instances,
            "GitopsEngineInstance",
            id,
            |i| i.gitopsengineinstance_id == id,
        )
    }

    fn create_managed_environment(
        &self,
        env: &ManagedEnvironment,
    ) -> Result<ManagedEnvironment, DbError> {
        self.check("create_managed_environment")?;
        self.store().managed_environments.push(env.clone());
        Ok(env.clone())
    }

    fn get_managed_environment(&self, id: &str) -> Result<ManagedEnvironment, DbError> {
        self.check("get_managed_environment")?;
        found(
            &self.store().managed_environments,
            "ManagedEnvironment",
            id,
            |e| e.managedenvironment_id == id,
        )
    }

    fn list_all_managed_environments(&self) -> Result<Vec<ManagedEnvironment>, DbError> {
        self.check("list_all_managed_environments")?;
        Ok(self.store().managed_environments.clone())
    }

    fn count_managed_environments_by_credentials(&self, creds_id: &str) -> Result<i64, DbError> {
        self.check("count_managed_environments_by_credentials")?;
        Ok(self
            .store()
            .managed_environments
            .iter()
            .filter(|e| e.clustercredentials_id == creds_id)
            .count() as i64)
    }

    fn delete_managed_environment(&self, id: &str) -> Result<usize, DbError> {
        self.check("delete_managed_environment")?;
        let mut store = self.store();
        let rows = remove_where(&mut store.managed_environments, |e| {
            e.managedenvironment_id == id
        });
        if rows > 0 {
            for app in store
                .applications
                .iter_mut()
                .filter(|a| a.managed_environment_id.as_deref() == Some(id))
            {
                app.managed_environment_id = None;
            }
            remove_where(&mut store.cluster_access, |a| {
                a.clusteraccess_managed_environment_id == id
            });
        }
        Ok(rows)
    }

    fn create_cluster_access(&self, access: &ClusterAccess) -> Result<ClusterAccess, DbError> {
        self.check("create_cluster_access")?;
        self.store().cluster_access.push(access.clone());
        Ok(access.clone())
    }

    fn count_cluster_access_by_user(&self, user_id: &str) -> Result<i64, DbError> {
        self.check("count_cluster_access_by_user")?;
        Ok(self
            .store()
            .cluster_access
            .iter()
            .filter(|a| a.clusteraccess_user_id == user_id)
            .count() as i64)
    }

    fn create_application(&self, app: &Application) -> Result<Application, DbError> {
        self.check("create_application")?;
        self.store().applications.push(app.clone());
        Ok(app.clone())
    }

    fn get_application(&self, id: &str) -> Result<Application, DbError> {
        self.check("get_application")?;
        found(&self.store().applications, "Application", id, |a| {
            a.application_id == id
        })
    }

    fn checked_get_application(
        &self,
        id: &str,
        owner_user_id: &str,
    ) -> Result<Application, DbError> {
        self.check("checked_get_application")?;
        let store = self.store();
        let owned = store.application_owners.iter().any(|o| {
            o.application_owner_application_id == id && o.application_owner_user_id == owner_user_id
        });
        if !owned {
            return Err(DbError::not_found("Application", id));
        }
        found(&store.applications, "Application", id, |a| {
            a.application_id == id
        })
    }

    fn list_all_applications(&self) -> Result<Vec<Application>, DbError> {
        self.check("list_all_applications")?;
        Ok(self.store().applications.clone())
    }

    fn list_applications_by_managed_environment(
        &self,
        env_id: &str,
    ) -> Result<Vec<Application>, DbError> {
        self.check("list_applications_by_managed_environment")?;
        Ok(self
            .store()
            .applications
            .iter()
            .filter(|a| a.managed_environment_id.as_deref() == Some(env_id))
            .cloned()
            .collect())
    }

    fn update_application(&self, app: &Application) -> Result<usize, DbError> {
        self.check("update_application")?;
        let mut store = self.store();
        match store
            .applications
            .iter_mut()
            .find(|a| a.application_id == app.application_id)
        {
            Some(existing) => {
                *existing = app.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn delete_application(&self, id: &str) -> Result<usize, DbError> {
        self.check("delete_application")?;
        Ok(remove_where(&mut self.store().applications, |a| {
            a.application_id == id
        }))
    }

    fn create_application_state(
        &self,
        state: &ApplicationState,
    ) -> Result<ApplicationState, DbError> {
        self.check("create_application_state")?;
        self.store().application_states.push(state.clone());
        Ok(state.clone())
    }

    fn delete_application_state(&self, application_id: &str) -> Result<usize, DbError> {
        self.check("delete_application_state")?;
        Ok(remove_where(&mut self.store().application_states, |s| {
            s.applicationstate_application_id == application_id
        }))
    }

    fn create_application_owner(
        &self,
        owner: &ApplicationOwner,
    ) -> Result<ApplicationOwner, DbError> {
        self.check("create_application_owner")?;
        self.store().application_owners.push(owner.clone());
        Ok(owner.clone())
    }

    fn delete_application_owners(&self, application_id: &str) -> Result<usize, DbError> {
        self.check("delete_application_owners")?;
        Ok(remove_where(&mut self.store().application_owners, |o| {
            o.application_owner_application_id == application_id
        }))
    }

    fn create_deployment_to_application_mapping(
        &self,
        mapping: &DeploymentToApplicationMapping,
    ) -> Result<DeploymentToApplicationMapping, DbError> {
        self.check("create_deployment_to_application_mapping")?;
        self.store().deployment_mappings.push(mapping.clone());
        Ok(mapping.clone())
    }

    fn list_all_deployment_to_application_mappings(
        &self,
    ) -> Result<Vec<DeploymentToApplicationMapping>, DbError> {
        self.check("list_all_deployment_to_application_mappings")?;
        Ok(self.store().deployment_mappings.clone())
    }

    fn get_deployment_to_application_mapping_by_application(
        &self,
        application_id: &str,
    ) -> Result<DeploymentToApplicationMapping, DbError> {
        self.check("get_deployment_to_application_mapping_by_application")?;
        found(
            &self.store().deployment_mappings,
            "DeploymentToApplicationMapping",
            application_id,
            |m| m.application_id == application_id,
        )
    }

    fn delete_deployment_to_application_mapping(&self, uid: &str) -> Result<usize, DbError> {
        self.check("delete_deployment_to_application_mapping")?;
        Ok(remove_where(&mut self.store().deployment_mappings, |m| {
            m.deploymenttoapplicationmapping_uid_id == uid
        }))
    }

    fn create_api_cr_to_database_mapping(
        &self,
        mapping: &ApiCrToDatabaseMapping,
    ) -> Result<ApiCrToDatabaseMapping, DbError> {
        self.check("create_api_cr_to_database_mapping")?;
        self.store().api_cr_mappings.push(mapping.clone());
        Ok(mapping.clone())
    }

    fn list_all_api_cr_to_database_mappings(
        &self,
    ) -> Result<Vec<ApiCrToDatabaseMapping>, DbError> {
        self.check("list_all_api_cr_to_database_mappings")?;
        Ok(self.store().api_cr_mappings.clone())
    }

    fn list_api_cr_to_database_mappings_by_relation(
        &self,
        db_relation_type: &str,
        db_relation_key: &str,
    ) -> Result<Vec<ApiCrToDatabaseMapping>, DbError> {
        self.check("list_api_cr_to_database_mappings_by_relation")?;
        Ok(self
            .store()
            .api_cr_mappings
            .iter()
            .filter(|m| m.db_relation_type == db_relation_type && m.db_relation_key == db_relation_key)
            .cloned()
            .collect())
    }

    fn delete_api_cr_to_database_mapping(
        &self,
        mapping: &ApiCrToDatabaseMapping,
    ) -> Result<usize, DbError> {
        self.check("delete_api_cr_to_database_mapping")?;
        Ok(remove_where(&mut self.store().api_cr_mappings, |m| {
            m.api_resource_type == mapping.api_resource_type
                && m.api_resource_uid == mapping.api_resource_uid
                && m.db_relation_type == mapping.db_relation_type
                && m.db_relation_key == mapping.db_relation_key
        }))
    }

    fn create_kubernetes_resource_mapping(
        &self,
        mapping: &KubernetesToDbResourceMapping,
    ) -> Result<KubernetesToDbResourceMapping, DbError> {
        self.check("create_kubernetes_resource_mapping")?;
        self.store().k8s_mappings.push(mapping.clone());
        Ok(mapping.clone())
    }

    fn count_kubernetes_resource_mappings_by_relation(
        &self,
        db_relation_type: &str,
        db_relation_key: &str,
    ) -> Result<i64, DbError> {
        self.check("count_kubernetes_resource_mappings_by_relation")?;
        Ok(self
            .store()
            .k8s_mappings
            .iter()
            .filter(|m| m.db_relation_type == db_relation_type && m.db_relation_key == db_relation_key)
            .count() as i64)
    }

    fn delete_kubernetes_resource_mapping(
        &self,
        mapping: &KubernetesToDbResourceMapping,
    ) -> Result<usize, DbError> {
        self.check("delete_kubernetes_resource_mapping")?;
        Ok(remove_where(&mut self.store().k8s_mappings, |m| m == mapping))
    }

    fn create_sync_operation(&self, op: &SyncOperation) -> Result<SyncOperation, DbError> {
        self.check("create_sync_operation")?;
        self.store().sync_operations.push(op.clone());
        Ok(op.clone())
    }

    fn get_sync_operation(&self, id: &str) -> Result<SyncOperation, DbError> {
        self.check("get_sync_operation")?;
        found(&self.store().sync_operations, "SyncOperation", id, |o| {
            o.syncoperation_id == id
        })
    }

    fn list_all_sync_operations(&self) -> Result<Vec<SyncOperation>, DbError> {
        self.check("list_all_sync_operations")?;
        Ok(self.store().sync_operations.clone())
    }

    fn list_sync_operations_by_application(
        &self,
        application_id: &str,
    ) -> Result<Vec<SyncOperation>, DbError> {
        self.check("list_sync_operations_by_application")?;
        Ok(self
            .store()
            .sync_operations
            .iter()
            .filter(|o| o.application_id.as_deref() == Some(application_id))
            .cloned()
            .collect())
    }

    fn clear_sync_operation_application(&self, id: &str) -> Result<usize, DbError> {
        self.check("clear_sync_operation_application")?;
        let mut store = self.store();
        let mut rows = 0;
        for op in store
            .sync_operations
            .iter_mut()
            .filter(|o| o.syncoperation_id == id)
        {
            op.application_id = Some(String::new());
            rows += 1;
        }
        Ok(rows)
    }

    fn delete_sync_operation(&self, id: &str) -> Result<usize, DbError> {
        self.check("delete_sync_operation")?;
        Ok(remove_where(&mut self.store().sync_operations, |o| {
            o.syncoperation_id == id
        }))
    }

    fn create_repository_credentials(
        &self,
        creds: &RepositoryCredentials,
    ) -> Result<RepositoryCredentials, DbError> {
        self.check("create_repository_credentials")?;
        self.store().repository_credentials.push(creds.clone());
        Ok(creds.clone())
    }

    fn get_repository_credentials(&self, id: &str) -> Result<RepositoryCredentials, DbError> {
        self.check("get_repository_credentials")?;
        found(
            &self.store().repository_credentials,
            "RepositoryCredentials",
            id,
            |c| c.repositorycredentials_id == id,
        )
    }

    fn checked_get_repository_credentials(
        &self,
        id: &str,
        owner_user_id: &str,
    ) -> Result<RepositoryCredentials, DbError> {
        self.check("checked_get_repository_credentials")?;
        found(
            &self.store().repository_credentials,
            "RepositoryCredentials",
            id,
            |c| c.repositorycredentials_id == id && c.repo_cred_user_id == owner_user_id,
        )
    }

    fn list_all_repository_credentials(&self) -> Result<Vec<RepositoryCredentials>, DbError> {
        self.check("list_all_repository_credentials")?;
        Ok(self.store().repository_credentials.clone())
    }

    fn count_repository_credentials_by_user(&self, user_id: &str) -> Result<i64, DbError> {
        self.check("count_repository_credentials_by_user")?;
        Ok(self
            .store()
            .repository_credentials
            .iter()
            .filter(|c| c.repo_cred_user_id == user_id)
            .count() as i64)
    }

    fn delete_repository_credentials(&self, id: &str) -> Result<usize, DbError> {
        self.check("delete_repository_credentials")?;
        Ok(remove_where(&mut self.store().repository_credentials, |c| {
            c.repositorycredentials_id == id
        }))
    }

    fn create_operation(&self, op: &Operation) -> Result<Operation, DbError> {
        self.check("create_operation")?;
        self.store().operations.push(op.clone());
        Ok(op.clone())
    }

    fn get_operation(&self, id: &str) -> Result<Operation, DbError> {
        self.check("get_operation")?;
        found(&self.store().operations, "Operation", id, |o| {
            o.operation_id == id
        })
    }

    fn checked_get_operation(&self, id: &str, owner_user_id: &str) -> Result<Operation, DbError> {
        self.check("checked_get_operation")?;
        found(&self.store().operations, "Operation", id, |o| {
            o.operation_id == id && o.operation_owner_user_id == owner_user_id
        })
    }

    fn list_all_operations(&self) -> Result<Vec<Operation>, DbError> {
        self.check("list_all_operations")?;
        Ok(self.store().operations.clone())
    }

    fn count_operations_by_owner(&self, user_id: &str) -> Result<i64, DbError> {
        self.check("count_operations_by_owner")?;
        Ok(self
            .store()
            .operations
            .iter()
            .filter(|o| o.operation_owner_user_id == user_id)
            .count() as i64)
    }

    fn update_operation_state(
        &self,
        id: &str,
        new_state: OperationState,
        human_readable_state: Option<String>,
    ) -> Result<Operation, DbError> {
        self.check("update_operation_state")?;
        let mut store = self.store();
        let op = store
            .operations
            .iter_mut()
            .find(|o| o.operation_id == id)
            .ok_or_else(|| DbError::not_found("Operation", id))?;
        if !op.state.can_transition_to(new_state) {
            return Err(DbError::InvalidStateTransition {
                from: op.state,
                to: new_state,
            });
        }
        op.state = new_state;
        op.last_state_update = Utc::now();
        op.human_readable_state = human_readable_state;
        Ok(op.clone())
    }

    fn delete_operation(&self, id: &str) -> Result<usize, DbError> {
        self.check("delete_operation")?;
        Ok(remove_where(&mut self.store().operations, |o| {
            o.operation_id == id
        }))
    }
}

/// A minimal engine topology: in-cluster credentials, one engine instance,
/// one managed environment and one user.
pub struct SampleData {
    pub credentials: ClusterCredentials,
    pub engine_cluster: GitopsEngineCluster,
    pub instance: GitopsEngineInstance,
    pub environment: ManagedEnvironment,
    pub user: ClusterUser,
}

impl SampleData {
    pub fn seed(db: &dyn DatabaseQueries) -> Self {
        let credentials = db
            .create_cluster_credentials(&ClusterCredentials::in_cluster("test-creds").unwrap())
            .unwrap();
        let engine_cluster = db
            .create_gitops_engine_cluster(
                &GitopsEngineCluster::new("test-engine-cluster", "test-creds").unwrap(),
            )
            .unwrap();
        let instance = db
            .create_gitops_engine_instance(
                &GitopsEngineInstance::new(
                    "test-instance",
                    "gitops-engine",
                    "test-engine-ns-uid",
                    "test-engine-cluster",
                )
                .unwrap(),
            )
            .unwrap();
        let environment = db
            .create_managed_environment(
                &ManagedEnvironment::new("test-env", "test-env", "test-creds").unwrap(),
            )
            .unwrap();
        let user = db
            .create_cluster_user(&ClusterUser::new("test-user", "test-user").unwrap())
            .unwrap();

        Self {
            credentials,
            engine_cluster,
            instance,
            environment,
            user,
        }
    }

    /// An application on the sample environment, owned by the sample user.
    pub fn application(&self, db: &dyn DatabaseQueries, id: &str) -> Application {
        let app = db
            .create_application(
                &Application::new(
                    id,
                    id,
                    "{\"destination\":{\"namespace\":\"team-a\"}}",
                    &self.instance.gitopsengineinstance_id,
                    Some(self.environment.managedenvironment_id.clone()),
                )
                .unwrap(),
            )
            .unwrap();
        db.create_application_owner(&ApplicationOwner::new(id, &self.user.clusteruser_id).unwrap())
            .unwrap();
        app
    }

    pub fn deployment_mapping(
        &self,
        db: &dyn DatabaseQueries,
        uid: &str,
        app: &Application,
    ) -> DeploymentToApplicationMapping {
        db.create_deployment_to_application_mapping(
            &DeploymentToApplicationMapping::new(
                uid,
                format!("{}-deployment", app.name),
                "team-a",
                "test-ns-uid",
                &app.application_id,
            )
            .unwrap(),
        )
        .unwrap()
    }

    pub fn sync_operation(
        &self,
        db: &dyn DatabaseQueries,
        id: &str,
        application_id: Option<&str>,
    ) -> SyncOperation {
        db.create_sync_operation(
            &SyncOperation::new(
                id,
                application_id.map(str::to_string),
                "my-deployment",
                "team-a",
                "main",
                "Running",
            )
            .unwrap(),
        )
        .unwrap()
    }
}

#[derive(Default)]
struct ClusterState {
    objects: HashMap<(ResourceKind, String, String), String>,
    created_operations: Vec<(String, String, String)>,
    transient: bool,
    hang: bool,
}

/// A cluster whose objects are a map from (kind, namespace, name) to UID.
///
/// Also acts as its own client factory, so engine-instance calls land here too.
#[derive(Clone, Default)]
pub struct FakeCluster {
    state: Arc<Mutex<ClusterState>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ClusterState> {
        self.state.lock().expect("cluster lock poisoned")
    }

    pub fn add(&self, kind: ResourceKind, namespace: &str, name: &str, uid: &str) {
        self.state().objects.insert(
            (kind, namespace.to_string(), name.to_string()),
            uid.to_string(),
        );
    }

    pub fn remove(&self, kind: ResourceKind, namespace: &str, name: &str) {
        self.state()
            .objects
            .remove(&(kind, namespace.to_string(), name.to_string()));
    }

    pub fn contains(&self, kind: ResourceKind, namespace: &str, name: &str) -> bool {
        self.state()
            .objects
            .contains_key(&(kind, namespace.to_string(), name.to_string()))
    }

    /// Every call fails with a transient error while set.
    pub fn set_transient(&self, transient: bool) {
        self.state().transient = transient;
    }

    /// Every call never completes while set.
    pub fn set_hang(&self, hang: bool) {
        self.state().hang = hang;
    }

    /// `(namespace, name, operation_id)` of every `Operation` created.
    pub fn created_operations(&self) -> Vec<(String, String, String)> {
        self.state().created_operations.clone()
    }

    async fn fault(&self) -> Result<(), ClusterError> {
        let (transient, hang) = {
            let state = self.state();
            (state.transient, state.hang)
        };
        if hang {
            std::future::pending::<()>().await;
        }
        if transient {
            return Err(ClusterError::Transient("503 Service Unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ObservedObject>, ClusterError> {
        self.fault().await?;
        Ok(self
            .state()
            .objects
            .get(&(kind, namespace.to_string(), name.to_string()))
            .map(|uid| ObservedObject {
                namespace: namespace.to_string(),
                name: name.to_string(),
                uid: uid.clone(),
            }))
    }

    async fn create_operation(
        &self,
        namespace: &str,
        name: &str,
        operation_id: &str,
    ) -> Result<(), ClusterError> {
        self.fault().await?;
        let mut state = self.state();
        state.created_operations.push((
            namespace.to_string(),
            name.to_string(),
            operation_id.to_string(),
        ));
        state.objects.insert(
            (ResourceKind::Operation, namespace.to_string(), name.to_string()),
            format!("uid-{}", operation_id),
        );
        Ok(())
    }
}

#[async_trait]
impl ClusterClientFactory for FakeCluster {
    async fn client_for_engine_instance(
        &self,
        _instance: &GitopsEngineInstance,
        _credentials: &ClusterCredentials,
    ) -> Result<Arc<dyn ClusterClient>, ClusterError> {
        Ok(Arc::new(self.clone()))
    }
}
