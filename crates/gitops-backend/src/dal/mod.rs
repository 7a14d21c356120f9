/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Data Access Layer
//!
//! Typed access to the shadow database. The reconciler only talks to the
//! [`DatabaseQueries`] trait; [`DAL`] is its diesel implementation, built from
//! per-entity accessors (`dal.applications()`, `dal.operations()`, ...) that
//! each borrow the DAL for the duration of a call.
//!
//! ## Checked and unsafe queries
//!
//! `checked_get_*` variants only return a row when it belongs to the given
//! cluster user. `list_all_*` queries are unfiltered and are refused unless
//! the DAL was built with `allow_unsafe = true`, which only the reconciler
//! does.
//!
//! ## Rows affected
//!
//! Every `delete_*` and decouple call returns the number of rows it touched.
//! Callers treat zero as "already handled elsewhere".

use crate::db::{ConnectionPool, PgPooledConnection};
use gitops_models::models::{
    ApiCrToDatabaseMapping, Application, ApplicationOwner, ApplicationState, ClusterAccess,
    ClusterCredentials, ClusterUser, DeploymentToApplicationMapping, GitopsEngineCluster,
    GitopsEngineInstance, KubernetesToDbResourceMapping, ManagedEnvironment, Operation,
    OperationState, RepositoryCredentials, SyncOperation,
};
use gitops_models::validation::ValidationError;
use thiserror::Error;

mod applications;
mod cluster_users;
mod clusters;
mod managed_environments;
mod mappings;
mod operations;
mod queries;
mod repository_credentials;
mod sync_operations;

pub use applications::ApplicationsDAL;
pub use cluster_users::ClusterUsersDAL;
pub use clusters::ClustersDAL;
pub use managed_environments::ManagedEnvironmentsDAL;
pub use mappings::MappingsDAL;
pub use operations::OperationsDAL;
pub use repository_credentials::RepositoryCredentialsDAL;
pub use sync_operations::SyncOperationsDAL;

/// Errors returned by the data access layer.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("'{0}' is an unfiltered query and requires a DAL built with allow_unsafe")]
    UnsafeNotAllowed(&'static str),
    #[error("invalid operation state transition: {from} -> {to}")]
    InvalidStateTransition {
        from: OperationState,
        to: OperationState,
    },
    #[error("invalid database configuration: {0}")]
    InvalidConfig(String),
    #[error("migration failed: {0}")]
    Migration(String),
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("query failed: {0}")]
    Query(#[from] diesel::result::Error),
}

impl DbError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        DbError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DbError::NotFound { .. } | DbError::Query(diesel::result::Error::NotFound)
        )
    }

    pub fn is_max_length(&self) -> bool {
        matches!(self, DbError::Validation(v) if v.is_max_length())
    }

    pub fn is_empty_field(&self) -> bool {
        matches!(self, DbError::Validation(v) if v.is_empty_field())
    }
}

pub fn is_not_found_error(err: &DbError) -> bool {
    err.is_not_found()
}

pub fn is_max_length_error(err: &DbError) -> bool {
    err.is_max_length()
}

/// Everything the reconciler needs from the shadow database.
///
/// Implemented by [`DAL`] against PostgreSQL and by an in-memory store in
/// unit tests.
pub trait DatabaseQueries: Send + Sync {
    // Cluster users
    fn create_cluster_user(&self, user: &ClusterUser) -> Result<ClusterUser, DbError>;
    fn get_cluster_user(&self, id: &str) -> Result<ClusterUser, DbError>;
    fn get_or_create_special_cluster_user(&self) -> Result<ClusterUser, DbError>;
    fn list_all_cluster_users(&self) -> Result<Vec<ClusterUser>, DbError>;
    fn delete_cluster_user(&self, id: &str) -> Result<usize, DbError>;

    // Cluster credentials and the engine topology
    fn create_cluster_credentials(
        &self,
        creds: &ClusterCredentials,
    ) -> Result<ClusterCredentials, DbError>;
    fn get_cluster_credentials(&self, id: &str) -> Result<ClusterCredentials, DbError>;
    fn list_all_cluster_credentials(&self) -> Result<Vec<ClusterCredentials>, DbError>;
    fn delete_cluster_credentials(&self, id: &str) -> Result<usize, DbError>;
    fn create_gitops_engine_cluster(
        &self,
        cluster: &GitopsEngineCluster,
    ) -> Result<GitopsEngineCluster, DbError>;
    fn get_gitops_engine_cluster(&self, id: &str) -> Result<GitopsEngineCluster, DbError>;
    fn count_engine_clusters_by_credentials(&self, creds_id: &str) -> Result<i64, DbError>;
    fn create_gitops_engine_instance(
        &self,
        instance: &GitopsEngineInstance,
    ) -> Result<GitopsEngineInstance, DbError>;
    fn get_gitops_engine_instance(&self, id: &str) -> Result<GitopsEngineInstance, DbError>;

    // Managed environments and cluster access
    fn create_managed_environment(
        &self,
        env: &ManagedEnvironment,
    ) -> Result<ManagedEnvironment, DbError>;
    fn get_managed_environment(&self, id: &str) -> Result<ManagedEnvironment, DbError>;
    fn list_all_managed_environments(&self) -> Result<Vec<ManagedEnvironment>, DbError>;
    fn count_managed_environments_by_credentials(&self, creds_id: &str) -> Result<i64, DbError>;
    fn delete_managed_environment(&self, id: &str) -> Result<usize, DbError>;
    fn create_cluster_access(&self, access: &ClusterAccess) -> Result<ClusterAccess, DbError>;
    fn count_cluster_access_by_user(&self, user_id: &str) -> Result<i64, DbError>;

    // Applications
    fn create_application(&self, app: &Application) -> Result<Application, DbError>;
    fn get_application(&self, id: &str) -> Result<Application, DbError>;
    fn checked_get_application(&self, id: &str, owner_user_id: &str)
        -> Result<Application, DbError>;
    fn list_all_applications(&self) -> Result<Vec<Application>, DbError>;
    fn list_applications_by_managed_environment(
        &self,
        env_id: &str,
    ) -> Result<Vec<Application>, DbError>;
    fn update_application(&self, app: &Application) -> Result<usize, DbError>;
    fn delete_application(&self, id: &str) -> Result<usize, DbError>;
    fn create_application_state(&self, state: &ApplicationState)
        -> Result<ApplicationState, DbError>;
    fn delete_application_state(&self, application_id: &str) -> Result<usize, DbError>;
    fn create_application_owner(&self, owner: &ApplicationOwner)
        -> Result<ApplicationOwner, DbError>;
    fn delete_application_owners(&self, application_id: &str) -> Result<usize, DbError>;

    // Mapping tables
    fn create_deployment_to_application_mapping(
        &self,
        mapping: &DeploymentToApplicationMapping,
    ) -> Result<DeploymentToApplicationMapping, DbError>;
    fn list_all_deployment_to_application_mappings(
        &self,
    ) -> Result<Vec<DeploymentToApplicationMapping>, DbError>;
    fn get_deployment_to_application_mapping_by_application(
        &self,
        application_id: &str,
    ) -> Result<DeploymentToApplicationMapping, DbError>;
    fn delete_deployment_to_application_mapping(&self, uid: &str) -> Result<usize, DbError>;
    fn create_api_cr_to_database_mapping(
        &self,
        mapping: &ApiCrToDatabaseMapping,
    ) -> Result<ApiCrToDatabaseMapping, DbError>;
    fn list_all_api_cr_to_database_mappings(&self)
        -> Result<Vec<ApiCrToDatabaseMapping>, DbError>;
    fn list_api_cr_to_database_mappings_by_relation(
        &self,
        db_relation_type: &str,
        db_relation_key: &str,
    ) -> Result<Vec<ApiCrToDatabaseMapping>, DbError>;
    fn delete_api_cr_to_database_mapping(
        &self,
        mapping: &ApiCrToDatabaseMapping,
    ) -> Result<usize, DbError>;
    fn create_kubernetes_resource_mapping(
        &self,
        mapping: &KubernetesToDbResourceMapping,
    ) -> Result<KubernetesToDbResourceMapping, DbError>;
    fn count_kubernetes_resource_mappings_by_relation(
        &self,
        db_relation_type: &str,
        db_relation_key: &str,
    ) -> Result<i64, DbError>;
    fn delete_kubernetes_resource_mapping(
        &self,
        mapping: &KubernetesToDbResourceMapping,
    ) -> Result<usize, DbError>;

    // Sync operations
    fn create_sync_operation(&self, op: &SyncOperation) -> Result<SyncOperation, DbError>;
    fn get_sync_operation(&self, id: &str) -> Result<SyncOperation, DbError>;
    fn list_all_sync_operations(&self) -> Result<Vec<SyncOperation>, DbError>;
    fn list_sync_operations_by_application(
        &self,
        application_id: &str,
    ) -> Result<Vec<SyncOperation>, DbError>;
    /// Sets `application_id` to the empty string, keeping the row.
    fn clear_sync_operation_application(&self, id: &str) -> Result<usize, DbError>;
    fn delete_sync_operation(&self, id: &str) -> Result<usize, DbError>;

    // Repository credentials
    fn create_repository_credentials(
        &self,
        creds: &RepositoryCredentials,
    ) -> Result<RepositoryCredentials, DbError>;
    fn get_repository_credentials(&self, id: &str) -> Result<RepositoryCredentials, DbError>;
    fn checked_get_repository_credentials(
        &self,
        id: &str,
        owner_user_id: &str,
    ) -> Result<RepositoryCredentials, DbError>;
    fn list_all_repository_credentials(&self) -> Result<Vec<RepositoryCredentials>, DbError>;
    fn count_repository_credentials_by_user(&self, user_id: &str) -> Result<i64, DbError>;
    fn delete_repository_credentials(&self, id: &str) -> Result<usize, DbError>;

    // Operations
    fn create_operation(&self, op: &Operation) -> Result<Operation, DbError>;
    fn get_operation(&self, id: &str) -> Result<Operation, DbError>;
    fn checked_get_operation(&self, id: &str, owner_user_id: &str) -> Result<Operation, DbError>;
    fn list_all_operations(&self) -> Result<Vec<Operation>, DbError>;
    fn count_operations_by_owner(&self, user_id: &str) -> Result<i64, DbError>;
    /// Moves an operation to `new_state`, rejecting invalid transitions.
    fn update_operation_state(
        &self,
        id: &str,
        new_state: OperationState,
        human_readable_state: Option<String>,
    ) -> Result<Operation, DbError>;
    fn delete_operation(&self, id: &str) -> Result<usize, DbError>;
}

/// Diesel-backed implementation of [`DatabaseQueries`].
#[derive(Clone)]
pub struct DAL {
    pub pool: ConnectionPool,
    allow_unsafe: bool,
}

impl DAL {
    /// Creates a DAL that refuses unfiltered `list_all_*` queries.
    pub fn new(pool: ConnectionPool) -> Self {
        DAL {
            pool,
            allow_unsafe: false,
        }
    }

    /// Creates a DAL that may run unfiltered queries. Used by the reconciler.
    pub fn new_allow_unsafe(pool: ConnectionPool) -> Self {
        DAL {
            pool,
            allow_unsafe: true,
        }
    }

    pub fn allows_unsafe(&self) -> bool {
        self.allow_unsafe
    }

    pub(crate) fn conn(&self) -> Result<PgPooledConnection, DbError> {
        self.pool.get()
    }

    pub(crate) fn ensure_unsafe(&self, query: &'static str) -> Result<(), DbError> {
        if self.allow_unsafe {
            Ok(())
        } else {
            Err(DbError::UnsafeNotAllowed(query))
        }
    }

    pub fn cluster_users(&self) -> ClusterUsersDAL {
        ClusterUsersDAL { dal: self }
    }

    pub fn clusters(&self) -> ClustersDAL {
        ClustersDAL { dal: self }
    }

    pub fn managed_environments(&self) -> ManagedEnvironmentsDAL {
        ManagedEnvironmentsDAL { dal: self }
    }

    pub fn applications(&self) -> ApplicationsDAL {
        ApplicationsDAL { dal: self }
    }

    pub fn mappings(&self) -> MappingsDAL {
        MappingsDAL { dal: self }
    }

    pub fn sync_operations(&self) -> SyncOperationsDAL {
        SyncOperationsDAL { dal: self }
    }

    pub fn repository_credentials(&self) -> RepositoryCredentialsDAL {
        RepositoryCredentialsDAL { dal: self }
    }

    pub fn operations(&self) -> OperationsDAL {
        OperationsDAL { dal: self }
    }
}
