/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

pub mod applications;
pub mod cluster_users;
pub mod clusters;
pub mod managed_environments;
pub mod mappings;
pub mod operations;
pub mod repository_credentials;
pub mod sync_operations;

pub use applications::{Application, ApplicationOwner, ApplicationState};
pub use cluster_users::{ClusterUser, SPECIAL_CLUSTER_USER_NAME};
pub use clusters::{ClusterCredentials, GitopsEngineCluster, GitopsEngineInstance};
pub use managed_environments::{ClusterAccess, ManagedEnvironment};
pub use mappings::{
    ApiCrToDatabaseMapping, ApiResourceType, DbRelationType, DeploymentToApplicationMapping,
    KubernetesToDbResourceMapping,
};
pub use operations::{Operation, OperationResourceType, OperationState};
pub use repository_credentials::RepositoryCredentials;
pub use sync_operations::SyncOperation;
