/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use crate::dal::{DatabaseQueries, DbError, DAL};
use gitops_models::models::{
    ApiCrToDatabaseMapping, Application, ApplicationOwner, ApplicationState, ClusterAccess,
    ClusterCredentials, ClusterUser, DeploymentToApplicationMapping, GitopsEngineCluster,
    GitopsEngineInstance, KubernetesToDbResourceMapping, ManagedEnvironment, Operation,
    OperationState, RepositoryCredentials, SyncOperation,
};

impl DatabaseQueries for DAL {
    fn create_cluster_user(&self, user: &ClusterUser) -> Result<ClusterUser, DbError> {
        self.cluster_users().create(user)
    }

    fn get_cluster_user(&self, id: &str) -> Result<ClusterUser, DbError> {
        self.cluster_users().get(id)
    }

    fn get_or_create_special_cluster_user(&self) -> Result<ClusterUser, DbError> {
        self.cluster_users().get_or_create_special()
    }

    fn list_all_cluster_users(&self) -> Result<Vec<ClusterUser>, DbError> {
        self.cluster_users().list_all()
    }

    fn delete_cluster_user(&self, id: &str) -> Result<usize, DbError> {
        self.cluster_users().delete(id)
    }

    fn create_cluster_credentials(
        &self,
        creds: &ClusterCredentials,
    ) -> Result<ClusterCredentials, DbError> {
        self.clusters().create_credentials(creds)
    }

    fn get_cluster_credentials(&self, id: &str) -> Result<ClusterCredentials, DbError> {
        self.clusters().get_credentials(id)
    }

    fn list_all_cluster_credentials(&self) -> Result<Vec<ClusterCredentials>, DbError> {
        self.clusters().list_all_credentials()
    }

    fn delete_cluster_credentials(&self, id: &str) -> Result<usize, DbError> {
        self.clusters().delete_credentials(id)
    }

    fn create_gitops_engine_cluster(
        &self,
        cluster: &GitopsEngineCluster,
    ) -> Result<GitopsEngineCluster, DbError> {
        self.clusters().create_engine_cluster(cluster)
    }

    fn get_gitops_engine_cluster(&self, id: &str) -> Result<GitopsEngineCluster, DbError> {
        self.clusters().get_engine_cluster(id)
    }

    fn count_engine_clusters_by_credentials(&self, creds_id: &str) -> Result<i64, DbError> {
        self.clusters().count_engine_clusters_by_credentials(creds_id)
    }

    fn create_gitops_engine_instance(
        &self,
        instance: &GitopsEngineInstance,
    ) -> Result<GitopsEngineInstance, DbError> {
        self.clusters().create_engine_instance(instance)
    }

    fn get_gitops_engine_instance(&self, id: &str) -> Result<GitopsEngineInstance, DbError> {
        self.clusters().get_engine_instance(id)
    }

    fn create_managed_environment(
        &self,
        env: &ManagedEnvironment,
    ) -> Result<ManagedEnvironment, DbError> {
        self.managed_environments().create(env)
    }

    fn get_managed_environment(&self, id: &str) -> Result<ManagedEnvironment, DbError> {
        self.managed_environments().get(id)
    }

    fn list_all_managed_environments(&self) -> Result<Vec<ManagedEnvironment>, DbError> {
        self.managed_environments().list_all()
    }

    fn count_managed_environments_by_credentials(&self, creds_id: &str) -> Result<i64, DbError> {
        self.managed_environments().count_by_credentials(creds_id)
    }

    fn delete_managed_environment(&self, id: &str) -> Result<usize, DbError> {
        self.managed_environments().delete(id)
    }

    fn create_cluster_access(&self, access: &ClusterAccess) -> Result<ClusterAccess, DbError> {
        self.managed_environments().create_cluster_access(access)
    }

    fn count_cluster_access_by_user(&self, user_id: &str) -> Result<i64, DbError> {
        self.managed_environments().count_cluster_access_by_user(user_id)
    }

    fn create_application(&self, app: &Application) -> Result<Application, DbError> {
        self.applications().create(app)
    }

    fn get_application(&self, id: &str) -> Result<Application, DbError> {
        self.applications().get(id)
    }

    fn checked_get_application(
        &self,
        id: &str,
        owner_user_id: &str,
    ) -> Result<Application, DbError> {
        self.applications().checked_get(id, owner_user_id)
    }

    fn list_all_applications(&self) -> Result<Vec<Application>, DbError> {
        self.applications().list_all()
    }

    fn list_applications_by_managed_environment(
        &self,
        env_id: &str,
    ) -> Result<Vec<Application>, DbError> {
        self.applications().list_by_managed_environment(env_id)
    }

    fn update_application(&self, app: &Application) -> Result<usize, DbError> {
        self.applications().update(app)
    }

    fn delete_application(&self, id: &str) -> Result<usize, DbError> {
        self.applications().delete(id)
    }

    fn create_application_state(
        &self,
        state: &ApplicationState,
    ) -> Result<ApplicationState, DbError> {
        self.applications().create_state(state)
    }

    fn delete_application_state(&self, application_id: &str) -> Result<usize, DbError> {
        self.applications().delete_state(application_id)
    }

    fn create_application_owner(
        &self,
        owner: &ApplicationOwner,
    ) -> Result<ApplicationOwner, DbError> {
        self.applications().create_owner(owner)
    }

    fn delete_application_owners(&self, application_id: &str) -> Result<usize, DbError> {
        self.applications().delete_owners(application_id)
    }

    fn create_deployment_to_application_mapping(
        &self,
        mapping: &DeploymentToApplicationMapping,
    ) -> Result<DeploymentToApplicationMapping, DbError> {
        self.mappings().create_deployment_mapping(mapping)
    }

    fn list_all_deployment_to_application_mappings(
        &self,
    ) -> Result<Vec<DeploymentToApplicationMapping>, DbError> {
        self.mappings().list_all_deployment_mappings()
    }

    fn get_deployment_to_application_mapping_by_application(
        &self,
        application_id: &str,
    ) -> Result<DeploymentToApplicationMapping, DbError> {
        self.mappings()
            .get_deployment_mapping_by_application(application_id)
    }

    fn delete_deployment_to_application_mapping(&self, uid: &str) -> Result<usize, DbError> {
        self.mappings().delete_deployment_mapping(uid)
    }

    fn create_api_cr_to_database_mapping(
        &self,
        mapping: &ApiCrToDatabaseMapping,
    ) -> Result<ApiCrToDatabaseMapping, DbError> {
        self.mappings().create_api_cr_mapping(mapping)
    }

    fn list_all_api_cr_to_database_mappings(
        &self,
    ) -> Result<Vec<ApiCrToDatabaseMapping>, DbError> {
        self.mappings().list_all_api_cr_mappings()
    }

    fn list_api_cr_to_database_mappings_by_relation(
        &self,
        db_relation_type: &str,
        db_relation_key: &str,
    ) -> Result<Vec<ApiCrToDatabaseMapping>, DbError> {
        self.mappings()
            .list_api_cr_mappings_by_relation(db_relation_type, db_relation_key)
    }

    fn delete_api_cr_to_database_mapping(
        &self,
        mapping: &ApiCrToDatabaseMapping,
    ) -> Result<usize, DbError> {
        self.mappings().delete_api_cr_mapping(mapping)
    }

    fn create_kubernetes_resource_mapping(
        &self,
        mapping: &KubernetesToDbResourceMapping,
    ) -> Result<KubernetesToDbResourceMapping, DbError> {
        self.mappings().create_kubernetes_mapping(mapping)
    }

    fn count_kubernetes_resource_mappings_by_relation(
        &self,
        db_relation_type: &str,
        db_relation_key: &str,
    ) -> Result<i64, DbError> {
        self.mappings()
            .count_kubernetes_mappings_by_relation(db_relation_type, db_relation_key)
    }

    fn delete_kubernetes_resource_mapping(
        &self,
        mapping: &KubernetesToDbResourceMapping,
    ) -> Result<usize, DbError> {
        self.mappings().delete_kubernetes_mapping(mapping)
    }

    fn create_sync_operation(&self, op: &SyncOperation) -> Result<SyncOperation, DbError> {
        self.sync_operations().create(op)
    }

    fn get_sync_operation(&self, id: &str) -> Result<SyncOperation, DbError> {
        self.sync_operations().get(id)
    }

    fn list_all_sync_operations(&self) -> Result<Vec<SyncOperation>, DbError> {
        self.sync_operations().list_all()
    }

    fn list_sync_operations_by_application(
        &self,
        application_id: &str,
    ) -> Result<Vec<SyncOperation>, DbError> {
        self.sync_operations().list_by_application(application_id)
    }

    fn clear_sync_operation_application(&self, id: &str) -> Result<usize, DbError> {
        self.sync_operations().clear_application(id)
    }

    fn delete_sync_operation(&self, id: &str) -> Result<usize, DbError> {
        self.sync_operations().delete(id)
    }

    fn create_repository_credentials(
        &self,
        creds: &RepositoryCredentials,
    ) -> Result<RepositoryCredentials, DbError> {
        self.repository_credentials().create(creds)
    }

    fn get_repository_credentials(&self, id: &str) -> Result<RepositoryCredentials, DbError> {
        self.repository_credentials().get(id)
    }

    fn checked_get_repository_credentials(
        &self,
        id: &str,
        owner_user_id: &str,
    ) -> Result<RepositoryCredentials, DbError> {
        self.repository_credentials().checked_get(id, owner_user_id)
    }

    fn list_all_repository_credentials(&self) -> Result<Vec<RepositoryCredentials>, DbError> {
        self.repository_credentials().list_all()
    }

    fn count_repository_credentials_by_user(&self, user_id: &str) -> Result<i64, DbError> {
        self.repository_credentials().count_by_user(user_id)
    }

    fn delete_repository_credentials(&self, id: &str) -> Result<usize, DbError> {
        self.repository_credentials().delete(id)
    }

    fn create_operation(&self, op: &Operation) -> Result<Operation, DbError> {
        self.operations().create(op)
    }

    fn get_operation(&self, id: &str) -> Result<Operation, DbError> {
        self.operations().get(id)
    }

    fn checked_get_operation(&self, id: &str, owner_user_id: &str) -> Result<Operation, DbError> {
        self.operations().checked_get(id, owner_user_id)
    }

    fn list_all_operations(&self) -> Result<Vec<Operation>, DbError> {
        self.operations().list_all()
    }

    fn count_operations_by_owner(&self, user_id: &str) -> Result<i64, DbError> {
        self.operations().count_by_owner(user_id)
    }

    fn update_operation_state(
        &self,
        id: &str,
        new_state: OperationState,
        human_readable_state: Option<String>,
    ) -> Result<Operation, DbError> {
        self.operations()
            .update_state(id, new_state, human_readable_state)
    }

    fn delete_operation(&self, id: &str) -> Result<usize, DbError> {
        self.operations().delete(id)
    }
}
