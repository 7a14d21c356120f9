/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Cluster clients used by the reconciler.
//!
//! [`ClusterClient`] is the seam the reconciler talks to. [`KubeClusterClient`]
//! implements it with `kube`, retrying retryable API errors with exponential
//! backoff. [`KubeClientFactory`] hands out the client for a GitOps engine
//! instance: the service's own client for in-cluster credentials, or one built
//! from the stored kube config otherwise.

use crate::k8s::resources::{
    GitOpsDeployment, GitOpsDeploymentManagedEnvironment, GitOpsDeploymentRepositoryCredential,
    GitOpsDeploymentSyncRun, Operation as OperationResource, OperationSpec,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use gitops_models::models::mappings::ApiResourceType;
use gitops_models::models::{ClusterCredentials, GitopsEngineInstance};
use gitops_utils::logging::prelude::*;
use k8s_openapi::NamespaceResourceScope;
use kube::api::PostParams;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config, Error as KubeError, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Errors returned by cluster calls.
#[derive(Debug, Clone, Error)]
pub enum ClusterError {
    #[error("not found: {0}")]
    NotFound(String),
    /// Retryable API status, network failure or timeout. Never authoritative.
    #[error("transient cluster error: {0}")]
    Transient(String),
    #[error("cluster error: {0}")]
    Permanent(String),
    #[error("invalid cluster configuration: {0}")]
    Config(String),
}

impl ClusterError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ClusterError::Transient(_))
    }

    fn from_kube(error: KubeError) -> Self {
        match &error {
            KubeError::Api(api_err) if api_err.code == 404 => {
                ClusterError::NotFound(api_err.message.clone())
            }
            e if is_retryable_error(e) => ClusterError::Transient(error.to_string()),
            KubeError::HyperError(_) | KubeError::Service(_) | KubeError::ReadEvents(_) => {
                ClusterError::Transient(error.to_string())
            }
            _ => ClusterError::Permanent(error.to_string()),
        }
    }
}

/// Kinds of custom resource the reconciler reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    GitOpsDeployment,
    ManagedEnvironment,
    RepositoryCredential,
    SyncRun,
    Operation,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::GitOpsDeployment => "GitOpsDeployment",
            ResourceKind::ManagedEnvironment => "GitOpsDeploymentManagedEnvironment",
            ResourceKind::RepositoryCredential => "GitOpsDeploymentRepositoryCredential",
            ResourceKind::SyncRun => "GitOpsDeploymentSyncRun",
            ResourceKind::Operation => "Operation",
        }
    }
}

impl From<ApiResourceType> for ResourceKind {
    fn from(value: ApiResourceType) -> Self {
        match value {
            ApiResourceType::ManagedEnvironment => ResourceKind::ManagedEnvironment,
            ApiResourceType::RepositoryCredential => ResourceKind::RepositoryCredential,
            ApiResourceType::SyncRun => ResourceKind::SyncRun,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identity of a live cluster object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedObject {
    pub namespace: String,
    pub name: String,
    pub uid: String,
}

#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Fetches an object. `Ok(None)` is an authoritative absence.
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ObservedObject>, ClusterError>;

    /// Creates an `Operation` resource. An existing object of the same name
    /// counts as success.
    async fn create_operation(
        &self,
        namespace: &str,
        name: &str,
        operation_id: &str,
    ) -> Result<(), ClusterError>;
}

#[async_trait]
pub trait ClusterClientFactory: Send + Sync {
    /// Returns the client for the cluster hosting `instance`, described by
    /// `credentials`.
    async fn client_for_engine_instance(
        &self,
        instance: &GitopsEngineInstance,
        credentials: &ClusterCredentials,
    ) -> Result<Arc<dyn ClusterClient>, ClusterError>;
}

/// Retry configuration for cluster calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_elapsed_time: Duration,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_elapsed_time: Duration::from_secs(20),
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

fn is_retryable_error(error: &KubeError) -> bool {
    match error {
        KubeError::Api(api_err) => {
            matches!(api_err.code, 429 | 500 | 503 | 504)
                || matches!(
                    api_err.reason.as_str(),
                    "ServiceUnavailable" | "InternalError" | "Timeout"
                )
        }
        _ => false,
    }
}

fn is_already_exists(error: &KubeError) -> bool {
    matches!(error, KubeError::Api(api_err) if api_err.code == 409 || api_err.reason == "AlreadyExists")
}

async fn with_retries<F, Fut, T>(operation: F, config: &RetryConfig) -> Result<T, KubeError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, KubeError>>,
{
    let backoff = ExponentialBackoffBuilder::new()
        .with_initial_interval(config.initial_interval)
        .with_max_interval(config.max_interval)
        .with_multiplier(config.multiplier)
        .with_max_elapsed_time(Some(config.max_elapsed_time))
        .build();

    let operation_with_backoff = || async {
        match operation().await {
            Ok(value) => Ok(value),
            Err(error) => {
                if is_retryable_error(&error) {
                    warn!("Retryable cluster error encountered: {}", error);
                    Err(backoff::Error::Transient {
                        err: error,
                        retry_after: None,
                    })
                } else {
                    Err(backoff::Error::Permanent(error))
                }
            }
        }
    };

    backoff::future::retry(backoff, operation_with_backoff).await
}

/// [`ClusterClient`] backed by a `kube::Client`.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
    retry: RetryConfig,
}

impl KubeClusterClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Connects to the cluster the service runs against: the given kubeconfig
    /// file when set, otherwise the in-cluster or default configuration.
    pub async fn connect(kubeconfig_path: Option<&str>) -> Result<Self, ClusterError> {
        let client = match kubeconfig_path {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .map_err(|e| ClusterError::Config(format!("{}: {}", path, e)))?;
                let config =
                    Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                        .await
                        .map_err(|e| ClusterError::Config(e.to_string()))?;
                Client::try_from(config).map_err(|e| ClusterError::Config(e.to_string()))?
            }
            None => Client::try_default()
                .await
                .map_err(|e| ClusterError::Config(e.to_string()))?,
        };
        info!("Connected to Kubernetes cluster");
        Ok(Self::new(client))
    }

    /// Builds a client from a stored kube config document and optional context.
    pub async fn from_kube_config(
        kube_config: &str,
        context: Option<&str>,
    ) -> Result<Self, ClusterError> {
        let kubeconfig =
            Kubeconfig::from_yaml(kube_config).map_err(|e| ClusterError::Config(e.to_string()))?;
        let options = KubeConfigOptions {
            context: context.filter(|c| !c.is_empty()).map(String::from),
            ..Default::default()
        };
        let config = Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .map_err(|e| ClusterError::Config(e.to_string()))?;
        let client = Client::try_from(config).map_err(|e| ClusterError::Config(e.to_string()))?;
        Ok(Self::new(client))
    }

    async fn observe<K>(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ObservedObject>, ClusterError>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + fmt::Debug,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let found = with_retries(|| api.get_opt(name), &self.retry)
            .await
            .map_err(ClusterError::from_kube)?;

        Ok(found.map(|obj| ObservedObject {
            namespace: namespace.to_string(),
            name: obj.name_any(),
            uid: obj.uid().unwrap_or_default(),
        }))
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ObservedObject>, ClusterError> {
        match kind {
            ResourceKind::GitOpsDeployment => self.observe::<GitOpsDeployment>(namespace, name).await,
            ResourceKind::ManagedEnvironment => {
                self.observe::<GitOpsDeploymentManagedEnvironment>(namespace, name)
                    .await
            }
            ResourceKind::RepositoryCredential => {
                self.observe::<GitOpsDeploymentRepositoryCredential>(namespace, name)
                    .await
            }
            ResourceKind::SyncRun => {
                self.observe::<GitOpsDeploymentSyncRun>(namespace, name)
                    .await
            }
            ResourceKind::Operation => self.observe::<OperationResource>(namespace, name).await,
        }
    }

    async fn create_operation(
        &self,
        namespace: &str,
        name: &str,
        operation_id: &str,
    ) -> Result<(), ClusterError> {
        let api: Api<OperationResource> = Api::namespaced(self.client.clone(), namespace);
        let resource = OperationResource::new(
            name,
            OperationSpec {
                operation_id: operation_id.to_string(),
            },
        );

        let pp = PostParams::default();
        match with_retries(|| api.create(&pp, &resource), &self.retry).await {
            Ok(_) => {
                debug!("Created Operation {}/{}", namespace, name);
                Ok(())
            }
            Err(e) if is_already_exists(&e) => {
                debug!("Operation {}/{} already exists", namespace, name);
                Ok(())
            }
            Err(e) => Err(ClusterError::from_kube(e)),
        }
    }
}

/// Produces clients for GitOps engine instances.
///
/// Clients built from kube configs are cached per credentials id.
pub struct KubeClientFactory {
    local: Arc<dyn ClusterClient>,
    retry: RetryConfig,
    remote: Mutex<HashMap<String, Arc<dyn ClusterClient>>>,
}

impl KubeClientFactory {
    pub fn new(local: Arc<dyn ClusterClient>) -> Self {
        Self {
            local,
            retry: RetryConfig::default(),
            remote: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, credentials_id: &str) -> Option<Arc<dyn ClusterClient>> {
        self.remote
            .lock()
            .ok()
            .and_then(|cache| cache.get(credentials_id).cloned())
    }
}

#[async_trait]
impl ClusterClientFactory for KubeClientFactory {
    async fn client_for_engine_instance(
        &self,
        instance: &GitopsEngineInstance,
        credentials: &ClusterCredentials,
    ) -> Result<Arc<dyn ClusterClient>, ClusterError> {
        if credentials.is_in_cluster() {
            return Ok(self.local.clone());
        }
        if let Some(client) = self.cached(&credentials.clustercredentials_cred_id) {
            return Ok(client);
        }

        debug!(
            "Building cluster client for engine instance {} from credentials {}",
            instance.gitopsengineinstance_id, credentials.clustercredentials_cred_id
        );
        let kube_config = credentials.kube_config.as_deref().unwrap_or_default();
        let client: Arc<dyn ClusterClient> = Arc::new(
            KubeClusterClient::from_kube_config(
                kube_config,
                credentials.kube_config_context.as_deref(),
            )
            .await?
            .with_retry_config(self.retry.clone()),
        );

        if let Ok(mut cache) = self.remote.lock() {
            cache.insert(
                credentials.clustercredentials_cred_id.clone(),
                client.clone(),
            );
        }
        Ok(client)
    }
}
