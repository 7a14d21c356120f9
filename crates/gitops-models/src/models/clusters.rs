/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Target cluster description: credentials, GitOps engine clusters and the
//! engine instances running on them.

use crate::schema::{clustercredentials, gitopsenginecluster, gitopsengineinstance};
use crate::validation::{self, Validate, ValidationError};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Credentials for reaching a cluster.
///
/// Credentials without a kube config describe the cluster the service itself
/// runs on.
#[derive(
    Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize,
)]
#[diesel(table_name = clustercredentials)]
#[diesel(primary_key(clustercredentials_cred_id))]
#[diesel(treat_none_as_null = true)]
pub struct ClusterCredentials {
    pub clustercredentials_cred_id: String,
    pub host: Option<String>,
    pub kube_config: Option<String>,
    pub kube_config_context: Option<String>,
    pub serviceaccount_bearer_token: Option<String>,
    pub serviceaccount_ns: Option<String>,
    pub created_on: DateTime<Utc>,
}

impl ClusterCredentials {
    /// Credentials for the cluster the service runs on.
    pub fn in_cluster(id: impl Into<String>) -> Result<Self, ValidationError> {
        let creds = Self {
            clustercredentials_cred_id: id.into(),
            host: None,
            kube_config: None,
            kube_config_context: None,
            serviceaccount_bearer_token: None,
            serviceaccount_ns: None,
            created_on: Utc::now(),
        };
        validation::validate(&creds)?;
        Ok(creds)
    }

    /// Credentials backed by a kube config document and optional context.
    pub fn from_kube_config(
        id: impl Into<String>,
        host: impl Into<String>,
        kube_config: impl Into<String>,
        kube_config_context: Option<String>,
    ) -> Result<Self, ValidationError> {
        let creds = Self {
            clustercredentials_cred_id: id.into(),
            host: Some(host.into()),
            kube_config: Some(kube_config.into()),
            kube_config_context,
            serviceaccount_bearer_token: None,
            serviceaccount_ns: None,
            created_on: Utc::now(),
        };
        validation::validate(&creds)?;
        Ok(creds)
    }

    pub fn is_in_cluster(&self) -> bool {
        self.kube_config
            .as_deref()
            .map_or(true, |c| c.trim().is_empty())
    }
}

impl Validate for ClusterCredentials {
    const ENTITY: &'static str = validation::CLUSTER_CREDENTIALS;
    const REQUIRED: &'static [&'static str] = &["clustercredentials_cred_id"];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "clustercredentials_cred_id" => Some(&self.clustercredentials_cred_id),
            "host" => self.host.as_deref(),
            "kube_config_context" => self.kube_config_context.as_deref(),
            "serviceaccount_ns" => self.serviceaccount_ns.as_deref(),
            _ => None,
        }
    }
}

/// A cluster hosting one or more GitOps engine instances.
#[derive(
    Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize,
)]
#[diesel(table_name = gitopsenginecluster)]
#[diesel(primary_key(gitopsenginecluster_id))]
pub struct GitopsEngineCluster {
    pub gitopsenginecluster_id: String,
    pub clustercredentials_id: String,
}

impl GitopsEngineCluster {
    pub fn new(
        gitopsenginecluster_id: impl Into<String>,
        clustercredentials_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let cluster = Self {
            gitopsenginecluster_id: gitopsenginecluster_id.into(),
            clustercredentials_id: clustercredentials_id.into(),
        };
        validation::validate(&cluster)?;
        Ok(cluster)
    }
}

impl Validate for GitopsEngineCluster {
    const ENTITY: &'static str = validation::GITOPS_ENGINE_CLUSTER;
    const REQUIRED: &'static [&'static str] = &["gitopsenginecluster_id", "clustercredentials_id"];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "gitopsenginecluster_id" => Some(&self.gitopsenginecluster_id),
            "clustercredentials_id" => Some(&self.clustercredentials_id),
            _ => None,
        }
    }
}

/// A GitOps engine running in one namespace of an engine cluster. Operation
/// CRs addressed to the instance are created in `namespace_name`.
#[derive(
    Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize,
)]
#[diesel(table_name = gitopsengineinstance)]
#[diesel(primary_key(gitopsengineinstance_id))]
pub struct GitopsEngineInstance {
    pub gitopsengineinstance_id: String,
    pub namespace_name: String,
    pub namespace_uid: String,
    pub enginecluster_id: String,
}

impl GitopsEngineInstance {
    pub fn new(
        gitopsengineinstance_id: impl Into<String>,
        namespace_name: impl Into<String>,
        namespace_uid: impl Into<String>,
        enginecluster_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let instance = Self {
            gitopsengineinstance_id: gitopsengineinstance_id.into(),
            namespace_name: namespace_name.into(),
            namespace_uid: namespace_uid.into(),
            enginecluster_id: enginecluster_id.into(),
        };
        validation::validate(&instance)?;
        Ok(instance)
    }
}

impl Validate for GitopsEngineInstance {
    const ENTITY: &'static str = validation::GITOPS_ENGINE_INSTANCE;
    const REQUIRED: &'static [&'static str] = &[
        "gitopsengineinstance_id",
        "namespace_name",
        "namespace_uid",
        "enginecluster_id",
    ];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "gitopsengineinstance_id" => Some(&self.gitopsengineinstance_id),
            "namespace_name" => Some(&self.namespace_name),
            "namespace_uid" => Some(&self.namespace_uid),
            "enginecluster_id" => Some(&self.enginecluster_id),
            _ => None,
        }
    }
}
