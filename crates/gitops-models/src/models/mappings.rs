/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Mapping rows correlating cluster objects with database rows.
//!
//! The mapping tables carry no foreign keys. A DTAM or ACTDM row is the
//! liveness oracle for the row it points at: the row stays live only while a
//! cluster object with the same namespace, name and UID exists.

use crate::schema::{
    apicrtodatabasemapping, deploymenttoapplicationmapping, kubernetestodbresourcemapping,
};
use crate::validation::{self, Validate, ValidationError};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Links one `GitOpsDeployment` CR (by UID) to one application row.
#[derive(
    Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize,
)]
#[diesel(table_name = deploymenttoapplicationmapping)]
#[diesel(primary_key(deploymenttoapplicationmapping_uid_id))]
pub struct DeploymentToApplicationMapping {
    pub deploymenttoapplicationmapping_uid_id: String,
    pub name: String,
    pub namespace: String,
    pub namespace_uid: String,
    pub application_id: String,
}

impl DeploymentToApplicationMapping {
    pub fn new(
        deployment_uid: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
        namespace_uid: impl Into<String>,
        application_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let mapping = Self {
            deploymenttoapplicationmapping_uid_id: deployment_uid.into(),
            name: name.into(),
            namespace: namespace.into(),
            namespace_uid: namespace_uid.into(),
            application_id: application_id.into(),
        };
        validation::validate(&mapping)?;
        Ok(mapping)
    }
}

impl Validate for DeploymentToApplicationMapping {
    const ENTITY: &'static str = validation::DEPLOYMENT_TO_APPLICATION_MAPPING;
    const REQUIRED: &'static [&'static str] = &[
        "deploymenttoapplicationmapping_uid_id",
        "name",
        "namespace",
        "application_id",
    ];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "deploymenttoapplicationmapping_uid_id" => {
                Some(&self.deploymenttoapplicationmapping_uid_id)
            }
            "name" => Some(&self.name),
            "namespace" => Some(&self.namespace),
            "namespace_uid" => Some(&self.namespace_uid),
            "application_id" => Some(&self.application_id),
            _ => None,
        }
    }
}

/// Error returned when parsing an unknown type tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} tag: {value}")]
pub struct UnknownTag {
    pub kind: &'static str,
    pub value: String,
}

/// The kind of API CR an ACTDM row points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiResourceType {
    ManagedEnvironment,
    RepositoryCredential,
    SyncRun,
}

impl ApiResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiResourceType::ManagedEnvironment => "GitOpsDeploymentManagedEnvironment",
            ApiResourceType::RepositoryCredential => "GitOpsDeploymentRepositoryCredential",
            ApiResourceType::SyncRun => "GitOpsDeploymentSyncRun",
        }
    }
}

impl fmt::Display for ApiResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiResourceType {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GitOpsDeploymentManagedEnvironment" => Ok(ApiResourceType::ManagedEnvironment),
            "GitOpsDeploymentRepositoryCredential" => Ok(ApiResourceType::RepositoryCredential),
            "GitOpsDeploymentSyncRun" => Ok(ApiResourceType::SyncRun),
            other => Err(UnknownTag {
                kind: "API resource type",
                value: other.to_string(),
            }),
        }
    }
}

/// The kind of database row an ACTDM row points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DbRelationType {
    ManagedEnvironment,
    RepositoryCredential,
    SyncOperation,
}

impl DbRelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbRelationType::ManagedEnvironment => "ManagedEnvironment",
            DbRelationType::RepositoryCredential => "RepositoryCredential",
            DbRelationType::SyncOperation => "SyncOperation",
        }
    }
}

impl fmt::Display for DbRelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbRelationType {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ManagedEnvironment" => Ok(DbRelationType::ManagedEnvironment),
            "RepositoryCredential" => Ok(DbRelationType::RepositoryCredential),
            "SyncOperation" => Ok(DbRelationType::SyncOperation),
            other => Err(UnknownTag {
                kind: "DB relation type",
                value: other.to_string(),
            }),
        }
    }
}

/// Generic link between one API CR and one database row.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Queryable,
    Selectable,
    Insertable,
    AsChangeset,
    Serialize,
    Deserialize,
)]
#[diesel(table_name = apicrtodatabasemapping)]
#[diesel(primary_key(api_resource_type, api_resource_uid, db_relation_type, db_relation_key))]
pub struct ApiCrToDatabaseMapping {
    pub api_resource_type: String,
    pub api_resource_uid: String,
    pub api_resource_name: String,
    pub api_resource_namespace: String,
    pub namespace_uid: String,
    pub db_relation_type: String,
    pub db_relation_key: String,
}

impl ApiCrToDatabaseMapping {
    pub fn new(
        api_resource_type: ApiResourceType,
        api_resource_uid: impl Into<String>,
        api_resource_name: impl Into<String>,
        api_resource_namespace: impl Into<String>,
        namespace_uid: impl Into<String>,
        db_relation_type: DbRelationType,
        db_relation_key: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let mapping = Self {
            api_resource_type: api_resource_type.as_str().to_string(),
            api_resource_uid: api_resource_uid.into(),
            api_resource_name: api_resource_name.into(),
            api_resource_namespace: api_resource_namespace.into(),
            namespace_uid: namespace_uid.into(),
            db_relation_type: db_relation_type.as_str().to_string(),
            db_relation_key: db_relation_key.into(),
        };
        validation::validate(&mapping)?;
        Ok(mapping)
    }

    pub fn resource_type(&self) -> Result<ApiResourceType, UnknownTag> {
        self.api_resource_type.parse()
    }

    pub fn relation_type(&self) -> Result<DbRelationType, UnknownTag> {
        self.db_relation_type.parse()
    }

    /// Compact description for log lines.
    pub fn short_string(&self) -> String {
        format!(
            "name: {}, namespace: {}, resource-type: {}, namespace-uid: {}, db-relation-key: {}, db-relation-type: {}",
            self.api_resource_name,
            self.api_resource_namespace,
            self.api_resource_type,
            self.namespace_uid,
            self.db_relation_key,
            self.db_relation_type
        )
    }
}

impl Validate for ApiCrToDatabaseMapping {
    const ENTITY: &'static str = validation::API_CR_TO_DATABASE_MAPPING;
    const REQUIRED: &'static [&'static str] = &[
        "api_resource_type",
        "api_resource_uid",
        "api_resource_name",
        "api_resource_namespace",
        "db_relation_type",
        "db_relation_key",
    ];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "api_resource_type" => Some(&self.api_resource_type),
            "api_resource_uid" => Some(&self.api_resource_uid),
            "api_resource_name" => Some(&self.api_resource_name),
            "api_resource_namespace" => Some(&self.api_resource_namespace),
            "namespace_uid" => Some(&self.namespace_uid),
            "db_relation_type" => Some(&self.db_relation_type),
            "db_relation_key" => Some(&self.db_relation_key),
            _ => None,
        }
    }
}

pub const K8S_RESOURCE_TYPE_NAMESPACE: &str = "Namespace";
pub const K8S_RELATION_MANAGED_ENVIRONMENT: &str = "ManagedEnvironment";
pub const K8S_RELATION_GITOPS_ENGINE_INSTANCE: &str = "GitopsEngineInstance";

/// Independent "in use" marker from a cluster object (such as a Namespace)
/// onto a database row.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = kubernetestodbresourcemapping)]
#[diesel(primary_key(
    kubernetes_resource_type,
    kubernetes_resource_uid,
    db_relation_type,
    db_relation_key
))]
pub struct KubernetesToDbResourceMapping {
    pub kubernetes_resource_type: String,
    pub kubernetes_resource_uid: String,
    pub db_relation_type: String,
    pub db_relation_key: String,
}

impl KubernetesToDbResourceMapping {
    pub fn new(
        kubernetes_resource_type: impl Into<String>,
        kubernetes_resource_uid: impl Into<String>,
        db_relation_type: impl Into<String>,
        db_relation_key: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let mapping = Self {
            kubernetes_resource_type: kubernetes_resource_type.into(),
            kubernetes_resource_uid: kubernetes_resource_uid.into(),
            db_relation_type: db_relation_type.into(),
            db_relation_key: db_relation_key.into(),
        };
        validation::validate(&mapping)?;
        Ok(mapping)
    }
}

impl Validate for KubernetesToDbResourceMapping {
    const ENTITY: &'static str = validation::KUBERNETES_TO_DB_RESOURCE_MAPPING;
    const REQUIRED: &'static [&'static str] = &[
        "kubernetes_resource_type",
        "kubernetes_resource_uid",
        "db_relation_type",
        "db_relation_key",
    ];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "kubernetes_resource_type" => Some(&self.kubernetes_resource_type),
            "kubernetes_resource_uid" => Some(&self.kubernetes_resource_uid),
            "db_relation_type" => Some(&self.db_relation_type),
            "db_relation_key" => Some(&self.db_relation_key),
            _ => None,
        }
    }
}
