/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Field validation for shadow-database rows.
//!
//! Every bounded string column is listed in [`FIELD_LENGTH_TABLE`], keyed by
//! entity and field name. Row types expose their bounded and required fields
//! through [`Validate`], and [`validate`] checks them against the table before
//! any write reaches the database.

use thiserror::Error;

/// A validation failure for a single field of a row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{entity}.{field} value exceeds maximum size: max: {max}, actual: {actual}")]
    MaxLength {
        entity: &'static str,
        field: &'static str,
        max: usize,
        actual: usize,
    },
    #[error("{entity}.{field} field should not be empty")]
    EmptyField {
        entity: &'static str,
        field: &'static str,
    },
}

impl ValidationError {
    pub fn is_max_length(&self) -> bool {
        matches!(self, ValidationError::MaxLength { .. })
    }

    pub fn is_empty_field(&self) -> bool {
        matches!(self, ValidationError::EmptyField { .. })
    }
}

/// Maximum length, in characters, of one bounded column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLimit {
    pub field: &'static str,
    pub max: usize,
}

const fn limit(field: &'static str, max: usize) -> FieldLimit {
    FieldLimit { field, max }
}

pub const ID_LENGTH: usize = 48;
pub const NAME_LENGTH: usize = 256;
pub const NAMESPACE_LENGTH: usize = 96;
pub const UID_LENGTH: usize = 48;
pub const TYPE_TAG_LENGTH: usize = 64;

pub const CLUSTER_USER: &str = "ClusterUser";
pub const CLUSTER_CREDENTIALS: &str = "ClusterCredentials";
pub const GITOPS_ENGINE_CLUSTER: &str = "GitopsEngineCluster";
pub const GITOPS_ENGINE_INSTANCE: &str = "GitopsEngineInstance";
pub const MANAGED_ENVIRONMENT: &str = "ManagedEnvironment";
pub const CLUSTER_ACCESS: &str = "ClusterAccess";
pub const APPLICATION: &str = "Application";
pub const APPLICATION_STATE: &str = "ApplicationState";
pub const APPLICATION_OWNER: &str = "ApplicationOwner";
pub const DEPLOYMENT_TO_APPLICATION_MAPPING: &str = "DeploymentToApplicationMapping";
pub const API_CR_TO_DATABASE_MAPPING: &str = "APICRToDatabaseMapping";
pub const KUBERNETES_TO_DB_RESOURCE_MAPPING: &str = "KubernetesToDBResourceMapping";
pub const SYNC_OPERATION: &str = "SyncOperation";
pub const REPOSITORY_CREDENTIALS: &str = "RepositoryCredentials";
pub const OPERATION: &str = "Operation";

/// Bounded string columns per entity. Mirrors the `VARCHAR(n)` widths of the migrations.
pub static FIELD_LENGTH_TABLE: &[(&str, &[FieldLimit])] = &[
    (
        CLUSTER_USER,
        &[
            limit("clusteruser_id", ID_LENGTH),
            limit("user_name", NAME_LENGTH),
            limit("display_name", NAME_LENGTH),
        ],
    ),
    (
        CLUSTER_CREDENTIALS,
        &[
            limit("clustercredentials_cred_id", ID_LENGTH),
            limit("host", 512),
            limit("kube_config_context", 64),
            limit("serviceaccount_ns", 128),
        ],
    ),
    (
        GITOPS_ENGINE_CLUSTER,
        &[
            limit("gitopsenginecluster_id", ID_LENGTH),
            limit("clustercredentials_id", ID_LENGTH),
        ],
    ),
    (
        GITOPS_ENGINE_INSTANCE,
        &[
            limit("gitopsengineinstance_id", ID_LENGTH),
            limit("namespace_name", NAMESPACE_LENGTH),
            limit("namespace_uid", UID_LENGTH),
            limit("enginecluster_id", ID_LENGTH),
        ],
    ),
    (
        MANAGED_ENVIRONMENT,
        &[
            limit("managedenvironment_id", ID_LENGTH),
            limit("name", NAME_LENGTH),
            limit("clustercredentials_id", ID_LENGTH),
        ],
    ),
    (
        CLUSTER_ACCESS,
        &[
            limit("clusteraccess_user_id", ID_LENGTH),
            limit("clusteraccess_managed_environment_id", ID_LENGTH),
            limit("clusteraccess_gitops_engine_instance_id", ID_LENGTH),
        ],
    ),
    (
        APPLICATION,
        &[
            limit("application_id", ID_LENGTH),
            limit("name", NAME_LENGTH),
            limit("engine_instance_inst_id", ID_LENGTH),
            limit("managed_environment_id", ID_LENGTH),
        ],
    ),
    (
        APPLICATION_STATE,
        &[
            limit("applicationstate_application_id", ID_LENGTH),
            limit("health", 30),
            limit("message", 1024),
            limit("sync_status", 30),
            limit("revision", 256),
        ],
    ),
    (
        APPLICATION_OWNER,
        &[
            limit("application_owner_application_id", ID_LENGTH),
            limit("application_owner_user_id", ID_LENGTH),
        ],
    ),
    (
        DEPLOYMENT_TO_APPLICATION_MAPPING,
        &[
            limit("deploymenttoapplicationmapping_uid_id", UID_LENGTH),
            limit("name", NAME_LENGTH),
            limit("namespace", NAMESPACE_LENGTH),
            limit("namespace_uid", UID_LENGTH),
            limit("application_id", ID_LENGTH),
        ],
    ),
    (
        API_CR_TO_DATABASE_MAPPING,
        &[
            limit("api_resource_type", TYPE_TAG_LENGTH),
            limit("api_resource_uid", UID_LENGTH),
            limit("api_resource_name", NAME_LENGTH),
            limit("api_resource_namespace", NAMESPACE_LENGTH),
            limit("namespace_uid", UID_LENGTH),
            limit("db_relation_type", TYPE_TAG_LENGTH),
            limit("db_relation_key", ID_LENGTH),
        ],
    ),
    (
        KUBERNETES_TO_DB_RESOURCE_MAPPING,
        &[
            limit("kubernetes_resource_type", TYPE_TAG_LENGTH),
            limit("kubernetes_resource_uid", UID_LENGTH),
            limit("db_relation_type", TYPE_TAG_LENGTH),
            limit("db_relation_key", ID_LENGTH),
        ],
    ),
    (
        SYNC_OPERATION,
        &[
            limit("syncoperation_id", ID_LENGTH),
            limit("application_id", ID_LENGTH),
            limit("deployment_name", NAME_LENGTH),
            limit("deployment_namespace", NAMESPACE_LENGTH),
            limit("revision", 256),
            limit("desired_state", 16),
        ],
    ),
    (
        REPOSITORY_CREDENTIALS,
        &[
            limit("repositorycredentials_id", ID_LENGTH),
            limit("repo_cred_user_id", ID_LENGTH),
            limit("repo_cred_url", 512),
            limit("repo_cred_user", NAME_LENGTH),
            limit("repo_cred_secret", ID_LENGTH),
            limit("repo_cred_engine_id", ID_LENGTH),
        ],
    ),
    (
        OPERATION,
        &[
            limit("operation_id", ID_LENGTH),
            limit("instance_id", ID_LENGTH),
            limit("resource_id", ID_LENGTH),
            limit("operation_owner_user_id", ID_LENGTH),
            limit("resource_type", TYPE_TAG_LENGTH),
            limit("human_readable_state", 1024),
        ],
    ),
];

/// Returns the bounded columns of `entity`, or an empty slice for unknown entities.
pub fn limits_for(entity: &str) -> &'static [FieldLimit] {
    FIELD_LENGTH_TABLE
        .iter()
        .find(|(name, _)| *name == entity)
        .map(|(_, limits)| *limits)
        .unwrap_or(&[])
}

/// Looks up the maximum length of a single column.
pub fn max_length(entity: &str, field: &str) -> Option<usize> {
    limits_for(entity)
        .iter()
        .find(|l| l.field == field)
        .map(|l| l.max)
}

/// Implemented by every row type that is written to the database.
pub trait Validate {
    /// Entity name as used in [`FIELD_LENGTH_TABLE`].
    const ENTITY: &'static str;

    /// Fields that must be non-empty.
    const REQUIRED: &'static [&'static str] = &[];

    /// The current value of a string column, `None` when the column is unset or unknown.
    fn field(&self, name: &str) -> Option<&str>;
}

/// Checks required fields and then every bounded column of `row`.
pub fn validate<T: Validate>(row: &T) -> Result<(), ValidationError> {
    for &field in T::REQUIRED {
        let empty = row.field(field).map_or(true, |v| v.trim().is_empty());
        if empty {
            return Err(ValidationError::EmptyField {
                entity: T::ENTITY,
                field,
            });
        }
    }
    validate_field_lengths(row)
}

/// Checks only the bounded columns of `row`.
pub fn validate_field_lengths<T: Validate>(row: &T) -> Result<(), ValidationError> {
    for limit in limits_for(T::ENTITY) {
        if let Some(value) = row.field(limit.field) {
            let actual = value.chars().count();
            if actual > limit.max {
                return Err(ValidationError::MaxLength {
                    entity: T::ENTITY,
                    field: limit.field,
                    max: limit.max,
                    actual,
                });
            }
        }
    }
    Ok(())
}

/// Generates a new opaque primary key.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
