/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Managed environments and the cluster access grants that reference them.

use crate::schema::{clusteraccess, managedenvironment};
use crate::validation::{self, Validate, ValidationError};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A user-visible deployment target backed by cluster credentials.
#[derive(
    Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize,
)]
#[diesel(table_name = managedenvironment)]
#[diesel(primary_key(managedenvironment_id))]
pub struct ManagedEnvironment {
    pub managedenvironment_id: String,
    pub name: String,
    pub clustercredentials_id: String,
    pub created_on: DateTime<Utc>,
}

impl ManagedEnvironment {
    pub fn new(
        managedenvironment_id: impl Into<String>,
        name: impl Into<String>,
        clustercredentials_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let env = Self {
            managedenvironment_id: managedenvironment_id.into(),
            name: name.into(),
            clustercredentials_id: clustercredentials_id.into(),
            created_on: Utc::now(),
        };
        validation::validate(&env)?;
        Ok(env)
    }
}

impl Validate for ManagedEnvironment {
    const ENTITY: &'static str = validation::MANAGED_ENVIRONMENT;
    const REQUIRED: &'static [&'static str] =
        &["managedenvironment_id", "name", "clustercredentials_id"];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "managedenvironment_id" => Some(&self.managedenvironment_id),
            "name" => Some(&self.name),
            "clustercredentials_id" => Some(&self.clustercredentials_id),
            _ => None,
        }
    }
}

/// Grants a cluster user access to a managed environment through a GitOps
/// engine instance. Its presence marks the user as in use.
#[derive(
    Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize,
)]
#[diesel(table_name = clusteraccess)]
#[diesel(primary_key(
    clusteraccess_user_id,
    clusteraccess_managed_environment_id,
    clusteraccess_gitops_engine_instance_id
))]
pub struct ClusterAccess {
    pub clusteraccess_user_id: String,
    pub clusteraccess_managed_environment_id: String,
    pub clusteraccess_gitops_engine_instance_id: String,
    pub created_on: DateTime<Utc>,
}

impl ClusterAccess {
    pub fn new(
        user_id: impl Into<String>,
        managed_environment_id: impl Into<String>,
        gitops_engine_instance_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let access = Self {
            clusteraccess_user_id: user_id.into(),
            clusteraccess_managed_environment_id: managed_environment_id.into(),
            clusteraccess_gitops_engine_instance_id: gitops_engine_instance_id.into(),
            created_on: Utc::now(),
        };
        validation::validate(&access)?;
        Ok(access)
    }
}

impl Validate for ClusterAccess {
    const ENTITY: &'static str = validation::CLUSTER_ACCESS;
    const REQUIRED: &'static [&'static str] = &[
        "clusteraccess_user_id",
        "clusteraccess_managed_environment_id",
        "clusteraccess_gitops_engine_instance_id",
    ];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "clusteraccess_user_id" => Some(&self.clusteraccess_user_id),
            "clusteraccess_managed_environment_id" => {
                Some(&self.clusteraccess_managed_environment_id)
            }
            "clusteraccess_gitops_engine_instance_id" => {
                Some(&self.clusteraccess_gitops_engine_instance_id)
            }
            _ => None,
        }
    }
}
