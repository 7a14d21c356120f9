/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Cluster users: the identities on whose behalf rows are owned.

use crate::schema::clusteruser;
use crate::validation::{self, Validate, ValidationError};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Reserved user that owns rows created by the service itself. It is never
/// garbage collected; its id and user name are both this value.
pub const SPECIAL_CLUSTER_USER_NAME: &str = "cluster-agent-application-sync-user";

/// A cluster user record.
#[derive(
    Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize,
)]
#[diesel(table_name = clusteruser)]
#[diesel(primary_key(clusteruser_id))]
#[diesel(treat_none_as_null = true)]
pub struct ClusterUser {
    pub clusteruser_id: String,
    pub user_name: String,
    pub display_name: Option<String>,
    pub created_on: DateTime<Utc>,
}

impl ClusterUser {
    /// Creates a new cluster user with a validated id and user name.
    pub fn new(
        clusteruser_id: impl Into<String>,
        user_name: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let user = Self {
            clusteruser_id: clusteruser_id.into(),
            user_name: user_name.into(),
            display_name: None,
            created_on: Utc::now(),
        };
        validation::validate(&user)?;
        Ok(user)
    }

    /// The reserved service user.
    pub fn special() -> Self {
        Self {
            clusteruser_id: SPECIAL_CLUSTER_USER_NAME.to_string(),
            user_name: SPECIAL_CLUSTER_USER_NAME.to_string(),
            display_name: None,
            created_on: Utc::now(),
        }
    }

    pub fn is_special(&self) -> bool {
        self.clusteruser_id == SPECIAL_CLUSTER_USER_NAME
            || self.user_name == SPECIAL_CLUSTER_USER_NAME
    }
}

impl Validate for ClusterUser {
    const ENTITY: &'static str = validation::CLUSTER_USER;
    const REQUIRED: &'static [&'static str] = &["clusteruser_id", "user_name"];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "clusteruser_id" => Some(&self.clusteruser_id),
            "user_name" => Some(&self.user_name),
            "display_name" => self.display_name.as_deref(),
            _ => None,
        }
    }
}
