/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Operations
//!
//! An operation is a row plus an `Operation` custom resource that together
//! notify the cluster-side agent that a database entity changed.
//!
//! ## State machine
//!
//! ```text
//! Waiting ──► In_Progress ──► Completed
//!    │             │
//!    │             └────────► Failed
//!    └──► Completed | Failed
//! ```
//!
//! `Completed` and `Failed` are terminal. Transitions are driven by the agent;
//! this crate only validates them through [`OperationState::can_transition_to`].

use crate::schema::operation;
use crate::validation::{self, Validate, ValidationError};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix of the name given to every `Operation` custom resource.
pub const OPERATION_CR_NAME_PREFIX: &str = "operation-";

/// Name of the custom resource belonging to `operation_id`.
pub fn operation_cr_name(operation_id: &str) -> String {
    format!("{}{}", OPERATION_CR_NAME_PREFIX, operation_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DbEnum, Serialize, Deserialize)]
#[ExistingTypePath = "crate::schema::sql_types::OperationState"]
#[DbValueStyle = "verbatim"]
pub enum OperationState {
    Waiting,
    #[db_rename = "In_Progress"]
    #[serde(rename = "In_Progress")]
    InProgress,
    Completed,
    Failed,
}

impl OperationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationState::Waiting => "Waiting",
            OperationState::InProgress => "In_Progress",
            OperationState::Completed => "Completed",
            OperationState::Failed => "Failed",
        }
    }

    /// `Completed` and `Failed` are final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationState::Completed | OperationState::Failed)
    }

    pub fn can_transition_to(&self, next: OperationState) -> bool {
        match (self, next) {
            (OperationState::Waiting, OperationState::InProgress)
            | (OperationState::Waiting, OperationState::Completed)
            | (OperationState::Waiting, OperationState::Failed)
            | (OperationState::InProgress, OperationState::Completed)
            | (OperationState::InProgress, OperationState::Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The database entity an operation refers to. Stored as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationResourceType {
    Application,
    ManagedEnvironment,
    RepositoryCredentials,
    SyncOperation,
    GitopsEngineInstance,
}

impl OperationResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationResourceType::Application => "Application",
            OperationResourceType::ManagedEnvironment => "ManagedEnvironment",
            OperationResourceType::RepositoryCredentials => "RepositoryCredentials",
            OperationResourceType::SyncOperation => "SyncOperation",
            OperationResourceType::GitopsEngineInstance => "GitopsEngineInstance",
        }
    }
}

impl fmt::Display for OperationResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Application" => Ok(OperationResourceType::Application),
            "ManagedEnvironment" => Ok(OperationResourceType::ManagedEnvironment),
            "RepositoryCredentials" => Ok(OperationResourceType::RepositoryCredentials),
            "SyncOperation" => Ok(OperationResourceType::SyncOperation),
            "GitopsEngineInstance" => Ok(OperationResourceType::GitopsEngineInstance),
            other => Err(format!("unknown operation resource type: {}", other)),
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize,
)]
#[diesel(table_name = operation)]
#[diesel(primary_key(operation_id))]
#[diesel(treat_none_as_null = true)]
pub struct Operation {
    pub operation_id: String,
    /// Engine instance the operation is addressed to.
    pub instance_id: String,
    pub resource_id: String,
    pub operation_owner_user_id: String,
    pub resource_type: String,
    pub created_on: DateTime<Utc>,
    pub last_state_update: DateTime<Utc>,
    pub state: OperationState,
    pub human_readable_state: Option<String>,
    /// Optional retention hint in seconds.
    pub gc_expiration_time: Option<i32>,
}

impl Operation {
    /// Creates a new operation in the `Waiting` state with a generated id.
    pub fn new(
        instance_id: impl Into<String>,
        resource_id: impl Into<String>,
        resource_type: OperationResourceType,
        owner_user_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let now = Utc::now();
        let op = Self {
            operation_id: validation::generate_id(),
            instance_id: instance_id.into(),
            resource_id: resource_id.into(),
            operation_owner_user_id: owner_user_id.into(),
            resource_type: resource_type.as_str().to_string(),
            created_on: now,
            last_state_update: now,
            state: OperationState::Waiting,
            human_readable_state: None,
            gc_expiration_time: None,
        };
        validation::validate(&op)?;
        Ok(op)
    }

    pub fn cr_name(&self) -> String {
        operation_cr_name(&self.operation_id)
    }

    pub fn parsed_resource_type(&self) -> Result<OperationResourceType, String> {
        self.resource_type.parse()
    }
}

impl Validate for Operation {
    const ENTITY: &'static str = validation::OPERATION;
    const REQUIRED: &'static [&'static str] = &[
        "operation_id",
        "instance_id",
        "resource_id",
        "operation_owner_user_id",
        "resource_type",
    ];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "operation_id" => Some(&self.operation_id),
            "instance_id" => Some(&self.instance_id),
            "resource_id" => Some(&self.resource_id),
            "operation_owner_user_id" => Some(&self.operation_owner_user_id),
            "resource_type" => Some(&self.resource_type),
            "human_readable_state" => self.human_readable_state.as_deref(),
            _ => None,
        }
    }
}
