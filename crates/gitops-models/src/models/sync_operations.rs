/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Sync operations: requested sync actions against an application.

use crate::schema::syncoperation;
use crate::validation::{self, Validate, ValidationError};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A requested sync action. `application_id` may be cleared while the row
/// itself is kept for audit.
#[derive(
    Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize,
)]
#[diesel(table_name = syncoperation)]
#[diesel(primary_key(syncoperation_id))]
#[diesel(treat_none_as_null = true)]
pub struct SyncOperation {
    pub syncoperation_id: String,
    pub application_id: Option<String>,
    pub deployment_name: String,
    pub deployment_namespace: String,
    pub revision: String,
    pub desired_state: String,
    pub created_on: DateTime<Utc>,
}

impl SyncOperation {
    pub fn new(
        syncoperation_id: impl Into<String>,
        application_id: Option<String>,
        deployment_name: impl Into<String>,
        deployment_namespace: impl Into<String>,
        revision: impl Into<String>,
        desired_state: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let op = Self {
            syncoperation_id: syncoperation_id.into(),
            application_id,
            deployment_name: deployment_name.into(),
            deployment_namespace: deployment_namespace.into(),
            revision: revision.into(),
            desired_state: desired_state.into(),
            created_on: Utc::now(),
        };
        validation::validate(&op)?;
        Ok(op)
    }

    /// The referenced application, treating an empty string as no reference.
    pub fn application(&self) -> Option<&str> {
        self.application_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }
}

impl Validate for SyncOperation {
    const ENTITY: &'static str = validation::SYNC_OPERATION;
    const REQUIRED: &'static [&'static str] = &["syncoperation_id", "deployment_name"];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "syncoperation_id" => Some(&self.syncoperation_id),
            "application_id" => self.application_id.as_deref(),
            "deployment_name" => Some(&self.deployment_name),
            "deployment_namespace" => Some(&self.deployment_namespace),
            "revision" => Some(&self.revision),
            "desired_state" => Some(&self.desired_state),
            _ => None,
        }
    }
}
