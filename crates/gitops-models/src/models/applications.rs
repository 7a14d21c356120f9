/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Applications together with their state snapshot and owner rows.

use crate::schema::{application, applicationowner, applicationstate};
use crate::validation::{self, Validate, ValidationError};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A deployable unit targeting a managed environment through a GitOps engine instance.
#[derive(
    Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize,
)]
#[diesel(table_name = application)]
#[diesel(primary_key(application_id))]
#[diesel(treat_none_as_null = true)]
pub struct Application {
    pub application_id: String,
    pub name: String,
    pub spec_field: String,
    pub engine_instance_inst_id: String,
    pub managed_environment_id: Option<String>,
    pub created_on: DateTime<Utc>,
}

impl Application {
    pub fn new(
        application_id: impl Into<String>,
        name: impl Into<String>,
        spec_field: impl Into<String>,
        engine_instance_inst_id: impl Into<String>,
        managed_environment_id: Option<String>,
    ) -> Result<Self, ValidationError> {
        let app = Self {
            application_id: application_id.into(),
            name: name.into(),
            spec_field: spec_field.into(),
            engine_instance_inst_id: engine_instance_inst_id.into(),
            managed_environment_id,
            created_on: Utc::now(),
        };
        validation::validate(&app)?;
        Ok(app)
    }
}

impl Validate for Application {
    const ENTITY: &'static str = validation::APPLICATION;
    const REQUIRED: &'static [&'static str] =
        &["application_id", "name", "engine_instance_inst_id"];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "application_id" => Some(&self.application_id),
            "name" => Some(&self.name),
            "engine_instance_inst_id" => Some(&self.engine_instance_inst_id),
            "managed_environment_id" => self.managed_environment_id.as_deref(),
            _ => None,
        }
    }
}

/// Latest sync and health snapshot of an application. Shares the application's lifecycle.
#[derive(
    Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize,
)]
#[diesel(table_name = applicationstate)]
#[diesel(primary_key(applicationstate_application_id))]
#[diesel(treat_none_as_null = true)]
pub struct ApplicationState {
    pub applicationstate_application_id: String,
    pub health: String,
    pub message: Option<String>,
    pub sync_status: String,
    pub revision: Option<String>,
    pub reconciled_state: Option<String>,
}

impl ApplicationState {
    pub fn new(
        application_id: impl Into<String>,
        health: impl Into<String>,
        sync_status: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let state = Self {
            applicationstate_application_id: application_id.into(),
            health: health.into(),
            message: None,
            sync_status: sync_status.into(),
            revision: None,
            reconciled_state: None,
        };
        validation::validate(&state)?;
        Ok(state)
    }
}

impl Validate for ApplicationState {
    const ENTITY: &'static str = validation::APPLICATION_STATE;
    const REQUIRED: &'static [&'static str] =
        &["applicationstate_application_id", "health", "sync_status"];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "applicationstate_application_id" => Some(&self.applicationstate_application_id),
            "health" => Some(&self.health),
            "message" => self.message.as_deref(),
            "sync_status" => Some(&self.sync_status),
            "revision" => self.revision.as_deref(),
            _ => None,
        }
    }
}

/// Records that a cluster user owns an application.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = applicationowner)]
#[diesel(primary_key(application_owner_application_id, application_owner_user_id))]
pub struct ApplicationOwner {
    pub application_owner_application_id: String,
    pub application_owner_user_id: String,
}

impl ApplicationOwner {
    pub fn new(
        application_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let owner = Self {
            application_owner_application_id: application_id.into(),
            application_owner_user_id: user_id.into(),
        };
        validation::validate(&owner)?;
        Ok(owner)
    }
}

impl Validate for ApplicationOwner {
    const ENTITY: &'static str = validation::APPLICATION_OWNER;
    const REQUIRED: &'static [&'static str] = &[
        "application_owner_application_id",
        "application_owner_user_id",
    ];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "application_owner_application_id" => Some(&self.application_owner_application_id),
            "application_owner_user_id" => Some(&self.application_owner_user_id),
            _ => None,
        }
    }
}
