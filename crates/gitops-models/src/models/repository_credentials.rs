/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Repository credentials owned by a cluster user.

use crate::schema::repositorycredentials;
use crate::validation::{self, Validate, ValidationError};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Credentials for a source repository, delivered to one GitOps engine
/// instance (`repo_cred_engine_id`).
#[derive(
    Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset, Serialize, Deserialize,
)]
#[diesel(table_name = repositorycredentials)]
#[diesel(primary_key(repositorycredentials_id))]
#[diesel(treat_none_as_null = true)]
pub struct RepositoryCredentials {
    pub repositorycredentials_id: String,
    pub repo_cred_user_id: String,
    pub repo_cred_url: String,
    pub repo_cred_user: Option<String>,
    pub repo_cred_pass: Option<String>,
    pub repo_cred_ssh: Option<String>,
    pub repo_cred_secret: String,
    pub repo_cred_engine_id: String,
    pub created_on: DateTime<Utc>,
}

impl RepositoryCredentials {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        url: impl Into<String>,
        secret: impl Into<String>,
        engine_instance_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let creds = Self {
            repositorycredentials_id: id.into(),
            repo_cred_user_id: user_id.into(),
            repo_cred_url: url.into(),
            repo_cred_user: None,
            repo_cred_pass: None,
            repo_cred_ssh: None,
            repo_cred_secret: secret.into(),
            repo_cred_engine_id: engine_instance_id.into(),
            created_on: Utc::now(),
        };
        validation::validate(&creds)?;
        Ok(creds)
    }
}

impl Validate for RepositoryCredentials {
    const ENTITY: &'static str = validation::REPOSITORY_CREDENTIALS;
    const REQUIRED: &'static [&'static str] = &[
        "repositorycredentials_id",
        "repo_cred_user_id",
        "repo_cred_url",
        "repo_cred_secret",
        "repo_cred_engine_id",
    ];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "repositorycredentials_id" => Some(&self.repositorycredentials_id),
            "repo_cred_user_id" => Some(&self.repo_cred_user_id),
            "repo_cred_url" => Some(&self.repo_cred_url),
            "repo_cred_user" => self.repo_cred_user.as_deref(),
            "repo_cred_secret" => Some(&self.repo_cred_secret),
            "repo_cred_engine_id" => Some(&self.repo_cred_engine_id),
            _ => None,
        }
    }
}
