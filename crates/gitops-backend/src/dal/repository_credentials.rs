/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data access for repository credentials.

use crate::dal::{DbError, DAL};
use diesel::prelude::*;
use gitops_models::models::repository_credentials::RepositoryCredentials;
use gitops_models::validation;

pub struct RepositoryCredentialsDAL<'a> {
    pub(crate) dal: &'a DAL,
}

impl<'a> RepositoryCredentialsDAL<'a> {
    pub fn create(&self, creds: &RepositoryCredentials) -> Result<RepositoryCredentials, DbError> {
        use gitops_models::schema::repositorycredentials::dsl::*;

        validation::validate(creds)?;
        let conn = &mut self.dal.conn()?;

        Ok(diesel::insert_into(repositorycredentials)
            .values(creds)
            .returning(RepositoryCredentials::as_returning())
            .get_result(conn)?)
    }

    pub fn get(&self, id: &str) -> Result<RepositoryCredentials, DbError> {
        use gitops_models::schema::repositorycredentials::dsl::*;

        let conn = &mut self.dal.conn()?;

        repositorycredentials
            .find(id)
            .select(RepositoryCredentials::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DbError::not_found("RepositoryCredentials", id))
    }

    /// Returns the credentials only if they belong to `owner_user_id`.
    pub fn checked_get(
        &self,
        id: &str,
        owner_user_id: &str,
    ) -> Result<RepositoryCredentials, DbError> {
        use gitops_models::schema::repositorycredentials::dsl::*;

        let conn = &mut self.dal.conn()?;

        repositorycredentials
            .find(id)
            .filter(repo_cred_user_id.eq(owner_user_id))
            .select(RepositoryCredentials::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DbError::not_found("RepositoryCredentials", id))
    }

    pub fn list_all(&self) -> Result<Vec<RepositoryCredentials>, DbError> {
        use gitops_models::schema::repositorycredentials::dsl::*;

        self.dal.ensure_unsafe("list_all_repository_credentials")?;
        let conn = &mut self.dal.conn()?;

        Ok(repositorycredentials
            .select(RepositoryCredentials::as_select())
            .order(created_on.asc())
            .load(conn)?)
    }

    pub fn count_by_user(&self, user_id: &str) -> Result<i64, DbError> {
        use gitops_models::schema::repositorycredentials::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(repositorycredentials
            .filter(repo_cred_user_id.eq(user_id))
            .count()
            .get_result(conn)?)
    }

    pub fn delete(&self, id: &str) -> Result<usize, DbError> {
        use gitops_models::schema::repositorycredentials::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(diesel::delete(repositorycredentials.find(id)).execute(conn)?)
    }
}
