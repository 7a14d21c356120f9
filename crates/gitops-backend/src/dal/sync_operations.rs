/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data access for sync operations.

use crate::dal::{DbError, DAL};
use diesel::prelude::*;
use gitops_models::models::sync_operations::SyncOperation;
use gitops_models::validation;

pub struct SyncOperationsDAL<'a> {
    pub(crate) dal: &'a DAL,
}

impl<'a> SyncOperationsDAL<'a> {
    pub fn create(&self, op: &SyncOperation) -> Result<SyncOperation, DbError> {
        use gitops_models::schema::syncoperation::dsl::*;

        validation::validate(op)?;
        let conn = &mut self.dal.conn()?;

        Ok(diesel::insert_into(syncoperation)
            .values(op)
            .returning(SyncOperation::as_returning())
            .get_result(conn)?)
    }

    pub fn get(&self, id: &str) -> Result<SyncOperation, DbError> {
        use gitops_models::schema::syncoperation::dsl::*;

        let conn = &mut self.dal.conn()?;

        syncoperation
            .find(id)
            .select(SyncOperation::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DbError::not_found("SyncOperation", id))
    }

    pub fn list_all(&self) -> Result<Vec<SyncOperation>, DbError> {
        use gitops_models::schema::syncoperation::dsl::*;

        self.dal.ensure_unsafe("list_all_sync_operations")?;
        let conn = &mut self.dal.conn()?;

        Ok(syncoperation
            .select(SyncOperation::as_select())
            .order(created_on.asc())
            .load(conn)?)
    }

    pub fn list_by_application(&self, app_id: &str) -> Result<Vec<SyncOperation>, DbError> {
        use gitops_models::schema::syncoperation::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(syncoperation
            .filter(application_id.eq(app_id))
            .select(SyncOperation::as_select())
            .load(conn)?)
    }

    /// Clears the application reference but keeps the row.
    pub fn clear_application(&self, id: &str) -> Result<usize, DbError> {
        use gitops_models::schema::syncoperation::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(diesel::update(syncoperation.find(id))
            .set(application_id.eq(""))
            .execute(conn)?)
    }

    pub fn delete(&self, id: &str) -> Result<usize, DbError> {
        use gitops_models::schema::syncoperation::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(diesel::delete(syncoperation.find(id)).execute(conn)?)
    }
}
