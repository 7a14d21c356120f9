/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data access for operations.
//!
//! State changes go through [`OperationsDAL::update_state`], which loads the
//! row and applies the transition inside one transaction so two writers can
//! not both move the same operation out of `Waiting`.

use crate::dal::{DbError, DAL};
use chrono::Utc;
use diesel::prelude::*;
use gitops_models::models::operations::{Operation, OperationState};
use gitops_models::validation;

pub struct OperationsDAL<'a> {
    pub(crate) dal: &'a DAL,
}

impl<'a> OperationsDAL<'a> {
    pub fn create(&self, op: &Operation) -> Result<Operation, DbError> {
        use gitops_models::schema::operation::dsl::*;

        validation::validate(op)?;
        let conn = &mut self.dal.conn()?;

        Ok(diesel::insert_into(operation)
            .values(op)
            .returning(Operation::as_returning())
            .get_result(conn)?)
    }

    pub fn get(&self, id: &str) -> Result<Operation, DbError> {
        use gitops_models::schema::operation::dsl::*;

        let conn = &mut self.dal.conn()?;

        operation
            .find(id)
            .select(Operation::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DbError::not_found("Operation", id))
    }

    pub fn checked_get(&self, id: &str, owner_user_id: &str) -> Result<Operation, DbError> {
        use gitops_models::schema::operation::dsl::*;

        let conn = &mut self.dal.conn()?;

        operation
            .find(id)
            .filter(operation_owner_user_id.eq(owner_user_id))
            .select(Operation::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DbError::not_found("Operation", id))
    }

    pub fn list_all(&self) -> Result<Vec<Operation>, DbError> {
        use gitops_models::schema::operation::dsl::*;

        self.dal.ensure_unsafe("list_all_operations")?;
        let conn = &mut self.dal.conn()?;

        Ok(operation
            .select(Operation::as_select())
            .order(created_on.asc())
            .load(conn)?)
    }

    pub fn count_by_owner(&self, user_id: &str) -> Result<i64, DbError> {
        use gitops_models::schema::operation::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(operation
            .filter(operation_owner_user_id.eq(user_id))
            .count()
            .get_result(conn)?)
    }

    pub fn update_state(
        &self,
        id: &str,
        new_state: OperationState,
        human_readable: Option<String>,
    ) -> Result<Operation, DbError> {
        use gitops_models::schema::operation::dsl::*;

        let conn = &mut self.dal.conn()?;

        conn.transaction::<_, DbError, _>(|conn| {
            let current: Operation = operation
                .find(id)
                .select(Operation::as_select())
                .for_update()
                .first(conn)
                .optional()?
                .ok_or_else(|| DbError::not_found("Operation", id))?;

            if !current.state.can_transition_to(new_state) {
                return Err(DbError::InvalidStateTransition {
                    from: current.state,
                    to: new_state,
                });
            }

            Ok(diesel::update(operation.find(id))
                .set((
                    state.eq(new_state),
                    last_state_update.eq(Utc::now()),
                    human_readable_state.eq(human_readable),
                ))
                .returning(Operation::as_returning())
                .get_result(conn)?)
        })
    }

    pub fn delete(&self, id: &str) -> Result<usize, DbError> {
        use gitops_models::schema::operation::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(diesel::delete(operation.find(id)).execute(conn)?)
    }
}
