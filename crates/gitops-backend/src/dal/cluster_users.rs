/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data access for cluster users, including the reserved service user.

use crate::dal::{DbError, DAL};
use gitops_models::models::cluster_users::{ClusterUser, SPECIAL_CLUSTER_USER_NAME};
use gitops_models::validation;
use diesel::prelude::*;

pub struct ClusterUsersDAL<'a> {
    pub(crate) dal: &'a DAL,
}

impl<'a> ClusterUsersDAL<'a> {
    pub fn create(&self, user: &ClusterUser) -> Result<ClusterUser, DbError> {
        use gitops_models::schema::clusteruser::dsl::*;

        validation::validate(user)?;
        let conn = &mut self.dal.conn()?;

        Ok(diesel::insert_into(clusteruser)
            .values(user)
            .returning(ClusterUser::as_returning())
            .get_result(conn)?)
    }

    pub fn get(&self, id: &str) -> Result<ClusterUser, DbError> {
        use gitops_models::schema::clusteruser::dsl::*;

        let conn = &mut self.dal.conn()?;

        clusteruser
            .find(id)
            .select(ClusterUser::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DbError::not_found("ClusterUser", id))
    }

    pub fn get_by_user_name(&self, name: &str) -> Result<ClusterUser, DbError> {
        use gitops_models::schema::clusteruser::dsl::*;

        let conn = &mut self.dal.conn()?;

        clusteruser
            .filter(user_name.eq(name))
            .select(ClusterUser::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DbError::not_found("ClusterUser", name))
    }

    /// Returns the reserved service user, inserting it on first use.
    pub fn get_or_create_special(&self) -> Result<ClusterUser, DbError> {
        use gitops_models::schema::clusteruser::dsl::*;

        let conn = &mut self.dal.conn()?;

        diesel::insert_into(clusteruser)
            .values(&ClusterUser::special())
            .on_conflict_do_nothing()
            .execute(conn)?;

        clusteruser
            .filter(user_name.eq(SPECIAL_CLUSTER_USER_NAME))
            .select(ClusterUser::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DbError::not_found("ClusterUser", SPECIAL_CLUSTER_USER_NAME))
    }

    pub fn list_all(&self) -> Result<Vec<ClusterUser>, DbError> {
        use gitops_models::schema::clusteruser::dsl::*;

        self.dal.ensure_unsafe("list_all_cluster_users")?;
        let conn = &mut self.dal.conn()?;

        Ok(clusteruser
            .select(ClusterUser::as_select())
            .order(created_on.asc())
            .load(conn)?)
    }

    /// Deletes a user. The reserved service user is never deleted.
    pub fn delete(&self, id: &str) -> Result<usize, DbError> {
        use gitops_models::schema::clusteruser::dsl::*;

        if id == SPECIAL_CLUSTER_USER_NAME {
            return Ok(0);
        }
        let conn = &mut self.dal.conn()?;

        Ok(diesel::delete(clusteruser.find(id))
            .filter(user_name.ne(SPECIAL_CLUSTER_USER_NAME))
            .execute(conn)?)
    }
}
