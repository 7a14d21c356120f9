/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data access for managed environments and cluster access grants.

use crate::dal::{DbError, DAL};
use diesel::prelude::*;
use gitops_models::models::managed_environments::{ClusterAccess, ManagedEnvironment};
use gitops_models::validation;

pub struct ManagedEnvironmentsDAL<'a> {
    pub(crate) dal: &'a DAL,
}

impl<'a> ManagedEnvironmentsDAL<'a> {
    pub fn create(&self, env: &ManagedEnvironment) -> Result<ManagedEnvironment, DbError> {
        use gitops_models::schema::managedenvironment::dsl::*;

        validation::validate(env)?;
        let conn = &mut self.dal.conn()?;

        Ok(diesel::insert_into(managedenvironment)
            .values(env)
            .returning(ManagedEnvironment::as_returning())
            .get_result(conn)?)
    }

    pub fn get(&self, id: &str) -> Result<ManagedEnvironment, DbError> {
        use gitops_models::schema::managedenvironment::dsl::*;

        let conn = &mut self.dal.conn()?;

        managedenvironment
            .find(id)
            .select(ManagedEnvironment::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DbError::not_found("ManagedEnvironment", id))
    }

    pub fn list_all(&self) -> Result<Vec<ManagedEnvironment>, DbError> {
        use gitops_models::schema::managedenvironment::dsl::*;

        self.dal.ensure_unsafe("list_all_managed_environments")?;
        let conn = &mut self.dal.conn()?;

        Ok(managedenvironment
            .select(ManagedEnvironment::as_select())
            .order(created_on.asc())
            .load(conn)?)
    }

    pub fn count_by_credentials(&self, creds_id: &str) -> Result<i64, DbError> {
        use gitops_models::schema::managedenvironment::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(managedenvironment
            .filter(clustercredentials_id.eq(creds_id))
            .count()
            .get_result(conn)?)
    }

    /// Deletes the environment. Cluster access rows go with it and
    /// applications keep running with a cleared environment reference.
    pub fn delete(&self, id: &str) -> Result<usize, DbError> {
        use gitops_models::schema::managedenvironment::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(diesel::delete(managedenvironment.find(id)).execute(conn)?)
    }

    pub fn create_cluster_access(&self, access: &ClusterAccess) -> Result<ClusterAccess, DbError> {
        use gitops_models::schema::clusteraccess::dsl::*;

        validation::validate(access)?;
        let conn = &mut self.dal.conn()?;

        Ok(diesel::insert_into(clusteraccess)
            .values(access)
            .returning(ClusterAccess::as_returning())
            .get_result(conn)?)
    }

    pub fn count_cluster_access_by_user(&self, user_id: &str) -> Result<i64, DbError> {
        use gitops_models::schema::clusteraccess::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(clusteraccess
            .filter(clusteraccess_user_id.eq(user_id))
            .count()
            .get_result(conn)?)
    }
}
