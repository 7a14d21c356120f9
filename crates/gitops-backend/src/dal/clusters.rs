/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data access for cluster credentials and the GitOps engine topology
//! (engine clusters and engine instances).

use crate::dal::{DbError, DAL};
use diesel::prelude::*;
use gitops_models::models::clusters::{
    ClusterCredentials, GitopsEngineCluster, GitopsEngineInstance,
};
use gitops_models::validation;

pub struct ClustersDAL<'a> {
    pub(crate) dal: &'a DAL,
}

impl<'a> ClustersDAL<'a> {
    pub fn create_credentials(
        &self,
        creds: &ClusterCredentials,
    ) -> Result<ClusterCredentials, DbError> {
        use gitops_models::schema::clustercredentials::dsl::*;

        validation::validate(creds)?;
        let conn = &mut self.dal.conn()?;

        Ok(diesel::insert_into(clustercredentials)
            .values(creds)
            .returning(ClusterCredentials::as_returning())
            .get_result(conn)?)
    }

    pub fn get_credentials(&self, id: &str) -> Result<ClusterCredentials, DbError> {
        use gitops_models::schema::clustercredentials::dsl::*;

        let conn = &mut self.dal.conn()?;

        clustercredentials
            .find(id)
            .select(ClusterCredentials::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DbError::not_found("ClusterCredentials", id))
    }

    pub fn list_all_credentials(&self) -> Result<Vec<ClusterCredentials>, DbError> {
        use gitops_models::schema::clustercredentials::dsl::*;

        self.dal.ensure_unsafe("list_all_cluster_credentials")?;
        let conn = &mut self.dal.conn()?;

        Ok(clustercredentials
            .select(ClusterCredentials::as_select())
            .order(created_on.asc())
            .load(conn)?)
    }

    pub fn delete_credentials(&self, id: &str) -> Result<usize, DbError> {
        use gitops_models::schema::clustercredentials::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(diesel::delete(clustercredentials.find(id)).execute(conn)?)
    }

    pub fn create_engine_cluster(
        &self,
        cluster: &GitopsEngineCluster,
    ) -> Result<GitopsEngineCluster, DbError> {
        use gitops_models::schema::gitopsenginecluster::dsl::*;

        validation::validate(cluster)?;
        let conn = &mut self.dal.conn()?;

        Ok(diesel::insert_into(gitopsenginecluster)
            .values(cluster)
            .returning(GitopsEngineCluster::as_returning())
            .get_result(conn)?)
    }

    pub fn get_engine_cluster(&self, id: &str) -> Result<GitopsEngineCluster, DbError> {
        use gitops_models::schema::gitopsenginecluster::dsl::*;

        let conn = &mut self.dal.conn()?;

        gitopsenginecluster
            .find(id)
            .select(GitopsEngineCluster::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DbError::not_found("GitopsEngineCluster", id))
    }

    pub fn count_engine_clusters_by_credentials(&self, creds_id: &str) -> Result<i64, DbError> {
        use gitops_models::schema::gitopsenginecluster::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(gitopsenginecluster
            .filter(clustercredentials_id.eq(creds_id))
            .count()
            .get_result(conn)?)
    }

    pub fn create_engine_instance(
        &self,
        instance: &GitopsEngineInstance,
    ) -> Result<GitopsEngineInstance, DbError> {
        use gitops_models::schema::gitopsengineinstance::dsl::*;

        validation::validate(instance)?;
        let conn = &mut self.dal.conn()?;

        Ok(diesel::insert_into(gitopsengineinstance)
            .values(instance)
            .returning(GitopsEngineInstance::as_returning())
            .get_result(conn)?)
    }

    pub fn get_engine_instance(&self, id: &str) -> Result<GitopsEngineInstance, DbError> {
        use gitops_models::schema::gitopsengineinstance::dsl::*;

        let conn = &mut self.dal.conn()?;

        gitopsengineinstance
            .find(id)
            .select(GitopsEngineInstance::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DbError::not_found("GitopsEngineInstance", id))
    }
}
