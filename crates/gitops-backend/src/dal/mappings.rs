/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data access for the three mapping tables: deployment-to-application,
//! API CR-to-database and Kubernetes resource-to-database.

use crate::dal::{DbError, DAL};
use diesel::prelude::*;
use gitops_models::models::mappings::{
    ApiCrToDatabaseMapping, DeploymentToApplicationMapping, KubernetesToDbResourceMapping,
};
use gitops_models::validation;

pub struct MappingsDAL<'a> {
    pub(crate) dal: &'a DAL,
}

impl<'a> MappingsDAL<'a> {
    pub fn create_deployment_mapping(
        &self,
        mapping: &DeploymentToApplicationMapping,
    ) -> Result<DeploymentToApplicationMapping, DbError> {
        use gitops_models::schema::deploymenttoapplicationmapping::dsl::*;

        validation::validate(mapping)?;
        let conn = &mut self.dal.conn()?;

        Ok(diesel::insert_into(deploymenttoapplicationmapping)
            .values(mapping)
            .returning(DeploymentToApplicationMapping::as_returning())
            .get_result(conn)?)
    }

    pub fn list_all_deployment_mappings(
        &self,
    ) -> Result<Vec<DeploymentToApplicationMapping>, DbError> {
        use gitops_models::schema::deploymenttoapplicationmapping::dsl::*;

        self.dal
            .ensure_unsafe("list_all_deployment_to_application_mappings")?;
        let conn = &mut self.dal.conn()?;

        Ok(deploymenttoapplicationmapping
            .select(DeploymentToApplicationMapping::as_select())
            .load(conn)?)
    }

    pub fn get_deployment_mapping_by_application(
        &self,
        app_id: &str,
    ) -> Result<DeploymentToApplicationMapping, DbError> {
        use gitops_models::schema::deploymenttoapplicationmapping::dsl::*;

        let conn = &mut self.dal.conn()?;

        deploymenttoapplicationmapping
            .filter(application_id.eq(app_id))
            .select(DeploymentToApplicationMapping::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DbError::not_found("DeploymentToApplicationMapping", app_id))
    }

    pub fn delete_deployment_mapping(&self, uid: &str) -> Result<usize, DbError> {
        use gitops_models::schema::deploymenttoapplicationmapping::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(diesel::delete(deploymenttoapplicationmapping.find(uid)).execute(conn)?)
    }

    pub fn create_api_cr_mapping(
        &self,
        mapping: &ApiCrToDatabaseMapping,
    ) -> Result<ApiCrToDatabaseMapping, DbError> {
        use gitops_models::schema::apicrtodatabasemapping::dsl::*;

        validation::validate(mapping)?;
        let conn = &mut self.dal.conn()?;

        Ok(diesel::insert_into(apicrtodatabasemapping)
            .values(mapping)
            .returning(ApiCrToDatabaseMapping::as_returning())
            .get_result(conn)?)
    }

    pub fn list_all_api_cr_mappings(&self) -> Result<Vec<ApiCrToDatabaseMapping>, DbError> {
        use gitops_models::schema::apicrtodatabasemapping::dsl::*;

        self.dal.ensure_unsafe("list_all_api_cr_to_database_mappings")?;
        let conn = &mut self.dal.conn()?;

        Ok(apicrtodatabasemapping
            .select(ApiCrToDatabaseMapping::as_select())
            .load(conn)?)
    }

    pub fn list_api_cr_mappings_by_relation(
        &self,
        relation_type: &str,
        relation_key: &str,
    ) -> Result<Vec<ApiCrToDatabaseMapping>, DbError> {
        use gitops_models::schema::apicrtodatabasemapping::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(apicrtodatabasemapping
            .filter(db_relation_type.eq(relation_type))
            .filter(db_relation_key.eq(relation_key))
            .select(ApiCrToDatabaseMapping::as_select())
            .load(conn)?)
    }

    pub fn delete_api_cr_mapping(&self, mapping: &ApiCrToDatabaseMapping) -> Result<usize, DbError> {
        use gitops_models::schema::apicrtodatabasemapping::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(diesel::delete(apicrtodatabasemapping.find((
            &mapping.api_resource_type,
            &mapping.api_resource_uid,
            &mapping.db_relation_type,
            &mapping.db_relation_key,
        )))
        .execute(conn)?)
    }

    pub fn create_kubernetes_mapping(
        &self,
        mapping: &KubernetesToDbResourceMapping,
    ) -> Result<KubernetesToDbResourceMapping, DbError> {
        use gitops_models::schema::kubernetestodbresourcemapping::dsl::*;

        validation::validate(mapping)?;
        let conn = &mut self.dal.conn()?;

        Ok(diesel::insert_into(kubernetestodbresourcemapping)
            .values(mapping)
            .returning(KubernetesToDbResourceMapping::as_returning())
            .get_result(conn)?)
    }

    pub fn count_kubernetes_mappings_by_relation(
        &self,
        relation_type: &str,
        relation_key: &str,
    ) -> Result<i64, DbError> {
        use gitops_models::schema::kubernetestodbresourcemapping::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(kubernetestodbresourcemapping
            .filter(db_relation_type.eq(relation_type))
            .filter(db_relation_key.eq(relation_key))
            .count()
            .get_result(conn)?)
    }

    pub fn delete_kubernetes_mapping(
        &self,
        mapping: &KubernetesToDbResourceMapping,
    ) -> Result<usize, DbError> {
        use gitops_models::schema::kubernetestodbresourcemapping::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(diesel::delete(kubernetestodbresourcemapping.find((
            &mapping.kubernetes_resource_type,
            &mapping.kubernetes_resource_uid,
            &mapping.db_relation_type,
            &mapping.db_relation_key,
        )))
        .execute(conn)?)
    }
}
