/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data access for applications and the rows that share their lifecycle
//! (application state and application owners).

use crate::dal::{DbError, DAL};
use diesel::prelude::*;
use gitops_models::models::applications::{Application, ApplicationOwner, ApplicationState};
use gitops_models::validation;

pub struct ApplicationsDAL<'a> {
    pub(crate) dal: &'a DAL,
}

impl<'a> ApplicationsDAL<'a> {
    pub fn create(&self, app: &Application) -> Result<Application, DbError> {
        use gitops_models::schema::application::dsl::*;

        validation::validate(app)?;
        let conn = &mut self.dal.conn()?;

        Ok(diesel::insert_into(application)
            .values(app)
            .returning(Application::as_returning())
            .get_result(conn)?)
    }

    pub fn get(&self, id: &str) -> Result<Application, DbError> {
        use gitops_models::schema::application::dsl::*;

        let conn = &mut self.dal.conn()?;

        application
            .find(id)
            .select(Application::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DbError::not_found("Application", id))
    }

    /// Returns the application only if `owner_user_id` owns it.
    pub fn checked_get(&self, id: &str, owner_user_id: &str) -> Result<Application, DbError> {
        use gitops_models::schema::{application, applicationowner};

        let conn = &mut self.dal.conn()?;

        application::table
            .inner_join(
                applicationowner::table.on(applicationowner::application_owner_application_id
                    .eq(application::application_id)),
            )
            .filter(application::application_id.eq(id))
            .filter(applicationowner::application_owner_user_id.eq(owner_user_id))
            .select(Application::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DbError::not_found("Application", id))
    }

    pub fn list_all(&self) -> Result<Vec<Application>, DbError> {
        use gitops_models::schema::application::dsl::*;

        self.dal.ensure_unsafe("list_all_applications")?;
        let conn = &mut self.dal.conn()?;

        Ok(application
            .select(Application::as_select())
            .order(created_on.asc())
            .load(conn)?)
    }

    pub fn list_by_managed_environment(&self, env_id: &str) -> Result<Vec<Application>, DbError> {
        use gitops_models::schema::application::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(application
            .filter(managed_environment_id.eq(env_id))
            .select(Application::as_select())
            .load(conn)?)
    }

    pub fn update(&self, app: &Application) -> Result<usize, DbError> {
        use gitops_models::schema::application::dsl::*;

        validation::validate(app)?;
        let conn = &mut self.dal.conn()?;

        Ok(diesel::update(application.find(&app.application_id))
            .set(app)
            .execute(conn)?)
    }

    pub fn delete(&self, id: &str) -> Result<usize, DbError> {
        use gitops_models::schema::application::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(diesel::delete(application.find(id)).execute(conn)?)
    }

    pub fn create_state(&self, state: &ApplicationState) -> Result<ApplicationState, DbError> {
        use gitops_models::schema::applicationstate::dsl::*;

        validation::validate(state)?;
        let conn = &mut self.dal.conn()?;

        Ok(diesel::insert_into(applicationstate)
            .values(state)
            .returning(ApplicationState::as_returning())
            .get_result(conn)?)
    }

    pub fn delete_state(&self, application_id: &str) -> Result<usize, DbError> {
        use gitops_models::schema::applicationstate::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(diesel::delete(applicationstate.find(application_id)).execute(conn)?)
    }

    pub fn create_owner(&self, owner: &ApplicationOwner) -> Result<ApplicationOwner, DbError> {
        use gitops_models::schema::applicationowner::dsl::*;

        validation::validate(owner)?;
        let conn = &mut self.dal.conn()?;

        Ok(diesel::insert_into(applicationowner)
            .values(owner)
            .returning(ApplicationOwner::as_returning())
            .get_result(conn)?)
    }

    pub fn delete_owners(&self, application_id: &str) -> Result<usize, DbError> {
        use gitops_models::schema::applicationowner::dsl::*;

        let conn = &mut self.dal.conn()?;

        Ok(
            diesel::delete(applicationowner.filter(application_owner_application_id.eq(application_id)))
                .execute(conn)?,
        )
    }
}
