/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Row types, diesel schema and field validation for the GitOps shadow database.

pub mod models;
pub mod schema;
pub mod validation;
