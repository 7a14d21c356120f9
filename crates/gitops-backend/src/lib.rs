/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # GitOps Backend
//!
//! Keeps the GitOps shadow database in line with the cluster. Rows are
//! correlated with custom resources through mapping tables; when the
//! resource behind a mapping disappears, or a root row has been unreferenced
//! for longer than the grace window, the reconciler removes it together with
//! its dependents and creates Operations so the cluster agent can clean up
//! the engine side.
//!
//! - [`dal`]: diesel data access behind the `DatabaseQueries` trait
//! - [`k8s`]: custom resource types and the cluster client
//! - [`reconciler`]: orphan scanning, cascade plans and Operation handling
//! - [`health`], [`metrics`]: probes and Prometheus metrics

pub mod cli;
pub mod dal;
pub mod db;
pub mod health;
pub mod k8s;
pub mod metrics;
pub mod reconciler;

#[cfg(test)]
pub(crate) mod testing;
