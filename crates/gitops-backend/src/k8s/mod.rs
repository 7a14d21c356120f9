/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Cluster Access Layer
//!
//! Typed reads of the `managed-gitops.redhat.com/v1alpha1` custom resources
//! the reconciler correlates with database rows, and creation of `Operation`
//! resources in GitOps engine namespaces.

pub mod client;
pub mod resources;

pub use client::{
    ClusterClient, ClusterClientFactory, ClusterError, KubeClientFactory, KubeClusterClient,
    ObservedObject, ResourceKind, RetryConfig,
};
