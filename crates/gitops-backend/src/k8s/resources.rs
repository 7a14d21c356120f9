/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Custom resource definitions for the `managed-gitops.redhat.com` API group.
//!
//! Only the fields the reconciler reads or writes are modelled. Every field
//! defaults so objects written by newer controllers still deserialize.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const API_GROUP: &str = "managed-gitops.redhat.com";
pub const API_VERSION: &str = "v1alpha1";

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    kind = "GitOpsDeployment",
    group = "managed-gitops.redhat.com",
    version = "v1alpha1",
    namespaced
)]
pub struct GitOpsDeploymentSpec {
    #[serde(default)]
    pub source: ApplicationSource,
    #[serde(default)]
    pub destination: ApplicationDestination,
    #[serde(default, rename = "type")]
    pub deployment_type: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSource {
    #[serde(default, rename = "repoURL")]
    pub repo_url: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub target_revision: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
pub struct ApplicationDestination {
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub namespace: String,
}

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    kind = "GitOpsDeploymentManagedEnvironment",
    group = "managed-gitops.redhat.com",
    version = "v1alpha1",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct GitOpsDeploymentManagedEnvironmentSpec {
    #[serde(default, rename = "apiURL")]
    pub api_url: String,
    #[serde(default)]
    pub credentials_secret: String,
    #[serde(default, rename = "allowInsecureSkipTLSVerify")]
    pub allow_insecure_skip_tls_verify: bool,
}

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    kind = "GitOpsDeploymentRepositoryCredential",
    group = "managed-gitops.redhat.com",
    version = "v1alpha1",
    namespaced
)]
pub struct GitOpsDeploymentRepositoryCredentialSpec {
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub secret: String,
}

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    kind = "GitOpsDeploymentSyncRun",
    group = "managed-gitops.redhat.com",
    version = "v1alpha1",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct GitOpsDeploymentSyncRunSpec {
    #[serde(default)]
    pub gitops_deployment_name: String,
    #[serde(default, rename = "revisionID")]
    pub revision_id: String,
}

/// Notification consumed by the cluster agent. Named `operation-<id>`.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    kind = "Operation",
    group = "managed-gitops.redhat.com",
    version = "v1alpha1",
    namespaced
)]
pub struct OperationSpec {
    #[serde(default, rename = "operationID")]
    pub operation_id: String,
}
