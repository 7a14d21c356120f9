/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Sweeps against the real database with a scripted cluster.

use crate::fixtures::TestFixture;
use async_trait::async_trait;
use gitops_backend::k8s::{ClusterClient, ClusterClientFactory, ClusterError, ObservedObject, ResourceKind};
use gitops_backend::reconciler::{Family, Reconciler, SweepPolicy};
use gitops_models::models::{
    ClusterCredentials, DeploymentToApplicationMapping, GitopsEngineInstance, OperationState,
    SyncOperation, SPECIAL_CLUSTER_USER_NAME,
};
use serial_test::serial;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Answers only for objects it was told about; everything else is a
/// transient failure, so rows outside the test are left alone.
#[derive(Clone, Default)]
struct ScriptedCluster {
    objects: Arc<Mutex<HashMap<(ResourceKind, String, String), Option<String>>>>,
    created: Arc<Mutex<Vec<String>>>,
}

impl ScriptedCluster {
    fn set(&self, kind: ResourceKind, namespace: &str, name: &str, uid: Option<&str>) {
        self.objects.lock().unwrap().insert(
            (kind, namespace.to_string(), name.to_string()),
            uid.map(str::to_string),
        );
    }

    fn created_operations(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClusterClient for ScriptedCluster {
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ObservedObject>, ClusterError> {
        let key = (kind, namespace.to_string(), name.to_string());
        match self.objects.lock().unwrap().get(&key) {
            Some(Some(uid)) => Ok(Some(ObservedObject {
                namespace: namespace.to_string(),
                name: name.to_string(),
                uid: uid.clone(),
            })),
            Some(None) => Ok(None),
            None => Err(ClusterError::Transient(format!("{} {}/{} not scripted", kind, namespace, name))),
        }
    }

    async fn create_operation(
        &self,
        _namespace: &str,
        _name: &str,
        operation_id: &str,
    ) -> Result<(), ClusterError> {
        self.created.lock().unwrap().push(operation_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl ClusterClientFactory for ScriptedCluster {
    async fn client_for_engine_instance(
        &self,
        _instance: &GitopsEngineInstance,
        _credentials: &ClusterCredentials,
    ) -> Result<Arc<dyn ClusterClient>, ClusterError> {
        Ok(Arc::new(self.clone()))
    }
}

fn reconciler(fixture: &TestFixture, cluster: &ScriptedCluster) -> Reconciler {
    Reconciler::new(
        Arc::new(fixture.dal.clone()),
        Arc::new(cluster.clone()),
        Arc::new(cluster.clone()),
    )
}

fn map_deployment(fixture: &TestFixture, uid: &str, app_id: &str) {
    fixture
        .dal
        .mappings()
        .create_deployment_mapping(
            &DeploymentToApplicationMapping::new(uid, "my-deployment", "team-a", "test-ns-uid", app_id)
                .unwrap(),
        )
        .expect("Failed to create mapping");
}

#[tokio::test]
#[serial]
async fn test_missing_deployment_removes_application() {
    let fixture = TestFixture::new();
    fixture.insert_application("test-app");
    map_deployment(&fixture, "test-deployment-uid", "test-app");
    fixture
        .dal
        .sync_operations()
        .create(
            &SyncOperation::new(
                "test-sync",
                Some("test-app".to_string()),
                "my-deployment",
                "team-a",
                "main",
                "Running",
            )
            .unwrap(),
        )
        .unwrap();

    let cluster = ScriptedCluster::default();
    cluster.set(ResourceKind::GitOpsDeployment, "team-a", "my-deployment", None);

    let report = reconciler(&fixture, &cluster)
        .sweep_family(Family::DeploymentMapping, &SweepPolicy::default())
        .await
        .expect("Sweep failed");
    assert!(report.deleted >= 1);
    assert_eq!(report.operations_created, 1);

    assert!(fixture.dal.applications().get("test-app").unwrap_err().is_not_found());
    assert!(fixture
        .dal
        .mappings()
        .get_deployment_mapping_by_application("test-app")
        .is_err());
    let sync = fixture.dal.sync_operations().get("test-sync").unwrap();
    assert!(sync.application().is_none());

    let ops: Vec<_> = fixture
        .dal
        .operations()
        .list_all()
        .unwrap()
        .into_iter()
        .filter(|op| op.resource_id == "test-app")
        .collect();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].operation_owner_user_id, SPECIAL_CLUSTER_USER_NAME);
    assert_eq!(ops[0].instance_id, "test-instance");
    assert_eq!(ops[0].state, OperationState::Waiting);
    assert_eq!(cluster.created_operations(), vec![ops[0].operation_id.clone()]);
}

#[tokio::test]
#[serial]
async fn test_live_deployment_is_kept() {
    let fixture = TestFixture::new();
    fixture.insert_application("test-app");
    map_deployment(&fixture, "test-deployment-uid", "test-app");

    let cluster = ScriptedCluster::default();
    cluster.set(
        ResourceKind::GitOpsDeployment,
        "team-a",
        "my-deployment",
        Some("test-deployment-uid"),
    );

    reconciler(&fixture, &cluster)
        .sweep_family(Family::DeploymentMapping, &SweepPolicy::default())
        .await
        .expect("Sweep failed");

    assert!(fixture.dal.applications().get("test-app").is_ok());
    assert!(cluster.created_operations().is_empty());
}

#[tokio::test]
#[serial]
async fn test_recreated_deployment_counts_as_orphaned() {
    let fixture = TestFixture::new();
    fixture.insert_application("test-app");
    map_deployment(&fixture, "test-deployment-uid", "test-app");

    let cluster = ScriptedCluster::default();
    cluster.set(
        ResourceKind::GitOpsDeployment,
        "team-a",
        "my-deployment",
        Some("test-replacement-uid"),
    );

    reconciler(&fixture, &cluster)
        .sweep_family(Family::DeploymentMapping, &SweepPolicy::default())
        .await
        .expect("Sweep failed");

    assert!(fixture.dal.applications().get("test-app").unwrap_err().is_not_found());
}

#[tokio::test]
#[serial]
async fn test_unreachable_cluster_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.insert_application("test-app");
    map_deployment(&fixture, "test-deployment-uid", "test-app");

    let cluster = ScriptedCluster::default();

    let report = reconciler(&fixture, &cluster)
        .sweep_family(Family::DeploymentMapping, &SweepPolicy::default())
        .await
        .expect("Sweep failed");

    assert!(report.undetermined >= 1);
    assert!(fixture.dal.applications().get("test-app").is_ok());
    assert!(fixture
        .dal
        .mappings()
        .get_deployment_mapping_by_application("test-app")
        .is_ok());
}
