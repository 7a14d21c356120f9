/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use crate::fixtures::TestFixture;
use gitops_models::models::{
    ApiCrToDatabaseMapping, ApiResourceType, DbRelationType, DeploymentToApplicationMapping,
    KubernetesToDbResourceMapping,
};
use serial_test::serial;

#[test]
#[serial]
fn test_deployment_mapping_lookup_by_application() {
    let fixture = TestFixture::new();
    fixture.insert_application("test-app");
    fixture
        .dal
        .mappings()
        .create_deployment_mapping(
            &DeploymentToApplicationMapping::new(
                "test-deployment-uid",
                "my-deployment",
                "team-a",
                "test-ns-uid",
                "test-app",
            )
            .unwrap(),
        )
        .expect("Failed to create mapping");

    let mapping = fixture
        .dal
        .mappings()
        .get_deployment_mapping_by_application("test-app")
        .expect("Failed to find mapping");
    assert_eq!(mapping.deploymenttoapplicationmapping_uid_id, "test-deployment-uid");

    assert_eq!(
        fixture
            .dal
            .mappings()
            .delete_deployment_mapping("test-deployment-uid")
            .unwrap(),
        1
    );
    let err = fixture
        .dal
        .mappings()
        .get_deployment_mapping_by_application("test-app")
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
#[serial]
fn test_api_cr_mappings_by_relation() {
    let fixture = TestFixture::new();
    let mapping = ApiCrToDatabaseMapping::new(
        ApiResourceType::ManagedEnvironment,
        "test-env-cr-uid",
        "my-env",
        "team-a",
        "test-ns-uid",
        DbRelationType::ManagedEnvironment,
        "test-env",
    )
    .unwrap();
    fixture
        .dal
        .mappings()
        .create_api_cr_mapping(&mapping)
        .expect("Failed to create mapping");

    let found = fixture
        .dal
        .mappings()
        .list_api_cr_mappings_by_relation(DbRelationType::ManagedEnvironment.as_str(), "test-env")
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].resource_type().unwrap(), ApiResourceType::ManagedEnvironment);

    assert!(fixture
        .restricted_dal()
        .mappings()
        .list_all_api_cr_mappings()
        .is_err());

    assert_eq!(fixture.dal.mappings().delete_api_cr_mapping(&mapping).unwrap(), 1);
    assert_eq!(fixture.dal.mappings().delete_api_cr_mapping(&mapping).unwrap(), 0);
}

#[test]
#[serial]
fn test_kubernetes_mapping_count() {
    let fixture = TestFixture::new();
    let mapping =
        KubernetesToDbResourceMapping::new("Namespace", "test-ns-uid", "GitopsEngineInstance", "test-instance")
            .unwrap();
    fixture
        .dal
        .mappings()
        .create_kubernetes_mapping(&mapping)
        .expect("Failed to create mapping");

    let count = fixture
        .dal
        .mappings()
        .count_kubernetes_mappings_by_relation("GitopsEngineInstance", "test-instance")
        .unwrap();
    assert_eq!(count, 1);

    assert_eq!(fixture.dal.mappings().delete_kubernetes_mapping(&mapping).unwrap(), 1);
}
