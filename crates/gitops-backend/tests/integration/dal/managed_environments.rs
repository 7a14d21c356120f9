/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use crate::fixtures::TestFixture;
use gitops_models::models::ClusterAccess;
use serial_test::serial;

#[test]
#[serial]
fn test_count_by_credentials() {
    let fixture = TestFixture::new();

    let count = fixture
        .dal
        .managed_environments()
        .count_by_credentials("test-creds")
        .expect("Failed to count environments");
    assert_eq!(count, 1);
}

#[test]
#[serial]
fn test_delete_clears_application_reference_and_access() {
    let fixture = TestFixture::new();
    fixture.insert_application("test-app");
    fixture
        .dal
        .managed_environments()
        .create_cluster_access(&ClusterAccess::new("test-user", "test-env", "test-instance").unwrap())
        .expect("Failed to create cluster access");
    assert_eq!(
        fixture
            .dal
            .managed_environments()
            .count_cluster_access_by_user("test-user")
            .unwrap(),
        1
    );

    let deleted = fixture
        .dal
        .managed_environments()
        .delete("test-env")
        .expect("Failed to delete environment");
    assert_eq!(deleted, 1);

    let app = fixture.dal.applications().get("test-app").unwrap();
    assert!(app.managed_environment_id.is_none());
    assert_eq!(
        fixture
            .dal
            .managed_environments()
            .count_cluster_access_by_user("test-user")
            .unwrap(),
        0
    );
    assert!(fixture
        .dal
        .applications()
        .list_by_managed_environment("test-env")
        .unwrap()
        .is_empty());
}
