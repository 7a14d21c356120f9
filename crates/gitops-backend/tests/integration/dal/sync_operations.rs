/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use crate::fixtures::TestFixture;
use gitops_models::models::SyncOperation;
use serial_test::serial;

#[test]
#[serial]
fn test_clear_application_keeps_row() {
    let fixture = TestFixture::new();
    fixture.insert_application("test-app");
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
        .expect("Failed to create sync operation");

    assert_eq!(
        fixture
            .dal
            .sync_operations()
            .list_by_application("test-app")
            .unwrap()
            .len(),
        1
    );

    assert_eq!(fixture.dal.sync_operations().clear_application("test-sync").unwrap(), 1);

    let op = fixture.dal.sync_operations().get("test-sync").unwrap();
    assert!(op.application().is_none());
    assert!(fixture
        .dal
        .sync_operations()
        .list_by_application("test-app")
        .unwrap()
        .is_empty());
}

#[test]
#[serial]
fn test_delete_sync_operation() {
    let fixture = TestFixture::new();
    fixture
        .dal
        .sync_operations()
        .create(&SyncOperation::new("test-sync", None, "my-deployment", "team-a", "main", "Running").unwrap())
        .unwrap();

    assert_eq!(fixture.dal.sync_operations().delete("test-sync").unwrap(), 1);
    assert_eq!(fixture.dal.sync_operations().delete("test-sync").unwrap(), 0);
}
