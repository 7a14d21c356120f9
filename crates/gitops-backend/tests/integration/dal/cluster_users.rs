/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use crate::fixtures::TestFixture;
use gitops_models::models::cluster_users::SPECIAL_CLUSTER_USER_NAME;
use gitops_models::models::ClusterUser;
use serial_test::serial;

#[test]
#[serial]
fn test_get_by_user_name() {
    let fixture = TestFixture::new();

    let user = fixture
        .dal
        .cluster_users()
        .get_by_user_name("test-user")
        .expect("Failed to get user by name");
    assert_eq!(user.clusteruser_id, fixture.user.clusteruser_id);
}

#[test]
#[serial]
fn test_get_or_create_special_is_idempotent() {
    let fixture = TestFixture::new();

    let first = fixture
        .dal
        .cluster_users()
        .get_or_create_special()
        .expect("Failed to get special user");
    let second = fixture
        .dal
        .cluster_users()
        .get_or_create_special()
        .expect("Failed to get special user");

    assert!(first.is_special());
    assert_eq!(first.clusteruser_id, second.clusteruser_id);
    assert_eq!(first.created_on, second.created_on);
}

#[test]
#[serial]
fn test_special_user_is_never_deleted() {
    let fixture = TestFixture::new();
    fixture.dal.cluster_users().get_or_create_special().unwrap();

    let deleted = fixture
        .dal
        .cluster_users()
        .delete(SPECIAL_CLUSTER_USER_NAME)
        .expect("Delete should not fail");
    assert_eq!(deleted, 0);
    assert!(fixture
        .dal
        .cluster_users()
        .get(SPECIAL_CLUSTER_USER_NAME)
        .is_ok());
}

#[test]
#[serial]
fn test_delete_user() {
    let fixture = TestFixture::new();
    fixture
        .dal
        .cluster_users()
        .create(&ClusterUser::new("test-leaving-user", "test-leaving-user").unwrap())
        .unwrap();

    assert_eq!(fixture.dal.cluster_users().delete("test-leaving-user").unwrap(), 1);
    let err = fixture.dal.cluster_users().get("test-leaving-user").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
#[serial]
fn test_create_rejects_overlong_user_name() {
    let fixture = TestFixture::new();
    let mut user = ClusterUser::new("test-long-user", "test-long-user").unwrap();
    user.user_name = "u".repeat(300);

    let err = fixture.dal.cluster_users().create(&user).unwrap_err();
    assert!(err.is_max_length());
    assert!(fixture.dal.cluster_users().get("test-long-user").is_err());
}
