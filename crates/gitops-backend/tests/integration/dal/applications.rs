/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use crate::fixtures::TestFixture;
use gitops_backend::dal::DbError;
use gitops_models::models::{ApplicationOwner, ApplicationState, ClusterUser};
use serial_test::serial;

#[test]
#[serial]
fn test_create_and_get_application() {
    let fixture = TestFixture::new();
    let created = fixture.insert_application("test-app");

    let fetched = fixture
        .dal
        .applications()
        .get("test-app")
        .expect("Failed to get application");
    assert_eq!(fetched.application_id, created.application_id);
    assert_eq!(fetched.engine_instance_inst_id, "test-instance");
    assert_eq!(fetched.managed_environment_id.as_deref(), Some("test-env"));
}

#[test]
#[serial]
fn test_get_missing_application_is_not_found() {
    let fixture = TestFixture::new();

    let err = fixture.dal.applications().get("test-missing").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
#[serial]
fn test_checked_get_filters_by_owner() {
    let fixture = TestFixture::new();
    fixture.insert_application("test-app");
    fixture
        .dal
        .cluster_users()
        .create(&ClusterUser::new("test-other-user", "test-other-user").unwrap())
        .expect("Failed to create user");

    let owned = fixture
        .dal
        .applications()
        .checked_get("test-app", "test-user")
        .expect("Owner should see the application");
    assert_eq!(owned.application_id, "test-app");

    let err = fixture
        .dal
        .applications()
        .checked_get("test-app", "test-other-user")
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
}

#[test]
#[serial]
fn test_list_all_requires_unsafe_dal() {
    let fixture = TestFixture::new();
    fixture.insert_application("test-app");

    let err = fixture.restricted_dal().applications().list_all().unwrap_err();
    assert!(matches!(err, DbError::UnsafeNotAllowed(_)));

    let all = fixture
        .dal
        .applications()
        .list_all()
        .expect("Failed to list applications");
    assert!(all.iter().any(|a| a.application_id == "test-app"));
}

#[test]
#[serial]
fn test_delete_application_and_dependents() {
    let fixture = TestFixture::new();
    fixture.insert_application("test-app");
    fixture
        .dal
        .applications()
        .create_state(&ApplicationState::new("test-app", "Healthy", "Synced").unwrap())
        .expect("Failed to create state");

    assert_eq!(fixture.dal.applications().delete_state("test-app").unwrap(), 1);
    assert_eq!(fixture.dal.applications().delete_owners("test-app").unwrap(), 1);
    assert_eq!(fixture.dal.applications().delete("test-app").unwrap(), 1);

    // Already gone: zero rows, not an error.
    assert_eq!(fixture.dal.applications().delete("test-app").unwrap(), 0);
    assert_eq!(fixture.dal.applications().delete_owners("test-app").unwrap(), 0);
}

#[test]
#[serial]
fn test_duplicate_owner_is_rejected() {
    let fixture = TestFixture::new();
    fixture.insert_application("test-app");

    let result = fixture
        .dal
        .applications()
        .create_owner(&ApplicationOwner::new("test-app", "test-user").unwrap());
    assert!(matches!(result, Err(DbError::Query(_))));
}

#[test]
#[serial]
fn test_update_validates_field_lengths() {
    let fixture = TestFixture::new();
    let mut app = fixture.insert_application("test-app");

    app.name = "a".repeat(300);
    let err = fixture.dal.applications().update(&app).unwrap_err();
    assert!(err.is_max_length());

    let stored = fixture.dal.applications().get("test-app").unwrap();
    assert_eq!(stored.name, "test-app");
}
