/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

use crate::fixtures::TestFixture;
use gitops_backend::dal::DbError;
use gitops_models::models::{Operation, OperationResourceType, OperationState};
use serial_test::serial;

fn insert_operation(fixture: &TestFixture, resource_id: &str) -> Operation {
    fixture
        .dal
        .operations()
        .create(
            &Operation::new(
                "test-instance",
                resource_id,
                OperationResourceType::Application,
                "test-user",
            )
            .unwrap(),
        )
        .expect("Failed to create operation")
}

#[test]
#[serial]
fn test_new_operation_is_waiting() {
    let fixture = TestFixture::new();
    let op = insert_operation(&fixture, "test-app");

    let fetched = fixture.dal.operations().get(&op.operation_id).unwrap();
    assert_eq!(fetched.state, OperationState::Waiting);
    assert_eq!(fetched.resource_type, OperationResourceType::Application.as_str());
    assert!(fetched.gc_expiration_time.is_none());
}

#[test]
#[serial]
fn test_checked_get_and_count_by_owner() {
    let fixture = TestFixture::new();
    let op = insert_operation(&fixture, "test-app");

    assert!(fixture
        .dal
        .operations()
        .checked_get(&op.operation_id, "test-user")
        .is_ok());
    assert!(fixture
        .dal
        .operations()
        .checked_get(&op.operation_id, "test-someone-else")
        .unwrap_err()
        .is_not_found());
    assert_eq!(fixture.dal.operations().count_by_owner("test-user").unwrap(), 1);
}

#[test]
#[serial]
fn test_state_transitions() {
    let fixture = TestFixture::new();
    let op = insert_operation(&fixture, "test-app");

    let running = fixture
        .dal
        .operations()
        .update_state(&op.operation_id, OperationState::InProgress, None)
        .expect("Waiting -> InProgress should be allowed");
    assert_eq!(running.state, OperationState::InProgress);
    assert!(running.last_state_update >= op.last_state_update);

    let done = fixture
        .dal
        .operations()
        .update_state(
            &op.operation_id,
            OperationState::Completed,
            Some("deployed".to_string()),
        )
        .unwrap();
    assert_eq!(done.human_readable_state.as_deref(), Some("deployed"));

    let err = fixture
        .dal
        .operations()
        .update_state(&op.operation_id, OperationState::Waiting, None)
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::InvalidStateTransition {
            from: OperationState::Completed,
            to: OperationState::Waiting
        }
    ));
}

#[test]
#[serial]
fn test_update_state_of_missing_operation() {
    let fixture = TestFixture::new();

    let err = fixture
        .dal
        .operations()
        .update_state("test-no-such-op", OperationState::Completed, None)
        .unwrap_err();
    assert!(err.is_not_found());
}
