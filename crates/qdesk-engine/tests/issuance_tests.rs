// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket issuance against a real SQLite store.

use std::sync::Arc;

use chrono::{Duration, NaiveTime};
use qdesk_core::types::{PriorityType, WorkingSession};
use qdesk_core::{DeskEvent, QdeskError};
use qdesk_engine::{EngineSettings, IssueRequest};
use qdesk_test_utils::harness::{KB1, XN1, XN2};
use qdesk_test_utils::{FailingPublisher, StalledPublisher, TestHarness};

fn morning() -> WorkingSession {
    WorkingSession {
        id: 1,
        name: "Morning".into(),
        start_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
        day_of_week: None,
        is_active: true,
    }
}

#[tokio::test]
async fn numbers_carry_service_code_and_class() {
    let h = TestHarness::new().await.unwrap();

    let first = h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
    let urgent = h.issue_in(XN1, "XN", PriorityType::Priority).await.unwrap();
    let second = h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();

    assert_eq!(first.number, "XN-0001");
    assert_eq!(urgent.number, "XN-U0001");
    assert_eq!(second.number, "XN-0002");
    assert_eq!(first.service_name, "Blood tests");
    assert_eq!(first.room_code, "XN1");
    assert_eq!(second.queue_position, 3);
    assert_eq!(second.estimated_wait_minutes, 15);
}

#[tokio::test]
async fn issuance_publishes_queue_update_for_the_room() {
    let h = TestHarness::new().await.unwrap();
    h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();

    let events = h.recorder.events().await;
    assert_eq!(events.len(), 1);
    match &events[0] {
        DeskEvent::QueueUpdated(update) => {
            assert_eq!(update.room_id, XN1);
            assert_eq!(update.queue_size, 1);
            assert_eq!(update.affected_numbers, ["XN-0001"]);
        }
        other => panic!("expected queue update, got {other:?}"),
    }
}

#[tokio::test]
async fn unassigned_tickets_go_to_least_loaded_room() {
    let h = TestHarness::new().await.unwrap();

    let rooms: Vec<_> = [
        h.issue("XN", PriorityType::Normal).await.unwrap().room_id,
        h.issue("XN", PriorityType::Normal).await.unwrap().room_id,
        h.issue("XN", PriorityType::Normal).await.unwrap().room_id,
    ]
    .into();
    assert_eq!(rooms, [XN1, XN2, XN1]);

    // Services never borrow another service's room.
    assert_eq!(h.issue("KB", PriorityType::Normal).await.unwrap().room_id, KB1);
}

#[tokio::test]
async fn unknown_service_and_foreign_room_are_refused() {
    let h = TestHarness::new().await.unwrap();

    let err = h.issue("ZZ", PriorityType::Normal).await.unwrap_err();
    assert!(matches!(err, QdeskError::NotFound { entity: "service", .. }), "{err:?}");

    let err = h.issue_in(KB1, "XN", PriorityType::Normal).await.unwrap_err();
    assert!(matches!(err, QdeskError::Rejected { .. }), "{err:?}");

    let err = h.issue_in(999, "XN", PriorityType::Normal).await.unwrap_err();
    assert!(matches!(err, QdeskError::NotFound { entity: "room", .. }), "{err:?}");
}

#[tokio::test]
async fn closed_gate_refuses_without_consuming_a_number() {
    let h = TestHarness::builder()
        .with_session(morning())
        .build()
        .await
        .unwrap();

    h.clock.advance(Duration::hours(4));
    let err = h.issue("XN", PriorityType::Normal).await.unwrap_err();
    match err {
        QdeskError::OutsideWorkingHours { windows } => {
            assert_eq!(windows, ["Morning 07:00-11:30"]);
        }
        other => panic!("expected OutsideWorkingHours, got {other:?}"),
    }
    assert!(h.recorder.events().await.is_empty());

    h.clock.advance(Duration::hours(-3));
    let issued = h.issue("XN", PriorityType::Normal).await.unwrap();
    assert_eq!(issued.number, "XN-0001");
}

#[tokio::test]
async fn numbering_and_queue_reset_each_day() {
    let h = TestHarness::new().await.unwrap();
    h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
    h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();

    h.clock.advance(Duration::days(1));
    assert!(h.engine.views().queue(XN1).await.unwrap().is_empty());

    let next_day = h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
    assert_eq!(next_day.number, "XN-0001");
    assert_eq!(next_day.queue_position, 1);
}

#[tokio::test]
async fn concurrent_issuance_yields_contiguous_numbers() {
    let h = TestHarness::new().await.unwrap();

    let issued = futures::future::join_all(
        (0..20).map(|_| h.issue("XN", PriorityType::Normal)),
    )
    .await;
    let mut numbers: Vec<String> = issued.into_iter().map(|r| r.unwrap().number).collect();
    numbers.sort();

    let expected: Vec<String> = (1..=20).map(|n| format!("XN-{n:04}")).collect();
    assert_eq!(numbers, expected);
}

#[tokio::test]
async fn request_defaults_to_normal_class() {
    let request: IssueRequest = serde_json::from_str(r#"{"service_code":"XN"}"#).unwrap();
    assert_eq!(request.priority_type, PriorityType::Normal);
    assert_eq!(request.room_id, None);

    let h = TestHarness::new().await.unwrap();
    let issued = h.engine.issuer().issue(request).await.unwrap();
    assert_eq!(issued.number, "XN-0001");
}

#[tokio::test]
async fn failing_publisher_never_fails_issuance() {
    let h = TestHarness::builder()
        .with_publisher(Arc::new(FailingPublisher))
        .build()
        .await
        .unwrap();

    let issued = h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
    assert_eq!(issued.number, "XN-0001");
    assert_eq!(h.call_next(XN1).await.unwrap().as_deref(), Some("XN-0001"));
}

#[tokio::test]
async fn stalled_publisher_is_bounded_by_timeout() {
    let settings = EngineSettings {
        publish_timeout: std::time::Duration::from_millis(50),
        ..EngineSettings::default()
    };
    let h = TestHarness::builder()
        .with_publisher(Arc::new(StalledPublisher))
        .with_settings(settings)
        .build()
        .await
        .unwrap();

    let issued = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        h.issue_in(XN1, "XN", PriorityType::Normal),
    )
    .await
    .expect("issuance should not wait for the publisher")
    .unwrap();
    assert_eq!(issued.number, "XN-0001");
}
