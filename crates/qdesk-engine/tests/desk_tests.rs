// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Calling-desk transitions, ordering and the one-active-ticket rule.

use chrono::Duration;
use qdesk_core::types::{PriorityStrategy, PriorityType, TicketStatus};
use qdesk_core::{CallAction, Clock, DeskEvent, QdeskError, TicketStore};
use qdesk_engine::{CallOutcome, RecallOutcome};
use qdesk_test_utils::TestHarness;
use qdesk_test_utils::harness::{KB, KB1, XN1, XN2};

async fn numbers_waiting(h: &TestHarness, room_id: i64) -> Vec<String> {
    h.engine
        .views()
        .queue(room_id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.number)
        .collect()
}

async fn called(h: &TestHarness, room_id: i64) -> qdesk_core::types::Ticket {
    match h.engine.desk().call_next(room_id, Some(7)).await.unwrap() {
        CallOutcome::Called(ticket) => ticket,
        CallOutcome::QueueEmpty => panic!("queue of room {room_id} is empty"),
    }
}

#[tokio::test]
async fn priority_ticket_is_called_before_earlier_normal() {
    let h = TestHarness::new().await.unwrap();
    h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
    h.issue_in(XN1, "XN", PriorityType::Priority).await.unwrap();

    assert_eq!(numbers_waiting(&h, XN1).await, ["XN-U0001", "XN-0001"]);

    let ticket = called(&h, XN1).await;
    assert_eq!(ticket.number, "XN-U0001");
    assert_eq!(ticket.status, TicketStatus::Calling);
    assert_eq!(ticket.called_by_user_id, Some(7));
    assert_eq!(
        h.recorder.kinds().await,
        ["queue_updated", "queue_updated", "ticket_called"]
    );
}

#[tokio::test]
async fn strict_queue_serves_priority_fifo_then_normal_fifo() {
    let h = TestHarness::new().await.unwrap();
    for class in [
        PriorityType::Normal,
        PriorityType::Priority,
        PriorityType::Normal,
        PriorityType::Priority,
    ] {
        h.issue_in(XN1, "XN", class).await.unwrap();
        h.clock.advance_minutes(1);
    }

    let mut served = Vec::new();
    while let Some(id) = h.serve_next(XN1).await.unwrap() {
        served.push(h.number_of(id).await.unwrap());
    }
    assert_eq!(served, ["XN-U0001", "XN-U0002", "XN-0001", "XN-0002"]);
}

#[tokio::test]
async fn second_call_while_busy_is_a_conflict() {
    let h = TestHarness::new().await.unwrap();
    h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
    h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();

    let first = called(&h, XN1).await;
    let err = h.engine.desk().call_next(XN1, None).await.unwrap_err();
    assert!(matches!(err, QdeskError::Conflict { .. }), "{err:?}");

    h.engine.desk().pass(first.id).await.unwrap();
    assert_eq!(called(&h, XN1).await.number, "XN-0002");
}

#[tokio::test]
async fn concurrent_calls_have_exactly_one_winner() {
    let h = TestHarness::new().await.unwrap();
    for _ in 0..3 {
        h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
    }

    let results =
        futures::future::join_all((0..5).map(|_| h.engine.desk().call_next(XN1, None))).await;

    let winners = results
        .iter()
        .filter(|r| matches!(r, Ok(CallOutcome::Called(_))))
        .count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(QdeskError::Conflict { .. })))
        .count();
    assert_eq!((winners, conflicts), (1, 4));
    assert_eq!(numbers_waiting(&h, XN1).await, ["XN-0002", "XN-0003"]);
}

#[tokio::test]
async fn rooms_are_independent() {
    let h = TestHarness::new().await.unwrap();
    h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
    h.issue_in(XN2, "XN", PriorityType::Normal).await.unwrap();

    assert_eq!(called(&h, XN1).await.number, "XN-0001");
    assert_eq!(called(&h, XN2).await.number, "XN-0002");
}

#[tokio::test]
async fn empty_queue_reports_nothing_to_call() {
    let h = TestHarness::new().await.unwrap();
    let outcome = h.engine.desk().call_next(XN1, None).await.unwrap();
    assert!(matches!(outcome, CallOutcome::QueueEmpty));
    assert!(h.recorder.events().await.is_empty());

    let err = h.engine.desk().call_next(404, None).await.unwrap_err();
    assert!(matches!(err, QdeskError::NotFound { entity: "room", .. }));
}

#[tokio::test]
async fn serving_lifecycle_records_wait_and_service_times() {
    let h = TestHarness::new().await.unwrap();
    let issued = h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();

    h.clock.advance_minutes(2);
    let ticket = called(&h, XN1).await;
    assert_eq!(ticket.wait_time_seconds, Some(120));

    h.clock.advance_minutes(1);
    let ticket = h.engine.desk().start_serving(ticket.id).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Serving);

    h.clock.advance_minutes(4);
    let ticket = h.engine.desk().done(ticket.id, Some(3)).await.unwrap();
    assert_eq!(ticket.id, issued.ticket_id);
    assert_eq!(ticket.status, TicketStatus::Done);
    assert_eq!(ticket.service_time_seconds, Some(240));
    assert_eq!(ticket.post_process_branch_id, Some(3));
    assert_eq!(ticket.completed_at, Some(h.clock.now()));
}

#[tokio::test]
async fn terminal_tickets_reject_further_transitions() {
    let h = TestHarness::new().await.unwrap();
    let issued = h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();

    let err = h.engine.desk().start_serving(issued.ticket_id).await.unwrap_err();
    assert!(matches!(err, QdeskError::Conflict { .. }), "{err:?}");

    h.engine.desk().done(issued.ticket_id, None).await.unwrap();
    for result in [
        h.engine.desk().done(issued.ticket_id, None).await,
        h.engine.desk().pass(issued.ticket_id).await,
    ] {
        assert!(matches!(result, Err(QdeskError::Conflict { .. })), "{result:?}");
    }

    let err = h.engine.desk().done(9999, None).await.unwrap_err();
    assert!(matches!(err, QdeskError::NotFound { entity: "ticket", .. }));
}

#[tokio::test]
async fn recall_reannounces_the_current_ticket() {
    let h = TestHarness::new().await.unwrap();
    let outcome = h.engine.desk().recall(XN1).await.unwrap();
    assert!(matches!(outcome, RecallOutcome::NothingToRecall));

    h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
    called(&h, XN1).await;
    h.clock.advance_minutes(3);
    h.recorder.clear().await;

    let RecallOutcome::Recalled(ticket) = h.engine.desk().recall(XN1).await.unwrap() else {
        panic!("expected a recalled ticket");
    };
    assert_eq!(ticket.called_at, Some(h.clock.now()));
    match h.recorder.events().await.as_slice() {
        [DeskEvent::TicketCalled(event)] => {
            assert_eq!(event.action, CallAction::Recall);
            assert_eq!(event.service_code, "XN");
            assert_eq!(event.room_code, "XN1");
        }
        other => panic!("expected one recall event, got {other:?}"),
    }
}

#[tokio::test]
async fn returned_ticket_goes_to_the_back_with_timing_cleared() {
    let h = TestHarness::new().await.unwrap();
    h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
    h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();

    h.clock.advance_minutes(1);
    let first = called(&h, XN1).await;
    h.engine.desk().start_serving(first.id).await.unwrap();
    h.clock.advance_minutes(1);
    h.recorder.clear().await;

    let returned = h.engine.desk().return_to_queue(first.id).await.unwrap();
    assert_eq!(returned.status, TicketStatus::Pending);
    assert_eq!(returned.issued_at, h.clock.now());
    assert_eq!(returned.called_at, None);
    assert_eq!(returned.serving_at, None);
    assert_eq!(returned.wait_time_seconds, None);
    assert_eq!(numbers_waiting(&h, XN1).await, ["XN-0002", "XN-0001"]);
    assert_eq!(
        h.recorder.kinds().await,
        ["ticket_status_changed", "queue_updated"]
    );

    // The room is free again.
    assert_eq!(called(&h, XN1).await.number, "XN-0002");
}

#[tokio::test]
async fn passed_ticket_can_be_returned() {
    let h = TestHarness::new().await.unwrap();
    h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
    let ticket = called(&h, XN1).await;
    h.engine.desk().pass(ticket.id).await.unwrap();

    let returned = h.engine.desk().return_to_queue(ticket.id).await.unwrap();
    assert_eq!(returned.completed_at, None);
    assert_eq!(numbers_waiting(&h, XN1).await, ["XN-0001"]);
}

#[tokio::test]
async fn transfer_moves_ticket_to_the_target_room_queue() {
    let h = TestHarness::new().await.unwrap();
    h.issue_in(XN2, "XN", PriorityType::Normal).await.unwrap();
    let moving = h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
    let ticket = called(&h, XN1).await;
    assert_eq!(ticket.id, moving.ticket_id);
    h.recorder.clear().await;

    let moved = h
        .engine
        .desk()
        .transfer(ticket.id, None, Some(XN2))
        .await
        .unwrap();
    assert_eq!(moved.room_id, XN2);
    assert_eq!(moved.status, TicketStatus::Pending);
    assert_eq!(moved.number, "XN-0002");
    assert_eq!(numbers_waiting(&h, XN2).await, ["XN-0001", "XN-0002"]);
    assert!(h.engine.views().current(XN1).await.unwrap().is_none());

    match h.recorder.events().await.as_slice() {
        [DeskEvent::TicketStatusChanged(status), DeskEvent::QueueUpdated(queue)] => {
            assert_eq!(status.room_id, XN1);
            assert_eq!(status.old_status, TicketStatus::Calling);
            assert_eq!(queue.room_id, XN2);
            assert_eq!(queue.queue_size, 2);
        }
        other => panic!("unexpected events {other:?}"),
    }
}

#[tokio::test]
async fn transfer_can_change_service_and_validates_targets() {
    let h = TestHarness::new().await.unwrap();
    let issued = h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();

    let err = h
        .engine
        .desk()
        .transfer(issued.ticket_id, None, Some(404))
        .await
        .unwrap_err();
    assert!(matches!(err, QdeskError::NotFound { entity: "room", .. }));
    let err = h
        .engine
        .desk()
        .transfer(issued.ticket_id, Some(404), None)
        .await
        .unwrap_err();
    assert!(matches!(err, QdeskError::NotFound { entity: "service", .. }));

    let moved = h
        .engine
        .desk()
        .transfer(issued.ticket_id, Some(KB), None)
        .await
        .unwrap();
    assert_eq!(moved.service_id, KB);
    assert_eq!(moved.room_id, XN1);
}

#[tokio::test]
async fn toggled_ticket_is_selected_by_its_new_class() {
    let h = TestHarness::new().await.unwrap();
    h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
    let second = h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
    h.recorder.clear().await;

    let toggled = h.engine.desk().toggle_priority(second.ticket_id).await.unwrap();
    assert_eq!(toggled.priority_type, PriorityType::Priority);
    assert_eq!(toggled.number, "XN-0002");
    assert_eq!(toggled.status, TicketStatus::Pending);
    assert_eq!(h.recorder.kinds().await, ["queue_updated"]);

    assert_eq!(called(&h, XN1).await.number, "XN-0002");
}

#[tokio::test]
async fn interleaved_room_mixes_in_priority_after_interval_normals() {
    let h = TestHarness::builder()
        .with_policy(Some(XN1), None, PriorityStrategy::Interleaved, 2)
        .build()
        .await
        .unwrap();
    for _ in 0..4 {
        h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
        h.clock.advance_minutes(1);
    }
    h.issue_in(XN1, "XN", PriorityType::Priority).await.unwrap();

    assert_eq!(
        numbers_waiting(&h, XN1).await,
        ["XN-0001", "XN-0002", "XN-U0001", "XN-0003", "XN-0004"]
    );

    let mut served = Vec::new();
    while let Some(id) = h.serve_next(XN1).await.unwrap() {
        served.push(h.number_of(id).await.unwrap());
    }
    assert_eq!(
        served,
        ["XN-0001", "XN-0002", "XN-U0001", "XN-0003", "XN-0004"]
    );
}

#[tokio::test]
async fn interleaved_priority_is_not_starved() {
    let h = TestHarness::builder()
        .with_policy(None, None, PriorityStrategy::Interleaved, 2)
        .build()
        .await
        .unwrap();
    for _ in 0..3 {
        h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
        h.clock.advance_minutes(1);
    }
    h.issue_in(XN1, "XN", PriorityType::Priority).await.unwrap();

    // Nothing served yet, but the priority ticket has waited past 2 x interval.
    h.clock.advance_minutes(5);
    assert_eq!(called(&h, XN1).await.number, "XN-U0001");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn recall_racing_done_never_revives_the_ticket() {
    let h = TestHarness::new().await.unwrap();
    for _ in 0..40 {
        h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
        let ticket = called(&h, XN1).await;
        let ticket_id = ticket.id;

        let desk = h.engine.desk().clone();
        let done = tokio::spawn(async move { desk.done(ticket_id, None).await });
        let desk = h.engine.desk().clone();
        let recall = tokio::spawn(async move { desk.recall(XN1).await });

        let done = done.await.unwrap();
        let recall = recall.await.unwrap();
        assert!(done.is_ok(), "done failed: {done:?}");
        assert!(
            matches!(recall, Ok(_) | Err(QdeskError::Conflict { .. })),
            "got {recall:?}"
        );

        let stored = h.store.ticket(ticket_id).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Done, "{} came back", ticket.number);
        assert!(stored.completed_at.is_some());
        assert!(h.engine.views().current(XN1).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn pass_after_done_is_a_conflict_not_an_overwrite() {
    let h = TestHarness::new().await.unwrap();
    h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
    let ticket = called(&h, XN1).await;

    h.engine.desk().done(ticket.id, Some(3)).await.unwrap();
    let err = h.engine.desk().pass(ticket.id).await.unwrap_err();
    assert!(matches!(err, QdeskError::Conflict { .. }), "got {err:?}");

    let stored = h.store.ticket(ticket.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TicketStatus::Done);
    assert_eq!(stored.post_process_branch_id, Some(3));
}

#[tokio::test]
async fn ticket_returned_on_a_later_day_takes_that_days_number() {
    let h = TestHarness::new().await.unwrap();
    let yesterday = h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
    assert_eq!(yesterday.number, "XN-0001");

    h.clock.advance(Duration::days(1));
    let returned = h.engine.desk().return_to_queue(yesterday.ticket_id).await.unwrap();
    assert_eq!(returned.number, "XN-0001");
    assert_eq!(returned.issued_date, h.clock.today());

    let fresh = h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
    assert_eq!(fresh.number, "XN-0002");
    assert_eq!(numbers_waiting(&h, XN1).await, ["XN-0001", "XN-0002"]);
}

#[tokio::test]
async fn ticket_transferred_on_a_later_day_is_renumbered_for_its_new_service() {
    let h = TestHarness::new().await.unwrap();
    h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();
    let carried = h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap();

    h.clock.advance(Duration::days(1));
    let kb_first = h.issue("KB", PriorityType::Normal).await.unwrap();
    assert_eq!(kb_first.number, "KB-0001");

    let moved = h
        .engine
        .desk()
        .transfer(carried.ticket_id, Some(KB), Some(KB1))
        .await
        .unwrap();
    assert_eq!(moved.number, "KB-0002");
    assert_eq!(moved.room_id, KB1);
    assert_eq!(h.issue("KB", PriorityType::Normal).await.unwrap().number, "KB-0003");
    assert_eq!(h.issue_in(XN1, "XN", PriorityType::Normal).await.unwrap().number, "XN-0001");
}
