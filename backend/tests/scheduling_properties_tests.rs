//! End-to-end behaviour of the scheduling service against the in-memory
//! repository, with "today" pinned by a fixed clock.

mod support;

use exam_scheduler::db::repo_config::SchedulingSettings;
use exam_scheduler::models::{
    Registration, RegistrationFilter, RegistrationId, RegistrationStatus, Session, SessionStatus,
};
use exam_scheduler::scheduling::{ArchiveSelection, ClosureState, OrphanPolicy, SchedulingError};
use support::{afternoon, fixture, fixture_at, june, morning};

fn full_session(key: exam_scheduler::models::SessionKey, capacity: u32) -> Session {
    let mut session = Session::new(key, capacity);
    session.book(capacity);
    session
}

// =========================================================
// Window
// =========================================================

#[tokio::test]
async fn test_window_auto_closes_after_end_date() {
    let fx = fixture_at(june(2), SchedulingSettings::default());
    let mut window = support::june_window();
    window.end_date = Some(june(1));
    fx.repo.set_window(window);

    let observed = fx.service.get_window().await.unwrap();
    assert!(!observed.is_open);

    let err = fx.service.register("EX-1", june(1)).await.unwrap_err();
    assert_eq!(err.code(), "OUT_OF_WINDOW");
}

#[tokio::test]
async fn test_set_window_rejects_stale_version() {
    let fx = fixture();
    let current = fx.service.get_window().await.unwrap();

    let mut first = current.clone();
    first.message = "first".to_string();
    let saved = fx.service.set_window(first).await.unwrap();
    assert_eq!(saved.result.version, current.version + 1);

    let mut stale = current;
    stale.message = "stale".to_string();
    let err = fx.service.set_window(stale).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(fx.service.get_window().await.unwrap().message, "first");
}

// =========================================================
// Assignment
// =========================================================

#[tokio::test]
async fn test_assigner_skips_full_date_for_earliest_with_room() {
    let fx = fixture();
    fx.repo.seed_sessions([
        full_session(morning(10), 2),
        full_session(afternoon(10), 2),
        {
            let mut s = Session::new(morning(12), 5);
            s.book(4);
            s
        },
    ]);
    let reg = fx.service.register("EX-1", june(9)).await.unwrap().result;

    let assigned = fx.service.assign_registration(reg.id).await.unwrap();
    assert_eq!(assigned.result.session.key(), morning(12));
    assert_eq!(assigned.result.session.booked, 5);
    assert_eq!(assigned.result.session.status, SessionStatus::Full);
    assert_eq!(assigned.result.registration.status, RegistrationStatus::Assigned);
}

#[tokio::test]
async fn test_assigner_prefers_morning_on_same_date() {
    let fx = fixture();
    fx.service.create_date_group(june(10), Some(1), None).await.unwrap();
    let a = fx.service.register("EX-A", june(3)).await.unwrap().result;
    let b = fx.service.register("EX-B", june(3)).await.unwrap().result;

    let first = fx.service.assign_registration(a.id).await.unwrap();
    let second = fx.service.assign_registration(b.id).await.unwrap();
    assert_eq!(first.result.session.key(), morning(10));
    assert_eq!(second.result.session.key(), afternoon(10));

    let c = fx.service.register("EX-C", june(3)).await.unwrap().result;
    let err = fx.service.assign_registration(c.id).await.unwrap_err();
    assert_eq!(err.code(), "NO_CAPACITY");
}

#[tokio::test]
async fn test_assigner_reports_out_of_window() {
    let fx = fixture();
    fx.repo.seed_sessions([Session::new(
        exam_scheduler::models::SessionKey::new(
            chrono::NaiveDate::from_ymd_opt(2025, 7, 3).unwrap(),
            exam_scheduler::models::SessionPeriod::Morning,
        ),
        10,
    )]);
    let reg = fx.service.register("EX-1", june(5)).await.unwrap().result;

    let err = fx.service.assign_registration(reg.id).await.unwrap_err();
    assert!(matches!(err, SchedulingError::OutOfWindow(_)));
}

#[tokio::test]
async fn test_manual_assign_to_past_date_is_rejected() {
    let fx = fixture_at(june(15), SchedulingSettings::default());
    fx.repo.seed_sessions([Session::new(morning(10), 50)]);
    fx.repo.seed_registrations([Registration::new(RegistrationId::new(1), "EX-1", june(5))]);

    let err = fx
        .service
        .manual_assign(RegistrationId::new(1), morning(10))
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulingError::PastDate { .. }));
    assert_eq!(fx.service.get_registration(RegistrationId::new(1)).await.unwrap().assignment, None);
}

#[tokio::test]
async fn test_manual_reassign_releases_previous_seat() {
    let fx = fixture();
    fx.service.create_date_group(june(10), Some(3), None).await.unwrap();
    let reg = fx.service.register("EX-1", june(3)).await.unwrap().result;
    fx.service.assign_registration(reg.id).await.unwrap();

    let moved = fx.service.manual_assign(reg.id, afternoon(10)).await.unwrap();
    assert_eq!(moved.result.session.booked, 1);
    let released = moved.delta.session(morning(10)).unwrap();
    assert_eq!(released.booked, 0);

    let again = fx.service.manual_assign(reg.id, afternoon(10)).await.unwrap();
    assert!(again.delta.is_empty());
}

// =========================================================
// Capacity
// =========================================================

#[tokio::test]
async fn test_capacity_round_trip_reopens_closed_session() {
    let fx = fixture();
    fx.service.create_date_group(june(10), Some(4), None).await.unwrap();
    fx.service.close_session(morning(10)).await.unwrap();

    let zero = fx.service.set_session_capacity(morning(10), 0).await.unwrap();
    assert_eq!(zero.result.status, SessionStatus::Closed);

    let five = fx.service.set_session_capacity(morning(10), 5).await.unwrap();
    assert_eq!(five.result.status, SessionStatus::Open);
    assert_eq!(five.result.capacity, 5);
}

#[tokio::test]
async fn test_capacity_increase_keeps_closed_when_flag_is_off() {
    let settings = SchedulingSettings {
        reopen_on_capacity_increase: false,
        ..Default::default()
    };
    let fx = fixture_at(june(2), settings);
    fx.service.create_date_group(june(10), Some(4), None).await.unwrap();
    fx.service.close_session(morning(10)).await.unwrap();

    let raised = fx.service.set_session_capacity(morning(10), 9).await.unwrap();
    assert_eq!(raised.result.status, SessionStatus::Closed);

    let reopened = fx.service.reopen_session(morning(10)).await.unwrap();
    assert_eq!(reopened.result.status, SessionStatus::Open);
}

#[tokio::test]
async fn test_close_twice_is_idempotent_and_keeps_booked() {
    let fx = fixture();
    fx.service.create_date_group(june(10), Some(4), None).await.unwrap();
    let reg = fx.service.register("EX-1", june(3)).await.unwrap().result;
    fx.service.assign_registration(reg.id).await.unwrap();

    let once = fx.service.close_session(morning(10)).await.unwrap().result;
    let twice = fx.service.close_session(morning(10)).await.unwrap().result;
    assert_eq!(once, twice);
    assert_eq!(twice.booked, 1);
    assert_eq!(twice.status, SessionStatus::Closed);

    let err = fx
        .service
        .manual_assign(RegistrationId::new(99), morning(10))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

// =========================================================
// Reschedule and closure
// =========================================================

async fn five_on_the_tenth(fx: &support::Fixture) -> Vec<RegistrationId> {
    fx.service.create_date_group(june(10), Some(10), None).await.unwrap();
    let mut ids = Vec::new();
    for i in 0..5 {
        let reg = fx.service.register(&format!("EX-{}", i), june(3)).await.unwrap().result;
        fx.service.manual_assign(reg.id, morning(10)).await.unwrap();
        ids.push(reg.id);
    }
    ids
}

#[tokio::test]
async fn test_reschedule_is_all_or_nothing() {
    let fx = fixture();
    let ids = five_on_the_tenth(&fx).await;
    fx.service.create_date_group(june(12), Some(3), None).await.unwrap();

    let err = fx.service.reschedule(june(10), morning(12)).await.unwrap_err();
    match err {
        SchedulingError::InsufficientCapacity {
            available, needed, ..
        } => {
            assert_eq!(available, 3);
            assert_eq!(needed, 5);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    for id in ids {
        let reg = fx.service.get_registration(id).await.unwrap();
        assert_eq!(reg.assignment, Some(morning(10)));
    }
    let groups = fx.service.list_sessions(None).await.unwrap();
    let twelfth = groups.iter().find(|g| g.date == june(12)).unwrap();
    assert_eq!(twelfth.total_booked(), 0);
}

#[tokio::test]
async fn test_reschedule_moves_everyone_when_room() {
    let fx = fixture();
    let ids = five_on_the_tenth(&fx).await;
    fx.service.create_date_group(june(12), Some(5), None).await.unwrap();

    let moved = fx.service.reschedule(june(10), afternoon(12)).await.unwrap();
    assert_eq!(moved.result.moved, 5);
    assert_eq!(moved.delta.session(afternoon(12)).unwrap().booked, 5);
    for id in ids {
        assert_eq!(
            fx.service.get_registration(id).await.unwrap().assignment,
            Some(afternoon(12))
        );
    }
}

#[tokio::test]
async fn test_force_close_with_target_moves_then_closes() {
    let fx = fixture();
    five_on_the_tenth(&fx).await;
    fx.service.create_date_group(june(12), Some(5), None).await.unwrap();

    let report = fx
        .service
        .force_close(june(10), Some(morning(12)))
        .await
        .unwrap()
        .result;
    assert_eq!(report.state, ClosureState::Closed);
    assert_eq!(report.rescheduled, 5);
    assert!(report.orphaned.is_empty());

    let groups = fx.service.list_sessions(Some(exam_scheduler::models::DateRange::new(
        Some(june(10)),
        Some(june(10)),
    )))
    .await
    .unwrap();
    assert!(groups[0].is_closed());
}

#[tokio::test]
async fn test_force_close_block_policy_refuses_orphans() {
    let settings = SchedulingSettings {
        orphan_policy: OrphanPolicy::Block,
        ..Default::default()
    };
    let fx = fixture_at(june(2), settings);
    fx.service.create_date_group(june(10), Some(3), None).await.unwrap();
    let reg = fx.service.register("EX-1", june(3)).await.unwrap().result;
    fx.service.assign_registration(reg.id).await.unwrap();

    let err = fx.service.force_close(june(10), None).await.unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
    let groups = fx.service.list_sessions(None).await.unwrap();
    assert!(!groups[0].is_closed());
}

#[tokio::test]
async fn test_force_close_leave_policy_reports_orphans() {
    let fx = fixture();
    fx.service.create_date_group(june(10), Some(3), None).await.unwrap();
    let reg = fx.service.register("EX-1", june(3)).await.unwrap().result;
    fx.service.assign_registration(reg.id).await.unwrap();

    let report = fx.service.force_close(june(10), None).await.unwrap().result;
    assert_eq!(report.orphaned, vec![reg.id]);
    assert_eq!(
        fx.service.get_registration(reg.id).await.unwrap().status,
        RegistrationStatus::Assigned
    );
}

#[tokio::test]
async fn test_archive_never_touches_active_registrations() {
    let fx = fixture();
    fx.service.create_date_group(june(10), Some(5), None).await.unwrap();
    let registered = fx.service.register("EX-R", june(3)).await.unwrap().result;
    let assigned = fx.service.register("EX-A", june(3)).await.unwrap().result;
    let completed = fx.service.register("EX-C", june(3)).await.unwrap().result;
    let cancelled = fx.service.register("EX-X", june(3)).await.unwrap().result;
    fx.service.assign_registration(assigned.id).await.unwrap();
    fx.service.assign_registration(completed.id).await.unwrap();
    fx.service.complete_registration(completed.id).await.unwrap();
    fx.service.cancel_registration(cancelled.id).await.unwrap();

    let explicit = fx
        .service
        .archive_terminal(&ArchiveSelection::Ids(vec![registered.id, assigned.id]))
        .await
        .unwrap();
    assert_eq!(explicit.result.archived, 0);

    let all = fx
        .service
        .archive_terminal(&ArchiveSelection::AllEligible)
        .await
        .unwrap();
    let mut archived = all.result.ids.clone();
    archived.sort();
    assert_eq!(archived, vec![completed.id, cancelled.id]);

    let visible = fx
        .service
        .list_registrations(&RegistrationFilter::default())
        .await
        .unwrap();
    assert_eq!(visible.len(), 2);
    assert!(visible.iter().all(|r| r.status.is_active()));

    let repeat = fx
        .service
        .archive_terminal(&ArchiveSelection::AllEligible)
        .await
        .unwrap();
    assert_eq!(repeat.result.archived, 0);
}
