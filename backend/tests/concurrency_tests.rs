//! Concurrent writers against shared sessions.
//!
//! Within one service the per-session locks serialize writers; across
//! services sharing a repository the versioned commit does.

mod support;

use std::sync::Arc;

use exam_scheduler::db::repo_config::SchedulingSettings;
use exam_scheduler::models::{RegistrationId, SessionStatus};
use exam_scheduler::scheduling::{
    FixedClock, Mutation, Assignment, SchedulingResult, SchedulingService,
};
use futures::future::join_all;
use support::{fixture, june, morning};

/// Auto-assign, retrying retryable failures the way a caller would.
async fn assign_with_retry(
    service: &SchedulingService,
    id: RegistrationId,
) -> SchedulingResult<Mutation<Assignment>> {
    let mut attempts = 0;
    loop {
        match service.assign_registration(id).await {
            Err(e) if e.is_retryable() && attempts < 20 => {
                attempts += 1;
                tokio::task::yield_now().await;
            }
            other => return other,
        }
    }
}

#[tokio::test]
async fn test_concurrent_assignments_never_overbook() {
    let fx = fixture();
    fx.service.create_date_group(june(10), Some(3), None).await.unwrap();

    let mut ids = Vec::new();
    for i in 0..10 {
        ids.push(fx.service.register(&format!("EX-{}", i), june(3)).await.unwrap().result.id);
    }

    let results = join_all(ids.iter().map(|id| assign_with_retry(&fx.service, *id))).await;
    let assigned = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(assigned, 6);
    for result in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(result.code(), "NO_CAPACITY");
    }

    let groups = fx.service.list_sessions(None).await.unwrap();
    for session in &groups[0].sessions {
        assert!(session.booked <= session.capacity);
        assert_eq!(session.status, SessionStatus::Full);
    }
    assert_eq!(groups[0].total_booked(), 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_spawned_manual_assignments_respect_capacity() {
    let fx = fixture();
    fx.service.create_date_group(june(10), Some(4), None).await.unwrap();
    let mut ids = Vec::new();
    for i in 0..12 {
        ids.push(fx.service.register(&format!("EX-{}", i), june(3)).await.unwrap().result.id);
    }

    let service = Arc::new(fx.service);
    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.manual_assign(id, morning(10)).await })
        })
        .collect();

    let mut assigned = 0;
    for handle in join_all(handles).await {
        match handle.unwrap() {
            Ok(_) => assigned += 1,
            Err(e) => assert_eq!(e.code(), "NO_CAPACITY"),
        }
    }
    assert_eq!(assigned, 4);

    let groups = service.list_sessions(None).await.unwrap();
    let morning_session = &groups[0].sessions[0];
    assert_eq!(morning_session.booked, 4);
}

#[tokio::test]
async fn test_services_sharing_a_repository_are_kept_consistent_by_versions() {
    let fx = fixture();
    fx.service.create_date_group(june(10), Some(1), None).await.unwrap();
    let mut ids = Vec::new();
    for i in 0..6 {
        ids.push(fx.service.register(&format!("EX-{}", i), june(3)).await.unwrap().result.id);
    }

    // A second process: same storage, its own lock registry.
    let other = SchedulingService::new(
        fx.repo.clone(),
        Arc::new(FixedClock::new(june(2))),
        SchedulingSettings::default(),
    );

    let results = join_all(ids.iter().enumerate().map(|(i, id)| {
        let service = if i % 2 == 0 { &fx.service } else { &other };
        assign_with_retry(service, *id)
    }))
    .await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 2);
    let groups = other.list_sessions(None).await.unwrap();
    assert_eq!(groups[0].total_booked(), 2);
    assert!(groups[0].sessions.iter().all(|s| s.booked <= s.capacity));
}
