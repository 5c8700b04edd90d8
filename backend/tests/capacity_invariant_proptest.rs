//! Property test: no accepted assignment or reschedule raises a session's
//! `booked` past its capacity, whatever came before it.

mod support;

use std::collections::HashMap;

use exam_scheduler::db::repo_config::SchedulingSettings;
use exam_scheduler::models::{RegistrationId, SessionKey, SessionPeriod};
use exam_scheduler::scheduling::{CanonicalDelta, SchedulingService};
use proptest::prelude::*;
use support::{fixture_at, june};

const DAYS: [u32; 3] = [10, 11, 12];

#[derive(Debug, Clone)]
enum Op {
    Register,
    Assign(usize),
    Manual(usize, usize, bool),
    Reschedule(usize, usize, bool),
    SetCapacity(usize, bool, u32),
    Close(usize, bool),
    Cancel(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Register),
        4 => (0..16usize).prop_map(Op::Assign),
        3 => (0..16usize, 0..3usize, any::<bool>()).prop_map(|(r, d, m)| Op::Manual(r, d, m)),
        1 => (0..3usize, 0..3usize, any::<bool>()).prop_map(|(f, t, m)| Op::Reschedule(f, t, m)),
        1 => (0..3usize, any::<bool>(), 0..4u32).prop_map(|(d, m, c)| Op::SetCapacity(d, m, c)),
        1 => (0..3usize, any::<bool>()).prop_map(|(d, m)| Op::Close(d, m)),
        1 => (0..16usize).prop_map(Op::Cancel),
    ]
}

fn key(day: usize, morning: bool) -> SessionKey {
    let period = if morning {
        SessionPeriod::Morning
    } else {
        SessionPeriod::Afternoon
    };
    SessionKey::new(june(DAYS[day]), period)
}

async fn booked_by_key(service: &SchedulingService) -> HashMap<SessionKey, u32> {
    service
        .list_sessions(None)
        .await
        .unwrap()
        .into_iter()
        .flat_map(|g| g.sessions)
        .map(|s| (s.key(), s.booked))
        .collect()
}

/// Every session whose `booked` went up in `delta` is within capacity.
fn check_delta(before: &HashMap<SessionKey, u32>, delta: &CanonicalDelta) -> Result<(), String> {
    for session in &delta.sessions {
        let previous = before.get(&session.key()).copied().unwrap_or(0);
        if session.booked > previous && session.booked > session.capacity {
            return Err(format!(
                "{} booked {} of {} after an accepted write",
                session.key(),
                session.booked,
                session.capacity
            ));
        }
    }
    Ok(())
}

async fn run(ops: Vec<Op>) -> Result<(), String> {
    let fx = fixture_at(june(2), SchedulingSettings::default());
    for day in DAYS {
        fx.service.create_date_group(june(day), Some(2), None).await.unwrap();
    }
    let mut ids: Vec<RegistrationId> = Vec::new();
    let pick = |ids: &Vec<RegistrationId>, i: usize| ids.get(i % ids.len().max(1)).copied();

    for op in ops {
        let before = booked_by_key(&fx.service).await;
        let delta = match op {
            Op::Register => {
                let reg = fx
                    .service
                    .register(&format!("EX-{}", ids.len()), june(3))
                    .await
                    .unwrap();
                ids.push(reg.result.id);
                None
            }
            Op::Assign(i) => match pick(&ids, i) {
                Some(id) => fx.service.assign_registration(id).await.ok().map(|m| m.delta),
                None => None,
            },
            Op::Manual(i, day, morning) => match pick(&ids, i) {
                Some(id) => fx
                    .service
                    .manual_assign(id, key(day, morning))
                    .await
                    .ok()
                    .map(|m| m.delta),
                None => None,
            },
            Op::Reschedule(from, to, morning) => fx
                .service
                .reschedule(june(DAYS[from]), key(to, morning))
                .await
                .ok()
                .map(|m| m.delta),
            Op::SetCapacity(day, morning, capacity) => {
                let _ = fx.service.set_session_capacity(key(day, morning), capacity).await;
                None
            }
            Op::Close(day, morning) => {
                let _ = fx.service.close_session(key(day, morning)).await;
                None
            }
            Op::Cancel(i) => {
                if let Some(id) = pick(&ids, i) {
                    let _ = fx.service.cancel_registration(id).await;
                }
                None
            }
        };
        if let Some(delta) = delta {
            check_delta(&before, &delta)?;
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_accepted_writes_stay_within_capacity(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        if let Err(violation) = rt.block_on(run(ops)) {
            prop_assert!(false, "{}", violation);
        }
    }
}
