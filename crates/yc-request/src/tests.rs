//! Unit tests for yc-request.

use std::collections::HashMap;

use yc_core::{BlockId, BoxId, Column, EquipmentId, LaneId, OperationId, RequestId};

use crate::*;

// ── Helpers ───────────────────────────────────────────────────────────────────

type Handler = fn(u32) -> u32;

fn noop(x: u32) -> u32 {
    x
}

fn store(id: u32, lane: u16) -> Request<Handler> {
    Request::new(
        RequestId(id),
        Intent::Store { box_id: BoxId(id), lane: LaneId(lane) },
        BlockId(0),
        0.0,
    )
}

fn relocate(id: u32) -> Request<Handler> {
    Request::new(RequestId(id), Intent::Relocate { box_id: BoxId(id), dest: None }, BlockId(0), 0.0)
}

fn started(mut r: Request<Handler>) -> Request<Handler> {
    r.ready(0.0).unwrap();
    r.schedule(EquipmentId(0)).unwrap();
    r.start_or_resume(1.0).unwrap();
    r
}

fn conflict() -> Rejection {
    Rejection::EquipmentConflict { op: OperationId(0), peer: EquipmentId(1), new_pos: None }
}

fn lookup(reqs: &HashMap<RequestId, Request<Handler>>) -> impl Fn(RequestId) -> Option<(RequestState, Option<RequestId>)> + '_ {
    move |id| reqs.get(&id).map(|r| (r.state, r.predecessor))
}

// ── State ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod state {
    use super::*;

    #[test]
    fn masks_group_states() {
        assert!(RequestState::READY.is_ready());
        assert!(RequestState::RESUME_READY.is_ready());
        assert!(!RequestState::SCHEDULED.is_ready());
        assert!(RequestState::SYNCED.is_running());
        assert!(RequestState::REJECTED.has_started());
        assert!(!RequestState::SCHEDULED.has_started());
        assert!(RequestState::FINISHED.is_synced());
        assert_eq!(RequestState::default(), RequestState::INIT);
        assert_eq!(RequestState::RESUME_READY.to_string(), "RESUME_READY");
    }
}

// ── Transitions ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod transitions {
    use super::*;

    #[test]
    fn happy_path() {
        let mut r = store(1, 0);
        r.ready(2.0).unwrap();
        assert_eq!(r.state, RequestState::READY);
        assert_eq!(r.ready_since(), 2.0);
        r.schedule(EquipmentId(3)).unwrap();
        assert_eq!(r.equipment, Some(EquipmentId(3)));
        r.start_or_resume(4.0).unwrap();
        r.start_or_resume(5.0).unwrap();
        assert_eq!(r.start_time, Some(4.0));
        r.sync(6.0).unwrap();
        assert!(r.finish_or_fail(7.0));
        assert!(r.is_finished());
        assert!(!r.finish_or_fail(8.0));
        assert_eq!(r.finish_time, Some(7.0));
    }

    #[test]
    fn schedule_requires_ready() {
        let mut r = store(1, 0);
        assert!(matches!(
            r.schedule(EquipmentId(0)),
            Err(RequestError::InvalidTransition { action: "schedule", .. })
        ));
    }

    #[test]
    fn recoverable_rejection_resubmits() {
        let mut r = started(store(1, 0));
        assert!(r.reject(3.0, conflict()).unwrap());
        assert_eq!(r.state, RequestState::REJECTED);
        assert_eq!(r.start_time, None);
        assert_eq!(r.reject_count, 1);
        assert!(!r.finish_or_fail(4.0));

        r.ready(5.0).unwrap();
        assert_eq!(r.state, RequestState::RESUME_READY);
        assert_eq!(r.ready_since(), 5.0);
        r.schedule(EquipmentId(0)).unwrap();
        r.start_or_resume(6.0).unwrap();
        assert_eq!(r.state, RequestState::STARTED);
    }

    #[test]
    fn one_time_attempt_is_not_resubmitted() {
        let mut r = started(relocate(2));
        r.one_time_attempt = true;
        assert!(!r.reject(3.0, Rejection::AcquireFail { columns: vec![Column::new(1, 0)] }).unwrap());
        assert!(r.failure.is_none());
    }

    #[test]
    fn undefined_rejection_fails_request() {
        let mut r = started(store(1, 0));
        assert!(!r.reject(3.0, Rejection::Undefined("no slot".into())).unwrap());
        assert!(r.is_failed());
        assert!(r.ready(4.0).is_err());
    }

    #[test]
    fn reject_from_ready_is_invalid() {
        let mut r = store(1, 0);
        r.ready(0.0).unwrap();
        assert!(r.reject(1.0, conflict()).is_err());
    }

    #[test]
    fn pending_columns_clear_one_by_one() {
        let mut r = store(1, 0);
        r.wait_on(Column::new(1, 0));
        r.wait_on(Column::new(2, 0));
        assert!(!r.on_resource_release(Column::new(1, 0)));
        assert!(r.on_resource_release(Column::new(2, 0)));
    }

    #[test]
    fn stray_release_is_not_a_wake_up() {
        let mut r = store(1, 0);
        assert!(!r.on_resource_release(Column::new(4, 2)));

        r.wait_on(Column::new(1, 0));
        assert!(!r.on_resource_release(Column::new(4, 2)));
        assert_eq!(r.pending_columns.len(), 1);
        assert!(r.on_resource_release(Column::new(1, 0)));
        assert!(!r.on_resource_release(Column::new(1, 0)));
    }

    #[test]
    fn rejection_labels() {
        assert_eq!(conflict().label(), "equipment_conflict");
        assert!(Rejection::BoxBeingOperated(BoxId(1)).is_recoverable());
        assert!(!Rejection::Undefined(String::new()).is_recoverable());
    }
}

// ── Signals ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod signals {
    use super::*;

    #[test]
    fn link_checks_kind() {
        let mut r = store(1, 0);
        r.signals.link(Signal::InBlock, noop).unwrap();
        assert!(r.signals.is_linked(Signal::InBlock));
        assert!(matches!(
            r.signals.link(Signal::OffBlock, noop),
            Err(RequestError::SignalNotAllowed { kind: RequestKind::Store, signal: Signal::OffBlock })
        ));
        assert_eq!(r.signals.get(Signal::InBlock).map(|h| h(5)), Some(5));
    }

    #[test]
    fn relocation_signals_belong_to_retrieve_and_relocate() {
        for s in [Signal::RelocateStart, Signal::PickUp, Signal::PutDown, Signal::RelocateFinish] {
            assert!(s.allowed_for(RequestKind::Retrieve));
            assert!(s.allowed_for(RequestKind::Relocate));
            assert!(!s.allowed_for(RequestKind::Store));
            assert!(!s.allowed_for(RequestKind::Adjust));
        }
        assert!(Signal::ALL.iter().enumerate().all(|(i, s)| s.index() == i));
        assert_eq!(Signal::OffAgv.to_string(), "off_agv");
    }
}

// ── Pool ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod pool {
    use super::*;

    #[test]
    fn lane_queue_chains_predecessors() {
        let mut pool = RequestPool::new();
        let mut reqs = HashMap::new();
        for id in 1..=3 {
            let mut r = store(id, 0);
            r.ready(0.0).unwrap();
            assert_eq!(pool.push(&mut r).unwrap(), PoolSlot::Access(LaneId(0)));
            reqs.insert(r.id, r);
        }
        assert_eq!(reqs[&RequestId(1)].predecessor, None);
        assert_eq!(reqs[&RequestId(2)].predecessor, Some(RequestId(1)));
        assert_eq!(reqs[&RequestId(3)].predecessor, Some(RequestId(2)));

        assert_eq!(pool.available(EquipmentId(0), lookup(&reqs)), vec![RequestId(1)]);
        pool.pop(RequestId(1)).unwrap();
        // head is now 2, but 1 has not started yet
        assert!(pool.available(EquipmentId(0), lookup(&reqs)).is_empty());

        let r1 = reqs.get_mut(&RequestId(1)).unwrap();
        r1.schedule(EquipmentId(0)).unwrap();
        r1.start_or_resume(1.0).unwrap();
        assert_eq!(pool.available(EquipmentId(0), lookup(&reqs)), vec![RequestId(2)]);
    }

    #[test]
    fn local_and_free_pools() {
        let mut pool = RequestPool::new();
        let mut reqs = HashMap::new();
        let mut bound = relocate(1);
        bound.equipment = Some(EquipmentId(1));
        let mut free = relocate(2);
        pool.push(&mut bound).unwrap();
        pool.push(&mut free).unwrap();
        reqs.insert(bound.id, bound);
        reqs.insert(free.id, free);

        assert_eq!(pool.available(EquipmentId(1), lookup(&reqs)), vec![RequestId(1), RequestId(2)]);
        assert_eq!(pool.available(EquipmentId(0), lookup(&reqs)), vec![RequestId(2)]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn double_push_and_missing_pop() {
        let mut pool = RequestPool::new();
        let mut r = relocate(1);
        pool.push(&mut r).unwrap();
        assert!(matches!(pool.push(&mut r), Err(RequestError::AlreadyQueued(_))));
        pool.pop(r.id).unwrap();
        assert!(matches!(pool.pop(r.id), Err(RequestError::NotQueued(_))));
        assert!(pool.is_empty());
    }

    #[test]
    fn dispatcher_filters_unready() {
        let mut d = Dispatcher::new();
        let mut reqs = HashMap::new();
        let mut a = relocate(1);
        let mut b = relocate(2);
        assert_eq!(d.submit(0.0, &mut a, true).unwrap(), Wake::All);
        d.submit(0.0, &mut b, false).unwrap();
        reqs.insert(a.id, a);
        reqs.insert(b.id, b);
        assert_eq!(d.candidates(EquipmentId(0), lookup(&reqs)), vec![RequestId(1)]);
        assert!(d.is_queued(RequestId(2)));
        d.take(RequestId(1)).unwrap();
        assert!(!d.is_queued(RequestId(1)));
    }
}
