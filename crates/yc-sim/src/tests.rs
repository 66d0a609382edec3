//! Integration tests for yc-sim.

use yc_core::{
    BlockId, BoxId, Cell, Column, EquipmentId, LaneId, OperationId, Priority, RequestId, SimRng, V3,
    YardConfig,
};
use yc_request::{Intent, Rejection, Request, RequestKind, RequestState};

use crate::{
    BlockLayout, BoxState, CraneConfig, DefaultPolicy, Event, EventQueue, GridLayout, Interference, JobPolicy,
    NearestColumnAllocator, NoopObserver, OpKind, OpState, ProbeEvent, SimError, SlotAllocator,
    StackView, Yard, YardBuilder, YardObserver,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn single_crane(layout: GridLayout) -> (Yard, BlockId) {
    let mut b = YardBuilder::new(YardConfig::default());
    let block = b.block(layout);
    b.crane(block, CraneConfig::default());
    (b.build().unwrap(), block)
}

fn twin_cranes(layout: GridLayout, sample: f64) -> (Yard, BlockId) {
    let mut b = YardBuilder::new(YardConfig::default());
    let block = b.block(layout);
    b.crane(block, CraneConfig::default());
    b.crane(block, CraneConfig::default());
    (b.sample_interval(sample).build().unwrap(), block)
}

/// Collects probes and the smallest gantry gap seen in samples.
#[derive(Default)]
struct Recorder {
    probes:  Vec<(f64, ProbeEvent)>,
    samples: usize,
    min_gap: Option<f64>,
    ended:   bool,
}

impl YardObserver for Recorder {
    fn on_probe(&mut self, time: f64, event: &ProbeEvent) {
        self.probes.push((time, event.clone()));
    }

    fn on_sample(&mut self, _time: f64, positions: &[(EquipmentId, V3)]) {
        self.samples += 1;
        if let [(_, a), (_, b)] = positions {
            let gap = (a.x - b.x).abs();
            self.min_gap = Some(self.min_gap.map_or(gap, |g: f64| g.min(gap)));
        }
    }

    fn on_run_end(&mut self, _time: f64) {
        self.ended = true;
    }
}

impl Recorder {
    fn count(&self, name: &str) -> usize {
        self.probes.iter().filter(|(_, e)| e.name() == name).count()
    }
}

fn store_at(yard: &mut Yard, time: f64, block: BlockId, bay: u16, row: u16) -> (BoxId, RequestId) {
    let tier = yard.block(block).unwrap().height(Column::new(bay, row));
    yard.store(time, block, LaneId(0), Some(Cell::new(bay, row, tier))).unwrap()
}

/// Two cranes on a 16-bay block, the second starting at `bay` instead of
/// the far end of the rail.
fn twin_cranes_with_peer_at(bay: u16) -> (Yard, BlockId) {
    let mut b = YardBuilder::new(YardConfig::default());
    let block = b.block(GridLayout::new(16, 6, 6));
    b.crane(block, CraneConfig::default());
    b.crane(block, CraneConfig { initial_bay: Some(bay), ..CraneConfig::default() });
    (b.sample_interval(1.0).build().unwrap(), block)
}

fn rejections_of(rec: &Recorder, request: RequestId) -> Vec<Rejection> {
    rec.probes
        .iter()
        .filter_map(|(_, e)| match e {
            ProbeEvent::RequestRejected { request: r, reason, .. } if *r == request => Some(reason.clone()),
            _ => None,
        })
        .collect()
}

/// Cranes that ran an operation of `kind` ending in `state`.
fn ops_of_kind(yard: &Yard, kind: OpKind, state: OpState) -> Vec<EquipmentId> {
    yard.operations()
        .iter()
        .filter(|op| op.kind == kind && op.state == state)
        .map(|op| op.equipment)
        .collect()
}

fn ops_of(yard: &Yard, request: RequestId) -> Vec<(OpKind, OpState)> {
    yard.operations()
        .iter()
        .filter(|op| op.request == Some(request))
        .map(|op| (op.kind, op.state))
        .collect()
}

// ── Event queue ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod event_queue {
    use super::*;

    #[test]
    fn earlier_time_first() {
        let mut q = EventQueue::new();
        q.push(5.0, Priority::Callback, Event::Submit(RequestId(0)));
        q.push(1.0, Priority::Forever, Event::Submit(RequestId(1)));
        assert_eq!(q.pop().unwrap().event, Event::Submit(RequestId(1)));
    }

    #[test]
    fn priority_breaks_time_ties() {
        let mut q = EventQueue::new();
        q.push(2.0, Priority::Schedule, Event::Submit(RequestId(0)));
        q.push(2.0, Priority::Callback, Event::Submit(RequestId(1)));
        q.push(2.0, Priority::OperationFinish, Event::Submit(RequestId(2)));
        let order: Vec<Event> = std::iter::from_fn(|| q.pop().map(|e| e.event)).collect();
        assert_eq!(order, vec![
            Event::Submit(RequestId(1)),
            Event::Submit(RequestId(2)),
            Event::Submit(RequestId(0)),
        ]);
    }

    #[test]
    fn insertion_order_breaks_full_ties() {
        let mut q = EventQueue::new();
        for i in 0..4 {
            q.push(0.0, Priority::Request, Event::Retry(RequestId(i)));
        }
        for i in 0..4 {
            assert_eq!(q.pop().unwrap().event, Event::Retry(RequestId(i)));
        }
    }

    #[test]
    fn samples_are_not_pending_work() {
        let mut q = EventQueue::new();
        q.push(0.0, Priority::Observe, Event::Sample);
        assert_eq!(q.pending_work(), 0);
        q.push(0.0, Priority::Request, Event::Submit(RequestId(0)));
        assert_eq!(q.pending_work(), 1);
        assert_eq!(q.len(), 2);
    }
}

// ── Layout ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod layout {
    use super::*;

    #[test]
    fn bay_centres() {
        let l = GridLayout::new(16, 6, 6);
        assert!((l.bay_x(0) - 3.2).abs() < 1e-9);
        assert!((l.length() - 102.4).abs() < 1e-9);
    }

    #[test]
    fn cell_height_is_top_of_box() {
        let l = GridLayout::new(4, 3, 5);
        let p = l.cell_coord(Cell::new(1, 2, 0));
        assert!((p.z - 2.9).abs() < 1e-9);
        assert!((p.y - 7.0).abs() < 1e-9);
    }

    #[test]
    fn missing_lane_is_none() {
        let l = GridLayout::new(4, 3, 5);
        assert!(l.lane_coord(LaneId(0), 1).is_some());
        assert!(l.lane_coord(LaneId(1), 1).is_none());
    }

    #[test]
    fn contains_checks_every_axis() {
        let l = GridLayout::new(4, 3, 5);
        assert!(l.contains(Cell::new(3, 2, 4)));
        assert!(!l.contains(Cell::new(4, 0, 0)));
        assert!(!l.contains(Cell::new(0, 3, 0)));
        assert!(!l.contains(Cell::new(0, 0, 5)));
    }
}

// ── Block stacks ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod block {
    use super::*;
    use crate::Block;

    #[test]
    fn reserve_fills_bottom_up() {
        let mut b = Block::new(BlockId(0), GridLayout::new(2, 2, 2));
        let col = Column::new(1, 1);
        assert_eq!(b.reserve(col, BoxId(0)), Some(Cell::new(1, 1, 0)));
        assert_eq!(b.reserve(col, BoxId(1)), Some(Cell::new(1, 1, 1)));
        assert_eq!(b.reserve(col, BoxId(2)), None);
        assert!(b.is_full(col));
    }

    #[test]
    fn remove_reports_shifted_boxes() {
        let mut b = Block::new(BlockId(0), GridLayout::new(2, 2, 4));
        let col = Column::new(0, 0);
        for i in 0..3 {
            b.reserve(col, BoxId(i));
        }
        assert_eq!(b.remove(col, BoxId(0)), vec![BoxId(1), BoxId(2)]);
        assert_eq!(b.column(col), &[BoxId(1), BoxId(2)]);
        assert!(b.remove(col, BoxId(9)).is_empty());
    }

    #[test]
    fn above_and_below() {
        let mut b = Block::new(BlockId(0), GridLayout::new(2, 2, 4));
        let col = Column::new(0, 1);
        for i in 0..3 {
            b.reserve(col, BoxId(i));
        }
        assert_eq!(b.above(Cell::new(0, 1, 0)), &[BoxId(1), BoxId(2)]);
        assert_eq!(b.below(Cell::new(0, 1, 2)), &[BoxId(0), BoxId(1)]);
    }

    #[test]
    fn bays_within_reach() {
        let b = Block::new(BlockId(0), GridLayout::new(16, 2, 4));
        assert_eq!(b.bays_within(0.0, 63.9), Some((0, 9)));
        assert_eq!(b.bays_within(38.5, 102.4), Some((6, 15)));
        assert_eq!(b.bays_within(200.0, 300.0), None);
    }
}

// ── Scheduling policy ─────────────────────────────────────────────────────────

#[cfg(test)]
mod policy {
    use super::*;
    use crate::SignalHandler;

    fn req(id: u32, intent: Intent, time: f64) -> Request<SignalHandler> {
        let mut r = Request::new(RequestId(id), intent, BlockId(0), time);
        r.ready(time).unwrap();
        r
    }

    #[test]
    fn adjust_outranks_everything() {
        let adjust = req(0, Intent::Adjust { target: 0.0, blocked: EquipmentId(1), blocking_request: None }, 50.0);
        let store = req(1, Intent::Store { box_id: BoxId(0), lane: LaneId(0) }, 0.0);
        assert!(DefaultPolicy.rank(&adjust) < DefaultPolicy.rank(&store));
    }

    #[test]
    fn resumed_before_new() {
        let fresh = req(0, Intent::Store { box_id: BoxId(0), lane: LaneId(0) }, 0.0);
        let mut resumed = req(1, Intent::Store { box_id: BoxId(1), lane: LaneId(0) }, 10.0);
        resumed.schedule(EquipmentId(0)).unwrap();
        resumed.reject(20.0, yc_request::Rejection::BoxBeingOperated(BoxId(0))).unwrap();
        resumed.ready(30.0).unwrap();
        assert_eq!(resumed.state, RequestState::RESUME_READY);
        assert_eq!(DefaultPolicy.rank(&resumed), (1, 30.0));
        assert!(DefaultPolicy.rank(&resumed) < DefaultPolicy.rank(&fresh));
    }
}

// ── Slot allocation ───────────────────────────────────────────────────────────

#[cfg(test)]
mod allocator {
    use super::*;
    use crate::{Block, BoxRecord};

    fn stored(block: &mut Block, boxes: &mut Vec<BoxRecord>, col: Column) {
        let id = BoxId(boxes.len() as u32);
        let cell = block.reserve(col, id).unwrap();
        let mut rec = BoxRecord::allocated(id, BlockId(0), cell, 0.0);
        rec.state = BoxState::Stored;
        boxes.push(rec);
    }

    #[test]
    fn store_prefers_lowest_stack() {
        let mut block = Block::new(BlockId(0), GridLayout::new(2, 2, 3));
        let mut boxes = Vec::new();
        for col in [Column::new(0, 0), Column::new(0, 1), Column::new(1, 0)] {
            stored(&mut block, &mut boxes, col);
        }
        let cell = NearestColumnAllocator.slot_for_store(StackView::new(&block, &boxes), LaneId(0));
        assert_eq!(cell, Some(Cell::new(1, 1, 0)));
    }

    #[test]
    fn relocation_stays_close_and_avoids_source() {
        let block = Block::new(BlockId(0), GridLayout::new(5, 3, 3));
        let from = Column::new(2, 1);
        let cell = NearestColumnAllocator.slot_for_relocation(StackView::new(&block, &[]), from, (0, 4));
        let cell = cell.unwrap();
        assert_eq!(cell.bay, 2);
        assert_ne!(cell.column(), from);
    }

    #[test]
    fn relocation_skips_unsettled_columns() {
        let mut block = Block::new(BlockId(0), GridLayout::new(1, 3, 3));
        let mut boxes = Vec::new();
        stored(&mut block, &mut boxes, Column::new(0, 0));
        // Reserved for an incoming box, not there yet.
        let id = BoxId(boxes.len() as u32);
        let cell = block.reserve(Column::new(0, 1), id).unwrap();
        boxes.push(BoxRecord::allocated(id, BlockId(0), cell, 0.0));

        let got = NearestColumnAllocator.slot_for_relocation(StackView::new(&block, &boxes), Column::new(0, 0), (0, 0));
        assert_eq!(got, Some(Cell::new(0, 2, 0)));
    }

    #[test]
    fn relocation_respects_bay_range() {
        let block = Block::new(BlockId(0), GridLayout::new(4, 1, 2));
        let got = NearestColumnAllocator.slot_for_relocation(StackView::new(&block, &[]), Column::new(0, 0), (3, 3));
        assert_eq!(got.map(|c| c.bay), Some(3));
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use super::*;

    #[test]
    fn twin_cranes_get_disjoint_edges() {
        let (yard, _) = twin_cranes(GridLayout::new(16, 6, 6), 1.0);
        let a = yard.equipment(EquipmentId(0)).unwrap();
        let b = yard.equipment(EquipmentId(1)).unwrap();
        assert!((a.reach.0 - 0.0).abs() < 1e-9);
        assert!((b.reach.1 - 102.4).abs() < 1e-9);
        assert!(b.position().x - a.position().x >= yard.config().check_clearance());
    }

    #[test]
    fn short_rail_is_rejected() {
        let mut b = YardBuilder::new(YardConfig::default());
        let block = b.block(GridLayout::new(4, 6, 6));
        b.crane(block, CraneConfig::default());
        b.crane(block, CraneConfig::default());
        assert!(matches!(b.build(), Err(SimError::Config(_))));
    }

    #[test]
    fn low_travel_height_is_rejected() {
        let mut b = YardBuilder::new(YardConfig::default());
        let block = b.block(GridLayout::new(8, 6, 6));
        b.crane(block, CraneConfig { travel_height: 15.0, ..CraneConfig::default() });
        assert!(matches!(b.build(), Err(SimError::Config(_))));
    }

    #[test]
    fn initial_bay_out_of_reach_is_rejected() {
        let mut b = YardBuilder::new(YardConfig::default());
        let block = b.block(GridLayout::new(16, 6, 6));
        b.crane(block, CraneConfig { initial_bay: Some(15), ..CraneConfig::default() });
        b.crane(block, CraneConfig::default());
        assert!(b.build().is_err());
    }
}

// ── Request API ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod requests {
    use super::*;

    #[test]
    fn store_reserves_immediately() {
        let (mut yard, block) = single_crane(GridLayout::new(4, 2, 3));
        let (box_id, _) = store_at(&mut yard, 0.0, block, 1, 1);
        let rec = yard.box_record(box_id).unwrap();
        assert_eq!(rec.state, BoxState::Allocated);
        assert_eq!(yard.block(block).unwrap().height(Column::new(1, 1)), 1);
    }

    #[test]
    fn store_rejects_floating_cell() {
        let (mut yard, block) = single_crane(GridLayout::new(4, 2, 3));
        let err = yard.store(0.0, block, LaneId(0), Some(Cell::new(0, 0, 1))).unwrap_err();
        assert!(matches!(err, SimError::InvalidCell { .. }));
    }

    #[test]
    fn unknown_lane_is_an_error() {
        let (mut yard, block) = single_crane(GridLayout::new(4, 2, 3));
        let err = yard.store(0.0, block, LaneId(3), None).unwrap_err();
        assert!(matches!(err, SimError::UnknownLane { .. }));
    }

    #[test]
    fn past_time_is_an_error() {
        let (mut yard, block) = single_crane(GridLayout::new(4, 2, 3));
        store_at(&mut yard, 10.0, block, 0, 0);
        yard.run(&mut NoopObserver).unwrap();
        let err = yard.store(0.0, block, LaneId(0), None).unwrap_err();
        assert!(matches!(err, SimError::PastTime { .. }));
    }
}

// ── End-to-end runs ───────────────────────────────────────────────────────────

#[cfg(test)]
mod runs {
    use super::*;

    #[test]
    fn store_then_retrieve() {
        let (mut yard, block) = single_crane(GridLayout::new(8, 4, 4));
        let (box_id, store) = store_at(&mut yard, 0.0, block, 5, 2);
        let retrieve = yard.retrieve(300.0, box_id, LaneId(0)).unwrap();
        let mut rec = Recorder::default();
        yard.run(&mut rec).unwrap();

        assert!(yard.request(store).unwrap().is_finished());
        assert!(yard.request(retrieve).unwrap().is_finished());
        assert_eq!(yard.box_record(box_id).unwrap().state, BoxState::Retrieved);
        assert_eq!(yard.block(block).unwrap().box_count(), 0);
        assert_eq!(rec.count("request.finished"), 2);
        assert!(rec.ended);
        assert_eq!(yard.pending_work(), 0);
    }

    #[test]
    fn signals_follow_the_physical_order() {
        let (mut yard, block) = single_crane(GridLayout::new(8, 4, 4));
        let (_, store) = store_at(&mut yard, 0.0, block, 2, 0);
        yard.run(&mut NoopObserver).unwrap();
        let r = yard.request(store).unwrap();
        let (start, sync, finish) = (r.start_time.unwrap(), r.sync_time.unwrap(), r.finish_time.unwrap());
        assert!(start <= sync && sync < finish);
        assert_eq!(ops_of(&yard, store), vec![(OpKind::Store, OpState::Finished)]);
    }

    #[test]
    fn retrieve_digs_out_buried_box() {
        let (mut yard, block) = single_crane(GridLayout::new(8, 4, 4));
        let (x, _) = store_at(&mut yard, 0.0, block, 3, 0);
        let (y, _) = store_at(&mut yard, 0.0, block, 3, 0);
        let (z, _) = store_at(&mut yard, 0.0, block, 3, 0);
        let retrieve = yard.retrieve(100.0, x, LaneId(0)).unwrap();
        yard.run(&mut NoopObserver).unwrap();

        assert!(yard.request(retrieve).unwrap().is_finished());
        let done: Vec<OpKind> = ops_of(&yard, retrieve)
            .into_iter()
            .filter(|(_, s)| *s == OpState::Finished)
            .map(|(k, _)| k)
            .collect();
        assert_eq!(done, vec![OpKind::Relocate, OpKind::Relocate, OpKind::Retrieve]);

        let retrieve_op = yard
            .operations()
            .iter()
            .find(|op| op.request == Some(retrieve) && op.kind == OpKind::Retrieve)
            .unwrap();
        assert_eq!(retrieve_op.src.map(|c| c.column()), Some(Column::new(3, 0)));

        for id in [y, z] {
            let b = yard.box_record(id).unwrap();
            assert_eq!(b.state, BoxState::Stored);
            assert_eq!(b.relocations, 1);
            assert_ne!(b.cell.column(), Column::new(3, 0));
        }
    }

    #[test]
    fn explicit_relocation_moves_box() {
        let (mut yard, block) = single_crane(GridLayout::new(8, 4, 4));
        let (b, _) = store_at(&mut yard, 0.0, block, 1, 1);
        let req = yard.relocate(200.0, b, Some(Cell::new(6, 3, 0))).unwrap();
        yard.run(&mut NoopObserver).unwrap();
        assert!(yard.request(req).unwrap().is_finished());
        assert_eq!(yard.box_record(b).unwrap().cell, Cell::new(6, 3, 0));
    }

    #[test]
    fn relocation_onto_own_column_fails() {
        let (mut yard, block) = single_crane(GridLayout::new(8, 4, 4));
        let (b, _) = store_at(&mut yard, 0.0, block, 1, 1);
        let req = yard.relocate(200.0, b, Some(Cell::new(1, 1, 1))).unwrap();
        let mut rec = Recorder::default();
        yard.run(&mut rec).unwrap();
        assert!(yard.request(req).unwrap().is_failed());
        assert_eq!(rec.count("request.failed"), 1);
    }

    #[test]
    fn abort_on_undefined_stops_the_run() {
        let mut b = YardBuilder::new(YardConfig { abort_on_undefined: true, ..YardConfig::default() });
        let block = b.block(GridLayout::new(8, 4, 4));
        b.crane(block, CraneConfig::default());
        let mut yard = b.build().unwrap();
        let (x, _) = store_at(&mut yard, 0.0, block, 1, 1);
        yard.relocate(200.0, x, Some(Cell::new(1, 1, 1))).unwrap();
        assert!(matches!(yard.run(&mut NoopObserver), Err(SimError::Aborted { .. })));
    }

    #[test]
    fn run_until_stops_early_and_resumes() {
        let (mut yard, block) = single_crane(GridLayout::new(8, 4, 4));
        let (_, store) = store_at(&mut yard, 0.0, block, 7, 3);
        yard.run_until(1.0, &mut NoopObserver).unwrap();
        assert!(!yard.request(store).unwrap().is_finished());
        yard.run(&mut NoopObserver).unwrap();
        assert!(yard.request(store).unwrap().is_finished());
    }

    #[test]
    fn twin_cranes_keep_their_distance() {
        let (mut yard, block) = twin_cranes(GridLayout::new(16, 6, 6), 1.0);
        let mut rng = SimRng::new(7);
        let mut stores = Vec::new();
        while stores.len() < 40 {
            let bay = rng.gen_range(0..16u16);
            let row = rng.gen_range(0..6u16);
            if yard.block(block).unwrap().is_full(Column::new(bay, row)) {
                continue;
            }
            let time = stores.len() as f64 * 60.0;
            stores.push(store_at(&mut yard, time, block, bay, row).1);
        }

        let mut rec = Recorder::default();
        yard.run(&mut rec).unwrap();

        assert!(rec.samples > 0);
        let gap = rec.min_gap.unwrap();
        assert!(gap >= yard.config().clearance, "cranes came within {gap} m");

        let finished = stores.iter().filter(|id| yard.request(**id).unwrap().is_finished()).count();
        let undefined = stores
            .iter()
            .filter(|id| matches!(yard.request(**id).unwrap().failure, Some(Rejection::Undefined(_))))
            .count();
        assert_eq!(finished, stores.len() - undefined);
        assert!(yard.requests().iter().all(|r| r.kind() != RequestKind::Adjust || r.equipment.is_some()));
    }
}

// ── Interference ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod interference {
    use super::*;

    #[test]
    fn every_conflict_is_recoverable() {
        let op = OperationId(3);
        let peer = EquipmentId(1);
        assert!(Interference::Clear.rejection(op).is_none());
        for found in [
            Interference::Idle { peer, target: 90.0 },
            Interference::Busy { peer },
            Interference::Unresolvable { peer },
        ] {
            let why = found.rejection(op).unwrap();
            assert!(why.is_recoverable(), "{found:?}");
            assert!(matches!(why, Rejection::EquipmentConflict { peer: p, .. } if p == peer));
        }
        assert!(matches!(
            Interference::Unresolvable { peer }.rejection(op),
            Some(Rejection::EquipmentConflict { new_pos: None, .. })
        ));
    }

    #[test]
    fn immovable_peer_is_retried_not_failed() {
        let (mut yard, block) = twin_cranes_with_peer_at(8);
        // Pin the peer where it stands, so it cannot make way.
        let reach = yard.equipment[1].reach;
        let x = yard.equipment[1].position().x;
        yard.equipment[1].reach = (x, x);
        let (_, store) = store_at(&mut yard, 0.0, block, 9, 2);

        let mut rec = Recorder::default();
        yard.run_until(600.0, &mut rec).unwrap();
        let r = yard.request(store).unwrap();
        assert!(!r.is_failed());
        assert!(!r.is_finished());
        assert!(r.reject_count >= 2, "only {} attempts", r.reject_count);
        assert!(matches!(
            r.last_rejection,
            Some(Rejection::EquipmentConflict { peer: EquipmentId(1), new_pos: None, .. })
        ));
        assert!(yard.requests().iter().all(|r| r.kind() != RequestKind::Adjust));
        assert_eq!(rec.count("request.failed"), 0);

        // Once the peer may move again, the next attempt clears the way.
        yard.equipment[1].reach = reach;
        yard.run(&mut rec).unwrap();
        assert!(yard.request(store).unwrap().is_finished());
        assert_eq!(ops_of_kind(&yard, OpKind::Adjust, OpState::Finished), vec![EquipmentId(1)]);
    }

    #[test]
    fn idle_peer_in_the_way_is_moved_aside() {
        let (mut yard, block) = twin_cranes_with_peer_at(8);
        let (_, store) = store_at(&mut yard, 0.0, block, 9, 2);
        let mut rec = Recorder::default();
        yard.run(&mut rec).unwrap();

        assert_eq!(ops_of_kind(&yard, OpKind::Adjust, OpState::Finished), vec![EquipmentId(1)]);
        let adjust = yard.requests().iter().find(|r| r.kind() == RequestKind::Adjust).unwrap();
        assert_eq!(adjust.equipment, Some(EquipmentId(1)));
        assert!(adjust.is_finished());
        assert_eq!(rec.count("equipment.conflict"), 1);

        let r = yard.request(store).unwrap();
        assert!(r.is_finished());
        assert!(r.reject_count >= 1);
        assert!(rejections_of(&rec, store)
            .iter()
            .all(|why| matches!(why, Rejection::EquipmentConflict { peer: EquipmentId(1), .. })));

        let blocked = yard.equipment(EquipmentId(0)).unwrap();
        assert_eq!(blocked.blocked_by(), None);
        assert!(rec.min_gap.unwrap() >= yard.config().clearance);
    }
}

// ── Contention ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod contention {
    use super::*;

    #[test]
    fn lock_waiter_resumes_when_column_frees() {
        let (mut yard, block) = twin_cranes(GridLayout::new(16, 6, 6), 1.0);
        let (a, _) = store_at(&mut yard, 0.0, block, 7, 0);
        let (b, _) = store_at(&mut yard, 600.0, block, 9, 3);
        // Both want column (7, 0): one takes a out of it, the other puts b on it.
        let retrieve = yard.retrieve(2000.0, a, LaneId(0)).unwrap();
        let relocate = yard.relocate(2000.0, b, Some(Cell::new(7, 0, 1))).unwrap();

        let mut rec = Recorder::default();
        yard.run(&mut rec).unwrap();

        let waited: Vec<RequestId> = [retrieve, relocate]
            .into_iter()
            .filter(|id| {
                rejections_of(&rec, *id)
                    .iter()
                    .any(|why| matches!(why, Rejection::AcquireFail { columns } if columns.contains(&Column::new(7, 0))))
            })
            .collect();
        assert_eq!(waited.len(), 1, "exactly one request should wait on the column");

        for id in [retrieve, relocate] {
            let r = yard.request(id).unwrap();
            assert!(r.is_finished(), "{id} did not finish");
            assert!(r.pending_columns.is_empty());
        }
        assert_eq!(yard.box_record(a).unwrap().state, BoxState::Retrieved);
        assert_eq!(yard.box_record(b).unwrap().state, BoxState::Stored);
        assert_eq!(yard.block(block).unwrap().locks().locked_count(), 0);
    }

    #[test]
    fn new_work_interrupts_a_park_move() {
        let (mut yard, block) = single_crane(GridLayout::new(8, 4, 4));
        store_at(&mut yard, 0.0, block, 6, 3);

        // Step until the crane is raising its spreader after the store.
        let mut t = 0.0;
        let park = loop {
            t += 0.25;
            assert!(t < 3600.0, "crane never parked");
            yard.run_until(t, &mut NoopObserver).unwrap();
            let unit = yard.equipment(EquipmentId(0)).unwrap();
            if let Some(op) = unit.current_op().and_then(|id| yard.operation(id)) {
                if op.kind == OpKind::Move {
                    break op.id;
                }
            }
        };

        let (_, next) = store_at(&mut yard, t, block, 1, 0);
        let mut rec = Recorder::default();
        yard.run(&mut rec).unwrap();

        let op = yard.operation(park).unwrap();
        assert_eq!(op.state, OpState::Cancelled);
        assert_eq!(op.request, None);
        assert!(op.start <= t);
        assert!((op.finish - t).abs() < 1e-9, "interrupted at {}", op.finish);
        assert!(yard.request(next).unwrap().is_finished());
        assert_eq!(ops_of(&yard, next), vec![(OpKind::Store, OpState::Finished)]);
    }
}
