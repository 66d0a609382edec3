//! Turning an intent into a workflow of axis moves, dwells and signals.
//!
//! Each operation is a flat sequence of top-level steps.  Crossing to
//! another column is hoist-up first, then gantry and trolley together with
//! the hoist lowering only once both horizontal axes are in place.

use yc_core::{Axis, BlockId, Cell, LaneId, V3, YardConfig};
use yc_motion::LoadState;
use yc_request::Signal;
use yc_workflow::Workflow;

use crate::{BlockLayout, CraneConfig, GridLayout, SimError, SimResult};

const SAME_COLUMN_EPS: f64 = 1e-6;

/// Everything the builders need to know about where a crane works.
pub(crate) struct Site<'a> {
    pub block:  BlockId,
    pub layout: &'a GridLayout,
    pub config: &'a YardConfig,
    pub crane:  &'a CraneConfig,
}

impl Site<'_> {
    fn lane(&self, lane: LaneId, bay: u16) -> SimResult<V3> {
        self.layout
            .lane_coord(lane, bay)
            .ok_or(SimError::UnknownLane { block: self.block, lane })
    }

    fn lifted(&self, at: V3) -> V3 {
        at.with(Axis::Hoist, at.z + self.config.height_clearance)
    }
}

/// Accumulates steps while tracking where the spreader will be.
pub(crate) struct StepWriter {
    wf:            Workflow<Signal>,
    pos:           V3,
    travel_height: f64,
    interruptible: bool,
}

impl StepWriter {
    pub fn new(sample_interval: f64, from: V3, travel_height: f64) -> Self {
        Self { wf: Workflow::new(sample_interval), pos: from, travel_height, interruptible: false }
    }

    pub fn interruptible(mut self, on: bool) -> Self {
        self.interruptible = on;
        self
    }

    pub fn signal(&mut self, signal: Signal) -> SimResult<()> {
        let step = self.wf.callback(signal);
        self.wf.add(step)?;
        Ok(())
    }

    pub fn hoist(&mut self, z: f64, load: LoadState) -> SimResult<()> {
        let step = self.wf.move_axis(Axis::Hoist, self.pos.z, z, self.interruptible, load);
        self.wf.add(step)?;
        self.pos.z = z;
        Ok(())
    }

    pub fn gantry(&mut self, x: f64, load: LoadState) -> SimResult<()> {
        let step = self.wf.move_axis(Axis::Gantry, self.pos.x, x, self.interruptible, load);
        self.wf.add(step)?;
        self.pos.x = x;
        Ok(())
    }

    /// Spreader holds still while a box is locked or unlocked.
    pub fn dwell(&mut self, duration: f64) -> SimResult<()> {
        let step = self.wf.wait(duration, Some(Axis::Hoist));
        self.wf.add(step)?;
        Ok(())
    }

    pub fn travel(&mut self, to: V3, load: LoadState) -> SimResult<()> {
        if self.pos.same_column(to, SAME_COLUMN_EPS) {
            return self.hoist(to.z, load);
        }
        self.hoist(self.travel_height, load)?;
        let i = self.interruptible;
        let gantry = self.wf.move_axis(Axis::Gantry, self.pos.x, to.x, i, load);
        let trolley = self.wf.move_axis(Axis::Trolley, self.pos.y, to.y, i, load);
        let lower = self.wf.move_axis(Axis::Hoist, self.travel_height, to.z, i, load);
        self.wf.after(lower, gantry)?;
        self.wf.after(lower, trolley)?;
        let group = self.wf.all(vec![gantry, trolley, lower]);
        self.wf.add(group)?;
        self.pos = to;
        Ok(())
    }

    pub fn finish(self) -> Workflow<Signal> {
        self.wf
    }
}

fn writer(site: &Site<'_>, from: V3) -> StepWriter {
    StepWriter::new(site.config.path_sample_interval, from, site.crane.travel_height)
}

/// Lane → cell.
pub(crate) fn store(site: &Site<'_>, from: V3, lane: LaneId, cell: Cell) -> SimResult<Workflow<Signal>> {
    let pick = site.lane(lane, cell.bay)?;
    let put = site.layout.cell_coord(cell);
    let mut w = writer(site, from);
    w.signal(Signal::StartOrResume)?;
    w.travel(site.lifted(pick), LoadState::Empty)?;
    w.hoist(pick.z, LoadState::Empty)?;
    w.dwell(site.config.grasp_time)?;
    w.signal(Signal::OffAgv)?;
    w.travel(put, LoadState::Loaded)?;
    w.signal(Signal::InBlock)?;
    w.dwell(site.config.release_time)?;
    w.hoist(site.lifted(put).z, LoadState::Empty)?;
    w.signal(Signal::FinishOrFail)?;
    Ok(w.finish())
}

/// Cell → lane.
pub(crate) fn retrieve(site: &Site<'_>, from: V3, cell: Cell, lane: LaneId) -> SimResult<Workflow<Signal>> {
    let pick = site.layout.cell_coord(cell);
    let put = site.lane(lane, cell.bay)?;
    let mut w = writer(site, from);
    w.signal(Signal::StartOrResume)?;
    w.travel(site.lifted(pick), LoadState::Empty)?;
    w.hoist(pick.z, LoadState::Empty)?;
    w.dwell(site.config.grasp_time)?;
    w.signal(Signal::OffBlock)?;
    w.travel(put, LoadState::Loaded)?;
    w.signal(Signal::OnAgv)?;
    w.dwell(site.config.release_time)?;
    w.hoist(site.lifted(put).z, LoadState::Empty)?;
    w.signal(Signal::FinishOrFail)?;
    Ok(w.finish())
}

/// Cell → cell.  `main` closes the request when done.
pub(crate) fn relocate(
    site: &Site<'_>,
    from: V3,
    src:  Cell,
    dst:  Cell,
    main: bool,
) -> SimResult<Workflow<Signal>> {
    let pick = site.layout.cell_coord(src);
    let put = site.layout.cell_coord(dst);
    let mut w = writer(site, from);
    w.signal(Signal::StartOrResume)?;
    w.signal(Signal::RelocateStart)?;
    w.travel(site.lifted(pick), LoadState::Empty)?;
    w.hoist(pick.z, LoadState::Empty)?;
    w.dwell(site.config.grasp_time)?;
    w.signal(Signal::PickUp)?;
    w.travel(put, LoadState::Loaded)?;
    w.signal(Signal::PutDown)?;
    w.dwell(site.config.release_time)?;
    w.hoist(site.lifted(put).z, LoadState::Empty)?;
    w.signal(Signal::RelocateFinish)?;
    if main {
        w.signal(Signal::FinishOrFail)?;
    }
    Ok(w.finish())
}

/// Gantry to `target`, unless the crane is already on the far side of it
/// as seen from `blocked_x`.
pub(crate) fn adjust(site: &Site<'_>, from: V3, target: f64, blocked_x: f64) -> SimResult<Workflow<Signal>> {
    let needs_move = if blocked_x <= target { from.x < target } else { from.x > target };
    let mut w = writer(site, from);
    w.signal(Signal::StartOrResume)?;
    if needs_move {
        w.hoist(site.crane.travel_height, LoadState::Empty)?;
        w.gantry(target, LoadState::Empty)?;
    }
    w.signal(Signal::FinishOrFail)?;
    Ok(w.finish())
}

/// Interruptible hoist move to `height`.
pub(crate) fn park(site: &Site<'_>, from: V3, height: f64) -> SimResult<Workflow<Signal>> {
    let mut w = writer(site, from).interruptible(true);
    w.hoist(height, LoadState::Empty)?;
    Ok(w.finish())
}
