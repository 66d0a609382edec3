//! Boxes and what lifecycle signals do to them.
//!
//! Each request carries a `SignalTable` of plain function pointers.  The
//! defaults linked by [`link_default_handlers`] move boxes between cells,
//! keep the block's stack index in step and release column locks at the
//! physical moment a column stops being touched.

use std::fmt;

use tracing::{debug, warn};
use yc_core::{BlockId, BoxId, Cell, EquipmentId, OperationId, RequestId};
use yc_request::{Request, RequestKind, RequestResult, Signal};

use crate::{ProbeEvent, SimError, SimResult, Yard};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoxState {
    /// A cell is reserved; the box is still on its way in.
    Allocated,
    /// Lifted off the vehicle.
    Storing,
    Stored,
    /// Lifted out of the block.
    Retrieving,
    /// On its way to another column.
    Relocating,
    /// Handed over to a vehicle; gone from the block.
    Retrieved,
}

impl fmt::Display for BoxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BoxState::Allocated => "ALLOCATED",
            BoxState::Storing => "STORING",
            BoxState::Stored => "STORED",
            BoxState::Retrieving => "RETRIEVING",
            BoxState::Relocating => "RELOCATING",
            BoxState::Retrieved => "RETRIEVED",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoxRecord {
    pub id:            BoxId,
    pub block:         BlockId,
    pub cell:          Cell,
    pub state:         BoxState,
    /// Unit currently handling the box.
    pub equipment:     Option<EquipmentId>,
    /// Destination reserved by a relocation in progress.
    pub pending_cell:  Option<Cell>,
    pub alloc_time:    f64,
    pub store_time:    Option<f64>,
    pub retrieve_time: Option<f64>,
    pub relocations:   u32,
}

impl BoxRecord {
    pub(crate) fn allocated(id: BoxId, block: BlockId, cell: Cell, time: f64) -> Self {
        Self {
            id,
            block,
            cell,
            state: BoxState::Allocated,
            equipment: None,
            pending_cell: None,
            alloc_time: time,
            store_time: None,
            retrieve_time: None,
            relocations: 0,
        }
    }
}

/// What a signal handler is told about the operation that fired it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SignalContext {
    pub request:   RequestId,
    pub op:        OperationId,
    pub equipment: EquipmentId,
    /// Box moved by the operation (for a relocation, the relocated box,
    /// which need not be the request's own box).
    pub box_id:    Option<BoxId>,
    pub from:      Option<Cell>,
    pub to:        Option<Cell>,
}

impl SignalContext {
    fn box_id(&self) -> SimResult<BoxId> {
        self.box_id.ok_or(SimError::NoBox(self.op))
    }
}

pub type SignalHandler = fn(&mut Yard, f64, &SignalContext) -> SimResult<()>;

/// Link the handlers every request of its kind needs.
pub fn link_default_handlers(req: &mut Request<SignalHandler>) -> RequestResult<()> {
    let kind = req.kind();
    let signals = &mut req.signals;
    if kind == RequestKind::Adjust {
        signals.link(Signal::StartOrResume, adjust_start)?;
        signals.link(Signal::FinishOrFail, adjust_finish)?;
        return Ok(());
    }
    signals.link(Signal::StartOrResume, start_or_resume)?;
    signals.link(Signal::FinishOrFail, finish_or_fail)?;
    match kind {
        RequestKind::Store => {
            signals.link(Signal::OffAgv, off_agv)?;
            signals.link(Signal::InBlock, in_block)?;
        }
        RequestKind::Retrieve => {
            signals.link(Signal::OffBlock, off_block)?;
            signals.link(Signal::OnAgv, on_agv)?;
        }
        _ => {}
    }
    if matches!(kind, RequestKind::Retrieve | RequestKind::Relocate) {
        signals.link(Signal::RelocateStart, relocate_start)?;
        signals.link(Signal::PickUp, pick_up)?;
        signals.link(Signal::PutDown, put_down)?;
        signals.link(Signal::RelocateFinish, relocate_finish)?;
    }
    Ok(())
}

// ── Common ────────────────────────────────────────────────────────────────────

fn start_or_resume(yard: &mut Yard, time: f64, ctx: &SignalContext) -> SimResult<()> {
    yard.request_mut(ctx.request)?.start_or_resume(time)?;
    Ok(())
}

fn finish_or_fail(yard: &mut Yard, time: f64, ctx: &SignalContext) -> SimResult<()> {
    yard.finish_request(ctx.request, time)
}

// ── STORE ─────────────────────────────────────────────────────────────────────

fn off_agv(yard: &mut Yard, time: f64, ctx: &SignalContext) -> SimResult<()> {
    let b = yard.box_mut(ctx.box_id()?)?;
    b.state = BoxState::Storing;
    b.equipment = Some(ctx.equipment);
    yard.request_mut(ctx.request)?.sync(time)?;
    Ok(())
}

fn in_block(yard: &mut Yard, time: f64, ctx: &SignalContext) -> SimResult<()> {
    let b = yard.box_mut(ctx.box_id()?)?;
    b.state = BoxState::Stored;
    b.equipment = None;
    b.store_time = Some(time);
    let (block, column) = (b.block, b.cell.column());
    yard.release_columns(time, block, ctx.request, &[column])
}

// ── RETRIEVE ──────────────────────────────────────────────────────────────────

fn off_block(yard: &mut Yard, time: f64, ctx: &SignalContext) -> SimResult<()> {
    let id = ctx.box_id()?;
    let b = yard.box_mut(id)?;
    b.state = BoxState::Retrieving;
    b.equipment = Some(ctx.equipment);
    let (block, column) = (b.block, b.cell.column());
    yard.take_from_stack(block, column, id)?;
    yard.release_columns(time, block, ctx.request, &[column])
}

fn on_agv(yard: &mut Yard, time: f64, ctx: &SignalContext) -> SimResult<()> {
    let b = yard.box_mut(ctx.box_id()?)?;
    b.state = BoxState::Retrieved;
    b.equipment = None;
    b.retrieve_time = Some(time);
    yard.request_mut(ctx.request)?.sync(time)?;
    Ok(())
}

// ── RELOCATE ──────────────────────────────────────────────────────────────────

fn relocate_start(yard: &mut Yard, time: f64, ctx: &SignalContext) -> SimResult<()> {
    let id = ctx.box_id()?;
    let dst = ctx.to.ok_or(SimError::NoSlot(id))?;
    let block = yard.box_record(id).ok_or(SimError::UnknownBox(id))?.block;
    let cell = yard.reserve_in_stack(block, dst.column(), id)?;
    if cell != dst {
        warn!(box_id = %id, planned = %dst, reserved = %cell, "relocation target moved");
    }
    let b = yard.box_mut(id)?;
    b.state = BoxState::Relocating;
    b.equipment = Some(ctx.equipment);
    b.pending_cell = Some(cell);
    yard.probe(time, ProbeEvent::BoxAlloc { box_id: id, cell });
    Ok(())
}

fn pick_up(yard: &mut Yard, time: f64, ctx: &SignalContext) -> SimResult<()> {
    let id = ctx.box_id()?;
    let b = yard.box_record(id).ok_or(SimError::UnknownBox(id))?;
    let (block, column) = (b.block, b.cell.column());
    yard.take_from_stack(block, column, id)?;
    yard.release_columns(time, block, ctx.request, &[column])
}

fn put_down(yard: &mut Yard, time: f64, ctx: &SignalContext) -> SimResult<()> {
    let id = ctx.box_id()?;
    let b = yard.box_mut(id)?;
    let cell = b.pending_cell.take().or(ctx.to).ok_or(SimError::NoSlot(id))?;
    b.cell = cell;
    b.state = BoxState::Stored;
    b.equipment = None;
    b.relocations += 1;
    let block = b.block;
    yard.release_columns(time, block, ctx.request, &[cell.column()])
}

fn relocate_finish(_yard: &mut Yard, time: f64, ctx: &SignalContext) -> SimResult<()> {
    debug!(time, request = %ctx.request, op = %ctx.op, "relocation done");
    Ok(())
}

// ── ADJUST ────────────────────────────────────────────────────────────────────

/// The way is being cleared: the blocked unit may plan again.
fn adjust_start(yard: &mut Yard, time: f64, ctx: &SignalContext) -> SimResult<()> {
    yard.request_mut(ctx.request)?.start_or_resume(time)?;
    yard.release_blocked(ctx.request, time, true)
}

fn adjust_finish(yard: &mut Yard, time: f64, ctx: &SignalContext) -> SimResult<()> {
    yard.finish_request(ctx.request, time)?;
    yard.release_blocked(ctx.request, time, true)
}
