//! Choosing cells for incoming and relocated boxes.

use yc_core::{Cell, Column, LaneId};

use crate::{Block, BlockLayout, BoxRecord, BoxState};

/// Read-only view of a block's occupancy handed to allocators.
#[derive(Copy, Clone)]
pub struct StackView<'a> {
    block: &'a Block,
    boxes: &'a [BoxRecord],
}

impl<'a> StackView<'a> {
    pub fn new(block: &'a Block, boxes: &'a [BoxRecord]) -> Self {
        Self { block, boxes }
    }

    #[inline] pub fn bays(&self) -> u16 { self.block.layout.bays() }
    #[inline] pub fn rows(&self) -> u16 { self.block.layout.rows() }
    #[inline] pub fn tiers(&self) -> u16 { self.block.layout.tiers() }

    pub fn height(&self, column: Column) -> u16 {
        self.block.height(column)
    }

    pub fn is_locked(&self, column: Column) -> bool {
        self.block.locks().is_locked(column)
    }

    /// `true` if every box in `column` is physically in place.
    pub fn is_settled(&self, column: Column) -> bool {
        self.block
            .column(column)
            .iter()
            .all(|id| self.boxes.get(id.index()).is_some_and(|b| b.state == BoxState::Stored))
    }

    /// Next free cell of `column` if it has room and nobody holds it.
    pub fn usable_top(&self, column: Column) -> Option<Cell> {
        if self.is_locked(column) {
            return None;
        }
        self.block.top_cell(column)
    }
}

/// Decides where boxes go.
pub trait SlotAllocator {
    /// Cell for a box arriving at `lane`.
    fn slot_for_store(&mut self, view: StackView<'_>, lane: LaneId) -> Option<Cell>;

    /// Cell for a box moved off `from`, within the inclusive bay range
    /// `bays`.  Never `from` itself.
    fn slot_for_relocation(&mut self, view: StackView<'_>, from: Column, bays: (u16, u16)) -> Option<Cell>;
}

/// Stores into the lowest stack; relocates to the nearest column with room,
/// same bay first.
#[derive(Copy, Clone, Debug, Default)]
pub struct NearestColumnAllocator;

impl SlotAllocator for NearestColumnAllocator {
    fn slot_for_store(&mut self, view: StackView<'_>, _lane: LaneId) -> Option<Cell> {
        let mut best: Option<Cell> = None;
        for bay in 0..view.bays() {
            for row in 0..view.rows() {
                let Some(cell) = view.usable_top(Column::new(bay, row)) else { continue };
                if best.is_none_or(|b| cell.tier < b.tier) {
                    best = Some(cell);
                }
            }
        }
        best
    }

    fn slot_for_relocation(&mut self, view: StackView<'_>, from: Column, bays: (u16, u16)) -> Option<Cell> {
        let (lo, hi) = bays;
        let mut order: Vec<u16> = (lo..=hi.min(view.bays().saturating_sub(1))).collect();
        order.sort_by_key(|b| (b.abs_diff(from.bay), *b));
        let mut rows: Vec<u16> = (0..view.rows()).collect();
        rows.sort_by_key(|r| (r.abs_diff(from.row), *r));

        order
            .into_iter()
            .flat_map(|bay| rows.iter().map(move |&row| Column::new(bay, row)))
            .filter(|col| *col != from && view.is_settled(*col))
            .find_map(|col| view.usable_top(col))
    }
}
