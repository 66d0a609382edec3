//! A stacking block: geometry, stack occupancy, column locks and the
//! request dispatcher shared by the cranes on its rail.

use std::collections::BTreeMap;

use yc_core::{BlockId, BoxId, Cell, Column, EquipmentId, RequestId};
use yc_request::Dispatcher;
use yc_stack::StackLockTable;

use crate::{BlockLayout, GridLayout};

pub struct Block {
    pub id:        BlockId,
    pub layout:    GridLayout,
    /// Cranes on this block's rail, in rail order.
    pub equipment: Vec<EquipmentId>,
    /// Boxes per column, bottom first.  Includes boxes that have a cell
    /// reserved but have not physically arrived yet.
    stacks:        BTreeMap<Column, Vec<BoxId>>,
    pub(crate) locks:      StackLockTable<RequestId>,
    pub(crate) dispatcher: Dispatcher,
}

impl Block {
    pub fn new(id: BlockId, layout: GridLayout) -> Self {
        Self {
            id,
            layout,
            equipment: Vec::new(),
            stacks: BTreeMap::new(),
            locks: StackLockTable::new(),
            dispatcher: Dispatcher::new(),
        }
    }

    #[inline]
    pub fn locks(&self) -> &StackLockTable<RequestId> {
        &self.locks
    }

    #[inline]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Number of occupied or reserved cells in `column`.
    pub fn height(&self, column: Column) -> u16 {
        self.stacks.get(&column).map_or(0, |s| s.len() as u16)
    }

    pub fn is_full(&self, column: Column) -> bool {
        self.height(column) >= self.layout.tiers()
    }

    /// The next cell to fill in `column`, if it has room.
    pub fn top_cell(&self, column: Column) -> Option<Cell> {
        (!self.is_full(column)).then(|| column.cell(self.height(column)))
    }

    pub fn column(&self, column: Column) -> &[BoxId] {
        self.stacks.get(&column).map_or(&[], Vec::as_slice)
    }

    /// Boxes stacked above `cell`, bottom first.
    pub fn above(&self, cell: Cell) -> &[BoxId] {
        let stack = self.column(cell.column());
        let from = (cell.tier as usize + 1).min(stack.len());
        &stack[from..]
    }

    /// Boxes below `cell`, bottom first.
    pub fn below(&self, cell: Cell) -> &[BoxId] {
        let stack = self.column(cell.column());
        &stack[..(cell.tier as usize).min(stack.len())]
    }

    pub fn box_count(&self) -> usize {
        self.stacks.values().map(Vec::len).sum()
    }

    /// Reserve the next cell of `column` for `box_id`.
    pub(crate) fn reserve(&mut self, column: Column, box_id: BoxId) -> Option<Cell> {
        let cell = self.top_cell(column)?;
        self.stacks.entry(column).or_default().push(box_id);
        Some(cell)
    }

    /// Take `box_id` out of `column`.  Returns the boxes that moved one tier
    /// down as a result.
    pub(crate) fn remove(&mut self, column: Column, box_id: BoxId) -> Vec<BoxId> {
        let Some(stack) = self.stacks.get_mut(&column) else {
            return Vec::new();
        };
        let Some(at) = stack.iter().position(|b| *b == box_id) else {
            return Vec::new();
        };
        stack.remove(at);
        let shifted = stack[at..].to_vec();
        if stack.is_empty() {
            self.stacks.remove(&column);
        }
        shifted
    }

    /// Bay range (inclusive) whose gantry positions lie inside `[lo, hi]`.
    pub fn bays_within(&self, lo: f64, hi: f64) -> Option<(u16, u16)> {
        let eps = 1e-6;
        let bays: Vec<u16> = (0..self.layout.bays())
            .filter(|&b| {
                let x = self.layout.bay_x(b);
                x >= lo - eps && x <= hi + eps
            })
            .collect();
        Some((*bays.first()?, *bays.last()?))
    }
}
