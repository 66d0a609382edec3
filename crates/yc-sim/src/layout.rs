//! Block geometry: where cells and truck lanes are in block-local metres.

use yc_core::{Cell, LaneId, V3};

/// Geometry of a stacking block as seen by the cranes serving it.
///
/// Coordinates are spreader positions: the `z` of a cell is where the
/// spreader sits while holding (or grasping) a box in that cell.
pub trait BlockLayout {
    fn bays(&self) -> u16;
    fn rows(&self) -> u16;
    fn tiers(&self) -> u16;

    /// Rail extent `[0, length]` along `x`.
    fn length(&self) -> f64;

    /// Gantry position serving `bay`.
    fn bay_x(&self, bay: u16) -> f64;

    /// Spreader position for a box in `cell`.
    fn cell_coord(&self, cell: Cell) -> V3;

    /// Spreader position for a box on a truck at `lane`, next to `bay`.
    /// `None` if the block has no such lane.
    fn lane_coord(&self, lane: LaneId, bay: u16) -> Option<V3>;

    /// Height of the top of a stack `tiers` high.
    fn stack_height(&self, tiers: u16) -> f64;

    fn lane_count(&self) -> usize;
}

/// A truck lane running alongside the block.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneSpec {
    /// Across-block position of the lane centre (negative: before row 0).
    pub y:          f64,
    /// Height of the truck bed.
    pub bed_height: f64,
}

/// Regular grid of `bays × rows × tiers` cells, with side lanes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridLayout {
    pub bays:        u16,
    pub rows:        u16,
    pub tiers:       u16,
    /// Bay spacing along the rail.
    pub bay_pitch:   f64,
    /// Row spacing across the block.
    pub row_pitch:   f64,
    /// Height of one box.
    pub tier_height: f64,
    pub lanes:       Vec<LaneSpec>,
}

impl GridLayout {
    /// A block of 20ft bays with one truck lane before row 0.
    pub fn new(bays: u16, rows: u16, tiers: u16) -> Self {
        Self {
            bays,
            rows,
            tiers,
            bay_pitch:   6.4,
            row_pitch:   2.8,
            tier_height: 2.9,
            lanes:       vec![LaneSpec { y: -3.5, bed_height: 1.5 }],
        }
    }

    pub fn with_lanes(mut self, lanes: Vec<LaneSpec>) -> Self {
        self.lanes = lanes;
        self
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.bay < self.bays && cell.row < self.rows && cell.tier < self.tiers
    }
}

impl BlockLayout for GridLayout {
    #[inline] fn bays(&self) -> u16 { self.bays }
    #[inline] fn rows(&self) -> u16 { self.rows }
    #[inline] fn tiers(&self) -> u16 { self.tiers }

    fn length(&self) -> f64 {
        self.bays as f64 * self.bay_pitch
    }

    fn bay_x(&self, bay: u16) -> f64 {
        (bay as f64 + 0.5) * self.bay_pitch
    }

    fn cell_coord(&self, cell: Cell) -> V3 {
        V3::new(
            self.bay_x(cell.bay),
            (cell.row as f64 + 0.5) * self.row_pitch,
            self.stack_height(cell.tier + 1),
        )
    }

    fn lane_coord(&self, lane: LaneId, bay: u16) -> Option<V3> {
        let spec = self.lanes.get(lane.index())?;
        Some(V3::new(self.bay_x(bay), spec.y, spec.bed_height + self.tier_height))
    }

    fn stack_height(&self, tiers: u16) -> f64 {
        tiers as f64 * self.tier_height
    }

    fn lane_count(&self) -> usize {
        self.lanes.len()
    }
}
