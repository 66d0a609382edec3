//! Yard coordinate and cell-index primitives.
//!
//! Coordinates are block-local metres: `x` runs along the rail (bays), `y`
//! across the block (rows), `z` is height above ground (tiers).  A crane's
//! three drives map one-to-one onto these axes, so a crane-local coordinate
//! is simply the block-local coordinate of its spreader.

use std::fmt;

/// One physical degree of freedom of a crane.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// Gantry travel along the rail (`x`).  Shared by all cranes on a rail.
    Gantry,
    /// Trolley travel across the block (`y`).
    Trolley,
    /// Spreader hoisting (`z`).
    Hoist,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Gantry, Axis::Trolley, Axis::Hoist];

    /// Index into a per-axis array (`[T; 3]`).
    #[inline(always)]
    pub fn index(self) -> usize {
        match self {
            Axis::Gantry  => 0,
            Axis::Trolley => 1,
            Axis::Hoist   => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Axis::Gantry  => "gantry",
            Axis::Trolley => "trolley",
            Axis::Hoist   => "hoist",
        };
        f.write_str(s)
    }
}

// ── V3 ────────────────────────────────────────────────────────────────────────

/// A block-local coordinate in metres.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct V3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl V3 {
    pub const ZERO: V3 = V3 { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component along `axis`.
    #[inline]
    pub fn get(self, axis: Axis) -> f64 {
        match axis {
            Axis::Gantry  => self.x,
            Axis::Trolley => self.y,
            Axis::Hoist   => self.z,
        }
    }

    /// Copy of `self` with the `axis` component replaced.
    #[inline]
    pub fn with(mut self, axis: Axis, value: f64) -> Self {
        match axis {
            Axis::Gantry  => self.x = value,
            Axis::Trolley => self.y = value,
            Axis::Hoist   => self.z = value,
        }
        self
    }

    /// `true` if both points share the same horizontal position.
    #[inline]
    pub fn same_column(self, other: V3, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }
}

impl fmt::Display for V3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// ── Cell / Column ─────────────────────────────────────────────────────────────

/// A stacking slot: `(bay, row, tier)` inside a block.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub bay:  u16,
    pub row:  u16,
    pub tier: u16,
}

impl Cell {
    #[inline]
    pub fn new(bay: u16, row: u16, tier: u16) -> Self {
        Self { bay, row, tier }
    }

    /// The stacking column holding this cell (tier projected out).
    #[inline]
    pub fn column(self) -> Column {
        Column { bay: self.bay, row: self.row }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}/{}]", self.bay, self.row, self.tier)
    }
}

/// A stacking column `(bay, row)`: the unit of stack locking.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Column {
    pub bay: u16,
    pub row: u16,
}

impl Column {
    #[inline]
    pub fn new(bay: u16, row: u16) -> Self {
        Self { bay, row }
    }

    /// The cell at `tier` in this column.
    #[inline]
    pub fn cell(self, tier: u16) -> Cell {
        Cell { bay: self.bay, row: self.row, tier }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}]", self.bay, self.row)
    }
}
