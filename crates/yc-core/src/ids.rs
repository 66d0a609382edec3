//! Strongly typed, zero-cost identifier wrappers.
//!
//! Every arena in the simulator (equipment, requests, operations, boxes,
//! blocks) hands out indices in insertion order.  The inner integer is `pub`
//! so arenas can index their `Vec`s via `id.0 as usize`, but callers should
//! prefer the `.index()` helper for clarity.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of one piece of equipment (a rail-mounted gantry crane).
    pub struct EquipmentId(u32);
}

typed_id! {
    /// Index of a client-visible request in the yard's request arena.
    pub struct RequestId(u32);
}

typed_id! {
    /// Index of an operation in the yard's operation arena.
    pub struct OperationId(u32);
}

typed_id! {
    /// Index of a container ("box").
    pub struct BoxId(u32);
}

typed_id! {
    /// Index of a stacking block.
    pub struct BlockId(u16);
}

typed_id! {
    /// Index of a truck lane (access point) within a block.
    pub struct LaneId(u16);
}
