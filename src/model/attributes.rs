//! Bitmask attribute types. Per spec.md §9 Design Notes, mode/agency/trip
//! attribute filters are plain bitmask tests — no dynamic dispatch.

use std::ops::{BitAnd, BitOr};

/// Per-stop-in-journey-pattern boarding/alighting permission flags.
/// spec.md §3 JourneyPattern invariants: "first point has boarding attr,
/// last has alighting attr".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JpointAttributes(pub u8);

impl JpointAttributes {
    pub const NONE: JpointAttributes = JpointAttributes(0);
    pub const BOARDING: JpointAttributes = JpointAttributes(1 << 0);
    pub const ALIGHTING: JpointAttributes = JpointAttributes(1 << 1);

    #[must_use]
    pub fn can_board(self) -> bool {
        self.0 & Self::BOARDING.0 != 0
    }

    #[must_use]
    pub fn can_alight(self) -> bool {
        self.0 & Self::ALIGHTING.0 != 0
    }
}

impl BitOr for JpointAttributes {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        JpointAttributes(self.0 | rhs.0)
    }
}

/// Travel-mode bitmask carried by a journey pattern (`jp.attributes` in
/// spec.md §3) and matched against a request's `mode` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeMask(pub u32);

impl ModeMask {
    pub const NONE: ModeMask = ModeMask(0);
    pub const ALL: ModeMask = ModeMask(u32::MAX);
    pub const TRAM: ModeMask = ModeMask(1 << 0);
    pub const SUBWAY: ModeMask = ModeMask(1 << 1);
    pub const RAIL: ModeMask = ModeMask(1 << 2);
    pub const BUS: ModeMask = ModeMask(1 << 3);
    pub const FERRY: ModeMask = ModeMask(1 << 4);

    #[must_use]
    pub fn intersects(self, other: ModeMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for ModeMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        ModeMask(self.0 | rhs.0)
    }
}

impl BitAnd for ModeMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        ModeMask(self.0 & rhs.0)
    }
}

/// Arbitrary per-trip attribute bitmask (wheelchair accessible, bike
/// carriage, etc). A request may require a subset of these bits to be
/// set on any vehicle journey it boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TripAttributes(pub u32);

impl TripAttributes {
    pub const NONE: TripAttributes = TripAttributes(0);

    /// True if `self` carries every bit required by `required`.
    #[must_use]
    pub fn satisfies(self, required: TripAttributes) -> bool {
        self.0 & required.0 == required.0
    }
}

impl BitOr for TripAttributes {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        TripAttributes(self.0 | rhs.0)
    }
}
