//! Dense integer index types. Every entity in the timetable (spec.md §3)
//! is addressed by one of these; `NONE` is the reserved sentinel shared
//! across all of them (the original C source reuses one `int` sentinel
//! for every index type — here each gets its own newtype so the
//! compiler catches a stop id passed where a JP id was expected).

use crate::time::NONE;
use std::fmt;

macro_rules! dense_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $name {
            pub const NONE: $name = $name(NONE);

            #[must_use]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[must_use]
            pub fn is_none(self) -> bool {
                self.0 == NONE
            }

            #[must_use]
            pub fn from_index(i: usize) -> Self {
                $name(u32::try_from(i).expect("index too large for dense id"))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_none() {
                    write!(f, "{}(NONE)", stringify!($name))
                } else {
                    write!(f, "{}({})", stringify!($name), self.0)
                }
            }
        }
    };
}

dense_id!(StopId, "Dense index of a [`crate::model::Stop`].");
dense_id!(JpId, "Dense index of a [`crate::model::JourneyPattern`].");
dense_id!(VjId, "Dense index of a [`crate::model::VehicleJourney`], global across all JPs.");
dense_id!(JpPointId, "Position of a stop within a journey pattern's stop sequence (0-based).");
