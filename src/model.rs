//! The timetable data model (spec.md §3, §6 data contracts).
//!
//! Submodules split the same way `ferrobus_core::model` separates plain
//! entity rows from the assembled, read-only transit data structure: dense
//! id newtypes, bitmask attribute types, the calendar bitset, entity rows,
//! the `Timetable` itself, its builder, and the tuning-knob config struct.

mod attributes;
mod builder;
mod calendar;
mod coord;
mod entities;
mod ids;
mod timetable;

pub mod config;

pub use attributes::{JpointAttributes, ModeMask, TripAttributes};
pub use builder::{JpSpec, StopSpec, TimetableBuilder, VjSpec};
pub use calendar::{CalendarMask, CALENDAR_DAYS};
pub use coord::Coord;
pub use entities::{JourneyPattern, JpPoint, Stop, StopTime, Transfer, VehicleJourney};
pub use ids::{JpId, JpPointId, StopId, VjId};
pub use timetable::Timetable;

pub use config::RouterConfig;
