//! The entity row types from spec.md §3. These are plain data — offsets
//! into the parallel arrays owned by [`crate::model::Timetable`] — with
//! no behavior of their own, mirroring how `ferrobus_core`'s `Stop`,
//! `Route` and `StopTime` rows are thin structs and all traversal logic
//! lives on `PublicTransitData`.

use crate::model::attributes::{JpointAttributes, ModeMask};
use crate::model::calendar::CalendarMask;
use crate::model::ids::{JpId, StopId};
use crate::time::RTime;

/// One stop. `jps_offset`/`transfers_offset` range into
/// `Timetable::stop_jps` / `Timetable::transfer_targets`; the range end
/// is the next stop's offset (a one-past-the-end sentinel stop row
/// terminates the last range).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stop {
    pub jps_offset: u32,
    pub transfers_offset: u32,
}

/// One journey pattern: an ordered stop sequence shared by one or more
/// vehicle journeys (the RAPTOR "route").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JourneyPattern {
    pub jp_points_offset: u32,
    pub stop_times_offset: u32,
    pub vj_offset: u32,
    pub n_stops: u32,
    pub n_vjs: u32,
    pub attributes: ModeMask,
    pub min_time: RTime,
    pub max_time: RTime,
    pub headsign_offset: u32,
    pub agency_index: u32,
    /// OR of every vehicle journey's [`CalendarMask`] on this JP —
    /// a cheap pre-filter before scanning individual VJs (`route_active`
    /// in `examples/original_source/tdata.h`).
    pub active_days: CalendarMask,
}

/// A stop within a journey pattern's sequence: which global stop it is,
/// and whether boarding/alighting is permitted there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpPoint {
    pub stop: StopId,
    pub attributes: JpointAttributes,
}

/// One scheduled run along a journey pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleJourney {
    pub stop_times_offset: u32,
    pub begin_time: RTime,
    pub attributes: crate::model::attributes::TripAttributes,
    pub calendar: CalendarMask,
    pub jp: JpId,
}

/// Arrival/departure at one stop-time slot, relative to the owning VJ's
/// `begin_time` (or absolute, for realtime overlay stop-times).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StopTime {
    pub arrival: RTime,
    pub departure: RTime,
}

/// A foot-path from one stop to another. Distances are stored densely
/// as `u8` in 16-meter units (spec.md §6) and widened to meters on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub target_stop: StopId,
    pub dist_meters: u32,
}
