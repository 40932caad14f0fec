//! Round-based public transit journey planner core.
//!
//! This crate implements the timetable data contract, the RAPTOR-family
//! round-based routing algorithm, a realtime schedule overlay, and a
//! coordinate-based spatial index over stops. It does not ingest GTFS,
//! parse the on-disk compact timetable format, or decode GTFS-realtime
//! protobuf feeds — those are external collaborators that feed this
//! crate through the types in [`model`] and [`realtime`].

pub mod bitset;
pub mod clock;
pub mod error;
pub mod model;
pub mod realtime;
pub mod router;
pub mod spatial;
pub mod time;
pub mod validate;

pub mod prelude {
    //! Convenience re-exports of the most commonly used types.

    pub use crate::bitset::Bitset;
    pub use crate::clock::{Clock, FixedClock, SystemClock};
    pub use crate::error::{Error, OverlayDrop};
    pub use crate::model::{
        JourneyPattern, JpPointId, JpointAttributes, RouterConfig, Stop, StopId, StopTime,
        Timetable, TimetableBuilder, Transfer, TripAttributes, VehicleJourney, VjId,
    };
    pub use crate::realtime::{RealtimeOverlay, TripUpdate};
    pub use crate::router::{Itinerary, Leg, Request, Router};
    pub use crate::time::{RTime, NONE, ONBOARD, RTIME_ONE_DAY, THREE_DAYS, UNREACHED};
}
