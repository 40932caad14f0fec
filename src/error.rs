//! Error kinds, following spec.md §7.
//!
//! `Overflow`, target pruning, time-cutoff pruning and "no improvement"
//! are normal-path prunings handled as control flow inside the round
//! scan (see [`crate::router`]) and never constructed as an [`Error`].
//! Only request validation and load-time timetable validation produce
//! `Result::Err`; a single bad realtime update produces an
//! [`OverlayDrop`] collected alongside the others rather than aborting
//! the whole feed apply.

use thiserror::Error;

/// Errors surfaced to a caller of this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Router scratch space could not be allocated. Fatal: abort the query.
    #[error("failed to allocate router scratch space for {0} stops")]
    AllocationFailure(usize),

    /// The request could not be satisfied as given.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] InvalidRequest),

    /// The timetable failed validation at load time.
    #[error("timetable failed validation: {0} problem(s) found")]
    TimetableIncoherent(usize),
}

/// Reasons a [`crate::router::Request`] is rejected before routing starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidRequest {
    #[error("onboard requests cannot be arrive-by")]
    OnboardArriveBy,

    #[error("request origin could not be resolved to a stop")]
    OriginUnresolved,

    #[error("request destination could not be resolved to a stop")]
    DestinationUnresolved,

    #[error("stop index {0} is out of range")]
    StopOutOfRange(u32),

    #[error("onboard vehicle journey {0} is out of range")]
    VehicleJourneyOutOfRange(u32),

    #[error("onboard vehicle journey {0} has no stop at or before the requested time")]
    OnboardStopNotFound(u32),

    #[error("max_transfers must be representable within the router's round budget")]
    TooManyTransfers,
}

/// A single realtime update that was dropped rather than applied, and why.
/// Collected (not bubbled as `Result::Err`) so one malformed update in a
/// feed never prevents the rest of the feed from being applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayDrop {
    pub trip_external_id: String,
    pub reason: OverlayDropReason,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OverlayDropReason {
    #[error("unknown vehicle journey external id")]
    UnknownVehicleJourney,

    #[error("start_date out of the 31-day calendar range")]
    StartDateOutOfRange,

    #[error("no stop-time updates and schedule_relationship was not CANCELED")]
    NoData,

    #[error("stop-time update references a stop not on the trip")]
    StopNotOnTrip,
}

impl std::fmt::Display for OverlayDrop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dropped update for {}: {}", self.trip_external_id, self.reason)
    }
}
