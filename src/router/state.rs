//! Per-round-per-stop scratch state (spec.md §3 `RouterState[r,s]`) and
//! the three-service-day calendar window a query searches across
//! (spec.md §3 `ServiceDay`, §4.3 "Service-day setup").

use crate::model::{CalendarMask, JpId, JpPointId, StopId, VjId};
use crate::time::{RTime, UNREACHED};

/// Sentinel `back_jp` value marking a state reached purely by walking in
/// this round, with no ride boarded (spec.md §4.3.3, §6 `WALK` sentinel).
/// One less than [`crate::time::NONE`] — the same two-highest-values
/// trick `ONBOARD` uses to stay distinct from `JpId::NONE`.
pub const WALK: JpId = JpId(crate::time::NONE - 1);

/// One `(round, stop)` scratch cell (spec.md §3 `RouterState[r,s]`).
///
/// `time` is the best arrival this round produced at the owning stop,
/// either by riding (`back_jp` a real journey pattern) or by walking
/// (`back_jp == WALK`). `walk_time` is the "departure readiness" time
/// used by *the next round's* boarding decisions — populated only by
/// transfer relaxation, never by the round scan itself. Keeping these
/// two fields distinct (rather than reusing one, as
/// `examples/original_source/router.c` does with its single `.time`
/// field read and written within the same round) is the fix spec.md §9
/// calls for: a round may only board using readiness carried over from
/// the *previous* round's transfer relaxation, never from a ride
/// another journey pattern completed earlier in the same round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopState {
    pub time: RTime,
    pub walk_time: RTime,
    pub walk_from: StopId,
    pub ride_from: StopId,
    pub back_jp: JpId,
    pub back_vj: VjId,
    pub board_time: RTime,
    pub back_jp_point: JpPointId,
    pub jp_point: JpPointId,
}

impl Default for StopState {
    fn default() -> Self {
        StopState {
            time: UNREACHED,
            walk_time: UNREACHED,
            walk_from: StopId::NONE,
            ride_from: StopId::NONE,
            back_jp: JpId::NONE,
            back_vj: VjId::NONE,
            board_time: UNREACHED,
            back_jp_point: JpPointId::NONE,
            jp_point: JpPointId::NONE,
        }
    }
}

/// One of the three calendar days a query searches across (spec.md §3).
/// `midnight` is the day's midnight expressed as an `rtime` offset from
/// the three-day window's own zero point (the earliest of the three
/// midnights); `mask` is the calendar bit for that physical day,
/// pre-shifted so it can be tested directly against a VJ's
/// [`CalendarMask`]; `apply_realtime` is set only for whichever of the
/// three days is the real wall-clock "today" (the only day a live GTFS-rt
/// feed describes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDay {
    pub midnight: RTime,
    pub mask: CalendarMask,
    pub apply_realtime: bool,
}
