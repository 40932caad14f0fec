//! `rtime`: the router's internal time representation.
//!
//! Wall-clock and schedule times are stored in 4-second units so that a
//! full three-day search window (yesterday/today/tomorrow) fits in a
//! 16-bit integer. This mirrors the `rtime_t` unit used by the original
//! implementation this crate reimplements, generalized from its 2-second
//! granularity to the 4-second granularity this spec calls for.

/// A time of day (or offset) in 4-second units, relative to some
/// [`crate::router::ServiceDay::midnight`].
pub type RTime = u16;

/// Sentinel meaning "never reached" — the maximum representable `rtime`.
pub const UNREACHED: RTime = 0xFFFF;

/// One calendar day, expressed in `rtime` units (`86400 / 4`).
pub const RTIME_ONE_DAY: RTime = 21_600;

/// Two calendar days in `rtime` units.
pub const RTIME_TWO_DAYS: RTime = 2 * RTIME_ONE_DAY;

/// Three calendar days in `rtime` units — candidates beyond this are
/// treated as an overflow and silently pruned (spec.md §7, `Overflow`).
pub const THREE_DAYS: RTime = 3 * RTIME_ONE_DAY;

/// `NONE` sentinel shared by every dense index type in this crate
/// (stops, journey patterns, vehicle journeys, JP points). All index
/// newtypes use `u32`, so `NONE` is `u32::MAX`.
pub const NONE: u32 = u32::MAX;

/// Sentinel distinguishing an onboard-seeded request from one with a
/// normal stop/coordinate origin. See [`crate::router::Request`].
pub const ONBOARD: u32 = u32::MAX - 1;

/// Convert a duration in whole seconds to `rtime` units, rounding down.
#[must_use]
pub fn sec_to_rtime(seconds: u32) -> RTime {
    let units = seconds / 4;
    if units > u32::from(UNREACHED) {
        UNREACHED
    } else {
        units as RTime
    }
}

/// Convert `rtime` units back to whole seconds.
#[must_use]
pub fn rtime_to_sec(rtime: RTime) -> u32 {
    u32::from(rtime) * 4
}

/// Convert epoch seconds to an `rtime` value relative to `midnight_epoch`,
/// returning `None` if the result does not fit (e.g. wrapped past the
/// three-day window). Mirrors `epoch_to_rtime` in the original C source.
#[must_use]
pub fn epoch_to_rtime(epoch_seconds: i64, midnight_epoch: i64) -> Option<RTime> {
    let delta = epoch_seconds - midnight_epoch;
    if delta < 0 {
        return None;
    }
    let delta = u32::try_from(delta).ok()?;
    let units = delta / 4;
    if units > u32::from(UNREACHED) {
        None
    } else {
        Some(units as RTime)
    }
}

/// Checked `rtime` addition that treats overflow past [`THREE_DAYS`] (or
/// wrap of the underlying `u32`) as `None`, per spec.md §7 `Overflow`.
#[must_use]
pub fn checked_add(base: RTime, delta: RTime) -> Option<RTime> {
    let sum = u32::from(base) + u32::from(delta);
    if sum > u32::from(THREE_DAYS) || sum >= u32::from(UNREACHED) {
        None
    } else {
        Some(sum as RTime)
    }
}

/// Checked `rtime` subtraction; `None` on underflow (used for arrive-by
/// transfer relaxation, which walks *backwards* in time).
#[must_use]
pub fn checked_sub(base: RTime, delta: RTime) -> Option<RTime> {
    base.checked_sub(delta)
}

/// Human-readable `HH:MM:SS` rendering of an `rtime` value relative to a
/// service day's midnight, for logging (`timetext` in the original).
#[must_use]
pub fn format_rtime(rtime: RTime) -> String {
    if rtime == UNREACHED {
        return "UNREACHED".to_string();
    }
    let total_seconds = rtime_to_sec(rtime);
    let hh = total_seconds / 3600;
    let mm = (total_seconds % 3600) / 60;
    let ss = total_seconds % 60;
    format!("{hh:02}:{mm:02}:{ss:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sec_round_trip() {
        assert_eq!(sec_to_rtime(40), 10);
        assert_eq!(rtime_to_sec(10), 40);
    }

    #[test]
    fn checked_add_prunes_past_three_days() {
        assert_eq!(checked_add(THREE_DAYS - 1, 1), Some(THREE_DAYS));
        assert_eq!(checked_add(THREE_DAYS, 1), None);
    }

    #[test]
    fn checked_sub_underflow() {
        assert_eq!(checked_sub(5, 10), None);
        assert_eq!(checked_sub(10, 5), Some(5));
    }

    #[test]
    fn epoch_conversion_rejects_pre_midnight() {
        assert_eq!(epoch_to_rtime(50, 100), None);
        assert_eq!(epoch_to_rtime(140, 100), Some(10));
    }
}
