//! Result reconstruction (spec.md §4.3.3): walks the back-pointer graph
//! from the target to the origin, one round's worth of state at a time,
//! producing the ordered legs of one itinerary.

use crate::model::StopId;
use crate::router::state::{StopState, WALK};
use crate::router::{Itinerary, Leg};

/// Reconstructs the itinerary terminating at round `r` (i.e. reading
/// `states[r + 1][target]`, this module's "cur" slot for round `r`).
/// A ride leg's boarding stop lives in the *previous* round's array
/// (`round -= 1`); a walk leg's source lives in the *same* round's
/// array, since `apply_transfers` never chains more than one hop.
///
/// `round()`'s scan runs stop order in reverse for arrive-by (spec.md
/// §4.3.1 step 4), which also swaps which physical point plays the
/// scan's "board" role versus its "alight" role (see `round.rs`). The
/// back-pointer chain itself still walks from `target` to `origin`
/// correctly regardless of direction, but every stored field has to be
/// relabeled back to physical board/alight before it goes into a `Leg`,
/// and the chain comes out in physical travel order already — it must
/// not be reversed again — so that callers always see
/// [`Itinerary::legs`] "origin to destination" (spec.md §8 scenario 3,
/// "arrive-by symmetry ... same legs").
pub(crate) fn reconstruct(
    states: &[Vec<StopState>],
    origin: StopId,
    target: StopId,
    r: usize,
    arrive_by: bool,
) -> Itinerary {
    let mut round = r + 1;
    let mut s = target;
    let mut legs_rev: Vec<Leg> = Vec::new();

    loop {
        let st: StopState = states[round][s.index()];
        if st.back_jp.is_none() {
            break;
        }

        if st.back_jp == WALK {
            let leg = if arrive_by {
                Leg::Walk {
                    from_stop: s,
                    to_stop: st.walk_from,
                    arrival_time: states[round][st.walk_from.index()].time,
                }
            } else {
                Leg::Walk {
                    from_stop: st.walk_from,
                    to_stop: s,
                    arrival_time: st.time,
                }
            };
            legs_rev.push(leg);
            s = st.walk_from;
        } else {
            let leg = if arrive_by {
                Leg::Ride {
                    jp: st.back_jp,
                    vj: st.back_vj,
                    board_stop: s,
                    board_jp_point: st.jp_point,
                    board_time: st.time,
                    alight_stop: st.ride_from,
                    alight_jp_point: st.back_jp_point,
                    alight_time: st.board_time,
                }
            } else {
                Leg::Ride {
                    jp: st.back_jp,
                    vj: st.back_vj,
                    board_stop: st.ride_from,
                    board_jp_point: st.back_jp_point,
                    board_time: st.board_time,
                    alight_stop: s,
                    alight_jp_point: st.jp_point,
                    alight_time: st.time,
                }
            };
            legs_rev.push(leg);
            s = st.ride_from;
            round -= 1;
        }
    }

    debug_assert_eq!(s, origin, "back-pointer walk terminated before reaching the origin");

    let arrival_time = if arrive_by {
        match legs_rev.last() {
            Some(Leg::Ride { alight_time, .. }) => *alight_time,
            Some(Leg::Walk { arrival_time, .. }) => *arrival_time,
            None => states[round][s.index()].time,
        }
    } else {
        legs_rev.reverse();
        match legs_rev.last() {
            Some(Leg::Ride { alight_time, .. }) => *alight_time,
            Some(Leg::Walk { arrival_time, .. }) => *arrival_time,
            None => states[round][s.index()].time,
        }
    };

    Itinerary {
        rounds: r,
        arrival_time,
        legs: legs_rev,
    }
}
