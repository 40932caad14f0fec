//! Transfer relaxation (spec.md §4.3.2 `apply_transfers`): converts this
//! round's ride-arrival times into next-round boarding readiness over the
//! static walking graph, and flags the journey patterns reachable from
//! each improved stop so the next round's scan knows where to look.

use crate::bitset::Bitset;
use crate::model::{CalendarMask, JpId, StopId};
use crate::router::state::{StopState, WALK};
use crate::router::{timetable_view::TimetableView, Request};
use crate::time::{checked_add, checked_sub, sec_to_rtime, RTime, UNREACHED};

/// Applies self- and foot-transfers from every stop in `updated_stops`,
/// writing next-round readiness into `state` and flagging the journey
/// patterns that serve each improved stop into `updated_routes`.
/// `updated_routes` is cleared at entry (spec.md §4.3.2 step 1);
/// `updated_stops` is cleared at exit (step 3). Operates on whichever
/// `StopState` slice represents "this round" — the seed array before
/// round 0, or `states[r+1]` after `round(r)`'s scan.
pub(crate) fn apply_transfers(
    view: &TimetableView,
    req: &Request,
    day_mask: CalendarMask,
    walk_speed_mps: f64,
    walk_slack_sec: u32,
    best_time: &mut [RTime],
    state: &mut [StopState],
    updated_stops: &mut Bitset,
    updated_routes: &mut Bitset,
) {
    updated_routes.clear();

    let sources: Vec<StopId> = updated_stops.ones().map(StopId::from_index).collect();
    for s in sources {
        let t_from = state[s.index()].time;
        if t_from == UNREACHED {
            log::trace!("apply_transfers: stop {s} marked updated but UNREACHED, skipping");
            continue;
        }
        flag_jps_for_stop(view, day_mask, s, updated_routes);

        if t_from == best_time[s.index()] {
            state[s.index()].walk_time = t_from;
            state[s.index()].walk_from = s;
        }

        for transfer in view.tt.transfers_for_stop(s) {
            let to = transfer.target_stop;
            let dur_sec = f64::from(transfer.dist_meters) / walk_speed_mps + f64::from(walk_slack_sec);
            let dur = sec_to_rtime(dur_sec.round() as u32);
            let t_to = if req.arrive_by {
                checked_sub(t_from, dur)
            } else {
                checked_add(t_from, dur)
            };
            let Some(t_to) = t_to else {
                continue;
            };

            let cur_best = best_time[to.index()];
            let improves = cur_best == UNREACHED
                || if req.arrive_by {
                    t_to > cur_best
                } else {
                    t_to < cur_best
                };
            if !improves {
                continue;
            }

            best_time[to.index()] = t_to;
            let st = &mut state[to.index()];
            st.walk_time = t_to;
            st.walk_from = s;
            st.time = t_to;
            st.back_jp = WALK;
            st.back_vj = crate::model::VjId::NONE;
            st.ride_from = StopId::NONE;
            st.board_time = t_to;
            st.back_jp_point = crate::model::JpPointId::NONE;
            st.jp_point = crate::model::JpPointId::NONE;

            flag_jps_for_stop(view, day_mask, to, updated_routes);
        }
    }

    for &jp in &req.banned_routes {
        if jp.index() < updated_routes.capacity() {
            updated_routes.unset(jp.index());
        }
    }

    updated_stops.clear();
}

fn flag_jps_for_stop(view: &TimetableView, day_mask: CalendarMask, stop: StopId, updated_routes: &mut Bitset) {
    for jp in view.jps_for_stop(stop) {
        flag_one(view, day_mask, jp, updated_routes);
    }
}

fn flag_one(view: &TimetableView, day_mask: CalendarMask, jp: JpId, updated_routes: &mut Bitset) {
    // `route_active` pre-filter: skip routes with no VJ running on any of
    // the three servicedays, mirroring `flag_routes_for_stop`'s
    // `date_mask & route_active_flags` check in
    // `examples/original_source/router.c` ("about 14% increase in
    // throughput").
    if view.jp_active_days(jp).intersects(day_mask) {
        updated_routes.set(jp.index());
    }
}
