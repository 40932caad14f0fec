//! One RAPTOR round (spec.md §4.3.1 `round(r)`): scans every flagged
//! journey pattern, re-boarding where an earlier ride now beats the
//! currently-held trip, and writes improved ride arrivals into this
//! round's state.

use crate::model::{JpId, JpPointId, StopId, VjId};
use crate::router::state::{ServiceDay, StopState};
use crate::router::{timetable_view::TimetableView, Request};
use crate::time::{checked_add, RTime, RTIME_ONE_DAY, THREE_DAYS, UNREACHED};

/// Scans every journey pattern in `flagged_jps` (a snapshot of this
/// round's `updated_routes`), reading boarding readiness from
/// `states[r]` ("last round") and writing improved ride arrivals into
/// `states[r + 1]` ("this round"). Newly improved stops are flagged
/// into `updated_stops`, which the next `apply_transfers` call consumes
/// and clears.
#[allow(clippy::too_many_arguments)]
pub(crate) fn round(
    view: &TimetableView,
    req: &Request,
    servicedays: &[ServiceDay; 3],
    target: StopId,
    req_rtime: RTime,
    time_cutoff: Option<RTime>,
    flagged_jps: &[usize],
    r: usize,
    best_time: &mut [RTime],
    states: &mut [Vec<StopState>],
    updated_stops: &mut crate::bitset::Bitset,
) {
    let last = r;
    let cur = r + 1;

    for &jp_idx in flagged_jps {
        let jp = JpId::from_index(jp_idx);

        if !req.mode.intersects(view.jp_attributes(jp)) {
            continue;
        }
        if req.banned_routes.contains(&jp) {
            continue;
        }

        let (min_time, max_time) = view.jp_min_max_time(jp);
        let overlap = max_time > RTIME_ONE_DAY && min_time < max_time - RTIME_ONE_DAY;
        let n_stops = view.jp_n_stops(jp);

        let mut vj: Option<VjId> = None;
        let mut board_stop = StopId::NONE;
        let mut board_jp_point = JpPointId::NONE;
        let mut board_time: RTime = UNREACHED;
        let mut board_serviceday: Option<usize> = None;

        let order: Vec<usize> = if req.arrive_by {
            (0..n_stops).rev().collect()
        } else {
            (0..n_stops).collect()
        };

        for i in order {
            let jp_point_id = JpPointId::from_index(i);
            let point = view.jp_point(jp, i);
            let s = point.stop;

            if req.banned_stops_hard.contains(&s) {
                vj = None;
                continue;
            }

            let prev_time = states[last][s.index()].walk_time;

            let attempt_board = if prev_time == UNREACHED {
                false
            } else if vj.is_none() || req.via == Some(s) {
                true
            } else if req.via.is_some() && req.via == Some(board_stop) {
                false
            } else {
                let sd = &servicedays[board_serviceday.expect("vj set implies a boarding day")];
                match view.stoptime(jp, vj.unwrap(), jp_point_id, req.arrive_by, sd) {
                    None => true,
                    Some(ct) => {
                        if req.arrive_by {
                            prev_time > ct
                        } else {
                            prev_time < ct
                        }
                    }
                }
            };

            let banned_soft = req.banned_stops.contains(&s);
            // Arrive-by scans a JP back to front: the point it meets first
            // (physically the last stop, alighting-only on a plain route)
            // is the one holding a known reachable time, so it plays the
            // "attempt to board" role here; the point it commits a new
            // state at plays the physical-boarding role. Forward search
            // keeps the two attributes in their physical sense.
            let (board_attr, alight_attr) = if req.arrive_by {
                (point.attributes.can_alight(), point.attributes.can_board())
            } else {
                (point.attributes.can_board(), point.attributes.can_alight())
            };
            let can_board_here = board_attr && !banned_soft;
            let can_alight_here = alight_attr && !banned_soft;

            if attempt_board && can_board_here {
                let mut best_found: Option<(VjId, RTime, usize)> = None;
                for (di, sd) in servicedays.iter().enumerate() {
                    // A day can supply a board candidate only if some point
                    // in its [midnight+min_time, midnight+max_time] range is
                    // still reachable from `prev_time` in the request
                    // direction: depart-after needs an upcoming departure
                    // (prev_time at or before the day's last time), arrive-by
                    // needs an earlier arrival (prev_time at or after the
                    // day's first time). The other bound doesn't rule the
                    // day out — boarding the day's first trip from an
                    // earlier `prev_time` is exactly the common case.
                    let window = if req.arrive_by {
                        checked_add(sd.midnight, min_time).is_some_and(|lo| prev_time >= lo)
                    } else {
                        checked_add(sd.midnight, max_time).is_some_and(|hi| prev_time <= hi)
                    };
                    if !window {
                        continue;
                    }

                    let mut day_best: Option<(VjId, RTime)> = None;
                    for (cand_vj, cal, attrs) in view.jp_vjs(jp) {
                        if req.banned_vjs.contains(&cand_vj) {
                            continue;
                        }
                        if !cal.intersects(sd.mask) {
                            continue;
                        }
                        if !attrs.satisfies(req.trip_attributes) {
                            continue;
                        }
                        let Some(t) = view.stoptime(jp, cand_vj, jp_point_id, req.arrive_by, sd) else {
                            continue;
                        };
                        let reachable = if req.arrive_by { t <= prev_time } else { t >= prev_time };
                        if !reachable {
                            continue;
                        }
                        let better = day_best.is_none_or(|(_, bt)| {
                            if req.arrive_by {
                                t > bt
                            } else {
                                t < bt
                            }
                        });
                        if better {
                            day_best = Some((cand_vj, t));
                        }
                    }

                    if let Some((dvj, dt)) = day_best {
                        let improves_running = best_found.is_none_or(|(_, bt, _)| {
                            if req.arrive_by {
                                dt > bt
                            } else {
                                dt < bt
                            }
                        });
                        if improves_running {
                            best_found = Some((dvj, dt, di));
                        }
                        if !overlap {
                            break;
                        }
                    }
                }

                if let Some((found_vj, found_time, di)) = best_found {
                    vj = Some(found_vj);
                    board_time = found_time;
                    board_stop = s;
                    board_jp_point = jp_point_id;
                    board_serviceday = Some(di);
                    continue;
                }
            }

            if can_alight_here {
                if let Some(cur_vj) = vj {
                    let sd = &servicedays[board_serviceday.expect("boarded vj has a serviceday")];
                    // Alighting reads arrival for forward, departure for
                    // arrive-by — the opposite of `stoptime`'s `arrive_flag`
                    // convention, which the board-candidate scan above uses
                    // directly.
                    let Some(time) = view.stoptime(jp, cur_vj, jp_point_id, !req.arrive_by, sd) else {
                        continue;
                    };

                    if best_time[target.index()] != UNREACHED {
                        let worse = if req.arrive_by {
                            time < best_time[target.index()]
                        } else {
                            time > best_time[target.index()]
                        };
                        if worse {
                            continue;
                        }
                    }

                    if let Some(cutoff) = time_cutoff {
                        let beyond_cutoff = if req.arrive_by { time < cutoff } else { time > cutoff };
                        if beyond_cutoff {
                            continue;
                        }
                    }

                    if time > THREE_DAYS {
                        continue;
                    }
                    let direction_ok = if req.arrive_by { time <= req_rtime } else { time >= req_rtime };
                    if !direction_ok {
                        continue;
                    }

                    let improves = best_time[s.index()] == UNREACHED
                        || if req.arrive_by {
                            time > best_time[s.index()]
                        } else {
                            time < best_time[s.index()]
                        };
                    if !improves {
                        continue;
                    }

                    best_time[s.index()] = time;
                    states[cur][s.index()] = StopState {
                        time,
                        walk_time: UNREACHED,
                        walk_from: StopId::NONE,
                        ride_from: board_stop,
                        back_jp: jp,
                        back_vj: cur_vj,
                        board_time,
                        back_jp_point: board_jp_point,
                        jp_point: jp_point_id,
                    };
                    updated_stops.set(s.index());
                }
            }
        }
    }
}
