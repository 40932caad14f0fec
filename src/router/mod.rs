//! Router Core (spec.md §4.3): owns the per-query scratch, drives the
//! round scan / transfer relaxation loop, and reconstructs itineraries.
//! ≈35% of the core.

mod reconstruct;
mod round;
mod state;
pub mod timetable_view;
mod transfers;

use hashbrown::HashSet;

use crate::bitset::Bitset;
use crate::clock::Clock;
use crate::error::{Error, InvalidRequest};
use crate::model::{CalendarMask, JpId, JpPointId, ModeMask, StopId, Timetable, TripAttributes, VjId};
use crate::realtime::RealtimeOverlay;
use crate::spatial::HashGrid;
use crate::time::{checked_add, checked_sub, sec_to_rtime, RTime, RTIME_ONE_DAY, RTIME_TWO_DAYS, UNREACHED};

pub use state::{ServiceDay, StopState, WALK};

/// Walking speed slack applied to access/egress legs from a coordinate
/// endpoint, where no real transfer-table distance (which already bakes
/// in actual network walking distance) is available. Not present in
/// `examples/original_source/` — a documented assumption, see DESIGN.md.
const WALK_COMP: f64 = 1.3;

/// One routing request (spec.md §6 "Request fields (design level)").
#[derive(Debug, Clone)]
pub struct Request {
    pub from: StopId,
    pub to: StopId,
    pub from_coord: Option<crate::model::Coord>,
    pub to_coord: Option<crate::model::Coord>,
    /// Departure (or, if `arrive_by`, arrival) epoch seconds.
    pub time: i64,
    pub arrive_by: bool,
    pub walk_speed_mps: f64,
    pub walk_slack_sec: u32,
    pub max_walk_distance_m: f64,
    pub mode: ModeMask,
    pub trip_attributes: TripAttributes,
    pub max_transfers: usize,
    pub via: Option<StopId>,
    pub time_cutoff: Option<i64>,
    pub onboard_vj: Option<VjId>,
    pub banned_stops: HashSet<StopId>,
    pub banned_stops_hard: HashSet<StopId>,
    pub banned_routes: HashSet<JpId>,
    pub banned_vjs: HashSet<VjId>,
}

impl Default for Request {
    fn default() -> Self {
        Request {
            from: StopId::NONE,
            to: StopId::NONE,
            from_coord: None,
            to_coord: None,
            time: 0,
            arrive_by: false,
            walk_speed_mps: 1.3,
            walk_slack_sec: 60,
            max_walk_distance_m: 1000.0,
            mode: ModeMask::ALL,
            trip_attributes: TripAttributes::NONE,
            max_transfers: 8,
            via: None,
            time_cutoff: None,
            onboard_vj: None,
            banned_stops: HashSet::new(),
            banned_stops_hard: HashSet::new(),
            banned_routes: HashSet::new(),
            banned_vjs: HashSet::new(),
        }
    }
}

/// One leg of a reconstructed itinerary (spec.md §4.3.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leg {
    Ride {
        jp: JpId,
        vj: VjId,
        board_stop: StopId,
        board_jp_point: JpPointId,
        board_time: RTime,
        alight_stop: StopId,
        alight_jp_point: JpPointId,
        alight_time: RTime,
    },
    Walk {
        from_stop: StopId,
        to_stop: StopId,
        arrival_time: RTime,
    },
}

/// One Pareto-optimal itinerary, the result of terminating round `rounds`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Itinerary {
    pub rounds: usize,
    pub arrival_time: RTime,
    /// Legs in travel order (origin to destination), regardless of
    /// whether the query was arrive-by.
    pub legs: Vec<Leg>,
}

/// Owns the reusable per-query scratch (spec.md §4.3 "Setup"):
/// `best_time`, `R` rounds of per-stop state, and the two bitsets.
/// Allocated once and reused across queries via [`Router::route`].
pub struct Router {
    max_rounds: usize,
    best_time: Vec<RTime>,
    /// `states[0]` is the seed ("round −1") scratch; `states[r + 1]` is
    /// round `r`'s output. This sidesteps spec.md §9's "states[1] reset
    /// trick" by giving the seed its own slot instead of reusing round
    /// 0's array — see DESIGN.md.
    states: Vec<Vec<StopState>>,
    updated_stops: Bitset,
    updated_routes: Bitset,
    cfg: crate::model::RouterConfig,
}

impl Router {
    /// Allocates scratch space sized for `timetable` (spec.md §4.3
    /// "Setup"). Call once per timetable; reuse the same `Router` across
    /// queries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailure`] if `n_stops` or `n_jps`
    /// cannot be represented in the bitset's indexing capacity.
    pub fn new(timetable: &Timetable, cfg: crate::model::RouterConfig) -> Result<Self, Error> {
        let n_stops = timetable.n_stops();
        let n_jps = timetable.n_jps();
        if n_stops == 0 {
            return Err(Error::AllocationFailure(n_stops));
        }
        let states = (0..=cfg.max_rounds)
            .map(|_| vec![StopState::default(); n_stops])
            .collect();
        Ok(Router {
            max_rounds: cfg.max_rounds,
            best_time: vec![UNREACHED; n_stops],
            states,
            updated_stops: Bitset::new(n_stops),
            updated_routes: Bitset::new(n_jps.max(1)),
            cfg,
        })
    }

    fn reset(&mut self) {
        for v in &mut self.best_time {
            *v = UNREACHED;
        }
        for round_states in &mut self.states {
            for s in round_states {
                *s = StopState::default();
            }
        }
        self.updated_stops.clear();
        self.updated_routes.clear();
    }

    /// Runs one query (spec.md §4.3), returning one [`Itinerary`] per
    /// round that reaches the target, earliest round first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the request cannot be
    /// resolved to a valid origin/destination, or combines onboard with
    /// arrive-by.
    pub fn route(
        &mut self,
        tt: &Timetable,
        rt: Option<&RealtimeOverlay>,
        grid: Option<&HashGrid>,
        req: &Request,
        clock: &dyn Clock,
    ) -> Result<Vec<Itinerary>, Error> {
        let view = timetable_view::TimetableView::new(tt, rt);
        // The realtime overlay may have forked new journey patterns since
        // this `Router` was allocated; `updated_routes` must cover their
        // ids too (spec.md §4.4 fork, `JpId` space extended past `tt.n_jps()`).
        self.updated_routes.ensure_capacity(view.n_jps().max(1));
        self.reset();

        if req.onboard_vj.is_some() && req.arrive_by {
            return Err(Error::InvalidRequest(InvalidRequest::OnboardArriveBy));
        }

        let d_travel = tt.day_index_for_epoch(req.time);
        let d_now = tt.day_index_for_epoch(clock.now());
        let servicedays = build_servicedays(d_travel, d_now, req.arrive_by);
        let day_mask = servicedays[0].mask | servicedays[1].mask | servicedays[2].mask;

        // `epoch_to_rtime` resolves a time against `d_travel`'s own
        // midnight; every other rtime value in this query (stop times,
        // `ServiceDay::midnight`) is relative to the three-day window's
        // zero point instead, where `d_travel` ("today") sits at offset
        // `RTIME_ONE_DAY` (servicedays[1]). Shift into that shared frame.
        let req_epoch_midnight = tt.calendar_start_time() + d_travel * 86_400;
        let Some(req_rtime_local) = crate::time::epoch_to_rtime(req.time, req_epoch_midnight) else {
            return Err(Error::InvalidRequest(InvalidRequest::OriginUnresolved));
        };
        let req_rtime = checked_add(req_rtime_local, RTIME_ONE_DAY).unwrap_or(RTIME_TWO_DAYS).min(RTIME_TWO_DAYS);

        let time_cutoff = req.time_cutoff.and_then(|t| {
            let local = crate::time::epoch_to_rtime(t, req_epoch_midnight)?;
            checked_add(local, RTIME_ONE_DAY)
        });

        let mut skip_initial_transfers = false;
        let (origin, target) = if let Some(onboard_vj) = req.onboard_vj {
            let today_sd = servicedays
                .iter()
                .find(|sd| sd.apply_realtime)
                .copied()
                .unwrap_or(servicedays[1]);
            let (origin, seed) = resolve_onboard(&view, tt, onboard_vj, req_rtime, &today_sd)?;
            let jp = tt.vehicle_journey(onboard_vj).jp;
            self.best_time[origin.index()] = seed;
            self.states[0][origin.index()] = StopState {
                time: seed,
                walk_time: seed,
                walk_from: origin,
                ..StopState::default()
            };
            self.updated_routes.set(jp.index());
            skip_initial_transfers = true;

            let to = resolve_endpoint_stop(
                tt,
                grid,
                req.to,
                req.to_coord,
                req.max_walk_distance_m,
                InvalidRequest::DestinationUnresolved,
            )?;
            (origin, to)
        } else {
            let (mut from, mut to) = (req.from, req.to);
            let (mut from_coord, mut to_coord) = (req.from_coord, req.to_coord);
            if req.arrive_by {
                std::mem::swap(&mut from, &mut to);
                std::mem::swap(&mut from_coord, &mut to_coord);
            }

            let origin_is_coord = !tt.is_valid_stop(from) && from_coord.is_some();
            let origin = if origin_is_coord {
                seed_from_coordinate(
                    tt,
                    grid,
                    from_coord.unwrap(),
                    req,
                    req_rtime,
                    self.cfg.max_candidate_stops,
                    &mut self.best_time,
                    &mut self.states[0],
                    &mut self.updated_stops,
                )
                .ok_or(Error::InvalidRequest(InvalidRequest::OriginUnresolved))?
            } else {
                if !tt.is_valid_stop(from) {
                    return Err(Error::InvalidRequest(if from_coord.is_none() {
                        InvalidRequest::StopOutOfRange(u32::try_from(from.index()).unwrap_or(u32::MAX))
                    } else {
                        InvalidRequest::OriginUnresolved
                    }));
                }
                self.best_time[from.index()] = req_rtime;
                self.states[0][from.index()] = StopState {
                    time: req_rtime,
                    walk_time: req_rtime,
                    walk_from: from,
                    ..StopState::default()
                };
                self.updated_stops.set(from.index());
                from
            };

            let target = resolve_endpoint_stop(
                tt,
                grid,
                to,
                to_coord,
                req.max_walk_distance_m,
                InvalidRequest::DestinationUnresolved,
            )?;
            (origin, target)
        };

        if !skip_initial_transfers {
            transfers::apply_transfers(
                &view,
                req,
                day_mask,
                req.walk_speed_mps,
                req.walk_slack_sec,
                &mut self.best_time,
                &mut self.states[0],
                &mut self.updated_stops,
                &mut self.updated_routes,
            );
        }

        let max_r = req.max_transfers.saturating_add(1).min(self.max_rounds);
        let mut itineraries = Vec::new();

        for r in 0..max_r {
            let flagged: Vec<usize> = self.updated_routes.ones().collect();
            if flagged.is_empty() {
                break;
            }

            round::round(
                &view,
                req,
                &servicedays,
                target,
                req_rtime,
                time_cutoff,
                flagged.as_slice(),
                r,
                &mut self.best_time,
                &mut self.states,
                &mut self.updated_stops,
            );

            for &s in req.banned_stops_hard.iter().chain(req.banned_stops.iter()) {
                if s.index() < self.updated_stops.capacity() {
                    self.updated_stops.unset(s.index());
                }
            }

            transfers::apply_transfers(
                &view,
                req,
                day_mask,
                req.walk_speed_mps,
                req.walk_slack_sec,
                &mut self.best_time,
                &mut self.states[r + 1],
                &mut self.updated_stops,
                &mut self.updated_routes,
            );

            if self.states[r + 1][target.index()].time != UNREACHED {
                let it = reconstruct::reconstruct(&self.states, origin, target, r, req.arrive_by);
                itineraries.push(it);
            }
        }

        Ok(itineraries)
    }
}

fn build_servicedays(d_travel: i64, d_now: i64, arrive_by: bool) -> [ServiceDay; 3] {
    let today = u32::try_from(d_travel.rem_euclid(i64::from(crate::model::CALENDAR_DAYS))).unwrap_or(0);
    let today_mask = CalendarMask::single_day(today);
    let yesterday_mask = today_mask >> 1;
    let tomorrow_mask = today_mask << 1;

    let mut days = [
        ServiceDay {
            midnight: 0,
            mask: yesterday_mask,
            apply_realtime: d_now == d_travel - 1,
        },
        ServiceDay {
            midnight: RTIME_ONE_DAY,
            mask: today_mask,
            apply_realtime: d_now == d_travel,
        },
        ServiceDay {
            midnight: RTIME_TWO_DAYS,
            mask: tomorrow_mask,
            apply_realtime: d_now == d_travel + 1,
        },
    ];
    if arrive_by {
        days.reverse();
    }
    days
}

fn resolve_endpoint_stop(
    tt: &Timetable,
    grid: Option<&HashGrid>,
    stop: StopId,
    coord: Option<crate::model::Coord>,
    max_walk_distance_m: f64,
    unresolved: InvalidRequest,
) -> Result<StopId, InvalidRequest> {
    if tt.is_valid_stop(stop) {
        return Ok(stop);
    }
    let Some(coord) = coord else {
        return Err(InvalidRequest::StopOutOfRange(u32::try_from(stop.index()).unwrap_or(u32::MAX)));
    };
    grid.and_then(|grid| grid.closest(tt, coord, max_walk_distance_m))
        .map(|hit| hit.stop)
        .ok_or(unresolved)
}

#[allow(clippy::too_many_arguments)]
fn seed_from_coordinate(
    tt: &Timetable,
    grid: Option<&HashGrid>,
    coord: crate::model::Coord,
    req: &Request,
    req_rtime: RTime,
    max_candidate_stops: usize,
    best_time: &mut [RTime],
    seed_state: &mut [StopState],
    updated_stops: &mut Bitset,
) -> Option<StopId> {
    let grid = grid?;
    let mut hits = grid.query(tt, coord, req.max_walk_distance_m);
    if hits.is_empty() {
        return None;
    }
    hits.truncate(max_candidate_stops.max(1));
    for hit in &hits {
        let dur_sec = (hit.dist_meters * WALK_COMP / req.walk_speed_mps).round() as u32;
        let dur = sec_to_rtime(dur_sec);
        let t = if req.arrive_by {
            checked_sub(req_rtime, dur)
        } else {
            checked_add(req_rtime, dur)
        };
        let Some(t) = t else { continue };

        let improves = best_time[hit.stop.index()] == UNREACHED
            || if req.arrive_by {
                t > best_time[hit.stop.index()]
            } else {
                t < best_time[hit.stop.index()]
            };
        if !improves {
            continue;
        }
        best_time[hit.stop.index()] = t;
        seed_state[hit.stop.index()] = StopState {
            time: t,
            walk_time: t,
            walk_from: hit.stop,
            ..StopState::default()
        };
        updated_stops.set(hit.stop.index());
    }
    Some(hits[0].stop)
}

/// Locates the latest stop on `vj` whose schedule time does not exceed
/// `req_rtime` (spec.md §4.3 origin resolution, onboard case): the
/// traveler boards the search there, seeded with that stop's own time.
fn resolve_onboard(
    view: &timetable_view::TimetableView,
    tt: &Timetable,
    vj: VjId,
    req_rtime: RTime,
    serviceday: &ServiceDay,
) -> Result<(StopId, RTime), Error> {
    if vj.index() >= tt.n_vjs() {
        return Err(Error::InvalidRequest(InvalidRequest::VehicleJourneyOutOfRange(
            u32::try_from(vj.index()).unwrap_or(u32::MAX),
        )));
    }
    let row = tt.vehicle_journey(vj);
    let jp = row.jp;
    let n_stops = view.jp_n_stops(jp);

    let mut best: Option<(StopId, RTime)> = None;
    for i in 0..n_stops {
        let point = view.jp_point(jp, i);
        let jp_point = JpPointId::from_index(i);
        let Some(t) = view.stoptime(jp, vj, jp_point, false, serviceday) else {
            continue;
        };
        if t <= req_rtime {
            best = Some((point.stop, t));
        } else {
            break;
        }
    }
    best.ok_or(Error::InvalidRequest(InvalidRequest::OnboardStopNotFound(
        u32::try_from(vj.index()).unwrap_or(u32::MAX),
    )))
}
