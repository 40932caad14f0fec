//! The synthetic-timetable scenarios from spec.md §8, exercised as a
//! downstream embedder would: through `raptor_transit::prelude`'s public
//! `TimetableBuilder` / `Router` / `RealtimeOverlay` surface only.

use raptor_transit::model::CalendarMask;
use raptor_transit::prelude::*;
use raptor_transit::router::Leg;
use raptor_transit::time::{checked_add, RTime, RTIME_ONE_DAY};

/// 07:50, as used by every scenario below. Epoch seconds fall on calendar
/// day 0 of a timetable built with `calendar_start_time = 0`.
const DEPART_READY_EPOCH: i64 = 7 * 3600 + 50 * 60;

fn req_rtime_for(tt: &Timetable, epoch: i64) -> RTime {
    let local = raptor_transit::time::epoch_to_rtime(epoch, tt.calendar_start_time()).unwrap();
    checked_add(local, RTIME_ONE_DAY).unwrap()
}

/// Every test network below runs entirely on calendar day 0, which
/// `Router::route` always places at `ServiceDay::midnight ==
/// RTIME_ONE_DAY` ("today") regardless of query direction. Stored state
/// times add that midnight on top of the schedule-relative value.
fn shifted(schedule_relative: RTime) -> RTime {
    checked_add(schedule_relative, RTIME_ONE_DAY).unwrap()
}

fn minutes(m: i64) -> RTime {
    ((m * 60) / 4) as RTime
}

fn alight_time(leg: &Leg) -> RTime {
    match *leg {
        Leg::Ride { alight_time, .. } => alight_time,
        Leg::Walk { arrival_time, .. } => arrival_time,
    }
}

fn straight_vj(external_id: &str, begin_time: RTime, leg_minutes: RTime) -> VjSpec {
    VjSpec {
        external_id: external_id.into(),
        begin_time,
        attributes: TripAttributes::NONE,
        calendar: CalendarMask::single_day(0),
        stop_times: vec![
            StopTime { arrival: 0, departure: 0 },
            StopTime { arrival: leg_minutes, departure: leg_minutes },
        ],
    }
}

/// One JP from `from` to `to`, with a single VJ departing at `begin_time`
/// and taking `leg_minutes` worth of rtime to arrive.
fn add_direct_jp(
    b: &mut TimetableBuilder,
    external_id: &str,
    from: StopId,
    to: StopId,
    begin_time: RTime,
    leg_minutes: RTime,
) -> JpId {
    b.add_journey_pattern(JpSpec {
        stops: vec![(from, JpointAttributes::BOARDING), (to, JpointAttributes::ALIGHTING)],
        mode: ModeMask::BUS,
        headsign: format!("to {to}"),
        agency: "agency".into(),
        vehicle_journeys: vec![straight_vj(external_id, begin_time, leg_minutes)],
    })
}

fn add_stop(b: &mut TimetableBuilder, name: &str, lon: f64) -> StopId {
    b.add_stop(StopSpec {
        name: name.into(),
        external_id: name.into(),
        coord: Coord::new(0.0, lon),
    })
}

fn base_request(from: StopId, to: StopId, time: i64) -> Request {
    Request { from, to, time, ..Request::default() }
}

// Scenario 1 (spec.md §8): two-stop direct.
#[test]
fn two_stop_direct() {
    let mut b = TimetableBuilder::new(0);
    let s0 = add_stop(&mut b, "S0", 0.0);
    let s1 = add_stop(&mut b, "S1", 0.01);
    add_direct_jp(&mut b, "A1", s0, s1, minutes(8 * 60), minutes(10));
    let tt = b.build().unwrap();

    let mut router = Router::new(&tt, RouterConfig::default()).unwrap();
    let req = base_request(s0, s1, DEPART_READY_EPOCH);
    let its = router.route(&tt, None, None, &req, &FixedClock(DEPART_READY_EPOCH)).unwrap();

    assert_eq!(its.len(), 1, "expected exactly one round-0 itinerary");
    let it = &its[0];
    assert_eq!(it.rounds, 0);
    assert_eq!(it.legs.len(), 1);
    match &it.legs[0] {
        Leg::Ride { board_stop, alight_stop, board_time, alight_time, .. } => {
            assert_eq!(*board_stop, s0);
            assert_eq!(*alight_stop, s1);
            assert_eq!(*board_time, shifted(minutes(8 * 60)));
            assert_eq!(alight_time - board_time, minutes(10));
            assert!(*board_time >= req_rtime_for(&tt, DEPART_READY_EPOCH), "P4: departs no earlier than requested");
        }
        Leg::Walk { .. } => panic!("expected a ride leg"),
    }
    assert_eq!(it.arrival_time, alight_time(&it.legs[0]));
}

// Scenario 2 (spec.md §8): one transfer, via a self-transfer at S1.
fn three_stop_network() -> (Timetable, StopId, StopId, StopId, JpId, JpId) {
    let mut b = TimetableBuilder::new(0);
    let s0 = add_stop(&mut b, "S0", 0.0);
    let s1 = add_stop(&mut b, "S1", 0.01);
    let s2 = add_stop(&mut b, "S2", 0.02);
    let jp_a = add_direct_jp(&mut b, "A1", s0, s1, minutes(8 * 60), minutes(10));
    let jp_b = add_direct_jp(&mut b, "B1", s1, s2, minutes(8 * 60 + 15), minutes(10));
    let tt = b.build().unwrap();
    (tt, s0, s1, s2, jp_a, jp_b)
}

#[test]
fn one_transfer_via_self_transfer() {
    let (tt, s0, _s1, s2, jp_a, jp_b) = three_stop_network();
    let mut router = Router::new(&tt, RouterConfig::default()).unwrap();
    let req = base_request(s0, s2, DEPART_READY_EPOCH);
    let its = router.route(&tt, None, None, &req, &FixedClock(DEPART_READY_EPOCH)).unwrap();

    assert_eq!(its.len(), 1, "S2 is only reached once the round-1 connection boards");
    let full = &its[0];
    assert_eq!(full.rounds, 1);
    assert_eq!(full.legs.len(), 2, "P3 (off-by-one, see DESIGN.md): round 1 has 2 rides");
    let Leg::Ride { jp: first_jp, alight_stop: first_alight, alight_time: t1, .. } = &full.legs[0] else {
        panic!("leg 0 should be a ride")
    };
    let Leg::Ride { jp: second_jp, board_stop: second_board, board_time: t2, .. } = &full.legs[1] else {
        panic!("leg 1 should be a ride")
    };
    assert_eq!(*first_jp, jp_a);
    assert_eq!(*second_jp, jp_b);
    assert_eq!(*first_alight, *second_board);
    assert!(t2 >= t1, "self-transfer carries readiness forward, no backwards time travel");
    assert_eq!(alight_time(&full.legs[1]), shifted(minutes(8 * 60 + 25)));
}

// Scenario 3 (spec.md §8): arrive-by symmetry over the same network.
#[test]
fn arrive_by_symmetry() {
    let (tt, s0, _s1, s2, jp_a, jp_b) = three_stop_network();
    let mut router = Router::new(&tt, RouterConfig::default()).unwrap();
    let arrive_epoch = 9 * 3600;
    let req = Request { arrive_by: true, ..base_request(s0, s2, arrive_epoch) };
    let its = router.route(&tt, None, None, &req, &FixedClock(arrive_epoch)).unwrap();

    let full = its.iter().find(|it| it.rounds == 1).expect("round-1 itinerary");
    let Leg::Ride { jp: first_jp, board_time: board_a, .. } = &full.legs[0] else {
        panic!("leg 0 should be a ride")
    };
    let Leg::Ride { jp: second_jp, alight_time: alight_b, .. } = &full.legs[1] else {
        panic!("leg 1 should be a ride")
    };
    assert_eq!(*first_jp, jp_a);
    assert_eq!(*second_jp, jp_b);
    assert_eq!(*board_a, shifted(minutes(8 * 60)));
    assert_eq!(*alight_b, shifted(minutes(8 * 60 + 25)));
    for leg in &full.legs {
        assert!(alight_time(leg) <= req_rtime_for(&tt, arrive_epoch), "P4: arrive-by never arrives late");
    }
}

// Scenario 4 (spec.md §8): target pruning discards a slower same-round
// direct alternative once a faster one has set `best_time[target]`.
#[test]
fn target_pruning_keeps_fastest_direct() {
    let mut b = TimetableBuilder::new(0);
    let s0 = add_stop(&mut b, "S0", 0.0);
    let s1 = add_stop(&mut b, "S1", 0.01);
    let s2 = add_stop(&mut b, "S2", 0.02);
    let _jp_a = add_direct_jp(&mut b, "A1", s0, s1, minutes(8 * 60), minutes(10));
    let jp_fast = add_direct_jp(&mut b, "FAST", s0, s2, minutes(8 * 60), minutes(20));
    let _jp_slow = add_direct_jp(&mut b, "SLOW", s0, s2, minutes(8 * 60), minutes(90));
    let tt = b.build().unwrap();

    let mut router = Router::new(&tt, RouterConfig::default()).unwrap();
    let req = base_request(s0, s2, DEPART_READY_EPOCH);
    let its = router.route(&tt, None, None, &req, &FixedClock(DEPART_READY_EPOCH)).unwrap();

    let round0 = its.iter().find(|it| it.rounds == 0).expect("round-0 itinerary");
    let Leg::Ride { jp, alight_time, .. } = &round0.legs[0] else { panic!("expected a ride leg") };
    assert_eq!(*jp, jp_fast, "the slower direct JP must be pruned against best_time[target]");
    assert_eq!(*alight_time, shifted(minutes(8 * 60 + 20)));
}

// Scenario 5 (spec.md §8): canceling the only VJ on JP-B leaves the
// round-0 result but drops the round-1 connection.
#[test]
fn realtime_cancel_drops_connecting_trip() {
    let (tt, s0, _s1, s2, _jp_a, _jp_b) = three_stop_network();
    let mut overlay = RealtimeOverlay::new();
    let (applied, drops) = overlay.apply_feed(
        &tt,
        &[TripUpdate {
            trip_external_id: "B1".into(),
            schedule_relationship: raptor_transit::realtime::TripScheduleRelationship::Canceled,
            service_day: 0,
            stop_time_updates: vec![],
        }],
    );
    assert_eq!(applied, 1);
    assert!(drops.is_empty());

    let mut router = Router::new(&tt, RouterConfig::default()).unwrap();
    let req = base_request(s0, s2, DEPART_READY_EPOCH);
    let its = router
        .route(&tt, Some(&overlay), None, &req, &FixedClock(DEPART_READY_EPOCH))
        .unwrap();

    assert!(
        its.is_empty(),
        "S2 is only ever reached via the round-1 connection, which the cancellation removes"
    );
}

// Boundary (spec.md §8): max_transfers = 0 yields at most one ride leg.
#[test]
fn max_transfers_zero_yields_one_ride() {
    let (tt, s0, _s1, s2, _jp_a, _jp_b) = three_stop_network();
    let mut router = Router::new(&tt, RouterConfig::default()).unwrap();
    let req = Request { max_transfers: 0, ..base_request(s0, s2, DEPART_READY_EPOCH) };
    let its = router.route(&tt, None, None, &req, &FixedClock(DEPART_READY_EPOCH)).unwrap();
    assert!(
        its.is_empty(),
        "S2 needs the round-1 connection at S1, which max_transfers = 0 forbids"
    );
}

// Scenario 6 (spec.md §8): a realtime reroute forks a new JP serving an
// added stop, and a query can route through it. Regression coverage for
// the forked-`JpId` offset and `updated_routes` capacity growth
// documented in DESIGN.md.
#[test]
fn realtime_reroute_routes_through_added_stop() {
    use raptor_transit::realtime::{StopTimeUpdate, StopUpdateRelationship, TimeUpdate, TripScheduleRelationship};

    let mut b = TimetableBuilder::new(0);
    let s0 = add_stop(&mut b, "S0", 0.0);
    let s1 = add_stop(&mut b, "S1", 0.02);
    add_direct_jp(&mut b, "A1", s0, s1, minutes(8 * 60), minutes(10));
    let tt = b.build().unwrap();
    let s_new = StopId::from_index(2);

    let mut overlay = RealtimeOverlay::new();
    let (applied, drops) = overlay.apply_feed(
        &tt,
        &[TripUpdate {
            trip_external_id: "A1".into(),
            schedule_relationship: TripScheduleRelationship::Scheduled,
            service_day: 0,
            stop_time_updates: vec![
                StopTimeUpdate {
                    stop: s0,
                    relationship: StopUpdateRelationship::Scheduled,
                    arrival: TimeUpdate::Absolute(minutes(8 * 60)),
                    departure: TimeUpdate::Absolute(minutes(8 * 60)),
                },
                StopTimeUpdate {
                    stop: s_new,
                    relationship: StopUpdateRelationship::Added,
                    arrival: TimeUpdate::Absolute(minutes(8 * 60 + 5)),
                    departure: TimeUpdate::Absolute(minutes(8 * 60 + 5)),
                },
                StopTimeUpdate {
                    stop: s1,
                    relationship: StopUpdateRelationship::Scheduled,
                    arrival: TimeUpdate::Absolute(minutes(8 * 60 + 10)),
                    departure: TimeUpdate::Absolute(minutes(8 * 60 + 10)),
                },
            ],
        }],
    );
    assert_eq!(applied, 1);
    assert!(drops.is_empty());

    let mut router = Router::new(&tt, RouterConfig::default()).unwrap();
    let req = base_request(s0, s_new, DEPART_READY_EPOCH);
    let its = router
        .route(&tt, Some(&overlay), None, &req, &FixedClock(DEPART_READY_EPOCH))
        .unwrap();

    assert_eq!(its.len(), 1);
    let Leg::Ride { jp, alight_stop, alight_time, .. } = &its[0].legs[0] else {
        panic!("expected a ride leg through the forked journey pattern")
    };
    assert_eq!(*alight_stop, s_new);
    assert_eq!(*jp, JpId::from_index(tt.n_jps()), "forked JP id must sit past the static JpId range");
    assert_eq!(*alight_time, shifted(minutes(8 * 60 + 5)));
}
