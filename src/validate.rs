//! Timetable validation, run once at [`crate::model::TimetableBuilder::build`]
//! time (spec.md §2 "Validation" component; ≈5% of the core).
//!
//! Grounded in `examples/original_source/tdata_validation.c`'s checklist
//! (monotone stop-times, symmetric transfers, coordinate ranges, JP
//! endpoint boarding/alighting flags) and in the
//! collect-every-problem-then-report style of
//! `ferrobus_core::error::Error`: a build either succeeds or returns every
//! violation found, not just the first.

use std::fmt;

use crate::model::{JpSpec, StopId, TimetableBuilder};

/// One violation of a timetable invariant from spec.md §3/§4.1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    StopTimesNotMonotone {
        jp_index: usize,
        vj_index: usize,
        jp_point: usize,
    },
    AsymmetricTransfer {
        from: StopId,
        to: StopId,
    },
    CoordinateOutOfRange {
        stop: StopId,
    },
    JpMissingBoardingAtFirstPoint {
        jp_index: usize,
    },
    JpMissingAlightingAtLastPoint {
        jp_index: usize,
    },
    JpTimeWindowInverted {
        jp_index: usize,
    },
    JpStopTimesLengthMismatch {
        jp_index: usize,
        vj_index: usize,
    },
    JpTooFewStops {
        jp_index: usize,
    },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::StopTimesNotMonotone {
                jp_index,
                vj_index,
                jp_point,
            } => write!(
                f,
                "jp {jp_index} vj {vj_index}: stop-times not monotone at point {jp_point}"
            ),
            Problem::AsymmetricTransfer { from, to } => {
                write!(f, "transfer {from} -> {to} has no matching reverse transfer")
            }
            Problem::CoordinateOutOfRange { stop } => {
                write!(f, "stop {stop} coordinate out of WGS-84 range")
            }
            Problem::JpMissingBoardingAtFirstPoint { jp_index } => {
                write!(f, "jp {jp_index}: first point lacks the boarding attribute")
            }
            Problem::JpMissingAlightingAtLastPoint { jp_index } => {
                write!(f, "jp {jp_index}: last point lacks the alighting attribute")
            }
            Problem::JpTimeWindowInverted { jp_index } => {
                write!(f, "jp {jp_index}: min_time > max_time")
            }
            Problem::JpStopTimesLengthMismatch { jp_index, vj_index } => write!(
                f,
                "jp {jp_index} vj {vj_index}: stop-times length does not match the jp's stop count"
            ),
            Problem::JpTooFewStops { jp_index } => {
                write!(f, "jp {jp_index}: fewer than 2 stops")
            }
        }
    }
}

/// Runs every check in spec.md §2's Validation component against a
/// not-yet-built [`TimetableBuilder`], returning every problem found.
#[must_use]
pub fn validate(builder: &TimetableBuilder) -> Vec<Problem> {
    let mut problems = Vec::new();

    validate_coordinates(builder, &mut problems);
    validate_transfers_symmetric(builder, &mut problems);
    validate_jps(builder, &mut problems);

    problems
}

fn validate_coordinates(builder: &TimetableBuilder, problems: &mut Vec<Problem>) {
    for (i, spec) in builder.stops().iter().enumerate() {
        if !spec.coord.in_range() {
            problems.push(Problem::CoordinateOutOfRange {
                stop: StopId::from_index(i),
            });
        }
    }
}

fn validate_transfers_symmetric(builder: &TimetableBuilder, problems: &mut Vec<Problem>) {
    // Build a lookup of (from, to) -> dist_meters for O(1) reverse checks.
    let mut pairs: hashbrown::HashMap<(StopId, StopId), u32> = hashbrown::HashMap::new();
    for (from_idx, idxs) in builder.transfers_by_stop().iter().enumerate() {
        let from = StopId::from_index(from_idx);
        for &t_idx in idxs {
            let t = builder.transfers()[t_idx];
            pairs.insert((from, t.target_stop), t.dist_meters);
        }
    }
    for (from_idx, idxs) in builder.transfers_by_stop().iter().enumerate() {
        let from = StopId::from_index(from_idx);
        for &t_idx in idxs {
            let t = builder.transfers()[t_idx];
            match pairs.get(&(t.target_stop, from)) {
                None => problems.push(Problem::AsymmetricTransfer {
                    from,
                    to: t.target_stop,
                }),
                Some(&reverse_dist) if reverse_dist != t.dist_meters => {
                    problems.push(Problem::AsymmetricTransfer {
                        from,
                        to: t.target_stop,
                    });
                }
                Some(_) => {}
            }
        }
    }
}

fn validate_jps(builder: &TimetableBuilder, problems: &mut Vec<Problem>) {
    for (jp_idx, jp) in builder.jps().iter().enumerate() {
        if jp.stops.len() < 2 {
            problems.push(Problem::JpTooFewStops { jp_index: jp_idx });
            continue;
        }
        let (_, first_attrs) = jp.stops[0];
        if !first_attrs.can_board() {
            problems.push(Problem::JpMissingBoardingAtFirstPoint { jp_index: jp_idx });
        }
        let (_, last_attrs) = jp.stops[jp.stops.len() - 1];
        if !last_attrs.can_alight() {
            problems.push(Problem::JpMissingAlightingAtLastPoint { jp_index: jp_idx });
        }

        for (vj_idx, vj) in jp.vehicle_journeys.iter().enumerate() {
            if vj.stop_times.len() != jp.stops.len() {
                problems.push(Problem::JpStopTimesLengthMismatch {
                    jp_index: jp_idx,
                    vj_index: vj_idx,
                });
                continue;
            }
            for (point, st) in vj.stop_times.iter().enumerate() {
                if st.arrival > st.departure {
                    problems.push(Problem::StopTimesNotMonotone {
                        jp_index: jp_idx,
                        vj_index: vj_idx,
                        jp_point: point,
                    });
                    continue;
                }
                if point > 0 {
                    let prev = vj.stop_times[point - 1];
                    if st.arrival < prev.departure {
                        problems.push(Problem::StopTimesNotMonotone {
                            jp_index: jp_idx,
                            vj_index: vj_idx,
                            jp_point: point,
                        });
                    }
                }
            }
        }

        if let (Some(min), Some(max)) = (jp_min_time(jp), jp_max_time(jp)) {
            if min > max {
                problems.push(Problem::JpTimeWindowInverted { jp_index: jp_idx });
            }
        }
    }
}

fn jp_min_time(jp: &JpSpec) -> Option<crate::time::RTime> {
    jp.vehicle_journeys
        .iter()
        .filter_map(|vj| vj.stop_times.first().map(|s| vj.begin_time.saturating_add(s.departure)))
        .min()
}

fn jp_max_time(jp: &JpSpec) -> Option<crate::time::RTime> {
    jp.vehicle_journeys
        .iter()
        .filter_map(|vj| vj.stop_times.last().map(|s| vj.begin_time.saturating_add(s.arrival)))
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CalendarMask, Coord, JpSpec, JpointAttributes, ModeMask, StopSpec, StopTime,
        TripAttributes, VjSpec,
    };

    fn stop(name: &str) -> StopSpec {
        StopSpec {
            name: name.to_string(),
            external_id: name.to_string(),
            coord: Coord::new(0.0, 0.0),
        }
    }

    #[test]
    fn catches_asymmetric_transfer() {
        let mut b = TimetableBuilder::new(0);
        let s0 = b.add_stop(stop("a"));
        let s1 = b.add_stop(stop("b"));
        b.add_transfer(s0, s1, 100);
        // no reverse transfer added
        let problems = validate(&b);
        assert!(problems
            .iter()
            .any(|p| matches!(p, Problem::AsymmetricTransfer { .. })));
    }

    #[test]
    fn catches_mismatched_reverse_distance() {
        let mut b = TimetableBuilder::new(0);
        let s0 = b.add_stop(stop("a"));
        let s1 = b.add_stop(stop("b"));
        b.add_transfer(s0, s1, 100);
        b.add_transfer(s1, s0, 200);
        let problems = validate(&b);
        assert!(problems
            .iter()
            .any(|p| matches!(p, Problem::AsymmetricTransfer { .. })));
    }

    #[test]
    fn catches_bad_coordinate() {
        let mut b = TimetableBuilder::new(0);
        b.add_stop(StopSpec {
            name: "bad".into(),
            external_id: "bad".into(),
            coord: Coord::new(200.0, 0.0),
        });
        let problems = validate(&b);
        assert!(problems
            .iter()
            .any(|p| matches!(p, Problem::CoordinateOutOfRange { .. })));
    }

    #[test]
    fn catches_missing_boarding_flag() {
        let mut b = TimetableBuilder::new(0);
        let s0 = b.add_stop(stop("a"));
        let s1 = b.add_stop(stop("b"));
        b.add_journey_pattern(JpSpec {
            stops: vec![
                (s0, JpointAttributes::NONE),
                (s1, JpointAttributes::ALIGHTING),
            ],
            mode: ModeMask::BUS,
            headsign: String::new(),
            agency: "a".into(),
            vehicle_journeys: vec![VjSpec {
                external_id: "vj0".into(),
                begin_time: 0,
                attributes: TripAttributes::NONE,
                calendar: CalendarMask::single_day(0),
                stop_times: vec![
                    StopTime { arrival: 0, departure: 10 },
                    StopTime { arrival: 20, departure: 20 },
                ],
            }],
        });
        let problems = validate(&b);
        assert!(problems
            .iter()
            .any(|p| matches!(p, Problem::JpMissingBoardingAtFirstPoint { .. })));
    }
}
