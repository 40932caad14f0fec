//! Realtime schedule overlay (spec.md §2 "Realtime Overlay (RT)", §4.4;
//! ≈15% of the core).
//!
//! Protobuf decoding of a GTFS-rt `FeedMessage` is out of scope (spec.md
//! §1); this module's entry point takes an already-decoded sequence of
//! [`TripUpdate`] values, the same boundary `ferrobus_core::loading::gtfs`
//! draws between raw `serde`-deserialized rows and the processed model.
//! Per-update failures are collected into a `Vec<OverlayDrop>` rather than
//! aborting the whole feed (spec.md §7).

use hashbrown::HashMap;

use crate::error::{OverlayDrop, OverlayDropReason};
use crate::model::{
    CalendarMask, JpId, JpPoint, JpointAttributes, ModeMask, StopId, StopTime, Timetable,
    TripAttributes, VjId, CALENDAR_DAYS,
};
use crate::time::RTime;

/// A decoded GTFS-rt `TripUpdate.trip.schedule_relationship`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripScheduleRelationship {
    Canceled,
    Scheduled,
    /// Not one of the two relationships spec.md §6 says the overlay
    /// honors directly, but present in real feeds; treated the same as
    /// an explicit withdrawal (spec.md §4.4 step 1: "if deleted, free
    /// overlay and restore original calendar validity").
    Deleted,
}

/// A decoded `StopTimeUpdate.schedule_relationship`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopUpdateRelationship {
    Scheduled,
    Skipped,
    Added,
    NoData,
}

/// Either an absolute rtime or a delay in seconds, matching GTFS-rt's
/// `StopTimeEvent` having either a `time` or a `delay` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUpdate {
    Absolute(RTime),
    DelaySeconds(i32),
    None,
}

/// One stop-time update within a [`TripUpdate`].
#[derive(Debug, Clone)]
pub struct StopTimeUpdate {
    pub stop: StopId,
    pub relationship: StopUpdateRelationship,
    pub arrival: TimeUpdate,
    pub departure: TimeUpdate,
}

/// One decoded `TripUpdate` from a GTFS-rt feed.
#[derive(Debug, Clone)]
pub struct TripUpdate {
    pub trip_external_id: String,
    pub schedule_relationship: TripScheduleRelationship,
    /// Calendar day this update applies to, already resolved from the
    /// feed's `start_date` by the caller (date parsing is outside this
    /// crate's scope, spec.md §1) as an offset from `calendar_start_time`.
    pub service_day: u32,
    pub stop_time_updates: Vec<StopTimeUpdate>,
}

#[derive(Debug, Clone)]
pub(crate) struct ForkedEntry {
    points: Vec<JpPoint>,
    stop_times: Vec<StopTime>,
    calendar: CalendarMask,
    attributes: TripAttributes,
    mode: ModeMask,
    headsign: Box<str>,
    min_time: RTime,
    max_time: RTime,
}

/// Per-VJ realtime schedule overlay, applied on top of a read-only
/// [`Timetable`]. Owns every forked journey pattern it creates; a
/// [`crate::router::Router`] queries through
/// [`crate::router::timetable_view::TimetableView`], which merges this
/// overlay's state with the static timetable.
#[derive(Debug, Clone, Default)]
pub struct RealtimeOverlay {
    calendar_overrides: HashMap<VjId, CalendarMask>,
    stop_time_overlays: HashMap<VjId, Vec<StopTime>>,
    forked: Vec<ForkedEntry>,
    forked_by_key: HashMap<Box<str>, usize>,
    rt_jps_at_stop: HashMap<StopId, Vec<JpId>>,
}

impl RealtimeOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies every update in `updates`, returning how many were applied
    /// and the drops (spec.md §7 `OverlayDrop`) for the rest.
    pub fn apply_feed(
        &mut self,
        tt: &Timetable,
        updates: &[TripUpdate],
    ) -> (usize, Vec<OverlayDrop>) {
        let mut applied = 0;
        let mut drops = Vec::new();
        for update in updates {
            match self.apply_one(tt, update) {
                Ok(()) => applied += 1,
                Err(reason) => {
                    log::warn!(
                        "dropping realtime update for {}: {reason}",
                        update.trip_external_id
                    );
                    drops.push(OverlayDrop {
                        trip_external_id: update.trip_external_id.clone(),
                        reason,
                    });
                }
            }
        }
        (applied, drops)
    }

    fn apply_one(&mut self, tt: &Timetable, update: &TripUpdate) -> Result<(), OverlayDropReason> {
        let Some(vj) = tt.resolve_vj_by_external_id(&update.trip_external_id) else {
            return Err(OverlayDropReason::UnknownVehicleJourney);
        };
        if update.service_day >= CALENDAR_DAYS {
            return Err(OverlayDropReason::StartDateOutOfRange);
        }
        let cal_day = update.service_day;

        match update.schedule_relationship {
            TripScheduleRelationship::Deleted => {
                self.clear_overlay_for(vj);
                Ok(())
            }
            TripScheduleRelationship::Canceled => {
                let mut mask = self.calendar_overrides.get(&vj).copied().unwrap_or_else(|| tt.vehicle_journey(vj).calendar);
                mask.clear_day(cal_day);
                self.calendar_overrides.insert(vj, mask);
                Ok(())
            }
            TripScheduleRelationship::Scheduled => {
                let mut mask = self.calendar_overrides.get(&vj).copied().unwrap_or_else(|| tt.vehicle_journey(vj).calendar);
                mask.set_day(cal_day);
                self.calendar_overrides.insert(vj, mask);

                if update.stop_time_updates.is_empty() {
                    return Ok(());
                }
                self.apply_stop_time_updates(tt, vj, cal_day, &update.stop_time_updates)
            }
        }
    }

    fn clear_overlay_for(&mut self, vj: VjId) {
        self.calendar_overrides.remove(&vj);
        self.stop_time_overlays.remove(&vj);
    }

    fn apply_stop_time_updates(
        &mut self,
        tt: &Timetable,
        vj: VjId,
        cal_day: u32,
        updates: &[StopTimeUpdate],
    ) -> Result<(), OverlayDropReason> {
        let n_stops = updates
            .iter()
            .filter(|u| u.relationship != StopUpdateRelationship::Skipped)
            .count();
        let changed = updates
            .iter()
            .any(|u| matches!(u.relationship, StopUpdateRelationship::Added | StopUpdateRelationship::Skipped));
        let nodata = updates
            .iter()
            .all(|u| u.relationship == StopUpdateRelationship::NoData);

        if nodata || n_stops == 0 {
            self.stop_time_overlays.remove(&vj);
            return Ok(());
        }

        if changed {
            self.fork(tt, vj, cal_day, updates)
        } else {
            self.apply_in_place(tt, vj, updates)
        }
    }

    fn fork(
        &mut self,
        tt: &Timetable,
        orig_vj: VjId,
        cal_day: u32,
        updates: &[StopTimeUpdate],
    ) -> Result<(), OverlayDropReason> {
        let row = tt.vehicle_journey(orig_vj);
        let jp = row.jp;
        let jp_row = tt.journey_pattern(jp);
        let external_id = tt.vj_external_id(orig_vj);
        let key: Box<str> = format!("@{external_id}").into_boxed_str();

        let mut points = Vec::with_capacity(updates.len());
        let mut stop_times = Vec::with_capacity(updates.len());
        for u in updates {
            if u.relationship == StopUpdateRelationship::Skipped {
                continue;
            }
            // Interior attrs for now; fixed up below once SKIPPED updates
            // have been dropped, so the endpoint flags land on the actual
            // retained first/last point rather than the raw update index.
            points.push(JpPoint {
                stop: u.stop,
                attributes: JpointAttributes::BOARDING | JpointAttributes::ALIGHTING,
            });
            let arrival = resolve_absolute(u.arrival, 0).unwrap_or(0);
            let departure = resolve_absolute(u.departure, arrival).unwrap_or(arrival);
            stop_times.push(StopTime { arrival, departure });
        }
        if points.len() < 2 {
            return Err(OverlayDropReason::NoData);
        }
        let last = points.len() - 1;
        points[0].attributes = JpointAttributes::BOARDING;
        points[last].attributes = JpointAttributes::ALIGHTING;
        let min_time = stop_times.first().map_or(0, |s| s.departure);
        let max_time = stop_times.last().map_or(0, |s| s.arrival);

        // Clear the original VJ's activity on this day; the fork takes over.
        let mut orig_mask = self
            .calendar_overrides
            .get(&orig_vj)
            .copied()
            .unwrap_or(row.calendar);
        orig_mask.clear_day(cal_day);
        self.calendar_overrides.insert(orig_vj, orig_mask);

        if let Some(&idx) = self.forked_by_key.get(&key) {
            let entry = &mut self.forked[idx];
            entry.calendar.set_day(cal_day);
            entry.points = points;
            entry.stop_times = stop_times;
            entry.min_time = min_time;
            entry.max_time = max_time;
            self.reindex_stop(tt.n_jps(), idx);
            return Ok(());
        }

        let entry = ForkedEntry {
            points,
            stop_times,
            calendar: CalendarMask::single_day(cal_day),
            attributes: row.attributes,
            mode: jp_row.attributes,
            headsign: tt.headsign(jp).into(),
            min_time,
            max_time,
        };
        let idx = self.forked.len();
        self.forked.push(entry);
        self.forked_by_key.insert(key, idx);
        self.reindex_stop(tt.n_jps(), idx);
        Ok(())
    }

    /// `jp_id` runs in the shared `JpId` space `router::timetable_view`
    /// uses (`tt.n_jps() + idx`, see `TimetableView::is_forked`), not the
    /// bare position within `self.forked`.
    fn reindex_stop(&mut self, n_jps: usize, idx: usize) {
        let jp_id = JpId::from_index(n_jps + idx);
        for stops in self.rt_jps_at_stop.values_mut() {
            stops.retain(|&j| j != jp_id);
        }
        let stops: Vec<StopId> = self.forked[idx].points.iter().map(|p| p.stop).collect();
        for stop in stops {
            let v = self.rt_jps_at_stop.entry(stop).or_default();
            if !v.contains(&jp_id) {
                v.push(jp_id);
            }
        }
    }

    fn apply_in_place(
        &mut self,
        tt: &Timetable,
        vj: VjId,
        updates: &[StopTimeUpdate],
    ) -> Result<(), OverlayDropReason> {
        let row = tt.vehicle_journey(vj);
        let jp = row.jp;
        let stops = tt.stops_for_jp(jp);
        let n = stops.len();

        let overlay = self.stop_time_overlays.entry(vj).or_insert_with(|| {
            (0..n)
                .map(|point| {
                    let raw = tt.raw_stop_time(vj, crate::model::JpPointId::from_index(point));
                    StopTime {
                        arrival: row.begin_time.saturating_add(raw.arrival),
                        departure: row.begin_time.saturating_add(raw.departure),
                    }
                })
                .collect()
        });

        let mut cursor = 0usize;
        let mut trailing_delay: Option<i32> = None;
        for u in updates {
            if u.relationship != StopUpdateRelationship::Scheduled {
                continue;
            }
            let Some(pos) = (cursor..n).find(|&p| stops[p].stop == u.stop) else {
                return Err(OverlayDropReason::StopNotOnTrip);
            };
            // Propagate the previous departure delay across any
            // intermediate (unmentioned) points before this one.
            if let Some(delay) = trailing_delay {
                for gap in cursor..pos {
                    apply_delay(&mut overlay[gap], delay);
                }
            }
            let base = overlay[pos];
            let arrival = match u.arrival {
                TimeUpdate::Absolute(t) => t,
                TimeUpdate::DelaySeconds(d) => shift(base.arrival, d),
                TimeUpdate::None => base.arrival,
            };
            let departure = match u.departure {
                TimeUpdate::Absolute(t) => t,
                TimeUpdate::DelaySeconds(d) => shift(base.departure, d),
                TimeUpdate::None => base.departure,
            };
            overlay[pos] = StopTime { arrival, departure };
            trailing_delay = match u.departure {
                TimeUpdate::DelaySeconds(d) => Some(d),
                _ => None,
            };
            cursor = pos + 1;
        }
        if let Some(delay) = trailing_delay {
            for gap in cursor..n {
                apply_delay(&mut overlay[gap], delay);
            }
        }
        Ok(())
    }

    // --- Accessors used by `router::timetable_view::TimetableView` ---

    #[must_use]
    pub fn n_forked_jps(&self) -> usize {
        self.forked.len()
    }

    #[must_use]
    pub(crate) fn forked_entry(&self, idx: usize) -> &ForkedEntry {
        &self.forked[idx]
    }

    #[must_use]
    pub(crate) fn rt_jps_at_stop(&self, stop: StopId) -> &[JpId] {
        self.rt_jps_at_stop.get(&stop).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub(crate) fn calendar_override(&self, vj: VjId) -> Option<CalendarMask> {
        self.calendar_overrides.get(&vj).copied()
    }

    #[must_use]
    pub(crate) fn stop_time_overlay(&self, vj: VjId) -> Option<&[StopTime]> {
        self.stop_time_overlays.get(&vj).map(Vec::as_slice)
    }
}

impl ForkedEntry {
    pub(crate) fn n_stops(&self) -> usize {
        self.points.len()
    }
    pub(crate) fn point(&self, i: usize) -> JpPoint {
        self.points[i]
    }
    pub(crate) fn stop_time(&self, i: usize) -> StopTime {
        self.stop_times[i]
    }
    pub(crate) fn calendar(&self) -> CalendarMask {
        self.calendar
    }
    pub(crate) fn attributes(&self) -> TripAttributes {
        self.attributes
    }
    pub(crate) fn headsign(&self) -> &str {
        &self.headsign
    }
    pub(crate) fn mode(&self) -> ModeMask {
        self.mode
    }
    pub(crate) fn min_time_val(&self) -> RTime {
        self.min_time
    }
    pub(crate) fn max_time_val(&self) -> RTime {
        self.max_time
    }
}

fn resolve_absolute(update: TimeUpdate, fallback_base: RTime) -> Option<RTime> {
    match update {
        TimeUpdate::Absolute(t) => Some(t),
        TimeUpdate::DelaySeconds(d) => Some(shift(fallback_base, d)),
        TimeUpdate::None => None,
    }
}

fn shift(base: RTime, delay_seconds: i32) -> RTime {
    let delay_units = delay_seconds / 4;
    let shifted = i64::from(base) + i64::from(delay_units);
    shifted.clamp(0, i64::from(crate::time::THREE_DAYS)) as RTime
}

fn apply_delay(st: &mut StopTime, delay_seconds: i32) {
    st.arrival = shift(st.arrival, delay_seconds);
    st.departure = shift(st.departure, delay_seconds);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coord, JpSpec, StopSpec, TimetableBuilder, VjSpec};

    fn two_stop_timetable() -> (Timetable, VjId) {
        let mut b = TimetableBuilder::new(0);
        let s0 = b.add_stop(StopSpec {
            name: "S0".into(),
            external_id: "S0".into(),
            coord: Coord::new(0.0, 0.0),
        });
        let s1 = b.add_stop(StopSpec {
            name: "S1".into(),
            external_id: "S1".into(),
            coord: Coord::new(0.01, 0.0),
        });
        b.add_journey_pattern(JpSpec {
            stops: vec![
                (s0, JpointAttributes::BOARDING),
                (s1, JpointAttributes::ALIGHTING),
            ],
            mode: ModeMask::BUS,
            headsign: "to S1".into(),
            agency: "agency".into(),
            vehicle_journeys: vec![VjSpec {
                external_id: "vjA".into(),
                begin_time: 7200, // 08:00 in rtime units (7200*4=28800s)
                attributes: TripAttributes::NONE,
                calendar: CalendarMask::single_day(0),
                stop_times: vec![
                    StopTime { arrival: 0, departure: 0 },
                    StopTime { arrival: 150, departure: 150 },
                ],
            }],
        });
        let tt = b.build().unwrap();
        let vj = tt.resolve_vj_by_external_id("vjA").unwrap();
        (tt, vj)
    }

    #[test]
    fn cancel_clears_day_bit() {
        let (tt, vj) = two_stop_timetable();
        let mut rt = RealtimeOverlay::new();
        rt.apply_feed(
            &tt,
            &[TripUpdate {
                trip_external_id: "vjA".into(),
                schedule_relationship: TripScheduleRelationship::Canceled,
                service_day: 0,
                stop_time_updates: vec![],
            }],
        );
        let mask = rt.calendar_override(vj).unwrap();
        assert!(!mask.runs_on(0));
    }

    #[test]
    fn unknown_trip_is_dropped() {
        let (tt, _vj) = two_stop_timetable();
        let mut rt = RealtimeOverlay::new();
        let (applied, drops) = rt.apply_feed(
            &tt,
            &[TripUpdate {
                trip_external_id: "nope".into(),
                schedule_relationship: TripScheduleRelationship::Canceled,
                service_day: 0,
                stop_time_updates: vec![],
            }],
        );
        assert_eq!(applied, 0);
        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].reason, OverlayDropReason::UnknownVehicleJourney);
    }

    #[test]
    fn reroute_forks_jp_and_indexes_new_stop() {
        let (tt, _vj) = two_stop_timetable();
        let mut rt = RealtimeOverlay::new();
        let s_new = StopId::from_index(5); // a stop id not in `tt`, representing a detour stop
        rt.apply_feed(
            &tt,
            &[TripUpdate {
                trip_external_id: "vjA".into(),
                schedule_relationship: TripScheduleRelationship::Scheduled,
                service_day: 0,
                stop_time_updates: vec![
                    StopTimeUpdate {
                        stop: StopId::from_index(0),
                        relationship: StopUpdateRelationship::Scheduled,
                        arrival: TimeUpdate::Absolute(0),
                        departure: TimeUpdate::Absolute(0),
                    },
                    StopTimeUpdate {
                        stop: s_new,
                        relationship: StopUpdateRelationship::Added,
                        arrival: TimeUpdate::Absolute(75),
                        departure: TimeUpdate::Absolute(75),
                    },
                    StopTimeUpdate {
                        stop: StopId::from_index(1),
                        relationship: StopUpdateRelationship::Scheduled,
                        arrival: TimeUpdate::Absolute(150),
                        departure: TimeUpdate::Absolute(150),
                    },
                ],
            }],
        );
        assert_eq!(rt.n_forked_jps(), 1);
        let forked_jp = JpId::from_index(tt.n_jps());
        assert!(rt.rt_jps_at_stop(s_new).contains(&forked_jp));
    }
}
