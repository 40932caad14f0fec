//! Merges a read-only [`Timetable`] with a [`RealtimeOverlay`] behind one
//! set of accessors, so [`crate::router::Router`]'s round scan (spec.md
//! §4.3.1) never has to branch on "is this JP/VJ forked" itself — it just
//! calls through this view. This is the central primitive from spec.md
//! §4.1 (`stoptime`) plus the adjacency helpers it depends on.

use crate::model::{
    CalendarMask, JourneyPattern, JpId, JpPoint, JpPointId, ModeMask, StopId, StopTime, Timetable,
    TripAttributes, VjId,
};
use crate::realtime::RealtimeOverlay;
use crate::router::ServiceDay;
use crate::time::RTime;

/// Read-only join of the static timetable and the (possibly absent)
/// realtime overlay, used throughout one query.
pub struct TimetableView<'a> {
    pub tt: &'a Timetable,
    pub rt: Option<&'a RealtimeOverlay>,
}

impl<'a> TimetableView<'a> {
    #[must_use]
    pub fn new(tt: &'a Timetable, rt: Option<&'a RealtimeOverlay>) -> Self {
        TimetableView { tt, rt }
    }

    #[must_use]
    pub fn n_jps(&self) -> usize {
        self.tt.n_jps() + self.rt.map_or(0, RealtimeOverlay::n_forked_jps)
    }

    fn is_forked(&self, jp: JpId) -> bool {
        jp.index() >= self.tt.n_jps()
    }

    fn forked_idx(&self, jp: JpId) -> usize {
        jp.index() - self.tt.n_jps()
    }

    fn forked_vj(&self, vj: VjId) -> bool {
        vj.index() >= self.tt.n_vjs()
    }

    fn forked_vj_idx(&self, vj: VjId) -> usize {
        vj.index() - self.tt.n_vjs()
    }

    /// The journey pattern's mode/attribute bitmask (spec.md §4.3.1 step 1).
    #[must_use]
    pub fn jp_attributes(&self, jp: JpId) -> ModeMask {
        if self.is_forked(jp) {
            self.rt.unwrap().forked_entry(self.forked_idx(jp)).mode()
        } else {
            self.tt.journey_pattern(jp).attributes
        }
    }

    #[must_use]
    pub fn jp_min_max_time(&self, jp: JpId) -> (RTime, RTime) {
        if self.is_forked(jp) {
            let e = self.rt.unwrap().forked_entry(self.forked_idx(jp));
            (e.min_time_val(), e.max_time_val())
        } else {
            let row = self.tt.journey_pattern(jp);
            (row.min_time, row.max_time)
        }
    }

    #[must_use]
    pub fn jp_n_stops(&self, jp: JpId) -> usize {
        if self.is_forked(jp) {
            self.rt.unwrap().forked_entry(self.forked_idx(jp)).n_stops()
        } else {
            self.tt.journey_pattern(jp).n_stops as usize
        }
    }

    #[must_use]
    pub fn jp_point(&self, jp: JpId, i: usize) -> JpPoint {
        if self.is_forked(jp) {
            self.rt.unwrap().forked_entry(self.forked_idx(jp)).point(i)
        } else {
            self.tt.stops_for_jp(jp)[i]
        }
    }

    /// Every `(vj, calendar)` pair running on `jp`, in scan order
    /// (spec.md §4.3.1: "scan all VJs").
    #[must_use]
    pub fn jp_vjs(&self, jp: JpId) -> Vec<(VjId, CalendarMask, TripAttributes)> {
        if self.is_forked(jp) {
            let idx = self.forked_idx(jp);
            let e = self.rt.unwrap().forked_entry(idx);
            let vj = VjId::from_index(self.tt.n_vjs() + idx);
            vec![(vj, e.calendar(), e.attributes())]
        } else {
            let row = self.tt.journey_pattern(jp);
            let start = row.vj_offset as usize;
            (0..row.n_vjs as usize)
                .map(|i| {
                    let vj_id = VjId::from_index(start + i);
                    let vj_row = self.tt.vehicle_journey(vj_id);
                    let calendar = self
                        .rt
                        .and_then(|rt| rt.calendar_override(vj_id))
                        .unwrap_or(vj_row.calendar);
                    (vj_id, calendar, vj_row.attributes)
                })
                .collect()
        }
    }

    #[must_use]
    pub fn vj_attributes(&self, vj: VjId) -> TripAttributes {
        if self.forked_vj(vj) {
            self.rt.unwrap().forked_entry(self.forked_vj_idx(vj)).attributes()
        } else {
            self.tt.vj_attributes(vj)
        }
    }

    #[must_use]
    pub fn vj_calendar(&self, vj: VjId) -> CalendarMask {
        if self.forked_vj(vj) {
            self.rt.unwrap().forked_entry(self.forked_vj_idx(vj)).calendar()
        } else {
            self.rt
                .and_then(|rt| rt.calendar_override(vj))
                .unwrap_or_else(|| self.tt.vehicle_journey(vj).calendar)
        }
    }

    /// Every JP calling at `stop`: the static adjacency plus any forked
    /// JPs the realtime overlay has indexed there (spec.md §4.4:
    /// `rt_jps_at_stop`).
    #[must_use]
    pub fn jps_for_stop(&self, stop: StopId) -> Vec<JpId> {
        let mut v: Vec<JpId> = self.tt.jps_for_stop(stop).to_vec();
        if let Some(rt) = self.rt {
            v.extend_from_slice(rt.rt_jps_at_stop(stop));
        }
        v
    }

    /// The central `stoptime` primitive (spec.md §4.1): resolves the
    /// arrival or departure rtime of `vj` at `jp_point`, folding in the
    /// realtime overlay when the service day calls for it, then adding
    /// the service day's midnight. Returns `None` (`UNREACHED`) on wrap.
    #[must_use]
    pub fn stoptime(
        &self,
        jp: JpId,
        vj: VjId,
        jp_point: JpPointId,
        arrive_flag: bool,
        serviceday: &ServiceDay,
    ) -> Option<RTime> {
        let overlay_times = if serviceday.apply_realtime {
            self.rt.and_then(|rt| rt.stop_time_overlay(vj))
        } else {
            None
        };
        let raw = if self.is_forked(jp) {
            let e = self.rt.unwrap().forked_entry(self.forked_idx(jp));
            e.stop_time(jp_point.index())
        } else if let Some(overlay) = overlay_times {
            overlay[jp_point.index()]
        } else {
            let row = self.tt.vehicle_journey(vj);
            let raw = self.tt.raw_stop_time(vj, jp_point);
            StopTime {
                arrival: row.begin_time.saturating_add(raw.arrival),
                departure: row.begin_time.saturating_add(raw.departure),
            }
        };
        let offset = if arrive_flag { raw.arrival } else { raw.departure };
        crate::time::checked_add(offset, serviceday.midnight)
    }

    /// The OR of every vehicle journey's active-day mask on `jp`, folding
    /// in any realtime calendar overrides. Used as a cheap pre-filter
    /// before a journey pattern is flagged into `updated_routes`
    /// (`flag_routes_for_stop`'s `date_mask & route_active_flags` check
    /// in `examples/original_source/router.c`).
    #[must_use]
    pub fn jp_active_days(&self, jp: JpId) -> CalendarMask {
        if self.is_forked(jp) {
            return self.rt.unwrap().forked_entry(self.forked_idx(jp)).calendar();
        }
        let row = self.tt.journey_pattern(jp);
        let mut mask = row.active_days;
        if let Some(rt) = self.rt {
            let start = row.vj_offset as usize;
            for i in 0..row.n_vjs as usize {
                if let Some(over) = rt.calendar_override(VjId::from_index(start + i)) {
                    mask = mask | over;
                }
            }
        }
        mask
    }

    #[must_use]
    pub fn jp_headsign(&self, jp: JpId) -> &str {
        if self.is_forked(jp) {
            self.rt.unwrap().forked_entry(self.forked_idx(jp)).headsign()
        } else {
            self.tt.headsign(jp)
        }
    }
}
