//! The compact, read-only timetable (spec.md §2 "Timetable (TT)", §3,
//! §4.1). All entities are addressed by dense index; adjacency is O(1)
//! via the offset arrays computed by [`crate::model::TimetableBuilder`].

use hashbrown::HashMap;

use crate::model::attributes::TripAttributes;
use crate::model::calendar::CalendarMask;
use crate::model::coord::Coord;
use crate::model::entities::{JourneyPattern, JpPoint, Stop, StopTime, Transfer, VehicleJourney};
use crate::model::ids::{JpId, JpPointId, StopId, VjId};
use crate::time::RTime;

/// Read-only, index-addressed public transit timetable.
///
/// `stops`, `journey_patterns` and `vehicle_journeys` each carry one
/// trailing sentinel row past the last real entity, so
/// `stops[i+1].jps_offset - stops[i].jps_offset` always gives a valid
/// range length even for the last real stop.
#[derive(Debug, Clone)]
pub struct Timetable {
    pub(crate) calendar_start_time: i64,
    pub(crate) dst_active: CalendarMask,

    pub(crate) stops: Vec<Stop>,
    pub(crate) stop_coords: Vec<Coord>,
    pub(crate) stop_names: Vec<Box<str>>,
    pub(crate) stop_external_ids: Vec<Box<str>>,
    pub(crate) stop_jps: Vec<JpId>,
    pub(crate) transfer_targets: Vec<StopId>,
    pub(crate) transfer_dist16: Vec<u8>,

    pub(crate) journey_patterns: Vec<JourneyPattern>,
    pub(crate) jp_points: Vec<JpPoint>,
    pub(crate) jp_headsigns: Vec<Box<str>>,
    pub(crate) agencies: Vec<Box<str>>,

    pub(crate) vehicle_journeys: Vec<VehicleJourney>,
    pub(crate) vj_external_ids: Vec<Box<str>>,
    pub(crate) vj_external_id_index: HashMap<Box<str>, VjId>,
    pub(crate) stop_times: Vec<StopTime>,
}

impl Timetable {
    #[must_use]
    pub fn n_stops(&self) -> usize {
        self.stops.len() - 1
    }

    #[must_use]
    pub fn n_jps(&self) -> usize {
        self.journey_patterns.len() - 1
    }

    #[must_use]
    pub fn n_vjs(&self) -> usize {
        self.vehicle_journeys.len() - 1
    }

    #[must_use]
    pub fn calendar_start_time(&self) -> i64 {
        self.calendar_start_time
    }

    #[must_use]
    pub fn dst_active(&self) -> CalendarMask {
        self.dst_active
    }

    #[must_use]
    pub fn stop_coord(&self, stop: StopId) -> Coord {
        self.stop_coords[stop.index()]
    }

    #[must_use]
    pub fn stop_name(&self, stop: StopId) -> &str {
        &self.stop_names[stop.index()]
    }

    #[must_use]
    pub fn stop_external_id(&self, stop: StopId) -> &str {
        &self.stop_external_ids[stop.index()]
    }

    #[must_use]
    pub fn agency(&self, jp: JpId) -> &str {
        let idx = self.journey_patterns[jp.index()].agency_index as usize;
        &self.agencies[idx]
    }

    #[must_use]
    pub fn headsign(&self, jp: JpId) -> &str {
        &self.jp_headsigns[jp.index()]
    }

    #[must_use]
    pub fn journey_pattern(&self, jp: JpId) -> JourneyPattern {
        self.journey_patterns[jp.index()]
    }

    #[must_use]
    pub fn vehicle_journey(&self, vj: VjId) -> VehicleJourney {
        self.vehicle_journeys[vj.index()]
    }

    /// The ordered stop sequence of a journey pattern (stop + board/alight
    /// flags per point).
    #[must_use]
    pub fn stops_for_jp(&self, jp: JpId) -> &[JpPoint] {
        let r = &self.journey_patterns[jp.index()];
        let start = r.jp_points_offset as usize;
        let end = start + r.n_stops as usize;
        &self.jp_points[start..end]
    }

    /// All vehicle journeys running along a journey pattern, in whatever
    /// order the builder inserted them.
    #[must_use]
    pub fn vjs_for_jp(&self, jp: JpId) -> &[VehicleJourney] {
        let r = &self.journey_patterns[jp.index()];
        let start = r.vj_offset as usize;
        let end = start + r.n_vjs as usize;
        &self.vehicle_journeys[start..end]
    }

    /// Every journey pattern that calls at `stop`, in ascending JP index
    /// order (spec.md §5: JPs are scanned in ascending index order).
    #[must_use]
    pub fn jps_for_stop(&self, stop: StopId) -> &[JpId] {
        let start = self.stops[stop.index()].jps_offset as usize;
        let end = self.stops[stop.index() + 1].jps_offset as usize;
        &self.stop_jps[start..end]
    }

    /// Foot-paths out of `stop`, with distances widened from the dense
    /// 16-meter-unit encoding back to meters.
    #[must_use]
    pub fn transfers_for_stop(&self, stop: StopId) -> impl Iterator<Item = Transfer> + '_ {
        let start = self.stops[stop.index()].transfers_offset as usize;
        let end = self.stops[stop.index() + 1].transfers_offset as usize;
        self.transfer_targets[start..end]
            .iter()
            .zip(&self.transfer_dist16[start..end])
            .map(|(&target_stop, &dist16)| Transfer {
                target_stop,
                dist_meters: u32::from(dist16) * 16,
            })
    }

    /// Raw (schedule-relative) stop-time for a vehicle journey at a
    /// position within its journey pattern. Does not apply `begin_time`,
    /// the service-day midnight, or any realtime overlay — see
    /// [`crate::router::timetable_view::TimetableView::stoptime`] for the
    /// full primitive from spec.md §4.1.
    #[must_use]
    pub fn raw_stop_time(&self, vj: VjId, jp_point: JpPointId) -> StopTime {
        let row = &self.vehicle_journeys[vj.index()];
        self.stop_times[row.stop_times_offset as usize + jp_point.index()]
    }

    #[must_use]
    pub fn resolve_vj_by_external_id(&self, external_id: &str) -> Option<VjId> {
        self.vj_external_id_index.get(external_id).copied()
    }

    #[must_use]
    pub fn vj_external_id(&self, vj: VjId) -> &str {
        &self.vj_external_ids[vj.index()]
    }

    #[must_use]
    pub fn vj_attributes(&self, vj: VjId) -> TripAttributes {
        self.vehicle_journeys[vj.index()].attributes
    }

    #[must_use]
    pub fn is_valid_stop(&self, stop: StopId) -> bool {
        stop.index() < self.n_stops()
    }

    #[must_use]
    pub fn is_valid_vj(&self, vj: VjId) -> bool {
        vj.index() < self.n_vjs()
    }

    /// Day index used for calendar bit tests: whole days since
    /// `calendar_start_time` midnight.
    #[must_use]
    pub fn day_index_for_epoch(&self, epoch_seconds: i64) -> i64 {
        (epoch_seconds - self.calendar_start_time).div_euclid(86_400)
    }
}
