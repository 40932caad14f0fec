//! Assembles a [`Timetable`] from loose, insertion-order specs.
//!
//! Real GTFS/binary-format ingestion is out of scope (spec.md §1); this
//! builder is the supported way to hand this crate a timetable from
//! whatever in-memory form an embedder (or a test) already has, the way
//! `ferrobus_core::loading::builder::create_transit_model` turns parsed
//! GTFS rows into `PublicTransitData`'s offset arrays — generalized here
//! to the JP/VJ split and calendar masks this timetable format uses.

use hashbrown::HashMap;

use crate::error::Error;
use crate::model::attributes::{JpointAttributes, ModeMask, TripAttributes};
use crate::model::calendar::CalendarMask;
use crate::model::coord::Coord;
use crate::model::entities::{JourneyPattern, JpPoint, Stop, StopTime, Transfer, VehicleJourney};
use crate::model::ids::{JpId, StopId, VjId};
use crate::model::timetable::Timetable;
use crate::time::RTime;
use crate::validate;

/// A stop, as handed to the builder before offsets are computed.
pub struct StopSpec {
    pub name: String,
    pub external_id: String,
    pub coord: Coord,
}

/// One vehicle journey within a [`JpSpec`]. `stop_times` must have the
/// same length as `JpSpec::stops`.
pub struct VjSpec {
    pub external_id: String,
    pub begin_time: RTime,
    pub attributes: TripAttributes,
    pub calendar: CalendarMask,
    pub stop_times: Vec<StopTime>,
}

/// One journey pattern, with its stop sequence and every vehicle journey
/// that runs along it.
pub struct JpSpec {
    pub stops: Vec<(StopId, JpointAttributes)>,
    pub mode: ModeMask,
    pub headsign: String,
    pub agency: String,
    pub vehicle_journeys: Vec<VjSpec>,
}

#[derive(Default)]
pub struct TimetableBuilder {
    calendar_start_time: i64,
    dst_active: CalendarMask,
    stops: Vec<StopSpec>,
    transfers: Vec<Transfer>,
    transfers_by_stop: Vec<Vec<usize>>,
    jps: Vec<JpSpec>,
}

impl TimetableBuilder {
    #[must_use]
    pub fn new(calendar_start_time: i64) -> Self {
        TimetableBuilder {
            calendar_start_time,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_dst_active(mut self, dst_active: CalendarMask) -> Self {
        self.dst_active = dst_active;
        self
    }

    pub fn add_stop(&mut self, spec: StopSpec) -> StopId {
        let id = StopId::from_index(self.stops.len());
        self.stops.push(spec);
        self.transfers_by_stop.push(Vec::new());
        id
    }

    /// Adds a one-directional foot-path. Callers are expected to add the
    /// symmetric pair themselves (spec.md P6); [`Self::build`] rejects a
    /// timetable where that invariant does not hold.
    pub fn add_transfer(&mut self, from: StopId, to: StopId, dist_meters: u32) {
        let idx = self.transfers.len();
        self.transfers.push(Transfer {
            target_stop: to,
            dist_meters,
        });
        self.transfers_by_stop[from.index()].push(idx);
    }

    pub fn add_journey_pattern(&mut self, spec: JpSpec) -> JpId {
        let id = JpId::from_index(self.jps.len());
        self.jps.push(spec);
        id
    }

    /// Validates and assembles the final, immutable [`Timetable`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimetableIncoherent`] if any invariant from
    /// spec.md §3/§4.1 (monotone stop-times, symmetric transfers,
    /// in-range coordinates, JP endpoint boarding/alighting flags) is
    /// violated; every problem found is logged via `log::warn!` before
    /// the count is returned.
    pub fn build(self) -> Result<Timetable, Error> {
        let problems = validate::validate(&self);
        if !problems.is_empty() {
            for p in &problems {
                log::warn!("timetable validation: {p}");
            }
            return Err(Error::TimetableIncoherent(problems.len()));
        }

        let n_stops = self.stops.len();
        let mut stop_jps_grouped: Vec<Vec<JpId>> = vec![Vec::new(); n_stops];
        for (jp_idx, jp) in self.jps.iter().enumerate() {
            let jp_id = JpId::from_index(jp_idx);
            let mut seen = hashbrown::HashSet::new();
            for &(stop, _) in &jp.stops {
                if seen.insert(stop) {
                    stop_jps_grouped[stop.index()].push(jp_id);
                }
            }
        }

        let mut stops = Vec::with_capacity(n_stops + 1);
        let mut stop_coords = Vec::with_capacity(n_stops);
        let mut stop_names = Vec::with_capacity(n_stops);
        let mut stop_external_ids = Vec::with_capacity(n_stops);
        let mut stop_jps = Vec::new();
        let mut transfer_targets = Vec::new();
        let mut transfer_dist16 = Vec::new();

        for (i, spec) in self.stops.iter().enumerate() {
            stops.push(Stop {
                jps_offset: u32::try_from(stop_jps.len()).unwrap(),
                transfers_offset: u32::try_from(transfer_targets.len()).unwrap(),
            });
            stop_coords.push(spec.coord);
            stop_names.push(spec.name.clone().into_boxed_str());
            stop_external_ids.push(spec.external_id.clone().into_boxed_str());
            stop_jps.extend_from_slice(&stop_jps_grouped[i]);
            for &t_idx in &self.transfers_by_stop[i] {
                let t = self.transfers[t_idx];
                transfer_targets.push(t.target_stop);
                transfer_dist16.push(dist_meters_to_dist16(t.dist_meters));
            }
        }
        // Sentinel stop row terminating the last range.
        stops.push(Stop {
            jps_offset: u32::try_from(stop_jps.len()).unwrap(),
            transfers_offset: u32::try_from(transfer_targets.len()).unwrap(),
        });

        let mut journey_patterns = Vec::with_capacity(self.jps.len() + 1);
        let mut jp_points = Vec::new();
        let mut jp_headsigns = Vec::with_capacity(self.jps.len());
        let mut agencies = Vec::new();
        let mut agency_index: HashMap<String, u32> = HashMap::new();
        let mut vehicle_journeys = Vec::new();
        let mut vj_external_ids = Vec::new();
        let mut vj_external_id_index = HashMap::new();
        let mut stop_times = Vec::new();

        for (jp_idx, jp) in self.jps.into_iter().enumerate() {
            let jp_id = JpId::from_index(jp_idx);
            let jp_points_offset = u32::try_from(jp_points.len()).unwrap();
            let n_stops_jp = u32::try_from(jp.stops.len()).unwrap();
            for &(stop, attrs) in &jp.stops {
                jp_points.push(JpPoint { stop, attributes: attrs });
            }

            let agency_idx = *agency_index.entry(jp.agency.clone()).or_insert_with(|| {
                agencies.push(jp.agency.clone().into_boxed_str());
                u32::try_from(agencies.len() - 1).unwrap()
            });
            jp_headsigns.push(jp.headsign.into_boxed_str());

            let vj_offset = u32::try_from(vehicle_journeys.len()).unwrap();
            let n_vjs = u32::try_from(jp.vehicle_journeys.len()).unwrap();
            let mut active_days = CalendarMask::EMPTY;
            let mut min_time = RTime::MAX;
            let mut max_time: RTime = 0;

            for vj in jp.vehicle_journeys {
                active_days = active_days | vj.calendar;
                let first_departure = vj
                    .begin_time
                    .saturating_add(vj.stop_times.first().map_or(0, |s| s.departure));
                let last_arrival = vj
                    .begin_time
                    .saturating_add(vj.stop_times.last().map_or(0, |s| s.arrival));
                min_time = min_time.min(first_departure);
                max_time = max_time.max(last_arrival);

                let vj_id = VjId::from_index(vehicle_journeys.len());
                vehicle_journeys.push(VehicleJourney {
                    stop_times_offset: u32::try_from(stop_times.len()).unwrap(),
                    begin_time: vj.begin_time,
                    attributes: vj.attributes,
                    calendar: vj.calendar,
                    jp: jp_id,
                });
                vj_external_ids.push(vj.external_id.clone().into_boxed_str());
                vj_external_id_index.insert(vj.external_id.into_boxed_str(), vj_id);
                stop_times.extend_from_slice(&vj.stop_times);
            }
            if n_vjs == 0 {
                min_time = 0;
            }

            journey_patterns.push(JourneyPattern {
                jp_points_offset,
                stop_times_offset: 0, // stop-times are addressed via each VJ's own offset
                vj_offset,
                n_stops: n_stops_jp,
                n_vjs,
                attributes: jp.mode,
                min_time,
                max_time,
                headsign_offset: jp_idx as u32,
                agency_index: agency_idx,
                active_days,
            });
        }
        // Sentinel JP / VJ rows.
        journey_patterns.push(JourneyPattern {
            jp_points_offset: u32::try_from(jp_points.len()).unwrap(),
            stop_times_offset: 0,
            vj_offset: u32::try_from(vehicle_journeys.len()).unwrap(),
            n_stops: 0,
            n_vjs: 0,
            attributes: ModeMask::NONE,
            min_time: 0,
            max_time: 0,
            headsign_offset: 0,
            agency_index: 0,
            active_days: CalendarMask::EMPTY,
        });

        Ok(Timetable {
            calendar_start_time: self.calendar_start_time,
            dst_active: self.dst_active,
            stops,
            stop_coords,
            stop_names,
            stop_external_ids,
            stop_jps,
            transfer_targets,
            transfer_dist16,
            journey_patterns,
            jp_points,
            jp_headsigns,
            agencies,
            vehicle_journeys,
            vj_external_ids,
            vj_external_id_index,
            stop_times,
        })
    }

    pub(crate) fn stops(&self) -> &[StopSpec] {
        &self.stops
    }

    pub(crate) fn jps(&self) -> &[JpSpec] {
        &self.jps
    }

    pub(crate) fn transfers_by_stop(&self) -> &[Vec<usize>] {
        &self.transfers_by_stop
    }

    pub(crate) fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }
}

fn dist_meters_to_dist16(dist_meters: u32) -> u8 {
    let units = dist_meters / 16;
    u8::try_from(units).unwrap_or(u8::MAX)
}
