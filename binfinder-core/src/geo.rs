//! Great-circle distance, nearest-facility ranking, and directions links.

use serde::Serialize;

use crate::model::{Coordinate, Facility};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between two coordinates in meters.
#[must_use]
pub fn distance_meters(from: Coordinate, to: Coordinate) -> f64 {
    let from_lat = from.latitude().to_radians();
    let to_lat = to.latitude().to_radians();
    let delta_lat = (to.latitude() - from.latitude()).to_radians();
    let delta_lon = (to.longitude() - from.longitude()).to_radians();

    let half_chord = (delta_lat / 2.0).sin().powi(2)
        + from_lat.cos() * to_lat.cos() * (delta_lon / 2.0).sin().powi(2);
    // Clamp guards asin against rounding slightly above 1 for antipodal points.
    2.0 * EARTH_RADIUS_METERS * half_chord.sqrt().min(1.0).asin()
}

/// Walking directions link between two coordinates, for display only.
#[must_use]
pub fn directions_link(from: Coordinate, to: Coordinate) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&origin={from}&destination={to}&travelmode=walking"
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Facility paired with its distance from the search origin.
pub struct RankedFacility {
    /// The facility.
    pub facility: Facility,
    /// Great-circle distance from the origin in meters.
    pub distance_meters: f64,
}

/// Sort facilities by distance from `origin`, nearest first.
///
/// The sort is stable, so equally distant facilities keep provider order.
#[must_use]
pub fn rank_by_distance(origin: Coordinate, facilities: Vec<Facility>) -> Vec<RankedFacility> {
    let mut ranked: Vec<RankedFacility> = facilities
        .into_iter()
        .map(|facility| RankedFacility {
            distance_meters: distance_meters(origin, facility.coordinate),
            facility,
        })
        .collect();
    ranked.sort_by(|left, right| left.distance_meters.total_cmp(&right.distance_meters));
    ranked
}

/// Nearest facility to `origin`, or `None` for an empty list.
#[must_use]
pub fn nearest(origin: Coordinate, facilities: Vec<Facility>) -> Option<RankedFacility> {
    rank_by_distance(origin, facilities).into_iter().next()
}
