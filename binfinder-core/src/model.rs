//! Domain data structures for coordinates, facilities, and facility queries.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ports::PortError;

/// Placeholder for any facility field the backend did not report.
pub const UNKNOWN: &str = "unknown";

/// Attribute keys shared by the provider adapters and the reply formatter.
pub mod attr {
    /// City district the facility belongs to.
    pub const DISTRICT: &str = "district";
    /// Street name.
    pub const STREET: &str = "street";
    /// Formatted postal address.
    pub const ADDRESS: &str = "address";
    /// Opening hours or pickup time window.
    pub const HOURS: &str = "hours";
    /// Pickup date for bulky-waste points.
    pub const DATE: &str = "date";
    /// Contact phone or e-mail.
    pub const CONTACT: &str = "contact";
    /// Accessibility of a smart bin station.
    pub const ACCESSIBILITY: &str = "accessibility";
    /// Timestamp of the most recent fill-level measurement.
    pub const MEASURED_AT: &str = "measured_at";
    /// Prefix of per-container fill levels, followed by the container's trash type.
    pub const FILL_PREFIX: &str = "fill:";
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
/// Rejected latitude/longitude pairs.
pub enum CoordinateError {
    /// Latitude outside `[-90, 90]` or not finite.
    #[error("Latitude out of range: {0}")]
    Latitude(f64),
    /// Longitude outside `[-180, 180]` or not finite.
    #[error("Longitude out of range: {0}")]
    Longitude(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
/// WGS84 position in decimal degrees.
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, checking both axes.
    ///
    /// # Errors
    ///
    /// Returns a [`CoordinateError`] when either value is out of range or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Kinds of disposal facility the assistant can look up.
pub enum FacilityKind {
    /// Sorted-waste station with fill-level telemetry.
    SmartBin,
    /// Scheduled bulky-waste container placement.
    BulkyWaste,
    /// Staffed collection yard.
    CollectionYard,
}

impl FacilityKind {
    /// All kinds in the order they are offered to the user.
    pub const ALL: [FacilityKind; 3] = [
        FacilityKind::SmartBin,
        FacilityKind::BulkyWaste,
        FacilityKind::CollectionYard,
    ];

    /// Identifier used by mode-selection events.
    #[must_use]
    pub fn mode_id(self) -> &'static str {
        match self {
            FacilityKind::SmartBin => "smarttrash",
            FacilityKind::BulkyWaste => "bulkytrash",
            FacilityKind::CollectionYard => "wasteyard",
        }
    }

    /// Human-friendly name used in replies.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FacilityKind::SmartBin => "smart bin",
            FacilityKind::BulkyWaste => "bulky waste pickup point",
            FacilityKind::CollectionYard => "collection yard",
        }
    }
}

impl fmt::Display for FacilityKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.mode_id())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown mode: {0}")]
/// Mode identifier that does not name a facility kind.
pub struct UnknownMode(pub String);

impl FromStr for FacilityKind {
    type Err = UnknownMode;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase();
        FacilityKind::ALL
            .into_iter()
            .find(|kind| kind.mode_id() == normalized)
            .ok_or_else(|| UnknownMode(raw.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier of a chat user, as assigned by the messaging layer.
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(raw: &str) -> Self {
        UserId(raw.to_owned())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Metadata describing a registered provider.
pub struct ProviderMeta {
    /// Facility kind served by the provider.
    pub kind: FacilityKind,
    /// Display name of the backend.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Disposal point returned by a provider.
pub struct Facility {
    /// Backend identifier, or the name when the backend has none.
    pub id: String,
    /// Human-friendly name.
    pub name: String,
    /// Position used for ranking and directions.
    pub coordinate: Coordinate,
    /// Facility kind.
    pub kind: FacilityKind,
    /// Provider-specific details keyed by the constants in [`attr`].
    pub attributes: BTreeMap<String, String>,
}

impl Facility {
    /// Look up an attribute, treating the unknown sentinel as absent.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|value| *value != UNKNOWN)
    }

    /// Per-container fill levels as `(trash type, level)` pairs.
    pub fn fill_levels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().filter_map(|(key, value)| {
            key.strip_prefix(attr::FILL_PREFIX)
                .map(|trash_type| (trash_type, value.as_str()))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
/// Normalized geospatial lookup handed to a provider.
pub struct FacilityQuery {
    /// Search origin.
    pub coordinate: Coordinate,
    /// Search radius in meters.
    pub radius_meters: u32,
    /// Maximum number of facilities to request.
    pub limit: usize,
    /// Restrict smart bins to stations reporting telemetry.
    pub only_monitored: bool,
}

impl FacilityQuery {
    /// Build a query, checking radius and limit.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidQuery`] when the radius or limit is zero.
    pub fn new(
        coordinate: Coordinate,
        radius_meters: u32,
        limit: usize,
        only_monitored: bool,
    ) -> Result<Self, PortError> {
        if radius_meters == 0 {
            return Err(PortError::InvalidQuery("radius must be positive".into()));
        }
        if limit == 0 {
            return Err(PortError::InvalidQuery("limit must be at least 1".into()));
        }
        Ok(Self {
            coordinate,
            radius_meters,
            limit,
            only_monitored,
        })
    }
}
