//! Provider implementation for monitored sorted-waste stations (smart bins).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use binfinder_core::{
    EndpointSettings,
    geojson::{RawId, features_into, fetch_features, id_or, or_unknown, with_token},
    model::{Coordinate, Facility, FacilityKind, FacilityQuery, ProviderMeta, UNKNOWN, attr},
    plugin::ProviderPlugin,
    ports::{FacilityPort, PortError},
};

/// Public open-data API hosting the station feed.
pub const DEFAULT_BASE_URL: &str = "https://api.golemio.cz/v2";

const STATIONS_PATH: &str = "/sortedwastestations";
const MEASURED_AT_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Properties of a station feature.
#[derive(Debug, Deserialize)]
struct StationProperties {
    id: Option<RawId>,
    name: Option<String>,
    district: Option<String>,
    accessibility: Option<Described>,
    #[serde(default)]
    containers: Vec<Container>,
}

/// `{ "description": ... }` objects used for enumerations.
#[derive(Debug, Deserialize)]
struct Described {
    description: Option<String>,
}

/// Single container at a station.
#[derive(Debug, Deserialize)]
struct Container {
    trash_type: Option<Described>,
    last_measurement: Option<Measurement>,
}

/// Latest fill-level reading of a container.
#[derive(Debug, Deserialize)]
struct Measurement {
    percent_calculated: Option<f64>,
    measured_at_utc: Option<String>,
}

/// Smart bin lookup against the sorted-waste station feed.
pub struct SmartBinPort {
    client: Client,
    endpoint: EndpointSettings,
    meta: ProviderMeta,
}

impl SmartBinPort {
    /// Create a new port bound to the given HTTP client and endpoint.
    #[must_use]
    pub fn new(client: Client, endpoint: EndpointSettings) -> Self {
        Self {
            client,
            endpoint,
            meta: provider_meta(),
        }
    }
}

#[async_trait]
impl FacilityPort for SmartBinPort {
    fn meta(&self) -> &ProviderMeta {
        &self.meta
    }

    async fn find(&self, query: &FacilityQuery) -> Result<Vec<Facility>, PortError> {
        // Range is in meters for this backend.
        let mut req = self
            .client
            .get(format!("{}{STATIONS_PATH}", self.endpoint.base()))
            .query(&[
                ("latlng", query.coordinate.to_string()),
                ("range", query.radius_meters.to_string()),
                ("limit", query.limit.to_string()),
            ]);
        if query.only_monitored {
            req = req.query(&[("onlyMonitored", "true")]);
        }
        let req = with_token(req, self.endpoint.api_token.as_deref());

        let features = fetch_features::<StationProperties>(req).await?;
        // Ranking happens in the service; every returned station is a candidate.
        let stations = features_into(features, station_to_facility);

        debug!(count = stations.len(), "smart bin stations parsed");
        Ok(stations)
    }
}

/// Build the plugin bundle for the smart bin provider.
#[must_use]
pub fn plugin(client: Client, endpoint: EndpointSettings) -> ProviderPlugin {
    ProviderPlugin::new(Arc::new(SmartBinPort::new(client, endpoint)))
}

fn provider_meta() -> ProviderMeta {
    ProviderMeta {
        kind: FacilityKind::SmartBin,
        name: String::from("Sorted waste stations"),
    }
}

fn station_to_facility(coordinate: Coordinate, props: StationProperties) -> Facility {
    let name = or_unknown(props.name);
    let id = id_or(props.id, &name);

    let mut attributes = BTreeMap::new();
    attributes.insert(attr::DISTRICT.to_owned(), or_unknown(props.district));
    attributes.insert(
        attr::ACCESSIBILITY.to_owned(),
        or_unknown(props.accessibility.and_then(|access| access.description)),
    );

    let mut latest: Option<DateTime<Utc>> = None;
    for container in props.containers {
        let Some(trash_type) = container
            .trash_type
            .and_then(|described| described.description)
            .filter(|description| !description.trim().is_empty())
        else {
            continue;
        };

        let (level, measured_at) = match container.last_measurement {
            Some(measurement) => (
                measurement.percent_calculated,
                measurement.measured_at_utc.as_deref().and_then(parse_timestamp),
            ),
            None => (None, None),
        };

        if let Some(measured_at) = measured_at {
            latest = Some(latest.map_or(measured_at, |current| current.max(measured_at)));
        }

        let fill = level.map_or_else(|| UNKNOWN.to_owned(), |percent| format!("{percent:.0}%"));
        attributes.insert(format!("{}{}", attr::FILL_PREFIX, trash_type.trim()), fill);
    }

    attributes.insert(
        attr::MEASURED_AT.to_owned(),
        latest.map_or_else(
            || UNKNOWN.to_owned(),
            |timestamp| timestamp.format(MEASURED_AT_FORMAT).to_string(),
        ),
    );

    Facility {
        id,
        name,
        coordinate,
        kind: FacilityKind::SmartBin,
        attributes,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}
