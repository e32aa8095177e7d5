//! Provider implementation for scheduled bulky-waste container placements.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use binfinder_core::{
    EndpointSettings,
    geojson::{features_into, fetch_features, or_unknown, with_token},
    model::{Coordinate, Facility, FacilityKind, FacilityQuery, ProviderMeta, UNKNOWN, attr},
    plugin::ProviderPlugin,
    ports::{FacilityPort, PortError},
};

/// Public open-data API hosting the pickup point feed.
pub const DEFAULT_BASE_URL: &str = "https://api.golemio.cz/v2";

const STATIONS_PATH: &str = "/bulky-waste/stations";

/// Properties of a pickup point feature.
#[derive(Debug, Deserialize)]
struct PickupProperties {
    custom_id: Option<String>,
    street: Option<String>,
    city_district_name: Option<String>,
    date: Option<String>,
    time_from: Option<String>,
    time_to: Option<String>,
}

/// Bulky-waste pickup point lookup.
pub struct BulkyWastePort {
    client: Client,
    endpoint: EndpointSettings,
    meta: ProviderMeta,
}

impl BulkyWastePort {
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
impl FacilityPort for BulkyWastePort {
    fn meta(&self) -> &ProviderMeta {
        &self.meta
    }

    async fn find(&self, query: &FacilityQuery) -> Result<Vec<Facility>, PortError> {
        // This backend takes its range in kilometers.
        let req = self
            .client
            .get(format!("{}{STATIONS_PATH}", self.endpoint.base()))
            .query(&[
                ("latlng", query.coordinate.to_string()),
                ("range", meters_to_kilometers(query.radius_meters)),
                ("limit", query.limit.to_string()),
            ]);
        let req = with_token(req, self.endpoint.api_token.as_deref());

        let features = fetch_features::<PickupProperties>(req).await?;
        Ok(features_into(features, pickup_to_facility))
    }
}

/// Build the plugin bundle for the bulky-waste provider.
#[must_use]
pub fn plugin(client: Client, endpoint: EndpointSettings) -> ProviderPlugin {
    ProviderPlugin::new(Arc::new(BulkyWastePort::new(client, endpoint)))
}

fn provider_meta() -> ProviderMeta {
    ProviderMeta {
        kind: FacilityKind::BulkyWaste,
        name: String::from("Bulky waste pickup points"),
    }
}

fn meters_to_kilometers(meters: u32) -> String {
    (f64::from(meters) / 1000.0).to_string()
}

fn pickup_to_facility(coordinate: Coordinate, props: PickupProperties) -> Facility {
    let street = or_unknown(props.street);
    let district = or_unknown(props.city_district_name);

    let name = if street == UNKNOWN {
        or_unknown(props.custom_id.clone())
    } else {
        street.clone()
    };
    let id = props
        .custom_id
        .filter(|custom_id| !custom_id.trim().is_empty())
        .unwrap_or_else(|| name.clone());

    let hours = match (props.time_from, props.time_to) {
        (Some(from), Some(to)) => format!("{}-{}", from.trim(), to.trim()),
        (Some(from), None) => format!("from {}", from.trim()),
        (None, Some(to)) => format!("until {}", to.trim()),
        (None, None) => UNKNOWN.to_owned(),
    };

    let attributes = BTreeMap::from([
        (attr::STREET.to_owned(), street),
        (attr::DISTRICT.to_owned(), district),
        (attr::DATE.to_owned(), or_unknown(props.date)),
        (attr::HOURS.to_owned(), hours),
    ]);

    Facility {
        id,
        name,
        coordinate,
        kind: FacilityKind::BulkyWaste,
        attributes,
    }
}
