//! Provider implementation for staffed waste collection yards.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use binfinder_core::{
    EndpointSettings,
    geojson::{RawId, features_into, fetch_features, id_or, or_unknown, with_token},
    model::{Coordinate, Facility, FacilityKind, FacilityQuery, ProviderMeta, attr},
    plugin::ProviderPlugin,
    ports::{FacilityPort, PortError},
};

/// Public open-data API hosting the collection yard feed.
pub const DEFAULT_BASE_URL: &str = "https://api.golemio.cz/v2";

const YARDS_PATH: &str = "/wastecollectionyards";

/// Properties of a collection yard feature.
#[derive(Debug, Deserialize)]
struct YardProperties {
    id: Option<RawId>,
    name: Option<String>,
    address: Option<Address>,
    operating_hours: Option<String>,
    contact: Option<String>,
    district: Option<String>,
}

/// Nested postal address.
#[derive(Debug, Deserialize)]
struct Address {
    address_formatted: Option<String>,
}

/// Collection yard lookup.
pub struct CollectionYardPort {
    client: Client,
    endpoint: EndpointSettings,
    meta: ProviderMeta,
}

impl CollectionYardPort {
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
impl FacilityPort for CollectionYardPort {
    fn meta(&self) -> &ProviderMeta {
        &self.meta
    }

    async fn find(&self, query: &FacilityQuery) -> Result<Vec<Facility>, PortError> {
        let req = self
            .client
            .get(format!("{}{YARDS_PATH}", self.endpoint.base()))
            .query(&[
                ("latlng", query.coordinate.to_string()),
                ("range", query.radius_meters.to_string()),
                ("limit", query.limit.to_string()),
            ]);
        let req = with_token(req, self.endpoint.api_token.as_deref());

        let features = fetch_features::<YardProperties>(req).await?;
        Ok(features_into(features, yard_to_facility))
    }
}

/// Build the plugin bundle for the collection yard provider.
#[must_use]
pub fn plugin(client: Client, endpoint: EndpointSettings) -> ProviderPlugin {
    ProviderPlugin::new(Arc::new(CollectionYardPort::new(client, endpoint)))
}

fn provider_meta() -> ProviderMeta {
    ProviderMeta {
        kind: FacilityKind::CollectionYard,
        name: String::from("Waste collection yards"),
    }
}

fn yard_to_facility(coordinate: Coordinate, props: YardProperties) -> Facility {
    let name = or_unknown(props.name);
    let id = id_or(props.id, &name);

    let attributes = BTreeMap::from([
        (
            attr::ADDRESS.to_owned(),
            or_unknown(props.address.and_then(|address| address.address_formatted)),
        ),
        (attr::HOURS.to_owned(), or_unknown(props.operating_hours)),
        (attr::CONTACT.to_owned(), or_unknown(props.contact)),
        (attr::DISTRICT.to_owned(), or_unknown(props.district)),
    ]);

    Facility {
        id,
        name,
        coordinate,
        kind: FacilityKind::CollectionYard,
        attributes,
    }
}
