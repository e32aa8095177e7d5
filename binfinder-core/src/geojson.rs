//! `GeoJSON` feature collections as returned by the facility backends.

use reqwest::RequestBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::model::{Coordinate, UNKNOWN};
use crate::ports::PortError;

/// Header carrying the backend access token.
pub const ACCESS_TOKEN_HEADER: &str = "X-Access-Token";

/// Top-level feature collection with provider-specific properties `P`.
#[derive(Debug, Deserialize)]
pub struct FeatureCollection<P> {
    /// Features, possibly empty.
    pub features: Vec<Feature<P>>,
}

/// Single feature.
#[derive(Debug, Deserialize)]
pub struct Feature<P> {
    /// Point geometry; other geometry types are not expected.
    #[serde(default)]
    pub geometry: Option<Geometry>,
    /// Provider-specific properties.
    pub properties: P,
}

/// Geometry object; only points carry usable coordinates.
#[derive(Debug, Deserialize)]
pub struct Geometry {
    /// Geometry type, `"Point"` for facilities.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// `[longitude, latitude]` for points.
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

impl<P> Feature<P> {
    /// Point position of the feature, if present and valid.
    #[must_use]
    pub fn point(&self) -> Option<Coordinate> {
        let geometry = self.geometry.as_ref()?;
        if geometry.kind != "Point" {
            return None;
        }
        match geometry.coordinates.as_slice() {
            [longitude, latitude, ..] => Coordinate::new(*latitude, *longitude).ok(),
            _ => None,
        }
    }
}

/// Convert features into facilities, skipping those that cannot be placed on the map.
pub fn features_into<P, T>(
    features: Vec<Feature<P>>,
    mut convert: impl FnMut(Coordinate, P) -> T,
) -> Vec<T> {
    features
        .into_iter()
        .filter_map(|feature| {
            let Some(point) = feature.point() else {
                warn!("skipping feature without a usable point geometry");
                return None;
            };
            Some(convert(point, feature.properties))
        })
        .collect()
}

/// Feature id, a number in some feeds and a string in others.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    /// Numeric id.
    Number(i64),
    /// Textual id.
    Text(String),
}

/// Id as text, or `fallback` when missing or blank.
#[must_use]
pub fn id_or(raw: Option<RawId>, fallback: &str) -> String {
    match raw {
        Some(RawId::Number(number)) => number.to_string(),
        Some(RawId::Text(text)) if !text.trim().is_empty() => text.trim().to_owned(),
        _ => fallback.to_owned(),
    }
}

/// Trimmed value or the unknown sentinel.
#[must_use]
pub fn or_unknown(value: Option<String>) -> String {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_owned())
}

/// Attach the access token header when one is configured.
#[must_use]
pub fn with_token(req: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) if !token.is_empty() => req.header(ACCESS_TOKEN_HEADER, token),
        _ => req,
    }
}

/// Send the request and decode a feature collection.
///
/// # Errors
///
/// Transport failures and non-success statuses yield [`PortError::ProviderUnavailable`];
/// bodies that are not a feature collection yield [`PortError::ProviderMalformedResponse`].
pub async fn fetch_features<P: DeserializeOwned>(
    req: RequestBuilder,
) -> Result<Vec<Feature<P>>, PortError> {
    let resp = req.send().await.map_err(PortError::from)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(PortError::ProviderUnavailable(format!(
            "backend answered {status}"
        )));
    }

    let body = resp.bytes().await.map_err(PortError::from)?;
    let collection: FeatureCollection<P> = serde_json::from_slice(&body)
        .map_err(|err| PortError::ProviderMalformedResponse(err.to_string()))?;

    debug!(features = collection.features.len(), "decoded feature collection");
    Ok(collection.features)
}
