//! Smart bin adapter against a mocked station feed.

use std::sync::Arc;
use std::time::Duration;

use binfinder_core::{
    Coordinate, EndpointSettings, FacilityKind, FacilityPort, FacilityQuery, FacilityService,
    PortError, ProviderRegistry, UNKNOWN, attr,
};
use binfinder_provider_smartbin::{SmartBinPort, plugin};
use mockito::{Matcher, Server};
use reqwest::Client;

const TWO_STATIONS: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "geometry": { "type": "Point", "coordinates": [14.4385, 50.0761] },
      "properties": {
        "id": 1042,
        "name": "Vodičkova 681/12",
        "district": "praha-1",
        "accessibility": { "id": 1, "description": "volně" },
        "containers": [
          {
            "trash_type": { "id": 6, "description": "Plast" },
            "last_measurement": { "percent_calculated": 42, "measured_at_utc": "2024-05-01T08:15:00.000Z" }
          },
          {
            "trash_type": { "id": 5, "description": "Papír" },
            "last_measurement": { "percent_calculated": 87.4, "measured_at_utc": "2024-05-01T09:45:00.000Z" }
          },
          {
            "trash_type": { "id": 1, "description": "Barevné sklo" }
          }
        ]
      }
    },
    {
      "type": "Feature",
      "geometry": { "type": "Point", "coordinates": [14.4401, 50.0749] },
      "properties": { "name": "Jungmannova 3" }
    }
  ]
}"#;

fn query(only_monitored: bool) -> FacilityQuery {
    let origin = Coordinate::new(50.0755, 14.4378).expect("valid coordinate");
    FacilityQuery::new(origin, 500, 10, only_monitored).expect("valid query")
}

fn port(server: &Server, token: Option<&str>) -> SmartBinPort {
    let mut endpoint = EndpointSettings::new(server.url());
    endpoint.api_token = token.map(str::to_owned);
    SmartBinPort::new(Client::new(), endpoint)
}

#[tokio::test]
async fn maps_query_parameters_and_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/sortedwastestations")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("latlng".into(), "50.075500,14.437800".into()),
            Matcher::UrlEncoded("range".into(), "500".into()),
            Matcher::UrlEncoded("limit".into(), "10".into()),
            Matcher::UrlEncoded("onlyMonitored".into(), "true".into()),
        ]))
        .match_header("x-access-token", "secret")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"type": "FeatureCollection", "features": []}"#)
        .create_async()
        .await;

    let stations = port(&server, Some("secret"))
        .find(&query(true))
        .await
        .expect("lookup succeeds");
    assert!(stations.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn parses_stations_and_fill_levels() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/sortedwastestations")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(TWO_STATIONS)
        .create_async()
        .await;

    let stations = port(&server, None)
        .find(&query(true))
        .await
        .expect("lookup succeeds");
    assert_eq!(stations.len(), 2);

    let first = &stations[0];
    assert_eq!(first.id, "1042");
    assert_eq!(first.name, "Vodičkova 681/12");
    assert_eq!(first.kind, FacilityKind::SmartBin);
    assert!((first.coordinate.latitude() - 50.0761).abs() < 1e-9);
    assert!((first.coordinate.longitude() - 14.4385).abs() < 1e-9);
    assert_eq!(first.attribute(attr::DISTRICT), Some("praha-1"));
    assert_eq!(first.attribute(attr::ACCESSIBILITY), Some("volně"));
    assert_eq!(first.attribute(attr::MEASURED_AT), Some("2024-05-01 09:45 UTC"));

    let levels: Vec<_> = first.fill_levels().collect();
    assert!(levels.contains(&("Plast", "42%")));
    assert!(levels.contains(&("Papír", "87%")));
    assert!(levels.contains(&("Barevné sklo", UNKNOWN)));

    let second = &stations[1];
    assert_eq!(second.id, "Jungmannova 3");
    assert_eq!(second.attributes.get(attr::DISTRICT).map(String::as_str), Some(UNKNOWN));
    assert_eq!(second.attribute(attr::MEASURED_AT), None);
}

#[tokio::test]
async fn monitored_flag_is_omitted_when_not_requested() {
    let mut server = Server::new_async().await;
    let monitored = server
        .mock("GET", "/sortedwastestations")
        .match_query(Matcher::UrlEncoded("onlyMonitored".into(), "true".into()))
        .with_status(200)
        .with_body(r#"{"features": []}"#)
        .expect(0)
        .create_async()
        .await;
    let any = server
        .mock("GET", "/sortedwastestations")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"features": []}"#)
        .create_async()
        .await;

    port(&server, None)
        .find(&query(false))
        .await
        .expect("lookup succeeds");
    monitored.assert_async().await;
    any.assert_async().await;
}

#[tokio::test]
async fn server_error_is_unavailable() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/sortedwastestations")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let err = port(&server, None)
        .find(&query(true))
        .await
        .expect_err("503 must fail");
    assert!(matches!(err, PortError::ProviderUnavailable(_)), "{err}");
}

#[tokio::test]
async fn unexpected_payload_is_malformed() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/sortedwastestations")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"stations": "not a feature collection"}"#)
        .create_async()
        .await;

    let err = port(&server, None)
        .find(&query(true))
        .await
        .expect_err("payload must be rejected");
    assert!(matches!(err, PortError::ProviderMalformedResponse(_)), "{err}");
}

#[tokio::test]
async fn unreachable_backend_is_unavailable() {
    // Nothing listens on the discard port.
    let endpoint = EndpointSettings::new("http://127.0.0.1:9");
    let err = SmartBinPort::new(Client::new(), endpoint)
        .find(&query(true))
        .await
        .expect_err("connection must fail");
    assert!(matches!(err, PortError::ProviderUnavailable(_)), "{err}");
}

/// `count` distant stations followed by one right next to the origin.
fn stations_nearest_last(count: usize) -> String {
    let mut features: Vec<String> = (0..count)
        .map(|index| {
            let latitude = 50.0855 - 0.0005 * index as f64;
            format!(
                r#"{{"type": "Feature",
                    "geometry": {{"type": "Point", "coordinates": [14.4378, {latitude}]}},
                    "properties": {{"id": {index}, "name": "far{index}"}}}}"#
            )
        })
        .collect();
    features.push(
        r#"{"type": "Feature",
            "geometry": {"type": "Point", "coordinates": [14.4378, 50.0757]},
            "properties": {"id": 999, "name": "nearest"}}"#
            .to_owned(),
    );
    format!(r#"{{"type": "FeatureCollection", "features": [{}]}}"#, features.join(","))
}

#[tokio::test]
async fn nearest_station_survives_an_oversized_answer() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/sortedwastestations")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(stations_nearest_last(11))
        .create_async()
        .await;

    let stations = port(&server, None)
        .find(&query(true))
        .await
        .expect("lookup succeeds");
    assert_eq!(stations.len(), 12);

    let registry = ProviderRegistry::new(vec![plugin(
        Client::new(),
        EndpointSettings::new(server.url()),
    )]);
    let service = FacilityService::new(Arc::new(registry), Duration::from_secs(5));
    let ranked = service
        .nearest(FacilityKind::SmartBin, &query(true), 1)
        .await
        .expect("lookup succeeds");

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].facility.name, "nearest");
    assert!(ranked[0].distance_meters < 30.0);
}
