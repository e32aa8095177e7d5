//! Collection yard adapter against a mocked yard feed.

use binfinder_core::{
    Coordinate, EndpointSettings, FacilityKind, FacilityPort, FacilityQuery, PortError, UNKNOWN,
    attr,
};
use binfinder_provider_yard::CollectionYardPort;
use mockito::{Matcher, Server};
use reqwest::Client;

fn query(limit: usize) -> FacilityQuery {
    let origin = Coordinate::new(50.0755, 14.4378).expect("valid coordinate");
    FacilityQuery::new(origin, 5000, limit, false).expect("valid query")
}

fn port(server: &Server) -> CollectionYardPort {
    CollectionYardPort::new(Client::new(), EndpointSettings::new(server.url()))
}

const YARDS: &str = r#"{"type": "FeatureCollection", "features": [
  {
    "type": "Feature",
    "geometry": {"type": "Point", "coordinates": [14.4196, 50.0652]},
    "properties": {
      "id": "sberny-dvur-pod-sancemi",
      "name": "Sběrný dvůr Pod Šancemi",
      "address": {"address_formatted": "Pod Šancemi 444/1, 190 00 Praha 9"},
      "operating_hours": "Po-Pá 8:30-18:00, So 8:30-15:00",
      "contact": "+420 284 098 607",
      "district": "praha-9"
    }
  },
  {
    "type": "Feature",
    "geometry": {"type": "Point", "coordinates": [14.4702, 50.0833]},
    "properties": {"name": "Sběrný dvůr Voctářova"}
  },
  {
    "type": "Feature",
    "geometry": {"type": "Point", "coordinates": [14.3900, 50.0500]},
    "properties": {"name": "Sběrný dvůr Puchmajerova"}
  }
]}"#;

#[tokio::test]
async fn sends_range_in_meters() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/wastecollectionyards")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("range".into(), "5000".into()),
            Matcher::UrlEncoded("limit".into(), "10".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"features": []}"#)
        .create_async()
        .await;

    let yards = port(&server).find(&query(10)).await.expect("lookup succeeds");
    assert!(yards.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn parses_yards_with_unknown_fallbacks() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/wastecollectionyards")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(YARDS)
        .create_async()
        .await;

    let yards = port(&server).find(&query(10)).await.expect("lookup succeeds");
    assert_eq!(yards.len(), 3);

    let first = &yards[0];
    assert_eq!(first.kind, FacilityKind::CollectionYard);
    assert_eq!(first.id, "sberny-dvur-pod-sancemi");
    assert_eq!(
        first.attribute(attr::ADDRESS),
        Some("Pod Šancemi 444/1, 190 00 Praha 9")
    );
    assert_eq!(
        first.attribute(attr::HOURS),
        Some("Po-Pá 8:30-18:00, So 8:30-15:00")
    );
    assert_eq!(first.attribute(attr::CONTACT), Some("+420 284 098 607"));

    let second = &yards[1];
    assert_eq!(second.id, "Sběrný dvůr Voctářova");
    assert_eq!(
        second.attributes.get(attr::CONTACT).map(String::as_str),
        Some(UNKNOWN)
    );
}

#[tokio::test]
async fn answer_longer_than_limit_is_kept_for_ranking() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/wastecollectionyards")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(YARDS)
        .create_async()
        .await;

    let yards = port(&server).find(&query(2)).await.expect("lookup succeeds");
    let names: Vec<_> = yards.iter().map(|yard| yard.name.as_str()).collect();
    assert_eq!(
        names,
        ["Sběrný dvůr Pod Šancemi", "Sběrný dvůr Voctářova", "Sběrný dvůr Puchmajerova"]
    );
}

#[tokio::test]
async fn missing_features_key_is_malformed() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/wastecollectionyards")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"type": "FeatureCollection"}"#)
        .create_async()
        .await;

    let err = port(&server).find(&query(10)).await.expect_err("must be rejected");
    assert!(matches!(err, PortError::ProviderMalformedResponse(_)), "{err}");
}

#[tokio::test]
async fn unauthorized_is_unavailable() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/wastecollectionyards")
        .match_query(Matcher::Any)
        .with_status(401)
        .create_async()
        .await;

    let err = port(&server).find(&query(10)).await.expect_err("401 must fail");
    assert!(matches!(err, PortError::ProviderUnavailable(_)), "{err}");
}
