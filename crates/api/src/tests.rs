use std::sync::Arc;

use actix_web::{body::to_bytes, http::StatusCode, test, web, App};
use serde_json::{json, Value};
use shiptrack_carriers::{AdapterFactory, ExecutionContext, TrackingAggregator};
use shiptrack_domain::services::telemetry::{init_telemetry, TelemetryConfig, TelemetryGuard};
use shiptrack_domain::{CarrierConfig, CarrierId, CarrierRegistry, TrackRequest, TrackerConfig};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::handlers::{
    carriers::CarrierHint, carriers_handler, fedex_route_handler, metrics_handler,
    track_by_path_handler, track_handler, ups_route_handler,
};
use crate::application::tracking_routes;
use crate::state::AppState;

/// Unroutable endpoint for carriers a test never expects to reach.
const NOWHERE: &str = "http://127.0.0.1:9";

fn telemetry() -> TelemetryGuard {
    let config = TelemetryConfig::from_env("API_TEST");
    init_telemetry(&config).expect("telemetry inits")
}

fn build_state(entries: Vec<CarrierConfig>) -> AppState {
    let registry = Arc::new(CarrierRegistry::new(entries).expect("registry builds"));
    let factory = AdapterFactory::new(&TrackerConfig::default())
        .expect("factory builds")
        .with_context(ExecutionContext::Direct);
    let aggregator = TrackingAggregator::from_factory(registry, &factory);
    AppState::new(Arc::new(aggregator), telemetry())
}

/// Every carrier registered, none with credentials.
fn unconfigured_state() -> AppState {
    build_state(vec![
        CarrierConfig::new(CarrierId::Ups, NOWHERE).unwrap(),
        CarrierConfig::new(CarrierId::Fedex, NOWHERE).unwrap(),
        CarrierConfig::new(CarrierId::Dhl, NOWHERE).unwrap(),
    ])
}

async fn body_json(resp: actix_web::dev::ServiceResponse) -> Value {
    let body = to_bytes(resp.into_body()).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[actix_web::test]
async fn vendor_route_requires_tracking_number() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(unconfigured_state()))
            .route("/api/tracking/fedex", web::post().to(fedex_route_handler)),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/api/tracking/fedex")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_TRACKING_NUMBER");
}

#[actix_web::test]
async fn fedex_route_without_credentials_is_server_error() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(unconfigured_state()))
            .route("/api/tracking/fedex", web::post().to(fedex_route_handler)),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/api/tracking/fedex")
        .set_json(TrackRequest::new("123456789012"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "FEDEX_CONFIG_ERROR");
}

#[actix_web::test]
async fn fedex_route_maps_vendor_failure_to_500() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fx"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/track/v1/trackingnumbers"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let state = build_state(vec![CarrierConfig::new(CarrierId::Fedex, server.uri())
        .unwrap()
        .with_credentials("key", "secret")]);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .route("/api/tracking/fedex", web::post().to(fedex_route_handler)),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/api/tracking/fedex")
        .set_json(TrackRequest::new("123456789012"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "FEDEX_API_ERROR");
}

#[actix_web::test]
async fn ups_route_propagates_oauth_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/security/v1/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "response": {"errors": [{"code": "10401", "message": "ClientId is Invalid"}]}
        })))
        .mount(&server)
        .await;

    let state = build_state(vec![CarrierConfig::new(CarrierId::Ups, server.uri())
        .unwrap()
        .with_credentials("bad", "creds")]);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .route("/api/tracking/ups", web::post().to(ups_route_handler)),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/api/tracking/ups")
        .set_json(TrackRequest::new("1Z999AA10123456789"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "UPS_OAUTH_ERROR");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("ClientId is Invalid"));
}

#[actix_web::test]
async fn ups_route_returns_raw_vendor_payload() {
    let server = MockServer::start().await;
    let vendor_body = json!({"trackResponse": {"shipment": [{"package": [{"activity": []}]}]}});
    Mock::given(method("POST"))
        .and(path("/security/v1/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/track/v1/details/1Z999AA10123456789"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vendor_body.clone()))
        .mount(&server)
        .await;

    let state = build_state(vec![CarrierConfig::new(CarrierId::Ups, server.uri())
        .unwrap()
        .with_credentials("key", "secret")]);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .route("/api/tracking/ups", web::post().to(ups_route_handler)),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/api/tracking/ups")
        .set_json(TrackRequest::new("1z999aa10123456789"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], vendor_body);
}

#[actix_web::test]
async fn aggregate_lookup_without_results_is_not_found() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(unconfigured_state()))
            .route(
                "/api/tracking/{tracking_number}",
                web::get().to(track_by_path_handler),
            ),
    )
    .await;
    let req = test::TestRequest::get()
        .uri("/api/tracking/NOPE-42")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "NO_CARRIER_FOUND");
}

#[actix_web::test]
async fn aggregate_lookup_rejects_blank_number() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(unconfigured_state()))
            .route("/api/tracking", web::post().to(track_handler)),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/api/tracking")
        .set_json(TrackRequest::new("  "))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn aggregate_lookup_tags_dhl_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/track/shipments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "shipments": [{
                "status": {"status": "Delivered"},
                "events": [{
                    "timestamp": "2024-03-02T09:10:00",
                    "location": {"address": {"addressLocality": "Bonn"}},
                    "description": "Delivered"
                }]
            }]
        })))
        .mount(&server)
        .await;

    let state = build_state(vec![
        CarrierConfig::new(CarrierId::Ups, NOWHERE).unwrap(),
        CarrierConfig::new(CarrierId::Fedex, NOWHERE).unwrap(),
        CarrierConfig::new(CarrierId::Dhl, server.uri())
            .unwrap()
            .with_api_key("dhl-key"),
    ]);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .route("/api/tracking", web::post().to(track_handler)),
    )
    .await;
    let req = test::TestRequest::post()
        .uri("/api/tracking")
        .set_json(TrackRequest::new("1234567890"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["carrier"], "dhl");
    assert_eq!(body["data"]["status"], "Delivered");
    assert_eq!(body["data"]["location"], "Bonn");
}

#[actix_web::test]
async fn lists_carriers_in_registry_order() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(unconfigured_state()))
            .route("/api/carriers", web::get().to(carriers_handler)),
    )
    .await;
    let req = test::TestRequest::get().uri("/api/carriers").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = to_bytes(resp.into_body()).await.unwrap();
    let hints: Vec<CarrierHint> = serde_json::from_slice(&body).unwrap();
    let ids: Vec<_> = hints.iter().map(|hint| hint.id).collect();
    assert_eq!(ids, vec![CarrierId::Ups, CarrierId::Fedex, CarrierId::Dhl]);
    assert_eq!(hints[1].name, "FedEx");
    assert_eq!(hints[0].example, "1Z999AA10123456789");
}

#[actix_web::test]
async fn metrics_endpoint_renders() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(unconfigured_state()))
            .route("/metrics", web::get().to(metrics_handler)),
    )
    .await;
    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn get_on_vendor_path_is_a_lookup() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(unconfigured_state()))
            .configure(tracking_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/tracking/ups").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "NO_CARRIER_FOUND");

    let req = test::TestRequest::post()
        .uri("/api/tracking/ups")
        .set_json(TrackRequest::new("1Z999AA10123456789"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "UPS_CONFIG_ERROR");
}
