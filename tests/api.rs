use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use regex::Regex;
use serde_json::Value;
use tower::ServiceExt;

use flight_board::config::{EndpointsConfig, FailurePolicy};
use flight_board::errors::FlightBoardError;
use flight_board::provider::{
    Direction, FlightProvider, MockProvider, RawLiveFlight, RawScheduledFlight, TimeWindow,
};
use flight_board::reference::Airport;
use flight_board::server::{router, AppState};
use flight_board::service::FlightService;

/// Provider that fails every request the same way
struct FailingProvider(fn() -> FlightBoardError);

#[async_trait::async_trait]
impl FlightProvider for FailingProvider {
    fn name(&self) -> &'static str {
        "Failing"
    }

    async fn live_flights(&self, _airport: &Airport) -> Result<Vec<RawLiveFlight>, FlightBoardError> {
        Err((self.0)())
    }

    async fn scheduled_flights(
        &self,
        _airport: &Airport,
        _direction: Direction,
        _window: TimeWindow,
    ) -> Result<Vec<RawScheduledFlight>, FlightBoardError> {
        Err((self.0)())
    }
}

fn app_with(provider: Arc<dyn FlightProvider>, endpoints: EndpointsConfig) -> Router {
    let service = FlightService::new(provider, &endpoints, Duration::from_secs(7200));
    router(AppState {
        service: Arc::new(service),
        default_airport: "OSL".to_string(),
    })
}

fn mock_app() -> Router {
    app_with(Arc::new(MockProvider::new()), EndpointsConfig::default())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn callsigns(body: &Value) -> Vec<&str> {
    body["flights"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["callsign"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn health() {
    let (status, body) = get(mock_app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn countries() {
    let (status, body) = get(mock_app(), "/api/countries").await;
    assert_eq!(status, StatusCode::OK);

    let codes: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["NO", "SE", "DK", "FI"]);
    assert_eq!(body[0]["airports"], serde_json::json!(["OSL", "BGO"]));
}

#[tokio::test]
async fn airports() {
    let (status, body) = get(mock_app(), "/api/airports").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 5);

    let (status, body) = get(mock_app(), "/api/airports?country=NO").await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["OSL", "BGO"]);
    assert_eq!(body[0]["icao"], "ENGM");
}

#[tokio::test]
async fn airports_invalid_country() {
    let (status, body) = get(mock_app(), "/api/airports?country=INVALID").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid country code");
    assert_eq!(body["validCodes"], serde_json::json!(["NO", "SE", "DK", "FI"]));
}

#[tokio::test]
async fn live_flights_from_mock() {
    let (status, body) = get(mock_app(), "/api/flights?airport=ARN").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["airport"]["code"], "ARN");
    assert_eq!(body["count"], 10);
    assert_eq!(body["source"], "live");
    assert_eq!(body["units"]["velocity"], "kilometers_per_hour");
    assert_eq!(body["units"]["altitude"], "meters");

    let first = &body["flights"][0];
    assert_eq!(first["callsign"], "SAS100");
    assert_eq!(first["airline"], "SAS");
    assert_eq!(first["originOrDestination"], "Norway");
    assert_eq!(first["status"], "Departing");
    assert_eq!(first["altitude"], 1524);
    assert_eq!(first["velocity"], 463);
}

#[tokio::test]
async fn demo_departures() {
    let (status, body) = get(mock_app(), "/api/departures/demo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "demo");
    assert_eq!(body["airport"]["code"], "OSL");
    assert_eq!(
        callsigns(&body),
        vec!["SK4455", "DY622", "LH867", "KL1152", "BA762", "AF1268", "AY681", "SK1465"]
    );

    let gate = Regex::new(r"^[A-D]\d{2}$").unwrap();
    for flight in body["flights"].as_array().unwrap() {
        let status = flight["status"].as_str().unwrap();
        assert!(["Departed", "Boarding", "Scheduled"].contains(&status));
        assert!(gate.is_match(flight["gate"].as_str().unwrap()));
        assert_eq!(flight["estDepartureAirport"], "ENGM");
    }

    let stockholm = &body["flights"][0];
    assert_eq!(stockholm["estArrivalAirport"], "ESSA");
    assert_eq!(stockholm["estArrivalAirportName"], "STOCKHOLM ARLANDA");
}

#[tokio::test]
async fn demo_arrivals() {
    let (status, body) = get(mock_app(), "/api/arrivals/demo?airport=CPH").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 7);
    assert_eq!(callsigns(&body)[0], "SK4456");

    for flight in body["flights"].as_array().unwrap() {
        let status = flight["status"].as_str().unwrap();
        assert!(["Landed", "OnApproach", "Expected"].contains(&status));
        assert_eq!(flight["estArrivalAirport"], "EKCH");
    }
    assert_eq!(body["flights"][0]["status"], "OnApproach");
    assert_eq!(body["flights"][0]["estDepartureAirportName"], "STOCKHOLM ARLANDA");
}

#[tokio::test]
async fn departures_from_mock_provider() {
    let (status, body) = get(mock_app(), "/api/departures?airport=BGO").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "live");
    assert_eq!(body["count"], 8);
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn invalid_airport() {
    for uri in [
        "/api/flights?airport=XYZ",
        "/api/departures?airport=XYZ",
        "/api/arrivals/demo?airport=XYZ",
    ] {
        let (status, body) = get(mock_app(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "Invalid airport code");
        assert_eq!(
            body["validCodes"],
            serde_json::json!(["OSL", "ARN", "CPH", "HEL", "BGO"])
        );
    }
}

#[tokio::test]
async fn provider_timeout() {
    let app = app_with(
        Arc::new(FailingProvider(|| FlightBoardError::UpstreamTimeout {
            provider: "OpenSky",
        })),
        EndpointsConfig::default(),
    );

    let (status, body) = get(app, "/api/flights").await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "OpenSky API timeout");
    assert_eq!(
        body["message"],
        "The flight data service is taking too long to respond"
    );
}

#[tokio::test]
async fn provider_status_propagated() {
    let app = app_with(
        Arc::new(FailingProvider(|| FlightBoardError::UpstreamStatus {
            provider: "OpenSky",
            status: 503,
            message: "Service unavailable".to_string(),
        })),
        EndpointsConfig::default(),
    );

    let (status, body) = get(app, "/api/arrivals").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "Service unavailable");
}

#[tokio::test]
async fn sample_policy_degrades() {
    let mut endpoints = EndpointsConfig::default();
    endpoints.departures.on_failure = FailurePolicy::Sample;
    let app = app_with(
        Arc::new(FailingProvider(|| FlightBoardError::UpstreamTimeout {
            provider: "OpenSky",
        })),
        endpoints,
    );

    let (status, body) = get(app.clone(), "/api/departures").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "sample");
    assert_eq!(body["count"], 8);

    let (status, _) = get(app, "/api/arrivals").await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
}
