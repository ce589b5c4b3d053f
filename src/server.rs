//! HTTP API

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::errors::FlightBoardError;
use crate::reference::{self, Airport, Country, COUNTRIES};
use crate::service::{FlightService, LiveListing, ScheduleListing};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FlightService>,
    /// Airport used when a request names none
    pub default_airport: String,
}

impl AppState {
    fn airport_code<'a>(&'a self, query: &'a AirportQuery) -> &'a str {
        query
            .airport
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .unwrap_or(&self.default_airport)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AirportQuery {
    pub airport: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CountryQuery {
    pub country: Option<String>,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    timestamp: DateTime<Utc>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/countries", get(countries))
        .route("/api/airports", get(airports))
        .route("/api/flights", get(flights))
        .route("/api/departures", get(departures))
        .route("/api/arrivals", get(arrivals))
        .route("/api/departures/demo", get(demo_departures))
        .route("/api/arrivals/demo", get(demo_arrivals))
        .with_state(state)
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        timestamp: Utc::now(),
    })
}

async fn countries() -> Json<&'static [Country]> {
    Json(COUNTRIES)
}

async fn airports(
    Query(query): Query<CountryQuery>,
) -> Result<Json<Vec<&'static Airport>>, FlightBoardError> {
    let country = query
        .country
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty());
    Ok(Json(reference::airports_in(country)?))
}

async fn flights(
    State(state): State<AppState>,
    Query(query): Query<AirportQuery>,
) -> Result<Json<LiveListing>, FlightBoardError> {
    let code = state.airport_code(&query);
    Ok(Json(state.service.live_flights(code).await?))
}

async fn departures(
    State(state): State<AppState>,
    Query(query): Query<AirportQuery>,
) -> Result<Json<ScheduleListing>, FlightBoardError> {
    let code = state.airport_code(&query);
    Ok(Json(state.service.departures(code).await?))
}

async fn arrivals(
    State(state): State<AppState>,
    Query(query): Query<AirportQuery>,
) -> Result<Json<ScheduleListing>, FlightBoardError> {
    let code = state.airport_code(&query);
    Ok(Json(state.service.arrivals(code).await?))
}

async fn demo_departures(
    State(state): State<AppState>,
    Query(query): Query<AirportQuery>,
) -> Result<Json<ScheduleListing>, FlightBoardError> {
    let code = state.airport_code(&query);
    Ok(Json(state.service.demo_departures(code)?))
}

async fn demo_arrivals(
    State(state): State<AppState>,
    Query(query): Query<AirportQuery>,
) -> Result<Json<ScheduleListing>, FlightBoardError> {
    let code = state.airport_code(&query);
    Ok(Json(state.service.demo_arrivals(code)?))
}

/// Error envelope returned by every endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_codes: Option<Vec<String>>,
}

impl IntoResponse for FlightBoardError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            FlightBoardError::InvalidAirport { code, valid_codes } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Invalid airport code".to_string(),
                    message: Some(format!("Unknown airport: {code}")),
                    valid_codes: Some(valid_codes),
                },
            ),
            FlightBoardError::InvalidCountry { code, valid_codes } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Invalid country code".to_string(),
                    message: Some(format!("Unknown country: {code}")),
                    valid_codes: Some(valid_codes),
                },
            ),
            FlightBoardError::UpstreamTimeout { provider } => {
                warn!("{} API timeout", provider);
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    ErrorBody {
                        error: format!("{provider} API timeout"),
                        message: Some(
                            "The flight data service is taking too long to respond".to_string(),
                        ),
                        valid_codes: None,
                    },
                )
            }
            FlightBoardError::UpstreamStatus {
                provider,
                status,
                message,
            } => {
                warn!("{} API responded with HTTP {}", provider, status);
                (
                    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                    ErrorBody {
                        error: format!("{provider} API error"),
                        message: Some(message),
                        valid_codes: None,
                    },
                )
            }
            other => {
                error!("Request failed: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Server error".to_string(),
                        message: Some(
                            "Failed to fetch flight data. Please try again later.".to_string(),
                        ),
                        valid_codes: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
