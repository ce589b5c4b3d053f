//! Flight data providers
//!
//! A provider fetches raw flight records for one airport. Records come in two
//! shapes: live telemetry ([`RawLiveFlight`]) and departure/arrival lists
//! ([`RawScheduledFlight`]). Both are normalized by [`crate::normalizer`].

mod aviationstack;
mod mock;
mod opensky;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::{ProviderConfig, ProviderKind};
use crate::errors::FlightBoardError;
use crate::models::serde_helpers::*;
use crate::models::Position;
use crate::normalizer::Telemetry;
use crate::reference::Airport;

pub use aviationstack::{AviationStackClient, AviationStackFlight, AviationStackResponse};
pub use mock::MockProvider;
pub use opensky::{OpenSkyClient, StateVector, StatesResponse};

/// Departure or arrival record as reported by a provider.
///
/// Matches the OpenSky flights format; richer providers convert into it.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScheduledFlight {
    #[serde(default)]
    pub icao24: Option<String>,
    #[serde(default, deserialize_with = "deserialize_trimmed_string")]
    pub callsign: Option<String>,
    /// Epoch seconds
    #[serde(default)]
    pub first_seen: Option<i64>,
    /// Epoch seconds
    #[serde(default)]
    pub last_seen: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_airport_code")]
    pub est_departure_airport: Option<String>,
    #[serde(default, deserialize_with = "deserialize_airport_code")]
    pub est_arrival_airport: Option<String>,
    /// Only set by providers that know gates
    #[serde(skip)]
    pub gate: Option<String>,
}

impl RawScheduledFlight {
    pub fn has_callsign(&self) -> bool {
        self.callsign.is_some()
    }
}

/// Live telemetry from any provider shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawLiveFlight {
    /// Row of an OpenSky states response
    State(StateVector),
    /// AviationStack flight with a `live` block
    AviationStack(AviationStackFlight),
}

impl RawLiveFlight {
    fn inner(&self) -> &dyn Telemetry {
        match self {
            Self::State(state) => state,
            Self::AviationStack(flight) => flight,
        }
    }

    pub fn has_callsign(&self) -> bool {
        self.inner().callsign().is_some_and(|c| !c.trim().is_empty())
    }
}

impl Telemetry for RawLiveFlight {
    fn icao24(&self) -> Option<&str> {
        self.inner().icao24()
    }
    fn callsign(&self) -> Option<&str> {
        self.inner().callsign()
    }
    fn airline(&self) -> Option<&str> {
        self.inner().airline()
    }
    fn origin(&self) -> Option<&str> {
        self.inner().origin()
    }
    fn position(&self) -> Option<Position> {
        self.inner().position()
    }
    fn altitude_m(&self) -> Option<f64> {
        self.inner().altitude_m()
    }
    fn velocity_mps(&self) -> Option<f64> {
        self.inner().velocity_mps()
    }
    fn heading(&self) -> Option<f64> {
        self.inner().heading()
    }
    fn vertical_rate_mps(&self) -> Option<f64> {
        self.inner().vertical_rate_mps()
    }
    fn on_ground(&self) -> bool {
        self.inner().on_ground()
    }
    fn last_contact(&self) -> Option<i64> {
        self.inner().last_contact()
    }
    fn gate(&self) -> Option<&str> {
        self.inner().gate()
    }
}

/// Query window in epoch seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub begin: i64,
    pub end: i64,
}

impl TimeWindow {
    /// Window ending at `now`, reaching `span` into the past.
    pub fn lookback(now: i64, span: Duration) -> Self {
        Self {
            begin: now - span.as_secs() as i64,
            end: now,
        }
    }
}

/// Which side of the board a scheduled query is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Departures,
    Arrivals,
}

/// Source of raw flight records.
#[async_trait::async_trait]
pub trait FlightProvider: Send + Sync {
    /// Provider name used in logs and error messages
    fn name(&self) -> &'static str;

    /// Live telemetry around `airport`.
    async fn live_flights(&self, airport: &Airport) -> Result<Vec<RawLiveFlight>, FlightBoardError>;

    /// Departures from or arrivals at `airport` within `window`.
    async fn scheduled_flights(
        &self,
        airport: &Airport,
        direction: Direction,
        window: TimeWindow,
    ) -> Result<Vec<RawScheduledFlight>, FlightBoardError>;
}

/// Build the provider selected in configuration.
pub fn from_config(config: &ProviderConfig) -> Result<Arc<dyn FlightProvider>, FlightBoardError> {
    info!("Using flight data provider: {:?}", config.kind);

    let provider: Arc<dyn FlightProvider> = match config.kind {
        ProviderKind::OpenSky => Arc::new(OpenSkyClient::new(config)?),
        ProviderKind::AviationStack => Arc::new(AviationStackClient::new(config)?),
        ProviderKind::Mock => Arc::new(MockProvider::new()),
    };

    Ok(provider)
}

fn http_client(config: &ProviderConfig) -> Result<reqwest::Client, FlightBoardError> {
    Ok(reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .build()?)
}

/// Send `request` and decode a JSON body.
///
/// Non-2xx replies become [`FlightBoardError::UpstreamStatus`] carrying the
/// provider's body; timeouts become [`FlightBoardError::UpstreamTimeout`].
async fn fetch_json<T: DeserializeOwned>(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, FlightBoardError> {
    let response = request
        .send()
        .await
        .map_err(|e| FlightBoardError::from_transport(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .map_err(|e| FlightBoardError::from_transport(provider, e))?;
        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Failed to fetch flight data")
                .to_string()
        } else {
            body
        };
        return Err(FlightBoardError::UpstreamStatus {
            provider,
            status: status.as_u16(),
            message,
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| FlightBoardError::from_transport(provider, e))?;
    debug!("{} responded with {} bytes", provider, body.len());

    Ok(serde_json::from_slice(&body)?)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scheduled_flight() {
        let s = r#"{
            "icao24": "4ca7b4",
            "firstSeen": 1734355200,
            "estDepartureAirport": "ENGM",
            "lastSeen": 1734358800,
            "estArrivalAirport": "ESSA",
            "callsign": "SAS4455 ",
            "estDepartureAirportHorizDistance": 1234,
            "departureAirportCandidatesCount": 1
        }"#;
        let flight: RawScheduledFlight = serde_json::from_str(s).unwrap();
        let expected = RawScheduledFlight {
            icao24: Some("4ca7b4".to_string()),
            callsign: Some("SAS4455".to_string()),
            first_seen: Some(1734355200),
            last_seen: Some(1734358800),
            est_departure_airport: Some("ENGM".to_string()),
            est_arrival_airport: Some("ESSA".to_string()),
            gate: None,
        };

        assert_eq!(flight, expected);
    }

    #[test]
    fn parse_scheduled_flight_nones() {
        let s = r#"{
            "icao24": "4ca7b4",
            "firstSeen": null,
            "estDepartureAirport": 42,
            "lastSeen": 1734358800,
            "estArrivalAirport": "  ",
            "callsign": "   "
        }"#;
        let flight: RawScheduledFlight = serde_json::from_str(s).unwrap();

        assert_eq!(flight.first_seen, None);
        assert_eq!(flight.est_departure_airport, None);
        assert_eq!(flight.est_arrival_airport, None);
        assert!(!flight.has_callsign());
    }

    #[test]
    fn lookback_window() {
        let window = TimeWindow::lookback(10_000, Duration::from_secs(7200));
        assert_eq!(window, TimeWindow { begin: 2_800, end: 10_000 });
    }
}
