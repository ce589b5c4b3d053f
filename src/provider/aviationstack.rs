//! AviationStack client
//!
//! See: https://aviationstack.com/documentation

use chrono::DateTime;
use serde::Deserialize;
use tracing::info;

use super::{
    fetch_json, http_client, Direction, FlightProvider, RawLiveFlight, RawScheduledFlight,
    TimeWindow,
};
use crate::config::ProviderConfig;
use crate::errors::FlightBoardError;
use crate::models::serde_helpers::*;
use crate::models::Position;
use crate::normalizer::Telemetry;
use crate::reference::Airport;

const DEFAULT_BASE_URL: &str = "http://api.aviationstack.com/v1";
const PROVIDER: &str = "AviationStack";
const KMH_PER_MPS: f64 = 3.6;

/// Response of `/flights`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AviationStackResponse {
    #[serde(default)]
    pub data: Vec<AviationStackFlight>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct AviationStackFlight {
    #[serde(default)]
    pub departure: Option<AirportEvent>,
    #[serde(default)]
    pub arrival: Option<AirportEvent>,
    #[serde(default)]
    pub airline: Option<AirlineInfo>,
    #[serde(default)]
    pub flight: Option<FlightIdent>,
    #[serde(default)]
    pub aircraft: Option<AircraftInfo>,
    /// Live telemetry, None unless the flight is airborne and tracked
    #[serde(default)]
    pub live: Option<LiveData>,
}

/// Departure or arrival side of a flight
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct AirportEvent {
    #[serde(default, deserialize_with = "deserialize_trimmed_string")]
    pub airport: Option<String>,
    #[serde(default, deserialize_with = "deserialize_airport_code")]
    pub icao: Option<String>,
    #[serde(default, deserialize_with = "deserialize_trimmed_string")]
    pub gate: Option<String>,
    /// ISO-8601 timestamps
    #[serde(default)]
    pub scheduled: Option<String>,
    #[serde(default)]
    pub estimated: Option<String>,
    #[serde(default)]
    pub actual: Option<String>,
}

impl AirportEvent {
    /// Best known time of the event, seconds from Unix epoch
    pub fn best_time(&self) -> Option<i64> {
        [&self.actual, &self.estimated, &self.scheduled]
            .into_iter()
            .flatten()
            .find_map(|s| parse_timestamp(s))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct AirlineInfo {
    #[serde(default, deserialize_with = "deserialize_trimmed_string")]
    pub iata: Option<String>,
    #[serde(default, deserialize_with = "deserialize_trimmed_string")]
    pub icao: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct FlightIdent {
    #[serde(default, deserialize_with = "deserialize_trimmed_string")]
    pub iata: Option<String>,
    #[serde(default, deserialize_with = "deserialize_trimmed_string")]
    pub icao: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct AircraftInfo {
    #[serde(default, deserialize_with = "deserialize_trimmed_string")]
    pub icao24: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct LiveData {
    /// ISO-8601 time of the last update
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub longitude: Option<f64>,
    /// Metres
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub altitude: Option<f64>,
    /// Degrees
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub direction: Option<f64>,
    /// km/h
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub speed_horizontal: Option<f64>,
    /// km/h
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub speed_vertical: Option<f64>,
    #[serde(default)]
    pub is_ground: Option<bool>,
}

fn parse_timestamp(s: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.timestamp())
}

impl AviationStackFlight {
    /// Flight identifier, ICAO form preferred
    pub fn callsign(&self) -> Option<&str> {
        let flight = self.flight.as_ref()?;
        flight.icao.as_deref().or(flight.iata.as_deref())
    }

    /// Convert into the departure/arrival record shape.
    ///
    /// The gate is taken from the side of the board being built.
    pub fn to_scheduled(&self, direction: Direction) -> RawScheduledFlight {
        let departure = self.departure.as_ref();
        let arrival = self.arrival.as_ref();
        let gate_side = match direction {
            Direction::Departures => departure,
            Direction::Arrivals => arrival,
        };

        RawScheduledFlight {
            icao24: self.aircraft.as_ref().and_then(|a| a.icao24.clone()),
            callsign: self.callsign().map(str::to_string),
            first_seen: departure.and_then(AirportEvent::best_time),
            last_seen: arrival.and_then(AirportEvent::best_time),
            est_departure_airport: departure.and_then(|d| d.icao.clone()),
            est_arrival_airport: arrival.and_then(|a| a.icao.clone()),
            gate: gate_side.and_then(|side| side.gate.clone()),
        }
    }
}

impl Telemetry for AviationStackFlight {
    fn icao24(&self) -> Option<&str> {
        self.aircraft.as_ref()?.icao24.as_deref()
    }
    fn callsign(&self) -> Option<&str> {
        AviationStackFlight::callsign(self)
    }
    fn airline(&self) -> Option<&str> {
        let airline = self.airline.as_ref()?;
        airline.iata.as_deref().or(airline.icao.as_deref())
    }
    fn origin(&self) -> Option<&str> {
        self.departure.as_ref()?.airport.as_deref()
    }
    fn position(&self) -> Option<Position> {
        let live = self.live.as_ref()?;
        Some(Position {
            latitude: live.latitude?,
            longitude: live.longitude?,
        })
    }
    fn altitude_m(&self) -> Option<f64> {
        self.live.as_ref()?.altitude
    }
    fn velocity_mps(&self) -> Option<f64> {
        self.live
            .as_ref()?
            .speed_horizontal
            .map(|kmh| kmh / KMH_PER_MPS)
    }
    fn heading(&self) -> Option<f64> {
        self.live.as_ref()?.direction
    }
    fn vertical_rate_mps(&self) -> Option<f64> {
        self.live
            .as_ref()?
            .speed_vertical
            .map(|kmh| kmh / KMH_PER_MPS)
    }
    fn on_ground(&self) -> bool {
        self.live
            .as_ref()
            .and_then(|live| live.is_ground)
            .unwrap_or(false)
    }
    fn last_contact(&self) -> Option<i64> {
        parse_timestamp(self.live.as_ref()?.updated.as_deref()?)
    }
    fn gate(&self) -> Option<&str> {
        self.departure.as_ref()?.gate.as_deref()
    }
}

/// AviationStack REST client
#[derive(Debug, Clone)]
pub struct AviationStackClient {
    client: reqwest::Client,
    base_url: String,
    access_key: String,
    config: ProviderConfig,
}

impl AviationStackClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, FlightBoardError> {
        let access_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| FlightBoardError::ConfigurationError {
                message: "AviationStack requires provider.api_key".to_string(),
            })?;

        Ok(Self {
            client: http_client(config)?,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            access_key,
            config: config.clone(),
        })
    }

    async fn flights(
        &self,
        filter: &[(&str, &str)],
        timeout: std::time::Duration,
    ) -> Result<Vec<AviationStackFlight>, FlightBoardError> {
        let request = self
            .client
            .get(format!("{}/flights", self.base_url))
            .query(&[("access_key", self.access_key.as_str())])
            .query(filter)
            .timeout(timeout);

        let response: AviationStackResponse = fetch_json(PROVIDER, request).await?;
        Ok(response.data)
    }
}

#[async_trait::async_trait]
impl FlightProvider for AviationStackClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    /// Active flights inbound to `airport` that carry live telemetry
    async fn live_flights(&self, airport: &Airport) -> Result<Vec<RawLiveFlight>, FlightBoardError> {
        info!("Fetching live flights for {} from AviationStack API", airport.code);

        let flights = self
            .flights(
                &[("arr_iata", airport.code), ("flight_status", "active")],
                self.config.states_timeout,
            )
            .await?;

        Ok(flights
            .into_iter()
            .filter(|flight| flight.live.is_some())
            .map(RawLiveFlight::AviationStack)
            .collect())
    }

    /// AviationStack has no time window; the current schedule is returned
    async fn scheduled_flights(
        &self,
        airport: &Airport,
        direction: Direction,
        _window: TimeWindow,
    ) -> Result<Vec<RawScheduledFlight>, FlightBoardError> {
        let key = match direction {
            Direction::Departures => "dep_iata",
            Direction::Arrivals => "arr_iata",
        };
        info!(
            "Fetching {:?} for {} from AviationStack API",
            direction, airport.code
        );

        let flights = self
            .flights(&[(key, airport.code)], self.config.flights_timeout)
            .await?;

        Ok(flights
            .iter()
            .map(|flight| flight.to_scheduled(direction))
            .collect())
    }
}
