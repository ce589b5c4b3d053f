//! OpenSky Network client
//!
//! See: https://openskynetwork.github.io/opensky-api/rest.html

use serde::Deserialize;
use serde_json::Value;
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

const DEFAULT_BASE_URL: &str = "https://opensky-network.org/api";
const PROVIDER: &str = "OpenSky";

/// Response of `/states/all`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatesResponse {
    /// Time the states are valid for, seconds from Unix epoch
    pub time: i64,
    /// None when no aircraft are inside the bounding box
    #[serde(default)]
    pub states: Option<Vec<StateVector>>,
}

/// One aircraft state.
///
/// Transmitted as a positional JSON array, decoded in field order.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct StateVector {
    /// ICAO 24-bit transponder address, hex string
    pub icao24: String,
    /// Callsign, None if not received or blank
    #[serde(deserialize_with = "deserialize_trimmed_string")]
    pub callsign: Option<String>,
    /// Country inferred from the ICAO 24-bit address
    pub origin_country: String,
    /// Last position update, seconds from Unix epoch
    pub time_position: Option<i64>,
    /// Last update of any kind, seconds from Unix epoch
    pub last_contact: Option<i64>,
    /// WGS-84 decimal degrees
    pub longitude: Option<f64>,
    /// WGS-84 decimal degrees
    pub latitude: Option<f64>,
    /// Barometric altitude in metres
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub baro_altitude: Option<f64>,
    pub on_ground: bool,
    /// Ground speed in m/s
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub velocity: Option<f64>,
    /// Track in decimal degrees clockwise from north
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub true_track: Option<f64>,
    /// m/s, positive when climbing
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub vertical_rate: Option<f64>,
    /// Receiver IDs, None unless requested
    pub sensors: Option<Vec<i64>>,
    /// Geometric altitude in metres
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub geo_altitude: Option<f64>,
    pub squawk: Option<String>,
    /// Special purpose indicator
    pub spi: bool,
    /// 0 = ADS-B, 1 = ASTERIX, 2 = MLAT, 3 = FLARM
    pub position_source: Option<u8>,
    /// Aircraft category, only sent with `extended=1`
    #[serde(default)]
    pub category: Option<u8>,
}

impl Telemetry for StateVector {
    fn icao24(&self) -> Option<&str> {
        Some(&self.icao24)
    }
    fn callsign(&self) -> Option<&str> {
        self.callsign.as_deref()
    }
    fn origin(&self) -> Option<&str> {
        Some(&self.origin_country)
    }
    fn position(&self) -> Option<Position> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Position {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
    fn altitude_m(&self) -> Option<f64> {
        self.baro_altitude
    }
    fn velocity_mps(&self) -> Option<f64> {
        self.velocity
    }
    fn heading(&self) -> Option<f64> {
        self.true_track
    }
    fn vertical_rate_mps(&self) -> Option<f64> {
        self.vertical_rate
    }
    fn on_ground(&self) -> bool {
        self.on_ground
    }
    fn last_contact(&self) -> Option<i64> {
        self.last_contact
    }
}

/// OpenSky REST client
#[derive(Debug, Clone)]
pub struct OpenSkyClient {
    client: reqwest::Client,
    base_url: String,
    config: ProviderConfig,
}

impl OpenSkyClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, FlightBoardError> {
        Ok(Self {
            client: http_client(config)?,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            config: config.clone(),
        })
    }
}

#[async_trait::async_trait]
impl FlightProvider for OpenSkyClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn live_flights(&self, airport: &Airport) -> Result<Vec<RawLiveFlight>, FlightBoardError> {
        info!("Fetching flights for {} from OpenSky API", airport.code);

        let bbox = airport.bbox;
        let request = self
            .client
            .get(format!("{}/states/all", self.base_url))
            .query(&[
                ("lamin", bbox.lamin),
                ("lomin", bbox.lomin),
                ("lamax", bbox.lamax),
                ("lomax", bbox.lomax),
            ])
            .timeout(self.config.states_timeout);

        let response: StatesResponse = fetch_json(PROVIDER, request).await?;

        Ok(response
            .states
            .unwrap_or_default()
            .into_iter()
            .map(RawLiveFlight::State)
            .collect())
    }

    async fn scheduled_flights(
        &self,
        airport: &Airport,
        direction: Direction,
        window: TimeWindow,
    ) -> Result<Vec<RawScheduledFlight>, FlightBoardError> {
        let path = match direction {
            Direction::Departures => "departure",
            Direction::Arrivals => "arrival",
        };
        info!(
            "Fetching {:?} for {} ({}) from OpenSky API",
            direction, airport.code, airport.icao
        );

        let request = self
            .client
            .get(format!("{}/flights/{}", self.base_url, path))
            .query(&[
                ("airport", airport.icao.to_string()),
                ("begin", window.begin.to_string()),
                ("end", window.end.to_string()),
            ])
            .timeout(self.config.flights_timeout);

        // Anything but an array means no flights
        let body: Value = fetch_json(PROVIDER, request).await?;
        match body {
            Value::Array(_) => Ok(serde_json::from_value(body)?),
            _ => Ok(Vec::new()),
        }
    }
}
