//! Locally generated flight data
//!
//! Used when `provider.kind = "mock"`, for the demo endpoints and as the
//! substitute data set of the `sample` failure policy.

use rand::Rng;

use super::{Direction, FlightProvider, RawLiveFlight, RawScheduledFlight, StateVector, TimeWindow};
use crate::errors::FlightBoardError;
use crate::reference::Airport;

const PROVIDER: &str = "Mock";

const AIRLINES: [&str; 10] = [
    "SAS", "NAX", "WIF", "DLH", "KLM", "BAW", "AFL", "THY", "UAE", "QTR",
];
const FOREIGN_ORIGINS: [&str; 5] = [
    "Germany",
    "Netherlands",
    "United Kingdom",
    "Russia",
    "Turkey",
];
const VERTICAL_RATES: [f64; 3] = [5.2, -2.1, 0.1];
const POSITION_JITTER: f64 = 0.15;
const FEET_PER_METER: f64 = 3.28084;
const KNOTS_PER_MPS: f64 = 1.94384;

/// (callsign, far-side ICAO, first seen offset, last seen offset)
type Fixture = (&'static str, &'static str, i64, i64);

const DEPARTURES: [Fixture; 8] = [
    ("SK4455", "ESSA", -1800, -1200),
    ("DY622", "ENBR", -900, -300),
    ("LH867", "EDDF", 600, 1200),
    ("KL1152", "EHAM", 1200, 1800),
    ("BA762", "EGLL", 1800, 2400),
    ("AF1268", "LFPG", 2400, 3000),
    ("AY681", "EFHK", 3000, 3600),
    ("SK1465", "EKCH", 3600, 4200),
];

const ARRIVALS: [Fixture; 7] = [
    ("SK4456", "ESSA", -5400, -3600),
    ("DY623", "ENBR", -4800, -900),
    ("LH868", "EDDF", -7200, -300),
    ("KL1153", "EHAM", -6600, 600),
    ("BA763", "EGLL", -6000, 1200),
    ("AF1269", "LFPG", -5400, 1800),
    ("AY682", "EFHK", -4800, 2400),
];

/// Provider serving generated states and fixed demo schedules.
#[derive(Debug, Clone, Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }

    /// Ten aircraft around `airport` with climbing altitude and speed.
    ///
    /// Vertical rates cycle so that statuses cycle departing, arriving and
    /// in flight.
    pub fn generate_states(&self, airport: &Airport, now: i64) -> Vec<StateVector> {
        let mut rng = rand::rng();

        (0..AIRLINES.len())
            .map(|i| {
                let seen = now - i as i64 * 5;
                let origin = if i % 2 == 0 {
                    "Norway"
                } else {
                    FOREIGN_ORIGINS[i % FOREIGN_ORIGINS.len()]
                };
                let altitude_ft = 5000.0 + i as f64 * 3000.0;
                let speed_kt = 250.0 + i as f64 * 20.0;

                StateVector {
                    icao24: format!("{i:06x}"),
                    callsign: Some(format!("{}{:03}", AIRLINES[i], 100 + i * 11)),
                    origin_country: origin.to_string(),
                    time_position: Some(seen),
                    last_contact: Some(seen),
                    longitude: Some(
                        airport.lon + rng.random_range(-POSITION_JITTER..POSITION_JITTER),
                    ),
                    latitude: Some(
                        airport.lat + rng.random_range(-POSITION_JITTER..POSITION_JITTER),
                    ),
                    baro_altitude: Some(altitude_ft / FEET_PER_METER),
                    on_ground: false,
                    velocity: Some(speed_kt / KNOTS_PER_MPS),
                    true_track: Some(((i * 36) % 360) as f64),
                    vertical_rate: Some(VERTICAL_RATES[i % VERTICAL_RATES.len()]),
                    ..Default::default()
                }
            })
            .collect()
    }

    /// Fixed departures from `airport`, timed relative to `now`.
    pub fn demo_departures(&self, airport: &Airport, now: i64) -> Vec<RawScheduledFlight> {
        DEPARTURES
            .iter()
            .map(|&(callsign, destination, first, last)| RawScheduledFlight {
                callsign: Some(callsign.to_string()),
                first_seen: Some(now + first),
                last_seen: Some(now + last),
                est_departure_airport: Some(airport.icao.to_string()),
                est_arrival_airport: Some(destination.to_string()),
                ..Default::default()
            })
            .collect()
    }

    /// Fixed arrivals at `airport`, timed relative to `now`.
    pub fn demo_arrivals(&self, airport: &Airport, now: i64) -> Vec<RawScheduledFlight> {
        ARRIVALS
            .iter()
            .map(|&(callsign, origin, first, last)| RawScheduledFlight {
                callsign: Some(callsign.to_string()),
                first_seen: Some(now + first),
                last_seen: Some(now + last),
                est_departure_airport: Some(origin.to_string()),
                est_arrival_airport: Some(airport.icao.to_string()),
                ..Default::default()
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl FlightProvider for MockProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn live_flights(&self, airport: &Airport) -> Result<Vec<RawLiveFlight>, FlightBoardError> {
        let now = chrono::Utc::now().timestamp();
        Ok(self
            .generate_states(airport, now)
            .into_iter()
            .map(RawLiveFlight::State)
            .collect())
    }

    /// Demo schedules timed around the end of `window`
    async fn scheduled_flights(
        &self,
        airport: &Airport,
        direction: Direction,
        window: TimeWindow,
    ) -> Result<Vec<RawScheduledFlight>, FlightBoardError> {
        Ok(match direction {
            Direction::Departures => self.demo_departures(airport, window.end),
            Direction::Arrivals => self.demo_arrivals(airport, window.end),
        })
    }
}
