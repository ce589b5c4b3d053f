//! Flight listing service
//!
//! Resolves the requested airport, fetches from the configured provider,
//! applies the endpoint's failure policy and runs the normalization pipeline:
//! drop blank callsigns, truncate to the endpoint limit, normalize, sort.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::{AppConfig, EndpointsConfig, FailurePolicy};
use crate::errors::FlightBoardError;
use crate::models::{FeedSource, FlightListing, FlightRecord, ScheduledFlight};
use crate::normalizer::Normalizer;
use crate::provider::{
    self, Direction, FlightProvider, MockProvider, RawLiveFlight, RawScheduledFlight, TimeWindow,
};
use crate::reference::{self, Airport};

const NO_FLIGHTS: &str = "No flights detected in area";
const NO_DEPARTURES: &str = "No departures found";
const NO_ARRIVALS: &str = "No arrivals found";

pub type LiveListing = FlightListing<FlightRecord>;
pub type ScheduleListing = FlightListing<ScheduledFlight>;

pub struct FlightService {
    provider: Arc<dyn FlightProvider>,
    fallback: MockProvider,
    flights: Normalizer,
    departures: Normalizer,
    arrivals: Normalizer,
    lookback: Duration,
}

impl FlightService {
    pub fn new(
        provider: Arc<dyn FlightProvider>,
        endpoints: &EndpointsConfig,
        lookback: Duration,
    ) -> Self {
        Self {
            provider,
            fallback: MockProvider::new(),
            flights: Normalizer::new(endpoints.flights.clone()),
            departures: Normalizer::new(endpoints.departures.clone()),
            arrivals: Normalizer::new(endpoints.arrivals.clone()),
            lookback,
        }
    }

    /// Service backed by the provider selected in `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, FlightBoardError> {
        let provider = provider::from_config(&config.provider)?;
        Ok(Self::new(
            provider,
            &config.endpoints,
            config.provider.lookback,
        ))
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Live aircraft around the airport `code`.
    pub async fn live_flights(&self, code: &str) -> Result<LiveListing, FlightBoardError> {
        let airport = reference::require_airport(code)?;
        let now = Utc::now();

        let fetched = self.provider.live_flights(airport).await;
        let (raw, source) = self.apply_policy(
            "flights",
            self.flights.profile().on_failure,
            fetched,
            || {
                self.fallback
                    .generate_states(airport, now.timestamp())
                    .into_iter()
                    .map(RawLiveFlight::State)
                    .collect()
            },
        )?;

        let flights = self.normalize_live(raw, now);
        info!(
            "Serving {} live flights for {} ({:?})",
            flights.len(),
            airport.code,
            source
        );

        let listing = FlightListing::new(airport, flights, now, source)
            .with_units(self.flights.units());
        Ok(with_empty_message(listing, NO_FLIGHTS))
    }

    /// Departures from the airport `code` within the lookback window.
    pub async fn departures(&self, code: &str) -> Result<ScheduleListing, FlightBoardError> {
        self.scheduled(code, Direction::Departures).await
    }

    /// Arrivals at the airport `code` within the lookback window.
    pub async fn arrivals(&self, code: &str) -> Result<ScheduleListing, FlightBoardError> {
        self.scheduled(code, Direction::Arrivals).await
    }

    /// Fixed demo departures, no provider access.
    pub fn demo_departures(&self, code: &str) -> Result<ScheduleListing, FlightBoardError> {
        self.demo(code, Direction::Departures)
    }

    /// Fixed demo arrivals, no provider access.
    pub fn demo_arrivals(&self, code: &str) -> Result<ScheduleListing, FlightBoardError> {
        self.demo(code, Direction::Arrivals)
    }

    async fn scheduled(
        &self,
        code: &str,
        direction: Direction,
    ) -> Result<ScheduleListing, FlightBoardError> {
        let airport = reference::require_airport(code)?;
        let now = Utc::now();
        let window = TimeWindow::lookback(now.timestamp(), self.lookback);

        let (endpoint, normalizer, empty) = match direction {
            Direction::Departures => ("departures", &self.departures, NO_DEPARTURES),
            Direction::Arrivals => ("arrivals", &self.arrivals, NO_ARRIVALS),
        };

        let fetched = self
            .provider
            .scheduled_flights(airport, direction, window)
            .await;
        let (raw, source) = self.apply_policy(
            endpoint,
            normalizer.profile().on_failure,
            fetched,
            || self.demo_records(airport, direction, window.end),
        )?;

        let flights = self.normalize_scheduled(raw, airport, direction, now);
        info!(
            "Serving {} {} for {} ({:?})",
            flights.len(),
            endpoint,
            airport.code,
            source
        );

        let listing = FlightListing::new(airport, flights, now, source);
        Ok(with_empty_message(listing, empty))
    }

    fn demo(&self, code: &str, direction: Direction) -> Result<ScheduleListing, FlightBoardError> {
        let airport = reference::require_airport(code)?;
        let now = Utc::now();

        let raw = self.demo_records(airport, direction, now.timestamp());
        let flights = self.normalize_scheduled(raw, airport, direction, now);

        Ok(FlightListing::new(airport, flights, now, FeedSource::Demo))
    }

    fn demo_records(
        &self,
        airport: &Airport,
        direction: Direction,
        now: i64,
    ) -> Vec<RawScheduledFlight> {
        match direction {
            Direction::Departures => self.fallback.demo_departures(airport, now),
            Direction::Arrivals => self.fallback.demo_arrivals(airport, now),
        }
    }

    /// Pass provider data through, or degrade to sample data when the
    /// endpoint allows it.
    fn apply_policy<T>(
        &self,
        endpoint: &str,
        policy: FailurePolicy,
        fetched: Result<Vec<T>, FlightBoardError>,
        sample: impl FnOnce() -> Vec<T>,
    ) -> Result<(Vec<T>, FeedSource), FlightBoardError> {
        match (fetched, policy) {
            (Ok(records), _) => Ok((records, FeedSource::Live)),
            (Err(e), FailurePolicy::Sample) if !e.is_invalid_input() => {
                warn!(
                    "{} request to {} failed, serving sample data: {}",
                    endpoint,
                    self.provider.name(),
                    e
                );
                Ok((sample(), FeedSource::Sample))
            }
            (Err(e), _) => Err(e),
        }
    }

    fn normalize_live(&self, raw: Vec<RawLiveFlight>, now: DateTime<Utc>) -> Vec<FlightRecord> {
        let mut rng = rand::rng();
        raw.iter()
            .filter(|flight| flight.has_callsign())
            .take(self.flights.profile().limit)
            .map(|flight| self.flights.live(flight, now, &mut rng))
            .collect()
    }

    fn normalize_scheduled(
        &self,
        raw: Vec<RawScheduledFlight>,
        airport: &Airport,
        direction: Direction,
        now: DateTime<Utc>,
    ) -> Vec<ScheduledFlight> {
        let mut rng = rand::rng();
        let now = now.timestamp();

        let records = raw.iter().filter(|flight| flight.has_callsign());
        let mut flights: Vec<ScheduledFlight> = match direction {
            Direction::Departures => records
                .take(self.departures.profile().limit)
                .map(|flight| self.departures.departure(flight, airport, now, &mut rng))
                .collect(),
            Direction::Arrivals => records
                .take(self.arrivals.profile().limit)
                .map(|flight| self.arrivals.arrival(flight, airport, now, &mut rng))
                .collect(),
        };

        // Stable, missing times first
        match direction {
            Direction::Departures => flights.sort_by_key(|f| f.first_seen.unwrap_or(0)),
            Direction::Arrivals => flights.sort_by_key(|f| f.last_seen.unwrap_or(0)),
        }
        flights
    }
}

fn with_empty_message<T>(listing: FlightListing<T>, message: &str) -> FlightListing<T> {
    if listing.flights.is_empty() && listing.source == FeedSource::Live {
        listing.with_message(message)
    } else {
        listing
    }
}
