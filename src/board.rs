//! Departure/arrival board
//!
//! Merges departures and arrivals into [`BoardRow`]s, filters them by facet,
//! sorts by time and renders a plain text table. [`ConsoleBoard`] polls the
//! service and logs the table on every refresh.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::BoardConfig;
use crate::errors::FlightBoardError;
use crate::models::{FlightStatus, ScheduledFlight};
use crate::provider::Direction;
use crate::reference::{self, resolve_airport_name, Airport};
use crate::scheduler::{Countdown, PollHandle, PollTask};
use crate::service::FlightService;

const TICK: Duration = Duration::from_secs(1);

/// Which flights the board shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightKind {
    #[default]
    All,
    Departures,
    Arrivals,
}

impl FlightKind {
    pub fn includes(&self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (Self::All, _)
                | (Self::Departures, Direction::Departures)
                | (Self::Arrivals, Direction::Arrivals)
        )
    }

    fn title(&self) -> &'static str {
        match self {
            Self::All => "Departures & Arrivals",
            Self::Departures => "Departures",
            Self::Arrivals => "Arrivals",
        }
    }
}

/// What the board is showing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardState {
    pub airport: &'static Airport,
    pub facet: FlightKind,
}

/// One line of the board
#[derive(Debug, Clone, PartialEq)]
pub struct BoardRow {
    pub direction: Direction,
    pub callsign: String,
    /// Destination for departures, origin for arrivals
    pub airport_name: String,
    /// Epoch seconds
    pub time: Option<i64>,
    pub gate: String,
    pub status: FlightStatus,
}

impl BoardRow {
    pub fn departure(flight: &ScheduledFlight) -> Self {
        Self {
            direction: Direction::Departures,
            callsign: flight.callsign.clone(),
            airport_name: flight
                .est_arrival_airport_name
                .clone()
                .unwrap_or_else(|| resolve_airport_name(Some(&flight.est_arrival_airport))),
            time: flight.first_seen,
            gate: flight.gate.clone(),
            status: flight.status,
        }
    }

    pub fn arrival(flight: &ScheduledFlight) -> Self {
        Self {
            direction: Direction::Arrivals,
            callsign: flight.callsign.clone(),
            airport_name: flight
                .est_departure_airport_name
                .clone()
                .unwrap_or_else(|| resolve_airport_name(Some(&flight.est_departure_airport))),
            time: flight.last_seen,
            gate: flight.gate.clone(),
            status: flight.status,
        }
    }
}

pub fn filter_rows(rows: &[BoardRow], facet: FlightKind) -> Vec<BoardRow> {
    rows.iter()
        .filter(|row| facet.includes(row.direction))
        .cloned()
        .collect()
}

/// Stable ascending sort, rows without a time first.
pub fn sort_by_time(rows: &mut [BoardRow]) {
    rows.sort_by_key(|row| row.time.unwrap_or(0));
}

fn format_time(time: Option<i64>) -> String {
    time.and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// Render `rows` as a text table. Rows are filtered and sorted first.
pub fn render(state: &BoardState, rows: &[BoardRow]) -> String {
    let mut rows = filter_rows(rows, state.facet);
    sort_by_time(&mut rows);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}) - {}",
        state.airport.name,
        state.airport.code,
        state.facet.title()
    );
    let _ = writeln!(
        out,
        "{:<5}  {:<3}  {:<8}  {:<24}  {:<4}  {}",
        "TIME", "", "FLIGHT", "TO/FROM", "GATE", "STATUS"
    );

    if rows.is_empty() {
        out.push_str("No flights\n");
        return out;
    }

    for row in &rows {
        let marker = match row.direction {
            Direction::Departures => "DEP",
            Direction::Arrivals => "ARR",
        };
        let _ = writeln!(
            out,
            "{:<5}  {:<3}  {:<8}  {:<24}  {:<4}  {}",
            format_time(row.time),
            marker,
            row.callsign,
            row.airport_name,
            row.gate,
            row.status
        );
    }
    out
}

/// Board that refreshes from the service on a countdown
pub struct ConsoleBoard {
    service: Arc<FlightService>,
    state: BoardState,
    countdown: Countdown,
    last_tick: Option<Instant>,
}

impl ConsoleBoard {
    pub fn new(
        service: Arc<FlightService>,
        config: &BoardConfig,
    ) -> Result<Self, FlightBoardError> {
        Ok(Self {
            service,
            state: BoardState {
                airport: reference::require_airport(&config.airport)?,
                facet: config.facet,
            },
            countdown: Countdown::new(config.refresh_interval),
            last_tick: None,
        })
    }

    /// Tick about every second, refreshing whenever the countdown is due.
    pub fn spawn(self) -> PollHandle {
        info!(
            "Starting console board for {} ({:?})",
            self.state.airport.code, self.state.facet
        );
        let board = Arc::new(Mutex::new(self));

        PollTask::start(TICK, move || {
            let board = board.clone();
            async move {
                board.lock().await.tick().await;
            }
        })
    }

    /// Advance the countdown by the whole seconds since the previous tick,
    /// so time spent in a slow refresh is not lost. Returns true when the
    /// board was refreshed.
    async fn tick(&mut self) -> bool {
        let now = Instant::now();
        let (elapsed, last_tick) = match self.last_tick {
            Some(last) => {
                let secs = now.duration_since(last).as_secs();
                // Sub-second remainders carry over to the next tick
                (secs, last + Duration::from_secs(secs))
            }
            None => (1, now),
        };
        self.last_tick = Some(last_tick);

        if self.countdown.advance(elapsed) {
            let table = self.refresh().await;
            info!("\n{}", table);
            true
        } else {
            debug!("Next board refresh in {:?}", self.countdown.remaining());
            false
        }
    }

    /// Fetch the shown facets and render the table.
    pub async fn refresh(&self) -> String {
        let code = self.state.airport.code;
        let mut rows = Vec::new();

        if self.state.facet.includes(Direction::Departures) {
            match self.service.departures(code).await {
                Ok(listing) => rows.extend(listing.flights.iter().map(BoardRow::departure)),
                Err(e) => warn!("Board could not load departures: {}", e),
            }
        }
        if self.state.facet.includes(Direction::Arrivals) {
            match self.service.arrivals(code).await {
                Ok(listing) => rows.extend(listing.flights.iter().map(BoardRow::arrival)),
                Err(e) => warn!("Board could not load arrivals: {}", e),
            }
        }

        render(&self.state, &rows)
    }
}
