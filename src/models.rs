//! Data models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalizer::{AltitudeUnit, VelocityUnit};
use crate::reference::Airport;

/// Derived flight status.
///
/// Serialized as the variant name; `Display` gives the board label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightStatus {
    // Position family
    OnGround,
    Departing,
    Arriving,
    InFlight,
    // Departure family
    Departed,
    Boarding,
    Scheduled,
    // Arrival family
    Landed,
    OnApproach,
    Expected,
}

/// Group of statuses one endpoint may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFamily {
    Position,
    Departure,
    Arrival,
}

impl FlightStatus {
    pub fn family(&self) -> StatusFamily {
        match self {
            Self::OnGround | Self::Departing | Self::Arriving | Self::InFlight => {
                StatusFamily::Position
            }
            Self::Departed | Self::Boarding | Self::Scheduled => StatusFamily::Departure,
            Self::Landed | Self::OnApproach | Self::Expected => StatusFamily::Arrival,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::OnGround => "On Ground",
            Self::Departing => "Departing",
            Self::Arriving => "Arriving",
            Self::InFlight => "In Flight",
            Self::Departed => "Departed",
            Self::Boarding => "Boarding",
            Self::Scheduled => "Scheduled",
            Self::Landed => "Landed",
            Self::OnApproach => "On Approach",
            Self::Expected => "Expected",
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl StatusFamily {
    pub fn members(&self) -> &'static [FlightStatus] {
        use FlightStatus::*;
        match self {
            Self::Position => &[OnGround, Departing, Arriving, InFlight],
            Self::Departure => &[Departed, Boarding, Scheduled],
            Self::Arrival => &[Landed, OnApproach, Expected],
        }
    }

    pub fn contains(&self, status: FlightStatus) -> bool {
        status.family() == *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// Normalized live flight, produced from a state vector or live telemetry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightRecord {
    pub icao24: Option<String>,
    pub callsign: String,
    pub airline: String,
    /// Origin country for state vectors, departure airport for richer feeds
    pub origin_or_destination: String,
    pub position: Option<Position>,
    /// In the unit named by the listing's `units.altitude`
    pub altitude: i64,
    /// In the unit named by the listing's `units.velocity`
    pub velocity: i64,
    pub heading: i64,
    /// Metres per second, one decimal
    pub vertical_rate: f64,
    pub on_ground: bool,
    pub status: FlightStatus,
    pub gate: Option<String>,
    pub last_contact: DateTime<Utc>,
}

/// Normalized departure or arrival.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledFlight {
    pub callsign: String,
    pub est_departure_airport: String,
    /// Present on arrival boards
    #[serde(skip_serializing_if = "Option::is_none")]
    pub est_departure_airport_name: Option<String>,
    pub est_arrival_airport: String,
    /// Present on departure boards
    #[serde(skip_serializing_if = "Option::is_none")]
    pub est_arrival_airport_name: Option<String>,
    pub first_seen: Option<i64>,
    pub last_seen: Option<i64>,
    pub gate: String,
    pub status: FlightStatus,
}

/// Where the flights of a listing came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    /// Fetched from the configured provider
    Live,
    /// Locally generated after a provider failure
    Sample,
    /// Hand-authored fixtures
    Demo,
}

/// Units the numeric fields of a live listing are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnitSummary {
    pub altitude: AltitudeUnit,
    pub velocity: VelocityUnit,
}

/// Response envelope for every flight endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct FlightListing<T> {
    pub airport: &'static Airport,
    pub flights: Vec<T>,
    pub count: usize,
    pub timestamp: DateTime<Utc>,
    pub source: FeedSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<UnitSummary>,
}

impl<T> FlightListing<T> {
    pub fn new(
        airport: &'static Airport,
        flights: Vec<T>,
        timestamp: DateTime<Utc>,
        source: FeedSource,
    ) -> Self {
        Self {
            airport,
            count: flights.len(),
            flights,
            timestamp,
            source,
            message: None,
            units: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_units(mut self, units: UnitSummary) -> Self {
        self.units = Some(units);
        self
    }
}

/// Custom deserializers for provider payloads
pub(crate) mod serde_helpers {
    use serde::{self, Deserialize, Deserializer};
    use serde_json::Value;

    /// Trimmed string, None if null or blank
    pub fn deserialize_trimmed_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        Ok(s.and_then(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }))
    }

    /// Airport code, None for blank strings and for non-string values
    pub fn deserialize_airport_code<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
    }

    /// Numeric value, None for null or non-numeric values
    pub fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(Value::as_f64))
    }
}
