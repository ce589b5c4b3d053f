//! Application configuration

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_with::serde_as;

use crate::board::FlightKind;
use crate::errors::FlightBoardError;
use crate::normalizer::{AltitudeUnit, VelocityUnit};
use crate::reference;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub endpoints: EndpointsConfig,
    pub board: BoardConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Airport used when a request does not name one
    pub default_airport: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            default_airport: "OSL".to_string(),
        }
    }
}

/// Which flight data provider to talk to
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenSky,
    AviationStack,
    /// Locally generated data, no network access
    Mock,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Overrides the provider's public API root
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub user_agent: String,
    /// Timeout for live state requests
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub states_timeout: Duration,
    /// Timeout for departure and arrival requests
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub flights_timeout: Duration,
    /// How far back departure and arrival queries look
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub lookback: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            base_url: None,
            api_key: None,
            user_agent: "FlightStatusBoard/1.0".to_string(),
            states_timeout: Duration::from_secs(10),
            flights_timeout: Duration::from_secs(15),
            lookback: Duration::from_secs(7200),
        }
    }
}

/// What an endpoint does when the provider fails
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Return the provider error to the client
    #[default]
    Surface,
    /// Substitute locally generated sample data
    Sample,
}

/// Normalization and failure settings of one endpoint.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EndpointProfile {
    #[serde(default)]
    pub velocity_unit: VelocityUnit,
    #[serde(default)]
    pub altitude_unit: AltitudeUnit,
    #[serde(default)]
    pub synthesize_gates: bool,
    pub limit: usize,
    #[serde(default)]
    pub on_failure: FailurePolicy,
}

impl EndpointProfile {
    /// Defaults of the live states endpoint
    pub fn live() -> Self {
        Self {
            velocity_unit: VelocityUnit::KilometersPerHour,
            altitude_unit: AltitudeUnit::Meters,
            synthesize_gates: false,
            limit: 20,
            on_failure: FailurePolicy::Surface,
        }
    }

    /// Defaults of the departure and arrival endpoints
    pub fn scheduled() -> Self {
        Self {
            synthesize_gates: true,
            limit: 30,
            ..Self::live()
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EndpointsConfig {
    pub flights: EndpointProfile,
    pub departures: EndpointProfile,
    pub arrivals: EndpointProfile,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            flights: EndpointProfile::live(),
            departures: EndpointProfile::scheduled(),
            arrivals: EndpointProfile::scheduled(),
        }
    }
}

/// Console departure/arrival board
#[serde_as]
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BoardConfig {
    pub enabled: bool,
    pub airport: String,
    pub facet: FlightKind,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub refresh_interval: Duration,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            airport: "OSL".to_string(),
            facet: FlightKind::All,
            refresh_interval: Duration::from_secs(60),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("config/default"))
    }

    /// Load from an optional file (extension inferred) overlaid by
    /// `FLIGHTBOARD__*` environment variables.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let live = EndpointProfile::live();
        let scheduled = EndpointProfile::scheduled();

        // Endpoint defaults differ per endpoint, so seed them here rather
        // than through serde field defaults.
        let config = Config::builder()
            .set_default("endpoints.flights.limit", live.limit as u64)?
            .set_default("endpoints.flights.synthesize_gates", live.synthesize_gates)?
            .set_default("endpoints.departures.limit", scheduled.limit as u64)?
            .set_default(
                "endpoints.departures.synthesize_gates",
                scheduled.synthesize_gates,
            )?
            .set_default("endpoints.arrivals.limit", scheduled.limit as u64)?
            .set_default(
                "endpoints.arrivals.synthesize_gates",
                scheduled.synthesize_gates,
            )?
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("FLIGHTBOARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), FlightBoardError> {
        self.provider.validate()?;
        for (name, profile) in [
            ("flights", &self.endpoints.flights),
            ("departures", &self.endpoints.departures),
            ("arrivals", &self.endpoints.arrivals),
        ] {
            profile.validate(name)?;
        }
        validate_airport("server.default_airport", &self.server.default_airport)?;
        self.board.validate()?;
        Ok(())
    }
}

fn validate_airport(key: &str, code: &str) -> Result<(), FlightBoardError> {
    if reference::airport(code).is_none() {
        return Err(FlightBoardError::ConfigurationError {
            message: format!("{key}: unknown airport code {code}"),
        });
    }
    Ok(())
}

impl ProviderConfig {
    fn validate(&self) -> Result<(), FlightBoardError> {
        if self.states_timeout.is_zero() || self.flights_timeout.is_zero() {
            return Err(FlightBoardError::ConfigurationError {
                message: "Provider timeouts must be greater than zero".to_string(),
            });
        }
        if self.lookback.is_zero() {
            return Err(FlightBoardError::ConfigurationError {
                message: "Lookback window must be greater than zero".to_string(),
            });
        }
        if self.kind == ProviderKind::AviationStack
            && self.api_key.as_deref().unwrap_or("").is_empty()
        {
            return Err(FlightBoardError::ConfigurationError {
                message: "AviationStack requires provider.api_key".to_string(),
            });
        }
        Ok(())
    }
}

impl EndpointProfile {
    fn validate(&self, name: &str) -> Result<(), FlightBoardError> {
        if self.limit == 0 {
            return Err(FlightBoardError::ConfigurationError {
                message: format!("endpoints.{name}.limit must be greater than zero"),
            });
        }
        Ok(())
    }
}

impl BoardConfig {
    fn validate(&self) -> Result<(), FlightBoardError> {
        if !self.enabled {
            return Ok(());
        }
        if self.refresh_interval.is_zero() {
            return Err(FlightBoardError::ConfigurationError {
                message: "Board refresh interval must be greater than zero".to_string(),
            });
        }
        validate_airport("board.airport", &self.airport)
    }
}
