//! Errors for flight board
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlightBoardError {
    #[error("Invalid airport code: {code}")]
    InvalidAirport {
        code: String,
        valid_codes: Vec<String>,
    },

    #[error("Invalid country code: {code}")]
    InvalidCountry {
        code: String,
        valid_codes: Vec<String>,
    },

    #[error("{provider} API timeout")]
    UpstreamTimeout { provider: &'static str },

    #[error("{provider} API error: HTTP {status}")]
    UpstreamStatus {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("HTTP client error")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error")]
    SerdeError(#[from] serde_json::Error),

    #[error("Configuration error")]
    ConfigError(#[from] config::ConfigError),

    #[error("Invalid configuration: {message}")]
    ConfigurationError { message: String },

    #[error("IO error")]
    IoError(#[from] std::io::Error),
}

impl FlightBoardError {
    /// Map a transport failure of `provider` onto the error taxonomy.
    ///
    /// Timeouts are reported separately so that they surface as 504.
    pub fn from_transport(provider: &'static str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::UpstreamTimeout { provider }
        } else {
            Self::HttpError(error)
        }
    }

    /// True for failures caused by the client request rather than the
    /// provider or the service itself.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidAirport { .. } | Self::InvalidCountry { .. }
        )
    }
}
