use thiserror::Error;

/// Errors that can occur while fetching a signal from an upstream feed
///
/// These never leave a source: they are logged and turned into
/// [`FetchOutcome::NoData`](crate::signals::FetchOutcome::NoData).
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Upstream request failed: {0}")]
    RequestFailed(String),

    #[error("Upstream returned status {0}")]
    BadStatus(u16),

    #[error("Failed to parse upstream payload: {0}")]
    ParseError(String),

    #[error("Upstream payload contained no usable value")]
    Empty,
}

/// Errors that can occur when publishing to the downstream collector
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    #[error("Collector communication failed: {0}")]
    RequestFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Collector returned error {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Collector rejected payload: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for SinkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SinkError::Timeout
        } else {
            SinkError::RequestFailed(err.to_string())
        }
    }
}

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_error_messages() {
        let err = SinkError::BadStatus {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Collector returned error 500: boom");
        assert_eq!(SinkError::Timeout.to_string(), "Request timeout");
    }

    #[test]
    fn test_config_error_from_toml() {
        let parse: Result<toml::Value, _> = toml::from_str("[agent\nbroken");
        let err: ConfigError = parse.unwrap_err().into();
        assert!(matches!(err, ConfigError::TomlError(_)));
    }
}
