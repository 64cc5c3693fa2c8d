use thiserror::Error;

/// Errors raised by the Stagehand client, configuration and CLI plumbing.
#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Missing API key: {0}")]
    MissingApiKey(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
}

pub type Result<T> = std::result::Result<T, ScoutError>;

impl ScoutError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }
}

impl From<reqwest::Error> for ScoutError {
    fn from(err: reqwest::Error) -> Self {
        ScoutError::Transport(err.to_string())
    }
}

impl From<eventsource_client::Error> for ScoutError {
    fn from(err: eventsource_client::Error) -> Self {
        ScoutError::Transport(err.to_string())
    }
}

/// Why a candidate payload was rejected by one resolver strategy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFault {
    /// A record is missing a field or carries a non-string value.
    #[error("{path}: {message}")]
    Schema { path: String, message: String },

    /// The payload is not shaped like the strategy expects at all.
    #[error("expected {expected}, got {found}")]
    Structure {
        expected: &'static str,
        found: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_fault_names_the_offending_path() {
        let fault = ValidationFault::Schema {
            path: "items[1]".to_string(),
            message: "missing field `price`".to_string(),
        };
        assert_eq!(fault.to_string(), "items[1]: missing field `price`");
    }

    #[test]
    fn test_structure_fault_describes_both_shapes() {
        let fault = ValidationFault::Structure {
            expected: "an object with an `items` array",
            found: "a string",
        };
        assert_eq!(
            fault.to_string(),
            "expected an object with an `items` array, got a string"
        );
    }

    #[test]
    fn test_json_errors_convert_into_scout_errors() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let scout: ScoutError = err.into();
        assert!(matches!(scout, ScoutError::Json(_)));
        assert!(scout.to_string().starts_with("JSON error:"));
    }
}
