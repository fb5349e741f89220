use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Shown to the user when an upstream request fails.
pub const APOLOGY: &str = "We're sorry, your request didn't go through. Please send the message \
below to the support team and we'll try to fix things as soon as we can.";

/// Content of the error dialog: a fixed apology plus the failing payload
/// serialized for the support team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub message: String,
    pub debug: String,
}

impl ErrorReport {
    /// Report for an error response body or any other serializable payload.
    pub fn from_payload<T: Serialize + ?Sized>(payload: &T) -> Self {
        let debug = serde_json::to_string(payload)
            .unwrap_or_else(|err| format!("<unserializable payload: {err}>"));
        Self {
            message: APOLOGY.to_string(),
            debug,
        }
    }

    pub fn from_error(err: &dyn std::error::Error) -> Self {
        Self::from_payload(&err.to_string())
    }
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n\n{}", self.message, self.debug)
    }
}

#[cfg(test)]
mod tests {
    use super::{APOLOGY, ErrorReport};
    use serde_json::json;

    #[test]
    fn payload_is_serialized_verbatim() {
        let report = ErrorReport::from_payload(&json!({ "error": "form invalid", "code": 422 }));
        assert_eq!(report.message, APOLOGY);
        assert_eq!(report.debug, r#"{"code":422,"error":"form invalid"}"#);
    }

    #[test]
    fn errors_are_reported_as_json_strings() {
        let err = std::io::Error::other("connection reset");
        let report = ErrorReport::from_error(&err);
        assert_eq!(report.debug, "\"connection reset\"");
        assert!(report.to_string().starts_with("We're sorry"));
    }
}
