use std::fmt;
use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, WikiError>;

#[derive(Error, Debug)]
pub enum WikiError {
    #[error("invalid url passed to the client ({url}): {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid user agent: {0:?}")]
    InvalidUserAgent(String),
    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("unexpected API response format: {0}")]
    Protocol(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("credentials error: {0}")]
    Credentials(#[source] serde_json::Error),
    #[error("wiki family {0} not found in credentials")]
    UnknownFamily(String),
}

impl WikiError {
    /// The API error carried by this error, if the API rejected the call
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            WikiError::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Whether the reply was valid JSON in an unexpected shape
    pub fn is_protocol(&self) -> bool {
        matches!(self, WikiError::Protocol(_))
    }

    /// Whether the call failed on the wire or while decoding the body
    pub fn is_transport(&self) -> bool {
        matches!(self, WikiError::Transport(_))
    }
}

/// Failures while talking to the endpoint or reading its reply
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("error occurred during HTTP request: {0}")]
    Request(#[source] reqwest::Error),
    #[error("error reading response body: {0}")]
    Body(#[source] reqwest::Error),
    #[error("error parsing JSON response: {0}")]
    Json(#[source] serde_json::Error),
}

/// A call the API understood and refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Machine readable code, e.g. `WrongPass` or `badtoken`
    pub code: String,
    /// Human readable explanation, when the API supplied one
    pub info: Option<String>,
}

impl ApiError {
    /// Create an API error
    ///
    /// # Arguments
    /// * `code` - machine readable code reported by the API
    /// * `info` - optional explanation; an empty string counts as none
    pub fn new(code: impl Into<String>, info: Option<String>) -> Self {
        Self {
            code: code.into(),
            info: info.filter(|info| !info.is_empty()),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.info {
            Some(info) => write!(f, "API Error - Code: {}, Reason: {}", self.code, info),
            None => write!(f, "API Error - Code: {}", self.code),
        }
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_with_reason() {
        let err = ApiError::new("WrongPass", Some("Incorrect password entered.".into()));
        assert_eq!(
            err.to_string(),
            "API Error - Code: WrongPass, Reason: Incorrect password entered."
        );
    }

    #[test]
    fn api_error_display_without_reason() {
        assert_eq!(
            ApiError::new("Aborted", None).to_string(),
            "API Error - Code: Aborted"
        );
        // empty reasons are treated as missing
        assert_eq!(ApiError::new("Aborted", Some(String::new())).info, None);
    }

    #[test]
    fn wiki_error_wraps_api_error() {
        let err: WikiError = ApiError::new("Throttled", None).into();
        assert_eq!(err.as_api_error().map(|e| e.code.as_str()), Some("Throttled"));
        assert!(!err.is_protocol());
        assert_eq!(err.to_string(), "API Error - Code: Throttled");
    }
}
