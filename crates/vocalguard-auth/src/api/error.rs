use thiserror::Error;

/// Message used when an operation needs a token and none is stored.
pub const NOT_AUTHENTICATED: &str = "Not authenticated";

/// Everything that can go wrong talking to the auth API or persisting the result.
///
/// The `Display` text is what callers eventually see in a failed
/// [`AuthOutcome`](crate::auth::AuthOutcome), so server messages are shown verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    Network(String),

    #[error("{message}")]
    Server { status: u16, message: String },

    /// Body was not the JSON we expected, whatever the status.
    #[error("{0}")]
    Parse(String),

    #[error("Not authenticated")]
    AuthRequired,

    #[error("{0}")]
    Storage(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}

impl ApiError {
    /// Build a server error from a non-2xx status, preferring the body's own
    /// `error` field over the operation's default message.
    pub fn from_status(status: u16, body_error: Option<String>, default_message: &str) -> Self {
        ApiError::Server {
            status,
            message: body_error.unwrap_or_else(|| default_message.to_string()),
        }
    }

    /// Only a readable 401 counts; an unparseable body is a `Parse` error
    /// even when the status was 401.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Server { status: 401, .. })
    }

    pub fn storage(err: anyhow::Error) -> Self {
        ApiError::Storage(format!("{:#}", err))
    }
}
