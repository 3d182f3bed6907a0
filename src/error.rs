use thiserror::Error;

/// Crate-level error raised while wiring up the service.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Rejection of an inbound dispatch request at the decode boundary.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("malformed body: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("address must not be empty")]
    EmptyAddress,
    #[error("address {address:?} is not an http(s) URL: {reason}")]
    InvalidAddress { address: String, reason: String },
}

/// Failure of a single outbound submission.
///
/// Kept distinct from a legitimate non-approval response so callers can tell
/// a dead remote apart from a declined account.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("response is not a JSON object: {0}")]
    Decode(String),
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
