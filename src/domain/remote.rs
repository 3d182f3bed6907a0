use crate::error::RemoteError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Status value signalling that the paired order should be submitted.
pub const OPEN_STATUS: &str = "O";

/// HTTP method of a submission. Every call the engine makes is a PUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMethod {
    Put,
}

impl SubmitMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitMethod::Put => "PUT",
        }
    }
}

impl fmt::Display for SubmitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single outbound call to the remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub method: SubmitMethod,
    pub address: String,
    pub body: Vec<u8>,
}

impl Submission {
    /// Creates a PUT of `body` to `address`.
    pub fn put(address: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: SubmitMethod::Put,
            address: address.into(),
            body,
        }
    }

    /// The body decoded as JSON, if it is JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// String fields of the JSON object returned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteResponse(BTreeMap<String, String>);

impl RemoteResponse {
    /// Decodes a response body. Only string-valued fields are kept; anything
    /// other than a JSON object is a decode error.
    pub fn from_slice(body: &[u8]) -> Result<Self, RemoteError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| RemoteError::Decode(e.to_string()))?;

        match value {
            Value::Object(fields) => Ok(fields
                .into_iter()
                .filter_map(|(key, value)| match value {
                    Value::String(s) => Some((key, s)),
                    _ => None,
                })
                .collect()),
            other => Err(RemoteError::Decode(format!("expected object, got {other}"))),
        }
    }

    /// Creates a response carrying only a `status` field.
    pub fn with_status(status: impl Into<String>) -> Self {
        Self(BTreeMap::from([("status".to_string(), status.into())]))
    }

    /// A response that approves the account step.
    pub fn open() -> Self {
        Self::with_status(OPEN_STATUS)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn status(&self) -> Option<&str> {
        self.get("status")
    }

    pub fn is_open(&self) -> bool {
        self.status() == Some(OPEN_STATUS)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for RemoteResponse {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
