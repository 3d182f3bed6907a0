use crate::error::RequestError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// An opaque JSON document forwarded verbatim to the remote service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(pub Value);

impl Payload {
    /// Wraps a JSON value to be forwarded untouched.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Renders the payload as the compact JSON body sent on the wire.
    pub fn to_body(&self) -> Vec<u8> {
        self.0.to_string().into_bytes()
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// One account/order pair. The order is only sent once the account is opened.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub account: Payload,
    #[serde(default)]
    pub order: Payload,
}

impl Step {
    /// Creates a step from its account and order payloads.
    pub fn new(account: impl Into<Payload>, order: impl Into<Payload>) -> Self {
        Self {
            account: account.into(),
            order: order.into(),
        }
    }
}

/// Ordered steps processed sequentially by a single task.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Thread(Vec<Step>);

impl Thread {
    pub fn new(steps: Vec<Step>) -> Self {
        Self(steps)
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Thread {
    type Item = Step;
    type IntoIter = std::vec::IntoIter<Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<Step> for Thread {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A complete multi-order request: the threads to run, where to send them,
/// and the payload announcing completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub address: String,
    #[serde(default)]
    pub threads: Vec<Thread>,
    #[serde(default)]
    pub response: Payload,
}

impl DispatchRequest {
    /// Creates a request without validating it; see [`DispatchRequest::validate`].
    ///
    /// # Arguments
    ///
    /// * `address` - Target of every account, order and completion submission.
    /// * `threads` - Threads to run concurrently.
    /// * `response` - Completion payload sent once every thread has ended.
    pub fn new(address: impl Into<String>, threads: Vec<Thread>, response: impl Into<Payload>) -> Self {
        Self {
            address: address.into(),
            threads,
            response: response.into(),
        }
    }

    /// Decodes and validates a request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, RequestError> {
        let request: Self = serde_json::from_slice(body)?;
        request.validate()?;
        Ok(request)
    }

    /// Checks that the address is a non-empty http(s) URL.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.address.trim().is_empty() {
            return Err(RequestError::EmptyAddress);
        }

        let url = Url::parse(&self.address).map_err(|e| RequestError::InvalidAddress {
            address: self.address.clone(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(RequestError::InvalidAddress {
                address: self.address.clone(),
                reason: format!("unsupported scheme {other:?}"),
            }),
        }
    }

    /// Total number of steps across all threads.
    pub fn step_count(&self) -> usize {
        self.threads.iter().map(Thread::len).sum()
    }
}
