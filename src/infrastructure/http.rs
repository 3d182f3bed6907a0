use crate::domain::ports::RemoteClient;
use crate::domain::remote::{RemoteResponse, Submission, SubmitMethod};
use crate::error::{RemoteError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use std::time::Duration;
use tracing::debug;

/// `RemoteClient` over HTTP. No retries; the body of every answer is decoded
/// regardless of its status code.
#[derive(Clone)]
pub struct HttpRemoteClient {
    client: reqwest::Client,
}

impl HttpRemoteClient {
    /// Builds a client, bounding each call by `timeout` when one is given.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn submit(&self, submission: Submission) -> Result<RemoteResponse, RemoteError> {
        let method = match submission.method {
            SubmitMethod::Put => Method::PUT,
        };

        let response = self
            .client
            .request(method, submission.address.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(submission.body)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        debug!(
            address = %submission.address,
            %status,
            body = %String::from_utf8_lossy(&body),
            "remote answered"
        );

        RemoteResponse::from_slice(&body)
    }
}
