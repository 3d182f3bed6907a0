use crate::domain::ports::RemoteClient;
use crate::domain::remote::{RemoteResponse, Submission};
use crate::error::RemoteError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

type Responder = dyn Fn(&Submission) -> Result<RemoteResponse, RemoteError> + Send + Sync;
type Latency = dyn Fn(&Submission) -> Duration + Send + Sync;

/// A remote service that lives in memory.
///
/// Submissions are answered by a scripted responder, optionally after a
/// per-submission delay. Recording remotes keep every submission in arrival
/// order for tests to inspect; `logging` remotes only log them, so they can
/// back a long-running `--dry-run` server.
#[derive(Clone)]
pub struct InMemoryRemote {
    calls: Option<Arc<Mutex<Vec<Submission>>>>,
    responder: Arc<Responder>,
    latency: Option<Arc<Latency>>,
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::always(RemoteResponse::default())
    }
}

impl InMemoryRemote {
    /// Creates a remote that answers every call with an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recording remote that answers every call with `response`.
    pub fn always(response: RemoteResponse) -> Self {
        Self::with_responder(move |_| Ok(response.clone()))
    }

    /// Creates a remote that answers every call with `response` and keeps
    /// nothing but the log line.
    pub fn logging(response: RemoteResponse) -> Self {
        Self {
            calls: None,
            ..Self::always(response)
        }
    }

    /// Creates a recording remote whose answers come from `responder`.
    ///
    /// # Arguments
    ///
    /// * `responder` - Called with each submission after it is recorded;
    ///   its result is returned to the caller as is.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&Submission) -> Result<RemoteResponse, RemoteError> + Send + Sync + 'static,
    {
        Self {
            calls: Some(Arc::new(Mutex::new(Vec::new()))),
            responder: Arc::new(responder),
            latency: None,
        }
    }

    /// Delays each answer by the duration `latency` picks for the submission.
    pub fn with_latency<F>(mut self, latency: F) -> Self
    where
        F: Fn(&Submission) -> Duration + Send + Sync + 'static,
    {
        self.latency = Some(Arc::new(latency));
        self
    }

    /// Submissions received so far, in arrival order. Always empty for a
    /// `logging` remote.
    pub async fn calls(&self) -> Vec<Submission> {
        match &self.calls {
            Some(calls) => calls.lock().await.clone(),
            None => Vec::new(),
        }
    }
}

#[async_trait]
impl RemoteClient for InMemoryRemote {
    async fn submit(&self, submission: Submission) -> Result<RemoteResponse, RemoteError> {
        info!(
            method = %submission.method,
            address = %submission.address,
            body = %String::from_utf8_lossy(&submission.body),
            "in-memory submission"
        );
        if let Some(calls) = &self.calls {
            calls.lock().await.push(submission.clone());
        }

        if let Some(latency) = &self.latency {
            let delay = latency(&submission);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        (self.responder)(&submission)
    }
}
