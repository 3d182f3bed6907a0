use super::remote::{RemoteResponse, Submission};
use crate::error::RemoteError;
use async_trait::async_trait;
use std::sync::Arc;

/// The remote service receiving account, order, and completion submissions.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Sends one submission and decodes the JSON object it answers with.
    async fn submit(&self, submission: Submission) -> Result<RemoteResponse, RemoteError>;
}

pub type RemoteClientRef = Arc<dyn RemoteClient>;
