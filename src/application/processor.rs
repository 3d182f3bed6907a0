use crate::domain::order::Thread;
use crate::domain::ports::RemoteClientRef;
use crate::domain::remote::{RemoteResponse, Submission};
use crate::error::RemoteError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// What happened to the order half of an opened step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    Sent,
    Failed(String),
    Cancelled,
}

/// Result of running one account/order step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The account was opened and the order submitted.
    Submitted { order: OrderOutcome },
    /// The remote answered without an open status; the order was skipped.
    Rejected { status: Option<String> },
    /// The account submission failed; the order was skipped.
    Failed { error: RemoteError },
}

impl StepOutcome {
    /// True only when the order actually went out to the remote.
    pub fn is_submitted(&self) -> bool {
        matches!(
            self,
            StepOutcome::Submitted {
                order: OrderOutcome::Sent
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadReport {
    /// Position of the thread in the request.
    pub index: usize,
    pub steps: Vec<StepOutcome>,
    /// Set when the dispatch was cancelled before every step ran.
    pub cancelled: bool,
}

impl ThreadReport {
    /// Creates an empty report for the thread at `index`.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            steps: Vec::new(),
            cancelled: false,
        }
    }

    /// Orders that reached the remote. Cancelled or failed orders are not counted.
    pub fn orders_submitted(&self) -> usize {
        self.steps.iter().filter(|s| s.is_submitted()).count()
    }
}

/// Runs the steps of one thread strictly in order.
///
/// Every step submits its account payload. Only an open response leads to the
/// order payload being submitted; anything else, including a failed call,
/// skips the order and moves on to the next step.
#[derive(Clone)]
pub struct ThreadProcessor {
    client: RemoteClientRef,
}

impl ThreadProcessor {
    /// Creates a processor submitting through `client`.
    pub fn new(client: RemoteClientRef) -> Self {
        Self { client }
    }

    /// Processes every step of `thread` against `address`.
    ///
    /// # Arguments
    ///
    /// * `index` - Position of the thread in the request, echoed in the report.
    /// * `thread` - The steps to run, in order.
    /// * `address` - Target of every submission.
    /// * `cancel` - Token of the enclosing dispatch; once cancelled no further
    ///   submission is started and the one in flight is abandoned.
    pub async fn process(
        &self,
        index: usize,
        thread: Thread,
        address: &str,
        cancel: &CancellationToken,
    ) -> ThreadReport {
        let mut report = ThreadReport::new(index);

        for (position, step) in thread.into_iter().enumerate() {
            let account = Submission::put(address, step.account.to_body());
            let Some(result) = self.submit(account, cancel).await else {
                report.cancelled = true;
                break;
            };

            let outcome = match result {
                Ok(response) if response.is_open() => {
                    let order = Submission::put(address, step.order.to_body());
                    let order = match self.submit(order, cancel).await {
                        Some(Ok(_)) => OrderOutcome::Sent,
                        Some(Err(e)) => {
                            warn!(thread = index, step = position, error = %e, "order submission failed");
                            OrderOutcome::Failed(e.to_string())
                        }
                        None => {
                            report.cancelled = true;
                            OrderOutcome::Cancelled
                        }
                    };
                    StepOutcome::Submitted { order }
                }
                Ok(response) => {
                    debug!(thread = index, step = position, status = ?response.status(), "account not opened, skipping order");
                    StepOutcome::Rejected {
                        status: response.status().map(str::to_owned),
                    }
                }
                Err(error) => {
                    warn!(thread = index, step = position, %error, "account submission failed, skipping order");
                    StepOutcome::Failed { error }
                }
            };

            report.steps.push(outcome);
            if report.cancelled {
                break;
            }
        }

        report
    }

    /// Submits unless the dispatch is cancelled first. `None` means cancelled.
    async fn submit(
        &self,
        submission: Submission,
        cancel: &CancellationToken,
    ) -> Option<Result<RemoteResponse, RemoteError>> {
        if cancel.is_cancelled() {
            return None;
        }
        cancel.run_until_cancelled(self.client.submit(submission)).await
    }
}
