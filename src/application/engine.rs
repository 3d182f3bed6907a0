use super::processor::{ThreadProcessor, ThreadReport};
use crate::domain::order::DispatchRequest;
use crate::domain::ports::RemoteClientRef;
use crate::domain::remote::{RemoteResponse, Submission};
use crate::error::RemoteError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, info, info_span, warn};

/// Lifecycle of a single dispatch. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    Idle,
    FanningOut,
    AwaitingBarrier,
    Notifying,
    Done,
}

/// Scope of one dispatch: its own cancellation token, derived from the
/// engine's shutdown token, and an optional deadline for the thread phase.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    token: CancellationToken,
    deadline: Option<Duration>,
}

impl DispatchContext {
    pub fn new(token: CancellationToken, deadline: Option<Duration>) -> Self {
        Self { token, deadline }
    }

    /// Cancels the threads of this dispatch. The notification is still sent.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// Summary of a finished dispatch. Only logged; never sent back to the caller.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// Reports of the threads that ran to completion, in request order.
    pub threads: Vec<ThreadReport>,
    /// Thread tasks that panicked. They still count towards the barrier.
    pub aborted: usize,
    pub notification: Result<RemoteResponse, RemoteError>,
    pub phase: DispatchPhase,
}

impl DispatchReport {
    pub fn orders_submitted(&self) -> usize {
        self.threads.iter().map(ThreadReport::orders_submitted).sum()
    }

    pub fn cancelled(&self) -> bool {
        self.threads.iter().any(|t| t.cancelled)
    }
}

/// Fans a request's threads out onto concurrent tasks, waits for all of them,
/// then sends the completion payload to the request's address exactly once.
///
/// Cloning is cheap; clones share the remote client, the shutdown token and
/// the tracker of in-flight dispatches.
#[derive(Clone)]
pub struct DispatchEngine {
    client: RemoteClientRef,
    processor: ThreadProcessor,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    /// Background dispatches not yet finished. Watched by `drain`.
    in_flight: Arc<watch::Sender<usize>>,
    deadline: Option<Duration>,
}

/// Decrements the in-flight count when a background dispatch ends, even by panic.
struct InFlightGuard(Arc<watch::Sender<usize>>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }
}

impl DispatchEngine {
    /// Creates an engine submitting every call through `client`.
    ///
    /// # Arguments
    ///
    /// * `client` - The remote service shared by all thread tasks and the
    ///   completion notification.
    pub fn new(client: RemoteClientRef) -> Self {
        Self {
            processor: ThreadProcessor::new(Arc::clone(&client)),
            client,
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
            in_flight: Arc::new(watch::Sender::new(0)),
            deadline: None,
        }
    }

    /// Bounds how long the threads of each dispatch may run. Threads still
    /// running at the deadline are cancelled; the notification is still sent.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// A fresh context scoped to one dispatch.
    pub fn context(&self) -> DispatchContext {
        DispatchContext::new(self.shutdown.child_token(), self.deadline)
    }

    /// Runs one dispatch to completion in a fresh context.
    pub async fn dispatch(&self, request: DispatchRequest) -> DispatchReport {
        let ctx = self.context();
        self.dispatch_with(request, ctx).await
    }

    /// Runs one dispatch under a caller-provided context.
    pub async fn dispatch_with(
        &self,
        request: DispatchRequest,
        ctx: DispatchContext,
    ) -> DispatchReport {
        let span = info_span!(
            "dispatch",
            address = %request.address,
            threads = request.threads.len()
        );
        self.run(request, ctx).instrument(span).await
    }

    /// Starts a dispatch in the background and returns immediately.
    pub fn spawn(&self, request: DispatchRequest) {
        let engine = self.clone();
        self.in_flight.send_modify(|n| *n += 1);
        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        self.tracker.spawn(async move {
            let _guard = guard;
            let report = engine.dispatch(request).await;
            log_report(&report);
        });
    }

    /// Waits until no background dispatch is running. Does not stop new ones
    /// from being spawned and leaves the shutdown path untouched.
    pub async fn drain(&self) {
        let mut in_flight = self.in_flight.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = in_flight.wait_for(|n| *n == 0).await;
    }

    /// Cancels in-flight dispatches and waits for their notifications to go out.
    pub async fn shutdown(&self) {
        info!(in_flight = self.tracker.len(), "shutting down dispatch engine");
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }

    async fn run(&self, request: DispatchRequest, ctx: DispatchContext) -> DispatchReport {
        let DispatchRequest {
            address,
            threads,
            response,
        } = request;
        let address: Arc<str> = Arc::from(address);
        let mut phase = DispatchPhase::Idle;

        advance(&mut phase, DispatchPhase::FanningOut);
        let mut tasks = JoinSet::new();
        for (index, thread) in threads.into_iter().enumerate() {
            let processor = self.processor.clone();
            let address = Arc::clone(&address);
            let token = ctx.token.clone();
            tasks.spawn(
                async move { processor.process(index, thread, &address, &token).await }
                    .instrument(info_span!("thread", index)),
            );
        }

        advance(&mut phase, DispatchPhase::AwaitingBarrier);
        let expiry = ctx.deadline.map(|d| Instant::now() + d);
        let deadline = async {
            match expiry {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        let mut reports = Vec::with_capacity(tasks.len());
        let mut aborted = 0;
        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    Some(Ok(report)) => reports.push(report),
                    Some(Err(e)) => {
                        warn!(error = %e, "thread task did not complete normally");
                        aborted += 1;
                    }
                    None => break,
                },
                _ = &mut deadline, if !ctx.token.is_cancelled() => {
                    warn!(remaining = tasks.len(), "dispatch deadline reached, cancelling threads");
                    ctx.token.cancel();
                }
            }
        }
        reports.sort_by_key(|r| r.index);

        advance(&mut phase, DispatchPhase::Notifying);
        let notification = self
            .client
            .submit(Submission::put(&*address, response.to_body()))
            .await;
        if let Err(e) = &notification {
            warn!(error = %e, "completion notification failed");
        }

        advance(&mut phase, DispatchPhase::Done);
        DispatchReport {
            threads: reports,
            aborted,
            notification,
            phase,
        }
    }
}

fn advance(phase: &mut DispatchPhase, next: DispatchPhase) {
    let from = *phase;
    debug!(?from, to = ?next, "dispatch phase");
    *phase = next;
}

fn log_report(report: &DispatchReport) {
    info!(
        threads = report.threads.len(),
        aborted = report.aborted,
        orders = report.orders_submitted(),
        cancelled = report.cancelled(),
        notified = report.notification.is_ok(),
        "all threads have ended"
    );
}
