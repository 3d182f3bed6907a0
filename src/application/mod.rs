//! Application layer containing the dispatch orchestration.
//!
//! `DispatchEngine` fans each request's threads out onto tokio tasks and joins
//! them behind a barrier before notifying the remote service. Each task runs a
//! `ThreadProcessor` over its steps sequentially.

pub mod engine;
pub mod processor;
