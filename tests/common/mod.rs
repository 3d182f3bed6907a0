#![allow(dead_code)]

use multiorder::domain::order::{DispatchRequest, Step, Thread};
use multiorder::domain::remote::Submission;
use serde_json::{Value, json};

pub const ADDRESS: &str = "http://svc/x";

/// A step whose payloads identify the thread and position they belong to.
pub fn tagged_step(thread: usize, step: usize) -> Step {
    Step::new(
        json!({"kind": "account", "thread": thread, "step": step}),
        json!({"kind": "order", "thread": thread, "step": step}),
    )
}

/// `threads` threads of `steps` tagged steps each, completing with `{"done": true}`.
pub fn tagged_request(threads: usize, steps: usize) -> DispatchRequest {
    let threads = (0..threads)
        .map(|t| (0..steps).map(|s| tagged_step(t, s)).collect::<Thread>())
        .collect();
    DispatchRequest::new(ADDRESS, threads, json!({"done": true}))
}

pub fn bodies(calls: &[Submission]) -> Vec<Value> {
    calls.iter().filter_map(Submission::json).collect()
}

pub fn kind_of(body: &Value) -> Option<&str> {
    body.get("kind").and_then(Value::as_str)
}

pub fn is_account(submission: &Submission) -> bool {
    submission
        .json()
        .is_some_and(|body| kind_of(&body) == Some("account"))
}

pub fn is_notification(body: &Value) -> bool {
    *body == json!({"done": true})
}
