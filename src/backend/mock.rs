use std::{
    collections::{HashMap, VecDeque},
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    Result, RoadhogError,
    backend::{GenerateRequest, GenerativeBackend},
};

/// Scripted backend that records every request it receives.
///
/// Responses queued for a specific flow are served first, then the shared
/// script in order; once both run out the fallback response (if any) is
/// repeated, otherwise the call fails as unavailable.
#[derive(Default)]
pub struct MockBackend {
    per_flow: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
    script: Mutex<VecDeque<Result<Value>>>,
    fallback: Option<Value>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful answer.
    pub fn respond(
        self,
        value: Value,
    ) -> Self {
        lock(&self.script).push_back(Ok(value));
        self
    }

    /// Queues a failure.
    pub fn fail(
        self,
        error: RoadhogError,
    ) -> Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    /// Queues an answer for requests issued by `flow` only.
    ///
    /// Lets concurrent invocations of different flows get their own answers
    /// regardless of arrival order.
    pub fn respond_to(
        self,
        flow: &str,
        value: Value,
    ) -> Self {
        lock(&self.per_flow).entry(flow.to_string()).or_default().push_back(Ok(value));
        self
    }

    /// Answer repeated after the script is exhausted.
    pub fn always(
        mut self,
        value: Value,
    ) -> Self {
        self.fallback = Some(value);
        self
    }

    /// Number of `generate` calls received.
    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Snapshot of every request received, in order.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        lock(&self.requests).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl GenerativeBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<Value> {
        lock(&self.requests).push(request.clone());

        if let Some(next) = lock(&self.per_flow).get_mut(&request.flow).and_then(VecDeque::pop_front) {
            return next;
        }
        if let Some(next) = lock(&self.script).pop_front() {
            return next;
        }
        self.fallback.clone().ok_or_else(|| RoadhogError::BackendUnavailable("mock backend has no scripted response".to_string()))
    }
}
