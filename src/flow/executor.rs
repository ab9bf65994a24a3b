use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::{
    Result, RoadhogError,
    backend::GenerativeBackend,
    flow::{FlowContext, FlowRegistry},
    schema::validate,
    utils,
};

/// Caller-configurable reliability policy.
///
/// The default performs no retries at all.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct InvokePolicy {
    /// extra attempts after an unavailable-backend failure
    pub backend_retries: u32,
    /// extra handler runs after an output contract violation
    pub output_retries: u32,
    /// base delay between backend retries in milliseconds, doubled per attempt
    pub backoff_ms: u64,
}

impl Default for InvokePolicy {
    fn default() -> Self {
        Self {
            backend_retries: 0,
            output_retries: 0,
            backoff_ms: 500,
        }
    }
}

impl InvokePolicy {
    /// Delay before retry number `attempt + 1`.
    pub fn backoff(
        &self,
        attempt: u32,
    ) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}

/// Everything known about one invocation.
///
/// Created per call and handed back to the caller; the executor keeps nothing.
#[derive(Debug, Clone)]
pub struct InvocationRecord {
    /// invocation id
    pub id: String,
    /// flow name
    pub flow: String,
    /// caller input as received
    pub input: Option<Value>,
    /// last prompt sent to the backend
    pub prompt: Option<String>,
    /// last raw answer from the backend
    pub raw_response: Option<Value>,
    /// start time in milliseconds
    pub started_at: i64,
    /// wall time spent in the pipeline
    pub elapsed: Duration,
    /// validated output or the error that stopped the pipeline
    pub result: Result<Value>,
}

/// Runs flows from a [`FlowRegistry`] against a backend.
///
/// The executor only holds immutable shared state, so one instance can serve
/// any number of concurrent invocations.
#[derive(Clone)]
pub struct FlowExecutor {
    registry: Arc<FlowRegistry>,
    backend: Arc<dyn GenerativeBackend>,
    policy: InvokePolicy,
}

impl FlowExecutor {
    pub fn new(
        registry: Arc<FlowRegistry>,
        backend: Arc<dyn GenerativeBackend>,
    ) -> Self {
        Self {
            registry,
            backend,
            policy: InvokePolicy::default(),
        }
    }

    pub fn with_policy(
        mut self,
        policy: InvokePolicy,
    ) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &FlowRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &InvokePolicy {
        &self.policy
    }

    /// Invokes the flow named `name` and returns its validated output.
    pub async fn invoke(
        &self,
        name: &str,
        input: Option<Value>,
    ) -> Result<Value> {
        self.invoke_recorded(name, input).await.result
    }

    /// Invokes several flows concurrently. Results come back in request order
    /// and are independent of each other.
    pub async fn invoke_all(
        &self,
        requests: Vec<(String, Option<Value>)>,
    ) -> Vec<Result<Value>> {
        join_all(requests.into_iter().map(|(name, input)| async move { self.invoke(&name, input).await })).await
    }

    /// Invokes a flow and returns the full invocation record.
    pub async fn invoke_recorded(
        &self,
        name: &str,
        input: Option<Value>,
    ) -> InvocationRecord {
        let mut record = InvocationRecord {
            id: utils::shortid(),
            flow: name.to_string(),
            input: input.clone(),
            prompt: None,
            raw_response: None,
            started_at: utils::time::time_millis(),
            elapsed: Duration::ZERO,
            result: Ok(Value::Null),
        };

        let span = info_span!("invoke", flow = name, id = %record.id);
        let start = Instant::now();
        let result = self.run(name, input, &mut record).instrument(span.clone()).await;
        record.elapsed = start.elapsed();

        let _enter = span.enter();
        match &result {
            Ok(_) => info!(elapsed_ms = record.elapsed.as_millis() as u64, "flow completed"),
            Err(err) => warn!(elapsed_ms = record.elapsed.as_millis() as u64, error = %err, "flow failed"),
        }
        record.result = result;
        record
    }

    async fn run(
        &self,
        name: &str,
        input: Option<Value>,
        record: &mut InvocationRecord,
    ) -> Result<Value> {
        let flow = self.registry.get(name).ok_or_else(|| RoadhogError::FlowNotFound(name.to_string()))?;

        let input = input.unwrap_or(Value::Null);
        let input = match &flow.input_schema {
            Some(schema) => validate(schema, &input).map_err(|violations| RoadhogError::InputValidation {
                flow: flow.name.clone(),
                violations,
            })?,
            None => input,
        };
        debug!("input validated");

        let mut attempt = 0;
        loop {
            let ctx = FlowContext::new(&flow, self.backend.as_ref(), &self.policy);
            let output = flow.handler.handle(&ctx, &input).await;
            record.prompt = ctx.take_prompt().or(record.prompt.take());
            record.raw_response = ctx.take_raw_response().or(record.raw_response.take());
            let output = output?;

            match validate(&flow.output_schema, &output) {
                Ok(validated) => return Ok(validated),
                Err(violations) if attempt < self.policy.output_retries => {
                    warn!(attempt, violations = violations.len(), "output contract violated, asking again");
                    attempt += 1;
                }
                Err(violations) => {
                    return Err(RoadhogError::OutputContract {
                        flow: flow.name.clone(),
                        violations,
                    });
                }
            }
        }
    }
}
