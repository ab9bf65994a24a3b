use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    Result, RoadhogError,
    backend::{GenerateRequest, GenerativeBackend},
    flow::{FlowDefinition, InvokePolicy},
    schema::Schema,
};

#[async_trait]
pub trait FlowHandler: Send + Sync {
    /// Produces the flow's output from already validated input.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The [`FlowContext`] of this invocation.
    /// * `input` - The validated input, `Value::Null` when the flow takes none.
    ///
    /// # Returns
    ///
    /// The unvalidated output; the executor checks it against the output schema.
    async fn handle(
        &self,
        ctx: &FlowContext<'_>,
        input: &Value,
    ) -> Result<Value>;
}

/// Per-invocation handle given to a [`FlowHandler`].
///
/// Lives for one call only. It records the last prompt sent and the last raw
/// answer received so the executor can put them on the invocation record.
pub struct FlowContext<'a> {
    flow: &'a FlowDefinition,
    backend: &'a dyn GenerativeBackend,
    policy: &'a InvokePolicy,
    prompt: Mutex<Option<String>>,
    raw_response: Mutex<Option<Value>>,
}

impl<'a> FlowContext<'a> {
    pub(crate) fn new(
        flow: &'a FlowDefinition,
        backend: &'a dyn GenerativeBackend,
        policy: &'a InvokePolicy,
    ) -> Self {
        Self {
            flow,
            backend,
            policy,
            prompt: Mutex::new(None),
            raw_response: Mutex::new(None),
        }
    }

    pub fn flow_name(&self) -> &str {
        &self.flow.name
    }

    pub fn output_schema(&self) -> &Schema {
        &self.flow.output_schema
    }

    /// Renders the flow's template against `input`.
    pub fn render(
        &self,
        input: &Value,
    ) -> Result<String> {
        let template = self.flow.template.as_ref().ok_or_else(|| RoadhogError::Programmer(format!("flow '{}' has no template", self.flow.name)))?;
        Ok(template.render(input))
    }

    /// Sends `prompt` to the backend with the flow's output schema.
    ///
    /// Unavailable-backend failures are retried only as far as the
    /// executor's [`InvokePolicy`] allows.
    pub async fn generate(
        &self,
        prompt: String,
    ) -> Result<Value> {
        let request = GenerateRequest::new(self.flow.name.clone(), prompt, self.flow.output_schema.clone());
        *lock(&self.prompt) = Some(request.prompt.clone());

        let mut attempt = 0;
        loop {
            match self.backend.generate(&request).await {
                Ok(value) => {
                    *lock(&self.raw_response) = Some(value.clone());
                    return Ok(value);
                }
                Err(err) if err.is_retryable() && attempt < self.policy.backend_retries => {
                    let delay = self.policy.backoff(attempt);
                    warn!(flow = %self.flow.name, backend = self.backend.name(), attempt, error = %err, "backend unavailable, retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub(crate) fn take_prompt(&self) -> Option<String> {
        lock(&self.prompt).take()
    }

    pub(crate) fn take_raw_response(&self) -> Option<Value> {
        lock(&self.raw_response).take()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Renders the flow's template and sends it to the backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptHandler;

#[async_trait]
impl FlowHandler for PromptHandler {
    async fn handle(
        &self,
        ctx: &FlowContext<'_>,
        input: &Value,
    ) -> Result<Value> {
        let prompt = ctx.render(input)?;
        debug!(flow = ctx.flow_name(), prompt_len = prompt.len(), "rendered prompt");
        ctx.generate(prompt).await
    }
}

type InstructionFn = dyn Fn(&Value) -> String + Send + Sync;

/// Sends an ad-hoc instruction instead of the flow's template.
pub struct InstructionHandler {
    build: Box<InstructionFn>,
}

impl InstructionHandler {
    /// Always sends the same instruction.
    pub fn fixed(instruction: &str) -> Self {
        let instruction = instruction.to_string();
        Self {
            build: Box::new(move |_: &Value| instruction.clone()),
        }
    }

    /// Builds the instruction from the validated input.
    pub fn from_fn<F>(build: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        Self {
            build: Box::new(build),
        }
    }
}

#[async_trait]
impl FlowHandler for InstructionHandler {
    async fn handle(
        &self,
        ctx: &FlowContext<'_>,
        input: &Value,
    ) -> Result<Value> {
        ctx.generate((self.build)(input)).await
    }
}
