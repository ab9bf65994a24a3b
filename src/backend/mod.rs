//! Generative-text backends.
//!
//! A backend receives a rendered prompt together with the output schema and
//! answers with a JSON value it claims matches that schema. The flow executor
//! validates the answer independently; a backend never self-certifies.
//!
//! Every `generate` call is exactly one round trip. Retries, caching and
//! batching are not done here.

mod gemini;
mod mock;
mod models;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, schema::Schema};

pub use gemini::GeminiBackend;
pub use mock::MockBackend;

/// Supported backend providers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BackendType {
    #[default]
    Gemini,
    Mock,
}

/// A single structured-generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Name of the flow issuing the request.
    pub flow: String,
    /// Fully rendered prompt text.
    pub prompt: String,
    /// Shape the answer must have.
    pub output_schema: Schema,
}

impl GenerateRequest {
    pub fn new(
        flow: impl Into<String>,
        prompt: impl Into<String>,
        output_schema: Schema,
    ) -> Self {
        Self {
            flow: flow.into(),
            prompt: prompt.into(),
            output_schema,
        }
    }
}

#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Returns the backend's name, used in logs.
    fn name(&self) -> &str;

    /// Sends the prompt and returns the structured answer.
    ///
    /// # Errors
    ///
    /// - [`RoadhogError::BackendUnavailable`](crate::RoadhogError::BackendUnavailable) on network or service failure
    /// - [`RoadhogError::BackendRejected`](crate::RoadhogError::BackendRejected) when the service refuses the prompt
    /// - [`RoadhogError::BackendMalformedResponse`](crate::RoadhogError::BackendMalformedResponse) when the answer is not JSON
    async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<Value>;
}

/// Extracts a JSON value from model text, tolerating a surrounding code fence.
pub(crate) fn parse_json_text(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let inner = trimmed.strip_prefix("```json").or_else(|| trimmed.strip_prefix("```"))?.strip_suffix("```")?;
    serde_json::from_str(inner.trim()).ok()
}
