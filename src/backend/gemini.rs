use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    Result, RoadhogError,
    backend::{
        GenerateRequest, GenerativeBackend,
        models::{Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part},
        parse_json_text,
    },
    config::BackendConfig,
};

const API_KEY_HEADER: &str = "x-goog-api-key";
const JSON_MIME_TYPE: &str = "application/json";
/// Finish reasons meaning the service refused to answer.
const REFUSAL_REASONS: [&str; 5] = ["SAFETY", "RECITATION", "BLOCKLIST", "PROHIBITED_CONTENT", "SPII"];

/// Backend for Google's Generative Language API.
///
/// Requests JSON output shaped by the flow's output schema through
/// `generationConfig.responseJsonSchema`.
pub struct GeminiBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl GeminiBackend {
    pub fn new(
        api_key: &str,
        endpoint: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_MIME_TYPE));
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            api_key.parse().map_err(|err: InvalidHeaderValue| RoadhogError::Config(format!("invalid api key: {}", err)))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| RoadhogError::Config(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    /// Builds the backend from config, reading the API key from the environment.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let api_key = config.api_key()?;
        Self::new(&api_key, &config.endpoint, &config.model, Duration::from_millis(config.timeout_ms))
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn build_body(request: &GenerateRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.prompt.clone()),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: JSON_MIME_TYPE.to_string(),
                response_json_schema: request.output_schema.to_json_schema(),
            },
        }
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<Value> {
        debug!(flow = %request.flow, model = %self.model, prompt_len = request.prompt.len(), "sending generateContent request");

        let res = self
            .client
            .post(self.url())
            .json(&Self::build_body(request))
            .send()
            .await?;

        let status = res.status().as_u16();
        let body = res.text().await?;

        let result = parse_response(status, &body);
        if let Err(err) = &result {
            warn!(flow = %request.flow, status, error = %err, "generateContent failed");
        }
        result
    }
}

/// Maps an HTTP status and body from `generateContent` to a structured answer.
fn parse_response(
    status: u16,
    body: &str,
) -> Result<Value> {
    if status >= 400 {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|e| format!("{} {}: {}", status, e.error.status, e.error.message))
            .unwrap_or_else(|_| format!("{}: {}", status, body));
        return if status == 429 || status >= 500 {
            Err(RoadhogError::BackendUnavailable(message))
        } else if status == 401 || status == 403 {
            // bad or missing key
            Err(RoadhogError::Config(message))
        } else {
            Err(RoadhogError::BackendRejected(message))
        };
    }

    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|err| RoadhogError::BackendMalformedResponse(format!("invalid response body: {}", err)))?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(RoadhogError::BackendRejected(format!("prompt blocked: {}", reason)));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| RoadhogError::BackendMalformedResponse("response has no candidates".to_string()))?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if REFUSAL_REASONS.contains(&reason) {
            return Err(RoadhogError::BackendRejected(format!("generation stopped: {}", reason)));
        }
    }

    let text: String = candidate.content.unwrap_or_default().parts.into_iter().filter_map(|p| p.text).collect();
    if text.trim().is_empty() {
        return Err(RoadhogError::BackendMalformedResponse("candidate has no text".to_string()));
    }

    parse_json_text(&text).ok_or_else(|| RoadhogError::BackendMalformedResponse(format!("candidate text is not JSON: {}", excerpt(&text))))
}

fn excerpt(text: &str) -> String {
    const MAX: usize = 120;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
