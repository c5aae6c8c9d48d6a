//! Google Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, warn, Instrument};

use super::{GenerationClient, GenerationError, GenerationRequest};
use crate::config::GenerationConfig;
use crate::secrets::SecretSource;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Keeps provider error bodies from flooding the logs and error pages.
const MAX_ERROR_BODY_CHARS: usize = 300;

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: SecretString,
}

impl GeminiClient {
    pub fn new(config: &GenerationConfig, api_key: SecretString) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint(&config.api_base, &config.model),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Resolves the API key from `apiKeyFile` or `apiKeyEnvVar` and builds the client.
    pub fn from_config(config: &GenerationConfig) -> crate::error::Result<Self> {
        let api_key = SecretSource::env(&config.api_key_env_var)
            .with_file(config.api_key_file.as_deref())
            .resolve()?;
        Ok(Self::new(config, api_key)?)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn endpoint(api_base: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        api_base.trim_end_matches('/'),
        model
    )
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let span = info_span!("gemini_generate",
            model = %self.model,
            prompt_chars = request.prompt.len(),
            attachments = request.attachments.len(),
        );

        async {
            let body = GenerateContentRequest::from(&request);

            let response = self
                .client
                .post(&self.endpoint)
                .header(API_KEY_HEADER, self.api_key.expose_secret())
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let error = error_from_status(status, &body);
                warn!(status = status.as_u16(), "Generation request rejected");
                return Err(error);
            }

            let reply: GenerateContentResponse = response
                .json()
                .await
                .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

            let text = reply.into_text()?;
            debug!(chars = text.len(), "Generation complete");
            Ok(text)
        }
        .instrument(span)
        .await
    }
}

fn error_from_status(status: StatusCode, body: &str) -> GenerationError {
    let message = error_message(body);
    if status == StatusCode::TOO_MANY_REQUESTS {
        return GenerationError::RateLimited { message };
    }
    GenerationError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Prefers the structured `error.message` field, falling back to the raw body.
fn error_message(body: &str) -> String {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    if message.chars().count() > MAX_ERROR_BODY_CHARS {
        let truncated: String = message.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{}... (truncated)", truncated)
    } else {
        message
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

impl From<&GenerationRequest> for GenerateContentRequest {
    fn from(request: &GenerationRequest) -> Self {
        let mut parts = vec![Part::Text {
            text: request.prompt.clone(),
        }];
        parts.extend(request.attachments.iter().map(|a| Part::InlineData {
            inline_data: InlineData {
                mime_type: a.mime_type.clone(),
                data: BASE64.encode(&a.data),
            },
        }));

        Self {
            contents: vec![Content {
                role: "user",
                parts,
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    fn into_text(self) -> Result<String, GenerationError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map(|r| format!("prompt blocked ({})", r))
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(GenerationError::EmptyResponse(reason));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            let reason = candidate
                .finish_reason
                .map(|r| format!("finish reason {}", r))
                .unwrap_or_else(|| "candidate has no text".to_string());
            return Err(GenerationError::EmptyResponse(reason));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<String, GenerationError> {
        serde_json::from_str::<GenerateContentResponse>(json)
            .unwrap()
            .into_text()
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            endpoint("https://generativelanguage.googleapis.com/v1beta/", "gemini-2.0-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_text_request_body() {
        let body = GenerateContentRequest::from(&GenerationRequest::text("Summarize"));
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Summarize" }] }]
            })
        );
    }

    #[test]
    fn test_image_request_body() {
        let request = GenerationRequest::text("Describe").with_attachment("image/png", b"png".to_vec());
        let json = serde_json::to_value(GenerateContentRequest::from(&request)).unwrap();

        assert_eq!(
            json["contents"][0]["parts"][1],
            serde_json::json!({ "inline_data": { "mime_type": "image/png", "data": "cG5n" } })
        );
    }

    #[test]
    fn test_reply_joins_text_parts_of_first_candidate() {
        let text = parse(
            r##"{
                "candidates": [
                    { "content": { "role": "model", "parts": [{ "text": "# Summary\n" }, { "text": "Hello." }] }, "finishReason": "STOP" },
                    { "content": { "parts": [{ "text": "ignored" }] } }
                ]
            }"##,
        )
        .unwrap();

        assert_eq!(text, "# Summary\nHello.");
    }

    #[test]
    fn test_blocked_prompt_is_empty_response() {
        let err = parse(r#"{ "promptFeedback": { "blockReason": "SAFETY" } }"#).unwrap_err();
        match err {
            GenerationError::EmptyResponse(reason) => assert!(reason.contains("SAFETY")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_candidate_without_text_is_empty_response() {
        let err = parse(r#"{ "candidates": [{ "finishReason": "MAX_TOKENS" }] }"#).unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse(_)));
    }

    #[test]
    fn test_status_mapping() {
        let body = r#"{ "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" } }"#;
        match error_from_status(StatusCode::TOO_MANY_REQUESTS, body) {
            GenerationError::RateLimited { message } => {
                assert_eq!(message, "Resource has been exhausted")
            }
            other => panic!("unexpected error: {other}"),
        }

        match error_from_status(StatusCode::BAD_REQUEST, "plain failure\n") {
            GenerationError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "plain failure");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_long_error_bodies_are_truncated() {
        let body = "é".repeat(1000);
        let message = error_message(&body);
        assert!(message.ends_with("... (truncated)"));
        assert_eq!(message.chars().count(), MAX_ERROR_BODY_CHARS + "... (truncated)".len());
    }

    #[test]
    fn test_client_construction() {
        let client =
            GeminiClient::new(&GenerationConfig::default(), SecretString::from("test-key")).unwrap();
        assert_eq!(client.model(), "gemini-2.0-flash");
    }
}
