//! Gemini `generateContent` provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::{
    AnalysisProvider, ClientError, GeneratedText, ProviderConfig, ProviderError, StructuredPrompt,
};

const API_KEY_HEADER: &str = "x-goog-api-key";
const JSON_MIME_TYPE: &str = "application/json";
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Provider backed by the Gemini REST API.
pub struct GeminiProvider {
    http: reqwest::Client,
    generate_url: Url,
    model: String,
    api_key: String,
}

impl GeminiProvider {
    /// Creates a provider from explicit settings.
    ///
    /// # Errors
    /// Returns [`ClientError::MissingCredential`] for a blank API key,
    /// [`ClientError::InvalidEndpoint`] for a bad endpoint or model id, and
    /// [`ClientError::Http`] when the HTTP client cannot be built.
    pub fn new(config: ProviderConfig) -> Result<Self, ClientError> {
        if config.api_key.trim().is_empty() {
            return Err(ClientError::MissingCredential);
        }
        if config.model.trim().is_empty() || config.model.contains('/') {
            return Err(ClientError::InvalidEndpoint(format!(
                "invalid model id `{}`",
                config.model
            )));
        }

        let base = validate_provider_endpoint(&config.endpoint)?;
        let generate_url = Url::parse(&format!(
            "{}/models/{}:generateContent",
            base.as_str().trim_end_matches('/'),
            config.model
        ))
        .map_err(|error| ClientError::InvalidEndpoint(format!("invalid generate url: {error}")))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|error| ClientError::Http(error.to_string()))?;

        Ok(Self {
            http,
            generate_url,
            model: config.model,
            api_key: config.api_key,
        })
    }

    /// Fully resolved `generateContent` URL.
    pub fn generate_url(&self) -> &Url {
        &self.generate_url
    }
}

#[async_trait]
impl AnalysisProvider for GeminiProvider {
    async fn generate_structured(
        &self,
        prompt: &StructuredPrompt,
        response_schema: &Value,
    ) -> Result<GeneratedText, ProviderError> {
        let body = GenerateContentRequest::new(prompt, response_schema);
        debug!(url = %self.generate_url, "posting generateContent request");

        let response = self
            .http
            .post(self.generate_url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|error| ProviderError::Transport(error.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "provider rejected request");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS),
            });
        }

        let envelope: GenerateContentResponse = response
            .json()
            .await
            .map_err(|error| ProviderError::Decode(error.without_url().to_string()))?;

        extract_text(envelope).map(|text| GeneratedText { text })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Validates the provider base URL.
///
/// # Errors
/// Returns [`ClientError::InvalidEndpoint`] for unparsable or non-HTTPS URLs.
pub fn validate_provider_endpoint(endpoint: &str) -> Result<Url, ClientError> {
    let parsed = Url::parse(endpoint)
        .map_err(|error| ClientError::InvalidEndpoint(format!("invalid provider url: {error}")))?;

    if parsed.scheme() != "https" {
        return Err(ClientError::InvalidEndpoint(
            "provider endpoint must use https".to_string(),
        ));
    }

    Ok(parsed)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: Content<'a>,
    generation_config: GenerationConfig<'a>,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a StructuredPrompt, response_schema: &'a Value) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &prompt.user_prompt,
                }],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: &prompt.system_instruction,
                }],
            },
            generation_config: GenerationConfig {
                response_mime_type: JSON_MIME_TYPE,
                response_schema,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
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

/// Concatenates the text parts of the first candidate.
///
/// Only a reply with no text parts at all is empty; blank text is returned
/// as-is and rejected later by the report parser.
fn extract_text(response: GenerateContentResponse) -> Result<String, ProviderError> {
    let parts: Vec<String> = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if parts.is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    Ok(parts.concat())
}

fn truncate_chars(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &input[..cut]),
        None => input.to_string(),
    }
}
