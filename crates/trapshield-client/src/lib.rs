#![warn(missing_docs)]
//! # trapshield-client
//!
//! ## Purpose
//! Issues one analysis request to the generative-AI provider and returns a
//! validated phishing-risk report or a typed failure.
//!
//! ## Responsibilities
//! - Reject blank content before any network traffic.
//! - Build the provider prompt for URL and text analysis.
//! - Call the provider through the injectable [`AnalysisProvider`] seam.
//! - Decode and validate provider output with `trapshield-report`.
//!
//! ## Data flow
//! `(kind, content)` -> [`AnalysisRequest`] -> [`StructuredPrompt`] ->
//! [`AnalysisProvider::generate_structured`] -> JSON text ->
//! [`trapshield_report::parse_report`] -> [`AnalysisReport`].
//!
//! ## Ownership and lifetimes
//! Requests own their content and are consumed by the call that sends them.
//! The client holds no per-scan state, so it can be cloned and shared freely.
//!
//! ## Error model
//! [`AnalysisError`] separates empty input, provider failure, non-JSON output
//! and contract violations for logging. Consumers show
//! [`AnalysisError::user_message`] only.
//!
//! ## Security and privacy notes
//! The provider credential is an explicit constructor input
//! ([`ProviderConfig`]) and is redacted from `Debug` output. Analysed content is
//! never logged.

mod gemini;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};
use trapshield_report::{ReportError, SchemaError, parse_report, response_schema};

pub use gemini::{GeminiProvider, validate_provider_endpoint};
pub use trapshield_report::AnalysisReport;

/// Default provider model id.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default provider API base URL.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Delimiter line framing the analysed content inside the prompt.
pub const CONTENT_DELIMITER: &str = "---";

/// Message shown to users for every provider-side failure.
pub const PROVIDER_FAILURE_MESSAGE: &str =
    "Failed to get analysis from AI. Please check the logs for details.";

const SYSTEM_INSTRUCTION: &str = "\
You are TrapShield, an advanced AI-powered phishing detection framework. Your task is to analyze the provided content and return a detailed security analysis in the specified JSON format.
Your analysis should be comprehensive, covering textual, structural, and reputational aspects.
- If the type is URL, analyze the URL structure and infer potential textual content that might be on the page.
- If the type is TEXT, analyze the language, links, and overall message.
- Fabricate realistic but simulated details for domain age and SSL certificates as if you were looking them up.
- Return your findings strictly in the provided JSON schema. Do not add any markdown formatting or prose.";

/// How the provider should interpret the analysed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnalysisKind {
    /// Content is a URL.
    #[default]
    Url,
    /// Content is free text such as an email body.
    Text,
}

impl AnalysisKind {
    /// Returns the label used in prompts.
    pub fn label(self) -> &'static str {
        match self {
            AnalysisKind::Url => "URL",
            AnalysisKind::Text => "TEXT",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One analysis request. Content is guaranteed non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    kind: AnalysisKind,
    content: String,
}

impl AnalysisRequest {
    /// Builds a request.
    ///
    /// # Errors
    /// Returns [`AnalysisError::EmptyInput`] when `content` is blank.
    pub fn new(kind: AnalysisKind, content: impl Into<String>) -> Result<Self, AnalysisError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }
        Ok(Self { kind, content })
    }

    /// Requested interpretation.
    pub fn kind(&self) -> AnalysisKind {
        self.kind
    }

    /// Raw content, verbatim.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Builds the provider prompt for this request.
    pub fn prompt(&self) -> StructuredPrompt {
        StructuredPrompt {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            user_prompt: format!(
                "Analysis type: {kind}\nContent to analyze:\n{CONTENT_DELIMITER}\n{content}\n{CONTENT_DELIMITER}\n",
                kind = self.kind,
                content = self.content,
            ),
        }
    }
}

/// Prompt sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredPrompt {
    /// Role and output-format instructions.
    pub system_instruction: String,
    /// Analysis kind plus delimited content.
    pub user_prompt: String,
}

/// Raw provider output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedText {
    /// Text the provider generated; expected to be JSON.
    pub text: String,
}

/// Structured-generation provider seam.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Generates text constrained (best-effort) by `response_schema`.
    async fn generate_structured(
        &self,
        prompt: &StructuredPrompt,
        response_schema: &Value,
    ) -> Result<GeneratedText, ProviderError>;

    /// Model identifier for logs.
    fn model_name(&self) -> &str;
}

/// Provider construction settings.
#[derive(Clone)]
pub struct ProviderConfig {
    /// API credential.
    pub api_key: String,
    /// Model id.
    pub model: String,
    /// API base URL; must be HTTPS.
    pub endpoint: String,
    /// Optional transport timeout. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl ProviderConfig {
    /// Creates settings with default model and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: None,
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Analysis client. One call, one provider request, no retries.
#[derive(Clone)]
pub struct AnalysisClient {
    provider: Arc<dyn AnalysisProvider>,
    response_schema: Arc<Value>,
}

impl AnalysisClient {
    /// Creates a client over any provider.
    pub fn new(provider: Arc<dyn AnalysisProvider>) -> Self {
        Self {
            provider,
            response_schema: Arc::new(response_schema()),
        }
    }

    /// Creates a client backed by [`GeminiProvider`].
    ///
    /// # Errors
    /// Returns [`ClientError::MissingCredential`] for a blank API key and
    /// [`ClientError::InvalidEndpoint`] for a non-HTTPS endpoint.
    pub fn gemini(config: ProviderConfig) -> Result<Self, ClientError> {
        let provider = GeminiProvider::new(config)?;
        Ok(Self::new(Arc::new(provider)))
    }

    /// Model identifier of the underlying provider.
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Analyses `content` as `kind`.
    ///
    /// # Errors
    /// See [`AnalysisError`]. Blank content fails without a provider call.
    pub async fn analyze(
        &self,
        kind: AnalysisKind,
        content: &str,
    ) -> Result<AnalysisReport, AnalysisError> {
        let request = AnalysisRequest::new(kind, content)?;
        self.analyze_request(request).await
    }

    /// Analyses a prepared request.
    ///
    /// # Errors
    /// See [`AnalysisError`].
    pub async fn analyze_request(
        &self,
        request: AnalysisRequest,
    ) -> Result<AnalysisReport, AnalysisError> {
        let prompt = request.prompt();
        info!(
            kind = %request.kind(),
            model = self.provider.model_name(),
            content_len = request.content().len(),
            "sending analysis request"
        );

        let generated = self
            .provider
            .generate_structured(&prompt, &self.response_schema)
            .await
            .inspect_err(|failure| error!(error = %failure, "provider call failed"))?;

        debug!(response_len = generated.text.len(), "provider responded");

        let report = parse_report(&generated.text)
            .map_err(AnalysisError::from)
            .inspect_err(|failure| error!(error = %failure, "provider output rejected"))?;

        info!(
            verdict = %report.verdict,
            risk_score = report.risk_score,
            "analysis report validated"
        );
        Ok(report)
    }
}

/// Analysis failures.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Nothing to analyse.
    #[error("content to analyze is empty")]
    EmptyInput,
    /// Provider could not be reached or refused the request.
    #[error("provider failure: {0}")]
    Provider(#[from] ProviderError),
    /// Provider returned text that is not JSON.
    #[error("provider returned non-JSON output: {0}")]
    Parse(#[source] serde_json::Error),
    /// Provider JSON violates the report contract.
    #[error("provider output violates report contract: {0}")]
    Schema(#[source] SchemaError),
}

impl AnalysisError {
    /// Single human-readable message for display.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::EmptyInput => "Please enter a URL or text to analyze.".to_string(),
            AnalysisError::Provider(_) | AnalysisError::Parse(_) | AnalysisError::Schema(_) => {
                PROVIDER_FAILURE_MESSAGE.to_string()
            }
        }
    }
}

impl From<ReportError> for AnalysisError {
    fn from(error: ReportError) -> Self {
        match error {
            ReportError::Decode(decode) => AnalysisError::Parse(decode),
            ReportError::Schema(schema) => AnalysisError::Schema(schema),
        }
    }
}

/// Provider call failures.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network, TLS, or timeout failure.
    #[error("transport failure: {0}")]
    Transport(String),
    /// Provider answered with a non-success status (auth, quota, bad request).
    #[error("provider returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        message: String,
    },
    /// Provider response envelope could not be decoded.
    #[error("provider envelope decode failure: {0}")]
    Decode(String),
    /// Provider answered without any candidate text.
    #[error("provider response contained no text")]
    EmptyResponse,
}

/// Client construction failures.
#[derive(Debug, Error)]
pub enum ClientError {
    /// API credential missing or blank.
    #[error("provider API key is not set")]
    MissingCredential,
    /// Endpoint violates URL or HTTPS requirements.
    #[error("invalid provider endpoint: {0}")]
    InvalidEndpoint(String),
    /// HTTP client could not be built.
    #[error("http client setup failure: {0}")]
    Http(String),
}
