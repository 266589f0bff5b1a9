//! Shared fixtures for app integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;
use trapshield_client::{
    AnalysisClient, AnalysisProvider, GeneratedText, ProviderError, StructuredPrompt,
};

/// Report returned for `https://example.com` in the start-up scenario.
pub const SAFE_REPORT: &str = r#"{
    "riskScore": 10,
    "verdict": "Safe",
    "summary": "Looks fine.",
    "textualAnalysis": {
        "sentiment": "Neutral",
        "urgencyDetected": false,
        "suspiciousPhrases": [],
        "grammarIssues": []
    },
    "urlAnalysis": {
        "domainAge": "5 years old",
        "sslCertificate": "Valid and Trusted",
        "redFlags": []
    }
}"#;

/// Canned provider reply.
#[derive(Clone)]
#[allow(dead_code)]
pub enum Reply {
    /// Provider returns this text.
    Text(&'static str),
    /// Provider fails with an HTTP status.
    Status(u16),
}

/// Provider replaying canned replies in order, repeating the last one.
#[allow(dead_code)]
pub struct ScriptedProvider {
    replies: Vec<Reply>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

#[allow(dead_code)]
impl ScriptedProvider {
    /// Provider answering immediately.
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies,
            calls: AtomicUsize::new(0),
            gate: None,
        })
    }

    /// Provider that waits for `gate` before answering.
    pub fn gated(replies: Vec<Reply>, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            replies,
            calls: AtomicUsize::new(0),
            gate: Some(gate),
        })
    }

    /// Number of provider calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisProvider for ScriptedProvider {
    async fn generate_structured(
        &self,
        _prompt: &StructuredPrompt,
        _response_schema: &Value,
    ) -> Result<GeneratedText, ProviderError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let reply = self
            .replies
            .get(index)
            .or_else(|| self.replies.last())
            .cloned()
            .unwrap_or(Reply::Status(500));

        match reply {
            Reply::Text(text) => Ok(GeneratedText {
                text: text.to_string(),
            }),
            Reply::Status(status) => Err(ProviderError::Status {
                status,
                message: "scripted failure".to_string(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Client over a scripted provider.
#[allow(dead_code)]
pub fn client_for(provider: &Arc<ScriptedProvider>) -> AnalysisClient {
    AnalysisClient::new(provider.clone())
}

/// Parses [`SAFE_REPORT`] as a JSON value.
#[allow(dead_code)]
pub fn safe_report_value() -> Value {
    serde_json::from_str(SAFE_REPORT).expect("fixture should be valid JSON")
}
