#![warn(missing_docs)]
//! # trapshield-report
//!
//! ## Purpose
//! Defines the phishing-risk report contract shared by every TrapShield crate
//! and the single validation gate provider output must pass.
//!
//! ## Responsibilities
//! - Model the report shape ([`AnalysisReport`] and its findings).
//! - Validate arbitrary decoded JSON into a fully populated report.
//! - Describe the report shape to the provider as a structured-output schema.
//!
//! ## Data flow
//! Provider text -> [`parse_report`] -> `serde_json::Value` -> [`validate`] ->
//! [`AnalysisReport`] handed to the scan controller.
//!
//! ## Ownership and lifetimes
//! Reports own their strings so they can outlive the response buffer they were
//! decoded from.
//!
//! ## Error model
//! Malformed JSON returns [`ReportError::Decode`]. Well-formed JSON that breaks
//! the contract returns [`SchemaError`], which lists every offending field by
//! dotted path. Partial reports are never produced.
//!
//! ## Security and privacy notes
//! Validation is pure and never logs field contents.
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use trapshield_report::{Verdict, validate};
//!
//! let raw = json!({
//!     "riskScore": 10,
//!     "verdict": "Safe",
//!     "summary": "Looks fine.",
//!     "textualAnalysis": {
//!         "sentiment": "Neutral",
//!         "urgencyDetected": false,
//!         "suspiciousPhrases": [],
//!         "grammarIssues": []
//!     },
//!     "urlAnalysis": {
//!         "domainAge": "5 years old",
//!         "sslCertificate": "Valid and Trusted",
//!         "redFlags": []
//!     }
//! });
//!
//! let report = validate(&raw).expect("report should validate");
//! assert_eq!(report.verdict, Verdict::Safe);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Path used for violations that concern the document root.
pub const ROOT_FIELD: &str = "$";

/// Overall classification of the analysed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// No phishing indicators.
    Safe,
    /// Some indicators; treat with care.
    Suspicious,
    /// Strong phishing indicators.
    Malicious,
}

impl Verdict {
    /// Every verdict in ascending severity.
    pub const ALL: [Verdict; 3] = [Verdict::Safe, Verdict::Suspicious, Verdict::Malicious];

    /// Returns the exact wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Safe => "Safe",
            Verdict::Suspicious => "Suspicious",
            Verdict::Malicious => "Malicious",
        }
    }

    /// Parses a wire label. Matching is case-sensitive.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|verdict| verdict.as_str() == label)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language-level findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextualFindings {
    /// Overall sentiment label (for example `Urgent` or `Professional`).
    pub sentiment: String,
    /// Whether urgent or time-pressure language was found.
    pub urgency_detected: bool,
    /// Phrases flagged as suspicious, in provider order.
    pub suspicious_phrases: Vec<String>,
    /// Grammar or style issues, in provider order.
    pub grammar_issues: Vec<String>,
}

/// URL and domain findings. Values are simulated by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlFindings {
    /// Domain age label (for example `Newly Registered`).
    pub domain_age: String,
    /// Certificate status label (for example `Valid and Trusted`).
    pub ssl_certificate: String,
    /// URL-specific red flags, in provider order.
    pub red_flags: Vec<String>,
}

/// Completed phishing-risk report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Provider risk score. Expected in [0, 100] but not clamped here.
    pub risk_score: i64,
    /// Overall verdict.
    pub verdict: Verdict,
    /// One-sentence summary.
    pub summary: String,
    /// Language findings.
    pub textual_analysis: TextualFindings,
    /// URL findings.
    pub url_analysis: UrlFindings,
}

/// What is wrong with one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// Field is absent or `null`.
    Missing,
    /// Field holds the wrong JSON kind.
    WrongType {
        /// Expected JSON kind.
        expected: &'static str,
    },
    /// Number is not an integer.
    NotInteger,
    /// Integer does not fit in a signed 64-bit value.
    OutOfRange,
    /// String is empty after trimming.
    Blank,
    /// Verdict label is not one of the enumerated values.
    UnknownVerdict(String),
    /// Array item at `index` is not a string.
    NonStringItem {
        /// Offending item position.
        index: usize,
    },
    /// Wrapping array holds no report.
    EmptyArray,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Missing => f.write_str("is missing"),
            ViolationKind::WrongType { expected } => write!(f, "must be {expected}"),
            ViolationKind::NotInteger => f.write_str("must be an integer"),
            ViolationKind::OutOfRange => f.write_str("is outside the supported integer range"),
            ViolationKind::Blank => f.write_str("must not be blank"),
            ViolationKind::UnknownVerdict(label) => write!(
                f,
                "has unknown verdict `{label}` (expected Safe, Suspicious or Malicious)"
            ),
            ViolationKind::NonStringItem { index } => write!(f, "item {index} must be a string"),
            ViolationKind::EmptyArray => f.write_str("is an empty array"),
        }
    }
}

/// One contract violation located by dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Dotted path such as `textualAnalysis.urgencyDetected`.
    pub field: String,
    /// Violation detail.
    pub kind: ViolationKind,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.kind)
    }
}

/// Report failed contract validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("report schema violation: {}", join_violations(.violations))]
pub struct SchemaError {
    /// Every violation found, in document order.
    pub violations: Vec<FieldViolation>,
}

impl SchemaError {
    fn single(field: &str, kind: ViolationKind) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.to_string(),
                kind,
            }],
        }
    }

    /// Returns `true` when `field` has at least one violation.
    pub fn names_field(&self, field: &str) -> bool {
        self.violations
            .iter()
            .any(|violation| violation.field == field)
    }

    /// Iterates over the violated field paths.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.violations
            .iter()
            .map(|violation| violation.field.as_str())
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors produced while turning provider text into a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Text is not JSON.
    #[error("report decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// JSON violates the report contract.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Decodes provider text and validates it.
///
/// # Errors
/// Returns [`ReportError::Decode`] for non-JSON text and
/// [`ReportError::Schema`] for contract violations.
pub fn parse_report(raw: &str) -> Result<AnalysisReport, ReportError> {
    let value: Value = serde_json::from_str(raw.trim())?;
    Ok(validate(&value)?)
}

/// Validates a decoded JSON value into a report.
///
/// Providers occasionally wrap the object in a list, so an array is reduced to
/// its first element and the remaining elements are ignored.
///
/// # Errors
/// Returns [`SchemaError`] naming every missing or invalid field.
pub fn validate(raw: &Value) -> Result<AnalysisReport, SchemaError> {
    let root = match raw {
        Value::Array(items) => items
            .first()
            .ok_or_else(|| SchemaError::single(ROOT_FIELD, ViolationKind::EmptyArray))?,
        other => other,
    };

    let Some(object) = root.as_object() else {
        return Err(SchemaError::single(
            ROOT_FIELD,
            ViolationKind::WrongType {
                expected: "an object",
            },
        ));
    };

    let mut reader = FieldReader::new();
    let risk_score = reader.integer(object, "", "riskScore");
    let verdict = reader.verdict(object, "", "verdict");
    let summary = reader.non_blank_string(object, "", "summary");
    let textual_analysis = reader
        .object(object, "", "textualAnalysis")
        .and_then(|textual| reader.textual_findings(textual));
    let url_analysis = reader
        .object(object, "", "urlAnalysis")
        .and_then(|url| reader.url_findings(url));

    match (risk_score, verdict, summary, textual_analysis, url_analysis) {
        (Some(risk_score), Some(verdict), Some(summary), Some(textual), Some(url))
            if reader.violations.is_empty() =>
        {
            Ok(AnalysisReport {
                risk_score,
                verdict,
                summary,
                textual_analysis: textual,
                url_analysis: url,
            })
        }
        _ => Err(SchemaError {
            violations: reader.violations,
        }),
    }
}

/// Collects violations while pulling typed fields out of JSON objects.
///
/// Every accessor returns `None` only after recording a violation, so a fully
/// `Some` result set with no violations is a complete report.
struct FieldReader {
    violations: Vec<FieldViolation>,
}

impl FieldReader {
    fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    fn reject(&mut self, prefix: &str, name: &str, kind: ViolationKind) {
        let field = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };
        self.violations.push(FieldViolation { field, kind });
    }

    fn present<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        prefix: &str,
        name: &str,
    ) -> Option<&'v Value> {
        match object.get(name) {
            None | Some(Value::Null) => {
                self.reject(prefix, name, ViolationKind::Missing);
                None
            }
            Some(value) => Some(value),
        }
    }

    fn string(&mut self, object: &Map<String, Value>, prefix: &str, name: &str) -> Option<String> {
        match self.present(object, prefix, name)? {
            Value::String(text) => Some(text.clone()),
            _ => {
                self.reject(prefix, name, ViolationKind::WrongType { expected: "a string" });
                None
            }
        }
    }

    fn non_blank_string(
        &mut self,
        object: &Map<String, Value>,
        prefix: &str,
        name: &str,
    ) -> Option<String> {
        let text = self.string(object, prefix, name)?;
        if text.trim().is_empty() {
            self.reject(prefix, name, ViolationKind::Blank);
            return None;
        }
        Some(text)
    }

    fn boolean(&mut self, object: &Map<String, Value>, prefix: &str, name: &str) -> Option<bool> {
        match self.present(object, prefix, name)? {
            Value::Bool(flag) => Some(*flag),
            _ => {
                self.reject(prefix, name, ViolationKind::WrongType { expected: "a boolean" });
                None
            }
        }
    }

    fn integer(&mut self, object: &Map<String, Value>, prefix: &str, name: &str) -> Option<i64> {
        match self.present(object, prefix, name)? {
            Value::Number(number) => match number.as_i64() {
                Some(value) => Some(value),
                None if number.is_u64() => {
                    self.reject(prefix, name, ViolationKind::OutOfRange);
                    None
                }
                None => {
                    self.reject(prefix, name, ViolationKind::NotInteger);
                    None
                }
            },
            _ => {
                self.reject(prefix, name, ViolationKind::WrongType { expected: "a number" });
                None
            }
        }
    }

    fn verdict(&mut self, object: &Map<String, Value>, prefix: &str, name: &str) -> Option<Verdict> {
        let label = self.string(object, prefix, name)?;
        match Verdict::from_label(&label) {
            Some(verdict) => Some(verdict),
            None => {
                self.reject(prefix, name, ViolationKind::UnknownVerdict(label));
                None
            }
        }
    }

    fn string_list(
        &mut self,
        object: &Map<String, Value>,
        prefix: &str,
        name: &str,
    ) -> Option<Vec<String>> {
        let Value::Array(items) = self.present(object, prefix, name)? else {
            self.reject(prefix, name, ViolationKind::WrongType { expected: "an array" });
            return None;
        };

        let mut strings = Vec::with_capacity(items.len());
        let mut valid = true;
        for (index, item) in items.iter().enumerate() {
            match item {
                Value::String(text) => strings.push(text.clone()),
                _ => {
                    self.reject(prefix, name, ViolationKind::NonStringItem { index });
                    valid = false;
                }
            }
        }

        valid.then_some(strings)
    }

    fn object<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        prefix: &str,
        name: &str,
    ) -> Option<&'v Map<String, Value>> {
        match self.present(object, prefix, name)? {
            Value::Object(inner) => Some(inner),
            _ => {
                self.reject(prefix, name, ViolationKind::WrongType { expected: "an object" });
                None
            }
        }
    }

    fn textual_findings(&mut self, object: &Map<String, Value>) -> Option<TextualFindings> {
        const PREFIX: &str = "textualAnalysis";
        let sentiment = self.string(object, PREFIX, "sentiment");
        let urgency_detected = self.boolean(object, PREFIX, "urgencyDetected");
        let suspicious_phrases = self.string_list(object, PREFIX, "suspiciousPhrases");
        let grammar_issues = self.string_list(object, PREFIX, "grammarIssues");

        Some(TextualFindings {
            sentiment: sentiment?,
            urgency_detected: urgency_detected?,
            suspicious_phrases: suspicious_phrases?,
            grammar_issues: grammar_issues?,
        })
    }

    fn url_findings(&mut self, object: &Map<String, Value>) -> Option<UrlFindings> {
        const PREFIX: &str = "urlAnalysis";
        let domain_age = self.string(object, PREFIX, "domainAge");
        let ssl_certificate = self.string(object, PREFIX, "sslCertificate");
        let red_flags = self.string_list(object, PREFIX, "redFlags");

        Some(UrlFindings {
            domain_age: domain_age?,
            ssl_certificate: ssl_certificate?,
            red_flags: red_flags?,
        })
    }
}

/// Structured-output schema handed to the provider alongside the prompt.
///
/// Uses the provider's OpenAPI subset (upper-case type names). The provider
/// treats it as a best-effort constraint; output is always re-validated.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "riskScore": {
                "type": "INTEGER",
                "description": "A score from 0 to 100 representing the phishing risk. 0 is safe, 100 is malicious."
            },
            "verdict": {
                "type": "STRING",
                "enum": ["Safe", "Suspicious", "Malicious"],
                "description": "A single-word verdict."
            },
            "summary": {
                "type": "STRING",
                "description": "A concise, one-sentence summary of the findings."
            },
            "textualAnalysis": {
                "type": "OBJECT",
                "properties": {
                    "sentiment": {
                        "type": "STRING",
                        "description": "Overall sentiment (e.g., 'Urgent', 'Fear-inducing', 'Professional')."
                    },
                    "urgencyDetected": {
                        "type": "BOOLEAN",
                        "description": "Whether urgent or time-sensitive language was detected."
                    },
                    "suspiciousPhrases": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" },
                        "description": "List of specific phrases that are red flags."
                    },
                    "grammarIssues": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" },
                        "description": "List of grammatical errors or awkward phrasings found."
                    }
                },
                "required": ["sentiment", "urgencyDetected", "suspiciousPhrases", "grammarIssues"]
            },
            "urlAnalysis": {
                "type": "OBJECT",
                "properties": {
                    "domainAge": {
                        "type": "STRING",
                        "description": "Simulated age of the domain (e.g., 'Newly Registered', '3 years old')."
                    },
                    "sslCertificate": {
                        "type": "STRING",
                        "description": "Simulated status of the SSL certificate (e.g., 'Valid and Trusted', 'Invalid', 'Missing')."
                    },
                    "redFlags": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" },
                        "description": "List of URL-specific red flags (e.g., 'Contains homoglyph characters', 'Uses a non-standard TLD')."
                    }
                },
                "required": ["domainAge", "sslCertificate", "redFlags"]
            }
        },
        "required": ["riskScore", "verdict", "summary", "textualAnalysis", "urlAnalysis"]
    })
}
