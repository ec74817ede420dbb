//! Compliance pass: extracted text to a list of flagged issues.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use super::gateway::ModelGateway;
use super::key_resolver::ResolvedKey;
use super::model_output::{find_json_span, lenient_string, parse_number};
use crate::entity::issue;
use crate::models::Severity;

/// Confidence assumed when the model omits one.
pub const DEFAULT_ISSUE_CONFIDENCE: f64 = 0.8;

/// Instruction prepended to the extracted text.
pub const COMPLIANCE_PROMPT: &str = r#"You are a grants compliance officer reviewing an acquittal document.
Check the document text below for compliance problems such as: missing or illegible dates,
missing totals or totals that do not match line items, missing vendor details or tax numbers,
missing authorization or signature, duplicated or altered amounts, and purchases that look
unrelated to the funded activity.

Respond with a JSON array and nothing else. Each element:
{
  "severity": "CRITICAL | WARNING | INFO",
  "title": "short title",
  "description": "what is wrong",
  "recommendation": "how to fix it",
  "confidence": number between 0 and 1,
  "location": "where in the document"
}
Respond with [] when there are no problems.

Document text:
"#;

/// An issue decoded from a compliance response.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplianceIssue {
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub recommendation: Option<String>,
    /// Normalized to [0, 1].
    pub confidence: f64,
    pub location: Option<String>,
}

impl From<&issue::Model> for ComplianceIssue {
    fn from(stored: &issue::Model) -> Self {
        Self {
            severity: Severity::parse_lenient(&stored.severity),
            title: stored.title.clone(),
            description: stored.description.clone(),
            recommendation: stored.recommendation.clone(),
            confidence: stored.confidence,
            location: stored.location.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    #[serde(default, deserialize_with = "lenient_string")]
    severity: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    recommendation: Option<String>,
    #[serde(default)]
    confidence: Option<JsonValue>,
    #[serde(default, deserialize_with = "lenient_string")]
    location: Option<String>,
}

impl RawIssue {
    fn into_issue(self) -> Option<ComplianceIssue> {
        let title = self.title.map(|t| t.trim().to_string());
        let description = self.description.map(|d| d.trim().to_string());

        // An element with neither title nor description carries nothing to show
        let (title, description) = match (title, description) {
            (None, None) => return None,
            (Some(t), None) => (t.clone(), t),
            (None, Some(d)) => (d.clone(), d),
            (Some(t), Some(d)) => (t, d),
        };

        let confidence = self
            .confidence
            .as_ref()
            .and_then(parse_number)
            .unwrap_or(DEFAULT_ISSUE_CONFIDENCE);

        Some(ComplianceIssue {
            severity: self
                .severity
                .as_deref()
                .map(Severity::parse_lenient)
                .unwrap_or(Severity::Info),
            title,
            description,
            recommendation: self.recommendation,
            confidence: normalize_confidence(confidence),
            location: self.location,
        })
    }
}

/// Bring a confidence into [0, 1]; values above 1 are read as percentages.
pub fn normalize_confidence(value: f64) -> f64 {
    if !value.is_finite() {
        return DEFAULT_ISSUE_CONFIDENCE;
    }
    let value = if value > 1.0 { value / 100.0 } else { value };
    value.clamp(0.0, 1.0)
}

/// Decode a compliance response. Malformed output yields no issues.
///
/// Array elements that are not issue objects are skipped individually.
pub fn decode_issues(response: &str) -> Vec<ComplianceIssue> {
    let Some(span) = find_json_span(response, '[') else {
        debug!("Compliance response has no JSON array");
        return Vec::new();
    };

    let elements: Vec<JsonValue> = match serde_json::from_str(span) {
        Ok(elements) => elements,
        Err(e) => {
            debug!("Compliance JSON did not decode: {}", e);
            return Vec::new();
        }
    };

    elements
        .into_iter()
        .filter_map(|element| serde_json::from_value::<RawIssue>(element).ok())
        .filter_map(RawIssue::into_issue)
        .collect()
}

/// Run the compliance pass over extracted text.
///
/// Gateway failures are logged and produce an empty list.
pub async fn analyze_compliance(
    gateway: &dyn ModelGateway,
    key: &ResolvedKey,
    text: &str,
) -> Vec<ComplianceIssue> {
    let prompt = format!("{}{}", COMPLIANCE_PROMPT, text);

    match gateway.complete_text(key.provider, &key.key, &prompt).await {
        Ok(response) => decode_issues(&response),
        Err(e) => {
            warn!("Compliance call failed: {}", e);
            Vec::new()
        }
    }
}
