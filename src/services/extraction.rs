//! Extraction pass: document image to structured fields plus raw text.

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use tracing::{debug, warn};

use super::gateway::{InlineImage, ModelGateway};
use super::key_resolver::ResolvedKey;
use super::model_output::{find_json_span, lenient_bool, lenient_f64, lenient_string};

/// Instruction sent with every document image.
pub const EXTRACTION_PROMPT: &str = r#"You are reading a financial acquittal document (a receipt, invoice, or similar record).
Extract its contents and respond with a single JSON object and nothing else, using these fields:
{
  "documentType": "receipt | invoice | statement | other",
  "date": "document date as written",
  "totalAmount": number without currency symbols,
  "referenceNumber": "invoice or receipt number",
  "organization": "vendor or issuing organization",
  "lineItems": [{"description": "...", "quantity": number, "amount": number}],
  "paymentMethod": "cash | card | transfer | other",
  "authorization": "approver name or authorization code, if any",
  "signaturePresent": true or false,
  "extractedText": "all text visible in the document"
}
Use null for any field you cannot read."#;

/// Structured fields read from one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedDocument {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<JsonValue>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool", skip_serializing_if = "Option::is_none")]
    pub signature_present: Option<bool>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
}

/// Result of an extraction pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// The response held a decodable JSON object.
    Parsed {
        document: ExtractedDocument,
        raw_text: String,
    },
    /// The response had no decodable object; the whole text is kept.
    Unparsed { raw_text: String },
    /// The gateway call failed.
    Failed { reason: String },
}

impl ExtractionOutcome {
    /// Text handed to the compliance pass.
    ///
    /// A parsed document without an `extractedText` field falls back to the
    /// full response so its structured fields still get checked.
    pub fn text(&self) -> &str {
        match self {
            Self::Parsed { document, raw_text } => document
                .extracted_text
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(raw_text),
            Self::Unparsed { raw_text } => raw_text,
            Self::Failed { .. } => "",
        }
    }

    pub fn document(&self) -> Option<&ExtractedDocument> {
        match self {
            Self::Parsed { document, .. } => Some(document),
            _ => None,
        }
    }

    /// Whether the pass produced any text to analyze.
    pub fn is_analyzed(&self) -> bool {
        !self.text().trim().is_empty()
    }

    /// JSON blob stored on the document row.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Parsed { document, .. } => {
                serde_json::to_value(document).unwrap_or_else(|_| json!({}))
            }
            Self::Unparsed { raw_text } => json!({ "extractedText": raw_text }),
            Self::Failed { reason } => json!({ "error": reason }),
        }
    }
}

/// Decode an extraction response.
pub fn decode_extraction(response: &str) -> ExtractionOutcome {
    let parsed = find_json_span(response, '{')
        .and_then(|span| match serde_json::from_str::<ExtractedDocument>(span) {
            Ok(document) => Some(document),
            Err(e) => {
                debug!("Extraction JSON did not decode: {}", e);
                None
            }
        });

    match parsed {
        Some(document) => ExtractionOutcome::Parsed {
            document,
            raw_text: response.trim().to_string(),
        },
        None => ExtractionOutcome::Unparsed {
            raw_text: response.trim().to_string(),
        },
    }
}

/// Run the extraction pass for one document.
///
/// Gateway failures are logged and returned as [`ExtractionOutcome::Failed`];
/// they never abort the batch.
pub async fn extract_document(
    gateway: &dyn ModelGateway,
    key: &ResolvedKey,
    image: &InlineImage,
) -> ExtractionOutcome {
    match gateway
        .complete_vision(key.provider, &key.key, EXTRACTION_PROMPT, image)
        .await
    {
        Ok(response) => decode_extraction(&response),
        Err(e) => {
            warn!("Extraction call failed: {}", e);
            ExtractionOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

/// Confidence in the extracted text, a step function of its length.
pub fn text_confidence(text: &str) -> f64 {
    if text.trim().chars().count() > 50 {
        0.9
    } else {
        0.6
    }
}
