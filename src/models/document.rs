//! Document DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::document;

/// Path of the byte-streaming endpoint for a document.
pub fn document_file_url(id: Uuid) -> String {
    format!("/api/v1/documents/{}/file", id)
}

/// Uploaded document as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub report_id: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    /// URL serving the original bytes inline.
    pub url: String,
    /// Fields extracted by the model, if any.
    #[schema(value_type = Option<Object>)]
    pub extracted_data: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

impl From<document::Model> for DocumentResponse {
    fn from(model: document::Model) -> Self {
        Self {
            url: document_file_url(model.id),
            id: model.id,
            report_id: model.report_id,
            filename: model.filename,
            mime_type: model.mime_type,
            size_bytes: model.size_bytes,
            extracted_data: model.extracted_data,
            created_at: model.created_at,
        }
    }
}
