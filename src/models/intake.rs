//! Intake (upload and analyze) DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::issue::IssueResponse;
use super::report::ReportStatus;

/// A file that could not be stored or recorded.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FailedFile {
    pub filename: String,
    pub reason: String,
}

/// Response of the intake endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IntakeResponse {
    pub success: bool,
    pub report_id: Uuid,
    pub status: ReportStatus,
    pub name: String,
    pub total_amount: Option<f64>,
    /// Aggregate confidence in [0, 1].
    pub confidence: f64,
    pub summary: String,
    /// Documents stored for this report.
    pub documents_processed: usize,
    /// Documents whose extraction pass produced text.
    pub documents_analyzed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_files: Vec<FailedFile>,
    /// Every issue found across the batch.
    pub issues: Vec<IssueResponse>,
}
