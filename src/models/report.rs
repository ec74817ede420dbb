//! Report domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::document::DocumentResponse;
use super::issue::IssueResponse;
use crate::entity::report;

/// Report workflow status.
///
/// PENDING on creation, REVIEWED after the first analysis pass.
/// APPROVED and REJECTED are manual decisions taken after review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Pending,
    Reviewed,
    Approved,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Reviewed => "REVIEWED",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "REVIEWED" => Some(Self::Reviewed),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Whether a report may move from `self` to `next`.
    pub fn can_transition_to(&self, next: ReportStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Reviewed)
                | (Self::Reviewed, Self::Approved)
                | (Self::Reviewed, Self::Rejected)
        )
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregated values written to a report once every file is processed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportAggregate {
    pub name: String,
    pub total_amount: Option<f64>,
    pub confidence: f64,
    pub summary: String,
}

/// Report with its documents and issues.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResponse {
    pub id: Uuid,
    pub name: String,
    pub status: ReportStatus,
    /// Sum of parsed document totals, null when no total was found.
    pub total_amount: Option<f64>,
    /// Aggregate confidence in [0, 1].
    pub confidence: f64,
    pub summary: Option<String>,
    pub document_count: usize,
    pub issue_count: usize,
    pub documents: Vec<DocumentResponse>,
    /// Issues, newest first.
    pub issues: Vec<IssueResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportResponse {
    pub fn from_parts(
        report: report::Model,
        documents: Vec<DocumentResponse>,
        issues: Vec<IssueResponse>,
    ) -> Self {
        Self {
            id: report.id,
            name: report.name,
            status: ReportStatus::parse(&report.status).unwrap_or(ReportStatus::Pending),
            total_amount: report.total_amount,
            confidence: report.confidence,
            summary: report.summary,
            document_count: documents.len(),
            issue_count: issues.len(),
            documents,
            issues,
            created_at: report.created_at,
            updated_at: report.updated_at,
        }
    }
}

/// Report detail envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportDetailResponse {
    pub success: bool,
    pub report: ReportResponse,
}

/// Report list envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportListResponse {
    pub success: bool,
    /// Reports, newest first.
    pub reports: Vec<ReportResponse>,
    /// Total number of reports matching the filter.
    pub total: u64,
}

/// Query parameters for listing reports.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ListReportsQuery {
    /// Filter by status.
    #[serde(default)]
    pub status: Option<ReportStatus>,
    /// Maximum results to return (all when omitted).
    #[serde(default)]
    pub limit: Option<u64>,
    /// Offset for pagination.
    #[serde(default)]
    pub offset: Option<u64>,
}

/// Result of a delete operation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    /// Number of report rows removed.
    pub deleted_reports: u64,
    /// Number of backing files removed from disk.
    pub deleted_files: usize,
}
