//! Compliance issue models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::issue;

/// Issue severity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }

    /// Lenient parse of a model-produced or stored severity tag.
    ///
    /// Unknown tags fall back to `Info`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "critical" | "high" | "error" | "severe" => Self::Critical,
            "warning" | "medium" | "moderate" | "warn" => Self::Warning,
            _ => Self::Info,
        }
    }

    /// Numeric weight used for ordering and export.
    pub fn weight(&self) -> i32 {
        match self {
            Self::Critical => 3,
            Self::Warning => 2,
            Self::Info => 1,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Issue as returned by the API, with severity normalized to lowercase tiers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssueResponse {
    pub id: Uuid,
    pub report_id: Uuid,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub recommendation: Option<String>,
    /// Confidence in [0, 1].
    pub confidence: f64,
    pub severity_weight: i32,
    pub location: Option<String>,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

impl From<issue::Model> for IssueResponse {
    fn from(model: issue::Model) -> Self {
        Self {
            id: model.id,
            report_id: model.report_id,
            severity: Severity::parse_lenient(&model.severity),
            title: model.title,
            description: model.description,
            recommendation: model.recommendation,
            confidence: model.confidence,
            severity_weight: model.severity_weight,
            location: model.location,
            resolved: model.resolved,
            created_at: model.created_at,
        }
    }
}
