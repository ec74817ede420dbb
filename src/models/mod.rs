//! Domain models for Akuit.

pub mod credential;
pub mod document;
pub mod intake;
pub mod issue;
pub mod report;

// Re-export commonly used types
pub use credential::{
    CreateCredentialRequest, CredentialEnvelope, CredentialListResponse, CredentialResponse,
};
pub use document::{DocumentResponse, document_file_url};
pub use intake::{FailedFile, IntakeResponse};
pub use issue::{IssueResponse, Severity};
pub use report::{
    DeleteResponse, ListReportsQuery, ReportAggregate, ReportDetailResponse, ReportListResponse,
    ReportResponse, ReportStatus,
};
