//! Report lifecycle operations that span the database and the upload directory.

use csv::Writer;
use tracing::info;
use uuid::Uuid;

use super::storage::Storage;
use crate::db::DbPool;
use crate::db::reports::ReportWithChildren;
use crate::error::{AppError, AppResult};
use crate::models::{DeleteResponse, ReportResponse, Severity};

const CSV_HEADER: [&str; 9] = [
    "report_name",
    "report_status",
    "severity",
    "title",
    "description",
    "recommendation",
    "confidence",
    "location",
    "created_at",
];

/// Assemble the API view of a report.
pub fn to_report_response(report: ReportWithChildren) -> ReportResponse {
    ReportResponse::from_parts(
        report.report,
        report.documents.into_iter().map(Into::into).collect(),
        report.issues.into_iter().map(Into::into).collect(),
    )
}

/// Delete one report: backing files first, then the rows.
pub async fn delete_report(
    pool: &DbPool,
    storage: &Storage,
    id: Uuid,
) -> AppResult<DeleteResponse> {
    if pool.get_report_by_id(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Report {}", id)));
    }

    let documents = pool.get_documents_by_report_ids(&[id]).await?;
    let deleted_files = storage
        .remove_all(documents.iter().map(|d| d.file_path.as_str()))
        .await;
    let deleted_reports = pool.delete_report(id).await?;

    info!(
        "Deleted report {} ({} of {} file(s) removed)",
        id,
        deleted_files,
        documents.len()
    );

    Ok(DeleteResponse {
        success: true,
        message: format!("Report {} deleted", id),
        deleted_reports,
        deleted_files,
    })
}

/// Delete every report, document, and issue, with the same file cleanup.
pub async fn clear_all(pool: &DbPool, storage: &Storage) -> AppResult<DeleteResponse> {
    let documents = pool.get_all_documents().await?;
    let deleted_files = storage
        .remove_all(documents.iter().map(|d| d.file_path.as_str()))
        .await;
    let deleted_reports = pool.delete_all_reports().await?;

    info!(
        "Cleared all data: {} report(s), {} file(s) removed",
        deleted_reports, deleted_files
    );

    Ok(DeleteResponse {
        success: true,
        message: format!("Deleted {} report(s)", deleted_reports),
        deleted_reports,
        deleted_files,
    })
}

/// Render a report's issues as CSV, one row per issue.
pub fn export_csv(report: &ReportWithChildren) -> AppResult<Vec<u8>> {
    let csv_error = |e: csv::Error| AppError::FileSystem(format!("Failed to write CSV: {}", e));

    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER).map_err(csv_error)?;

    for issue in &report.issues {
        writer
            .write_record([
                report.report.name.as_str(),
                report.report.status.as_str(),
                Severity::parse_lenient(&issue.severity).as_str(),
                issue.title.as_str(),
                issue.description.as_str(),
                issue.recommendation.as_deref().unwrap_or(""),
                format!("{:.2}", issue.confidence).as_str(),
                issue.location.as_deref().unwrap_or(""),
                issue.created_at.to_rfc3339().as_str(),
            ])
            .map_err(csv_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::FileSystem(format!("Failed to finish CSV: {}", e)))
}
