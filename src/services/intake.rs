//! Document intake: store each upload, run both model passes, persist, aggregate.
//!
//! Files are processed strictly one after another, so a request never has
//! more than one model call in flight. A file that fails is recorded and
//! skipped; work already done for earlier files is kept.

use chrono::Utc;
use serde_json::Value as JsonValue;
use tracing::{info, warn};
use uuid::Uuid;

use super::analysis::{ProcessedDocument, aggregate_report};
use super::compliance::{ComplianceIssue, analyze_compliance};
use super::extraction::{ExtractionOutcome, extract_document};
use super::gateway::{InlineImage, ModelGateway};
use super::key_resolver::ResolvedKey;
use super::quality::{QualityReport, assess_bytes};
use super::storage::{Storage, resolve_mime_type};
use crate::db::DbPool;
use crate::db::documents::DocumentEntry;
use crate::entity::{document, issue};
use crate::error::{AppError, AppResult};
use crate::models::{FailedFile, IntakeResponse, IssueResponse, ReportStatus};

/// One file read from the multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Services the intake pipeline needs.
#[derive(Clone, Copy)]
pub struct IntakeContext<'a> {
    pub pool: &'a DbPool,
    pub storage: &'a Storage,
    pub gateway: &'a dyn ModelGateway,
}

struct ProcessedFile {
    document: document::Model,
    outcome: ExtractionOutcome,
    stored_issues: Vec<issue::Model>,
}

/// Run the whole intake for one request.
///
/// Only failures writing the report row itself are returned as errors.
pub async fn run_intake(
    ctx: IntakeContext<'_>,
    key: &ResolvedKey,
    files: Vec<UploadedFile>,
) -> AppResult<IntakeResponse> {
    if files.is_empty() {
        return Err(AppError::InvalidInput("No files provided".to_string()));
    }

    let report_id = Uuid::now_v7();
    let fallback_name = format!("Acquittal {}", Utc::now().format("%Y-%m-%d"));
    ctx.pool.insert_report(report_id, &fallback_name).await?;

    info!(
        "Intake {} started: {} file(s) via {}",
        report_id,
        files.len(),
        key.provider
    );

    let mut processed: Vec<ProcessedFile> = Vec::with_capacity(files.len());
    let mut failed_files = Vec::new();

    for file in files {
        let filename = file.filename.clone();
        match process_file(ctx, key, report_id, file).await {
            Ok(result) => processed.push(result),
            Err(e) => {
                warn!("Intake {}: file '{}' failed: {}", report_id, filename, e);
                failed_files.push(FailedFile {
                    filename,
                    reason: e.to_string(),
                });
            }
        }
    }

    let all_issues = written_issues(&processed);
    let documents: Vec<ProcessedDocument<'_>> = processed
        .iter()
        .map(|p| ProcessedDocument {
            filename: &p.document.filename,
            outcome: &p.outcome,
        })
        .collect();

    let aggregate = aggregate_report(&documents, &all_issues, &fallback_name);
    let mut report = ctx
        .pool
        .update_report_aggregate(report_id, &aggregate)
        .await?;

    // A batch where nothing was stored never reached analysis
    if !processed.is_empty() {
        report = ctx
            .pool
            .update_report_status(report_id, ReportStatus::Reviewed)
            .await?;
    }

    let documents_processed = processed.len();
    let documents_analyzed = processed.iter().filter(|p| p.outcome.is_analyzed()).count();
    let issues: Vec<IssueResponse> = processed
        .into_iter()
        .flat_map(|p| p.stored_issues)
        .map(IssueResponse::from)
        .collect();

    info!(
        "Intake {} finished: {} stored, {} analyzed, {} failed, {} issue(s)",
        report_id,
        documents_processed,
        documents_analyzed,
        failed_files.len(),
        issues.len()
    );

    Ok(IntakeResponse {
        success: true,
        report_id,
        status: ReportStatus::parse(&report.status).unwrap_or(ReportStatus::Pending),
        name: report.name,
        total_amount: report.total_amount,
        confidence: report.confidence,
        summary: aggregate.summary,
        documents_processed,
        documents_analyzed,
        failed_files,
        issues,
    })
}

async fn process_file(
    ctx: IntakeContext<'_>,
    key: &ResolvedKey,
    report_id: Uuid,
    file: UploadedFile,
) -> AppResult<ProcessedFile> {
    if file.data.is_empty() {
        return Err(AppError::InvalidInput("File is empty".to_string()));
    }

    let document_id = Uuid::now_v7();
    let storage_key = Storage::document_key(report_id, document_id, &file.filename);
    let mime_type = resolve_mime_type(file.content_type.as_deref(), &file.filename);
    let size_bytes = file.data.len() as i64;

    ctx.storage.put(&storage_key, &file.data).await?;

    let (data, quality) = if mime_type.starts_with("image/") {
        let data = file.data;
        let (data, quality) = tokio::task::spawn_blocking(move || {
            let quality = assess_bytes(&data);
            (data, quality)
        })
        .await
        .map_err(|e| AppError::FileSystem(format!("Quality check panicked: {}", e)))?;
        (data, Some(quality))
    } else {
        (file.data, None)
    };

    let image = InlineImage::new(mime_type.clone(), data);
    let outcome = extract_document(ctx.gateway, key, &image).await;

    let issues = if outcome.is_analyzed() {
        analyze_compliance(ctx.gateway, key, outcome.text()).await
    } else {
        Vec::new()
    };

    let entry = DocumentEntry {
        id: document_id,
        report_id,
        filename: file.filename,
        mime_type,
        size_bytes,
        file_path: storage_key.clone(),
        extracted_data: Some(extracted_data(&outcome, quality.as_ref())),
    };

    let document = match ctx.pool.insert_document(entry).await {
        Ok(document) => document,
        Err(e) => {
            // Do not leave an unreferenced file behind
            ctx.storage.remove_all([storage_key.as_str()]).await;
            return Err(e);
        }
    };

    let stored_issues = match ctx.pool.insert_issues(report_id, &issues).await {
        Ok(stored) => stored,
        Err(e) => {
            warn!(
                "Failed to store {} issue(s) for document {}: {}",
                issues.len(),
                document_id,
                e
            );
            Vec::new()
        }
    };

    Ok(ProcessedFile {
        document,
        outcome,
        stored_issues,
    })
}

/// Issues that actually reached the database, for aggregation.
fn written_issues(processed: &[ProcessedFile]) -> Vec<ComplianceIssue> {
    processed
        .iter()
        .flat_map(|p| p.stored_issues.iter().map(ComplianceIssue::from))
        .collect()
}

/// Extraction result plus the image quality summary.
fn extracted_data(outcome: &ExtractionOutcome, quality: Option<&QualityReport>) -> JsonValue {
    let mut data = outcome.to_json();
    if let (Some(quality), Some(object)) = (quality, data.as_object_mut())
        && let Ok(value) = serde_json::to_value(quality)
    {
        object.insert("imageQuality".to_string(), value);
    }
    data
}
