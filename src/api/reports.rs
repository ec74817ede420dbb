//! Report API handlers.

use actix_web::{HttpResponse, delete, get, web};
use tracing::debug;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, AppResult, ErrorResponse};
use crate::models::{
    DeleteResponse, ListReportsQuery, ReportDetailResponse, ReportListResponse, ReportStatus,
};
use crate::services::Storage;
use crate::services::reports::{clear_all, delete_report, export_csv, to_report_response};

fn parse_report_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidInput("Invalid report ID".to_string()))
}

/// List reports with their documents and issues, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    tag = "Reports",
    params(
        ("status" = Option<ReportStatus>, Query, description = "Filter by status"),
        ("limit" = Option<u64>, Query, description = "Maximum results"),
        ("offset" = Option<u64>, Query, description = "Pagination offset")
    ),
    responses(
        (status = 200, description = "Reports", body = ReportListResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    )
)]
#[get("/reports")]
pub async fn list_reports(
    pool: web::Data<DbPool>,
    query: web::Query<ListReportsQuery>,
) -> AppResult<HttpResponse> {
    let (reports, total) = pool.list_reports_with_children(&query).await?;
    debug!("Listing {} of {} reports", reports.len(), total);

    Ok(HttpResponse::Ok().json(ReportListResponse {
        success: true,
        reports: reports.into_iter().map(to_report_response).collect(),
        total,
    }))
}

/// Get one report with its documents and issues.
#[utoipa::path(
    get,
    path = "/api/v1/reports/{id}",
    tag = "Reports",
    params(("id" = Uuid, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report", body = ReportDetailResponse),
        (status = 404, description = "Report not found", body = ErrorResponse)
    )
)]
#[get("/reports/{id}")]
pub async fn get_report(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_report_id(&path)?;
    let report = pool
        .get_report_with_children(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))?;

    Ok(HttpResponse::Ok().json(ReportDetailResponse {
        success: true,
        report: to_report_response(report),
    }))
}

/// Export a report's issues as CSV.
#[utoipa::path(
    get,
    path = "/api/v1/reports/{id}/export.csv",
    tag = "Reports",
    params(("id" = Uuid, Path, description = "Report ID")),
    responses(
        (status = 200, description = "CSV with one row per issue", content_type = "text/csv"),
        (status = 404, description = "Report not found", body = ErrorResponse)
    )
)]
#[get("/reports/{id}/export.csv")]
pub async fn export_report_csv(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_report_id(&path)?;
    let report = pool
        .get_report_with_children(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))?;

    let body = export_csv(&report)?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"report-{}.csv\"", id),
        ))
        .body(body))
}

/// Delete a report, its documents, issues, and stored files.
#[utoipa::path(
    delete,
    path = "/api/v1/reports/{id}",
    tag = "Reports",
    params(("id" = Uuid, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report deleted", body = DeleteResponse),
        (status = 404, description = "Report not found", body = ErrorResponse)
    )
)]
#[delete("/reports/{id}")]
pub async fn delete_report_handler(
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_report_id(&path)?;
    let response = delete_report(&pool, &storage, id).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Delete every report and stored file.
#[utoipa::path(
    delete,
    path = "/api/v1/reports",
    tag = "Reports",
    responses(
        (status = 200, description = "All reports deleted", body = DeleteResponse)
    )
)]
#[delete("/reports")]
pub async fn clear_reports(
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
) -> AppResult<HttpResponse> {
    let response = clear_all(&pool, &storage).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Configure report routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_reports)
        .service(clear_reports)
        .service(export_report_csv)
        .service(get_report)
        .service(delete_report_handler);
}
