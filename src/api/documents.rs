//! Document byte-streaming endpoint.

use actix_web::{HttpResponse, get, web};
use tracing::warn;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, AppResult, ErrorResponse};
use crate::services::Storage;

/// `Content-Disposition` value showing the file inline under its original name.
fn inline_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "inline; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(filename)
    )
}

/// Serve an uploaded document's original bytes.
#[utoipa::path(
    get,
    path = "/api/v1/documents/{id}/file",
    tag = "Documents",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Original file bytes with the stored media type"),
        (status = 404, description = "Document or file not found", body = ErrorResponse)
    )
)]
#[get("/documents/{id}/file")]
pub async fn document_file(
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = Uuid::parse_str(&path)
        .map_err(|_| AppError::InvalidInput("Invalid document ID".to_string()))?;

    let document = pool
        .get_document_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {}", id)))?;

    let data = storage.get(&document.file_path).await.map_err(|e| {
        if matches!(e, AppError::NotFound(_)) {
            warn!("File for document {} is missing: {}", id, document.file_path);
            AppError::NotFound(format!("File for document {}", id))
        } else {
            e
        }
    })?;

    Ok(HttpResponse::Ok()
        .content_type(document.mime_type.as_str())
        .insert_header(("Content-Disposition", inline_disposition(&document.filename)))
        .body(data))
}

/// Configure document routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(document_file);
}
