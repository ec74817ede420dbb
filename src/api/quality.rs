//! Image quality endpoints.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::multipart::{UploadLimits, read_files};
use crate::config::Config;
use crate::error::{AppError, AppResult, ErrorResponse};
use crate::services::intake::UploadedFile;
use crate::services::quality::{self, QualityReport};

/// Quality assessment envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QualityResponse {
    pub success: bool,
    pub filename: String,
    pub quality: QualityReport,
}

async fn read_single_file(payload: &mut Multipart, config: &Config) -> AppResult<UploadedFile> {
    read_files(
        payload,
        &["file"],
        UploadLimits {
            max_total_bytes: config.max_upload_size,
            max_files: 1,
        },
    )
    .await?
    .into_iter()
    .next()
    .ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))
}

/// Assess an image's brightness, contrast, sharpness, and document type.
#[utoipa::path(
    post,
    path = "/api/v1/quality/analyze",
    tag = "Quality",
    request_body(content_type = "multipart/form-data", description = "A single `file` part"),
    responses(
        (status = 200, description = "Quality assessment", body = QualityResponse),
        (status = 400, description = "No file", body = ErrorResponse)
    )
)]
#[post("/quality/analyze")]
pub async fn analyze_quality(
    mut payload: Multipart,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let file = read_single_file(&mut payload, &config).await?;
    let filename = file.filename;
    let data = file.data;

    let report = web::block(move || quality::assess_bytes(&data))
        .await
        .map_err(|e| AppError::FileSystem(format!("Quality check failed: {}", e)))?;

    Ok(HttpResponse::Ok().json(QualityResponse {
        success: true,
        filename,
        quality: report,
    }))
}

/// Return a brightness and contrast enhanced copy of an image as PNG.
#[utoipa::path(
    post,
    path = "/api/v1/quality/enhance",
    tag = "Quality",
    request_body(content_type = "multipart/form-data", description = "A single `file` part"),
    responses(
        (status = 200, description = "Enhanced PNG", content_type = "image/png"),
        (status = 400, description = "No file or undecodable image", body = ErrorResponse)
    )
)]
#[post("/quality/enhance")]
pub async fn enhance_image(
    mut payload: Multipart,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let file = read_single_file(&mut payload, &config).await?;
    let data = file.data;

    let png = web::block(move || quality::enhance_bytes(&data))
        .await
        .map_err(|e| AppError::FileSystem(format!("Enhancement failed: {}", e)))?
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    Ok(HttpResponse::Ok().content_type("image/png").body(png))
}

/// Configure quality routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(analyze_quality).service(enhance_image);
}
