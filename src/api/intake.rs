//! Document upload and analysis endpoint.

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, post, web};
use secrecy::SecretString;

use super::multipart::{UploadLimits, read_files};
use crate::config::{Config, EnvKeys, MODEL_API_KEY_HEADER, MODEL_PROVIDER_HEADER};
use crate::db::DbPool;
use crate::error::{AppError, AppResult, ErrorResponse};
use crate::models::IntakeResponse;
use crate::services::intake::{IntakeContext, run_intake};
use crate::services::key_resolver::resolve_key;
use crate::services::{ModelGateway, Provider, SecretBox, Storage};

/// Read the optional credential and provider headers.
pub fn model_headers(req: &HttpRequest) -> AppResult<(Option<SecretString>, Option<Provider>)> {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let key = header(MODEL_API_KEY_HEADER).map(|k| SecretString::from(k.to_string()));
    let provider = match header(MODEL_PROVIDER_HEADER) {
        Some(value) => Some(Provider::parse(value).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "{} must be gemini, openai or zai",
                MODEL_PROVIDER_HEADER
            ))
        })?),
        None => None,
    };

    Ok((key, provider))
}

/// Upload documents and analyze them.
///
/// Creates a report, stores every file, runs extraction and compliance on
/// each one in turn, and returns the aggregated result. Model failures on a
/// file degrade to empty results; they do not fail the request.
#[utoipa::path(
    post,
    path = "/api/v1/upload",
    tag = "Intake",
    params(
        ("X-Model-Api-Key" = Option<String>, Header, description = "Model credential for this request"),
        ("X-Model-Provider" = Option<String>, Header, description = "gemini, openai or zai")
    ),
    request_body(content_type = "multipart/form-data", description = "One or more `files` parts"),
    responses(
        (status = 200, description = "Report created and analyzed", body = IntakeResponse),
        (status = 400, description = "No files, or no usable credential", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 500, description = "Report could not be written", body = ErrorResponse)
    )
)]
#[post("/upload")]
#[allow(clippy::too_many_arguments)]
pub async fn upload_documents(
    req: HttpRequest,
    mut payload: Multipart,
    pool: web::Data<DbPool>,
    storage: web::Data<Storage>,
    gateway: web::Data<dyn ModelGateway>,
    env_keys: web::Data<EnvKeys>,
    secret_box: web::Data<SecretBox>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let (explicit, requested) = model_headers(&req)?;

    // Credential problems abort before any file is read or stored
    let key = resolve_key(
        &pool,
        &secret_box,
        &env_keys,
        explicit,
        requested,
        config.model.default_provider,
    )
    .await?;

    let files = read_files(
        &mut payload,
        &["files", "file"],
        UploadLimits {
            max_total_bytes: config.max_upload_size,
            max_files: config.max_files_per_request,
        },
    )
    .await?;

    let ctx = IntakeContext {
        pool: &pool,
        storage: &storage,
        gateway: gateway.get_ref(),
    };
    let response = run_intake(ctx, &key, files).await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Configure intake routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_documents);
}
