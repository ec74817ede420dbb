//! Stored model credential API handlers.

use actix_web::{HttpResponse, delete, get, post, web};
use uuid::Uuid;

use crate::config::EnvKeys;
use crate::db::DbPool;
use crate::error::{AppError, AppResult, ErrorResponse};
use crate::models::{CreateCredentialRequest, CredentialEnvelope, CredentialListResponse};
use crate::services::SecretBox;
use crate::services::credentials;

fn parse_credential_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidInput("Invalid credential ID".to_string()))
}

/// List stored credentials (masked) and the providers configured in the environment.
#[utoipa::path(
    get,
    path = "/api/v1/credentials",
    tag = "Credentials",
    responses(
        (status = 200, description = "Stored credentials", body = CredentialListResponse)
    )
)]
#[get("/credentials")]
pub async fn list_credentials(
    pool: web::Data<DbPool>,
    secret_box: web::Data<SecretBox>,
    env_keys: web::Data<EnvKeys>,
) -> AppResult<HttpResponse> {
    let credentials = credentials::list_credentials(&pool, &secret_box).await?;

    Ok(HttpResponse::Ok().json(CredentialListResponse {
        success: true,
        credentials,
        env_providers: env_keys.providers(),
    }))
}

/// Store a new credential. The key is validated for format and encrypted.
#[utoipa::path(
    post,
    path = "/api/v1/credentials",
    tag = "Credentials",
    request_body = CreateCredentialRequest,
    responses(
        (status = 201, description = "Credential stored", body = CredentialEnvelope),
        (status = 400, description = "Malformed key or label", body = ErrorResponse)
    )
)]
#[post("/credentials")]
pub async fn create_credential(
    pool: web::Data<DbPool>,
    secret_box: web::Data<SecretBox>,
    body: web::Json<CreateCredentialRequest>,
) -> AppResult<HttpResponse> {
    let credential = credentials::add_credential(&pool, &secret_box, body.into_inner()).await?;

    Ok(HttpResponse::Created().json(CredentialEnvelope {
        success: true,
        credential,
    }))
}

/// Make a credential the active stored credential.
#[utoipa::path(
    post,
    path = "/api/v1/credentials/{id}/activate",
    tag = "Credentials",
    params(("id" = Uuid, Path, description = "Credential ID")),
    responses(
        (status = 200, description = "Credential activated", body = CredentialEnvelope),
        (status = 404, description = "Credential not found", body = ErrorResponse)
    )
)]
#[post("/credentials/{id}/activate")]
pub async fn activate_credential(
    pool: web::Data<DbPool>,
    secret_box: web::Data<SecretBox>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_credential_id(&path)?;
    let credential = credentials::activate_credential(&pool, &secret_box, id).await?;

    Ok(HttpResponse::Ok().json(CredentialEnvelope {
        success: true,
        credential,
    }))
}

/// Delete a stored credential.
#[utoipa::path(
    delete,
    path = "/api/v1/credentials/{id}",
    tag = "Credentials",
    params(("id" = Uuid, Path, description = "Credential ID")),
    responses(
        (status = 204, description = "Credential deleted"),
        (status = 404, description = "Credential not found", body = ErrorResponse)
    )
)]
#[delete("/credentials/{id}")]
pub async fn delete_credential(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_credential_id(&path)?;
    credentials::delete_credential(&pool, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Configure credential routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_credentials)
        .service(create_credential)
        .service(activate_credential)
        .service(delete_credential);
}
