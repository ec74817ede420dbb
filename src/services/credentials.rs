//! Stored model credentials: add, list, activate, delete.

use secrecy::ExposeSecret;
use tracing::{info, warn};
use uuid::Uuid;

use super::crypto::SecretBox;
use super::gateway::Provider;
use super::key_resolver::{FULL_MASK, mask_api_key, validate_api_key};
use crate::db::DbPool;
use crate::entity::api_credential;
use crate::error::{AppError, AppResult};
use crate::models::{CreateCredentialRequest, CredentialResponse};

/// Validate, encrypt, and store a credential.
pub async fn add_credential(
    pool: &DbPool,
    secret_box: &SecretBox,
    request: CreateCredentialRequest,
) -> AppResult<CredentialResponse> {
    let label = request.label.trim();
    if label.is_empty() {
        return Err(AppError::InvalidInput("label must not be empty".to_string()));
    }

    validate_api_key(request.provider, request.key.expose_secret())
        .map_err(AppError::InvalidInput)?;

    let trimmed = secrecy::SecretString::from(request.key.expose_secret().trim().to_string());
    let sealed = secret_box.seal(&trimmed)?;

    let model = pool
        .insert_api_credential(
            request.provider.as_str(),
            label,
            &sealed,
            Some(true),
            request.activate,
        )
        .await?;

    info!(
        "Stored {} credential {} (active: {})",
        request.provider, model.id, model.is_active
    );

    Ok(to_response(model, mask_api_key(trimmed.expose_secret())))
}

/// List stored credentials with masked secrets.
pub async fn list_credentials(
    pool: &DbPool,
    secret_box: &SecretBox,
) -> AppResult<Vec<CredentialResponse>> {
    let models = pool.list_api_credentials().await?;

    Ok(models
        .into_iter()
        .map(|model| {
            let masked = masked_secret(secret_box, &model);
            to_response(model, masked)
        })
        .collect())
}

/// Make one credential the active one.
pub async fn activate_credential(
    pool: &DbPool,
    secret_box: &SecretBox,
    id: Uuid,
) -> AppResult<CredentialResponse> {
    let model = pool.activate_api_credential(id).await?;
    info!("Activated credential {}", id);
    let masked = masked_secret(secret_box, &model);
    Ok(to_response(model, masked))
}

/// Delete a stored credential.
pub async fn delete_credential(pool: &DbPool, id: Uuid) -> AppResult<()> {
    if !pool.delete_api_credential(id).await? {
        return Err(AppError::NotFound(format!("Credential {}", id)));
    }
    info!("Deleted credential {}", id);
    Ok(())
}

fn masked_secret(secret_box: &SecretBox, model: &api_credential::Model) -> String {
    match secret_box.open(&model.encrypted_secret) {
        Ok(secret) => mask_api_key(secret.expose_secret()),
        Err(e) => {
            warn!("Credential {} cannot be decrypted: {}", model.id, e);
            FULL_MASK.to_string()
        }
    }
}

fn to_response(model: api_credential::Model, masked_key: String) -> CredentialResponse {
    CredentialResponse {
        id: model.id,
        provider: Provider::parse(&model.provider).unwrap_or(Provider::Gemini),
        label: model.label,
        masked_key,
        is_active: model.is_active,
        is_valid: model.is_valid,
        created_at: model.created_at,
        last_used_at: model.last_used_at,
    }
}
