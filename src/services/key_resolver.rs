//! Model credential resolution, validation, and masking.
//!
//! Resolution order, first match wins:
//! 1. a key sent with the request
//! 2. a key from the server environment
//! 3. the active stored credential, decrypted on read
//!
//! When none applies the request fails before any work starts.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use uuid::Uuid;

use super::crypto::SecretBox;
use super::gateway::Provider;
use crate::config::EnvKeys;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};

/// Mask shown for keys too short to reveal any part of.
pub const FULL_MASK: &str = "********";

/// Where a resolved key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Request,
    Environment,
    Stored,
}

/// A credential ready to hand to the gateway.
#[derive(Debug)]
pub struct ResolvedKey {
    pub provider: Provider,
    pub key: SecretString,
    pub source: KeySource,
    /// Set when the key came from the credential store.
    pub credential_id: Option<Uuid>,
}

/// A decrypted stored credential.
#[derive(Debug)]
pub struct StoredKey {
    pub id: Uuid,
    pub provider: Provider,
    pub key: SecretString,
}

/// Pick a key without touching storage.
///
/// `requested` is the provider named by the caller, if any. Without one the
/// default provider's environment key is preferred, then any environment key.
pub fn resolve_without_store(
    explicit: Option<SecretString>,
    requested: Option<Provider>,
    default_provider: Provider,
    env_keys: &EnvKeys,
) -> Option<ResolvedKey> {
    if let Some(key) = explicit.filter(|k| !k.expose_secret().trim().is_empty()) {
        return Some(ResolvedKey {
            provider: requested.unwrap_or(default_provider),
            key,
            source: KeySource::Request,
            credential_id: None,
        });
    }

    let candidates: Vec<Provider> = match requested {
        Some(provider) => vec![provider],
        None => std::iter::once(default_provider)
            .chain(env_keys.providers())
            .collect(),
    };

    candidates.into_iter().find_map(|provider| {
        env_keys.get(provider).map(|key| ResolvedKey {
            provider,
            key: key.clone(),
            source: KeySource::Environment,
            credential_id: None,
        })
    })
}

/// Resolve a key, falling back to the active stored credential.
///
/// Returns `AppError::MissingCredential` when nothing applies.
pub async fn resolve_key(
    pool: &DbPool,
    secret_box: &SecretBox,
    env_keys: &EnvKeys,
    explicit: Option<SecretString>,
    requested: Option<Provider>,
    default_provider: Provider,
) -> AppResult<ResolvedKey> {
    if let Some(resolved) = resolve_without_store(explicit, requested, default_provider, env_keys)
    {
        debug!("Using {:?} credential for {}", resolved.source, resolved.provider);
        return Ok(resolved);
    }

    if let Some(stored) = load_active_key(pool, secret_box).await? {
        if requested.is_none_or(|p| p == stored.provider) {
            if let Err(e) = pool.touch_api_credential(stored.id).await {
                warn!("Failed to record credential use: {}", e);
            }
            return Ok(ResolvedKey {
                provider: stored.provider,
                key: stored.key,
                source: KeySource::Stored,
                credential_id: Some(stored.id),
            });
        }
        debug!(
            "Active stored credential is for {}, request asked for {}",
            stored.provider,
            requested.map(|p| p.as_str()).unwrap_or("-")
        );
    }

    Err(AppError::MissingCredential(format!(
        "No API key configured for {}. Send one in the request, set it in the server \
         environment, or store and activate one.",
        requested.unwrap_or(default_provider)
    )))
}

/// Decrypt the active stored credential, if any.
///
/// A credential that no longer decrypts is reported as `MissingCredential`.
pub async fn load_active_key(pool: &DbPool, secret_box: &SecretBox) -> AppResult<Option<StoredKey>> {
    let Some(credential) = pool.get_active_api_credential().await? else {
        return Ok(None);
    };

    let Some(provider) = Provider::parse(&credential.provider) else {
        warn!(
            "Active credential {} has unknown provider '{}'",
            credential.id, credential.provider
        );
        return Ok(None);
    };

    // Usually means AKUIT_ENCRYPTION_KEY changed since the key was stored
    let key = secret_box.open(&credential.encrypted_secret).map_err(|e| {
        warn!(
            "Active credential {} could not be decrypted: {}",
            credential.id, e
        );
        AppError::MissingCredential(format!(
            "The stored {} key '{}' is unreadable. Store it again or send a key with the request.",
            provider, credential.label
        ))
    })?;

    Ok(Some(StoredKey {
        id: credential.id,
        provider,
        key,
    }))
}

/// Reject obviously malformed keys. Does not check that the key is live.
pub fn validate_api_key(provider: Provider, key: &str) -> Result<(), String> {
    let key = key.trim();
    if key.is_empty() {
        return Err("API key must not be empty".to_string());
    }
    if key.chars().any(char::is_whitespace) {
        return Err("API key must not contain whitespace".to_string());
    }

    let (prefix, min_len) = match provider {
        Provider::Gemini => (Some("AIza"), 30),
        Provider::OpenAi => (Some("sk-"), 20),
        Provider::Zai => (None, 20),
    };

    if let Some(prefix) = prefix
        && !key.starts_with(prefix)
    {
        return Err(format!("{} keys start with '{}'", provider, prefix));
    }
    if key.len() < min_len {
        return Err(format!(
            "{} keys are at least {} characters long",
            provider, min_len
        ));
    }

    Ok(())
}

/// Mask a key for display: first four and last four characters.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 8 {
        return FULL_MASK.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
