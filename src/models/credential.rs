//! Stored model credential DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::services::gateway::Provider;

/// Request to store a new provider credential.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCredentialRequest {
    pub provider: Provider,
    /// Human-readable label.
    pub label: String,
    /// The raw key. Encrypted before it is written anywhere.
    #[schema(value_type = String)]
    pub key: secrecy::SecretString,
    /// Make this the active stored credential.
    #[serde(default)]
    pub activate: bool,
}

/// Stored credential with its secret masked.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CredentialResponse {
    pub id: Uuid,
    pub provider: Provider,
    pub label: String,
    /// First and last four characters of the key.
    pub masked_key: String,
    pub is_active: bool,
    pub is_valid: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Credential list envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CredentialListResponse {
    pub success: bool,
    pub credentials: Vec<CredentialResponse>,
    /// Providers with a credential configured in the server environment.
    pub env_providers: Vec<Provider>,
}

/// Single credential envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CredentialEnvelope {
    pub success: bool,
    pub credential: CredentialResponse,
}
