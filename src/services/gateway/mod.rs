//! External model gateway.
//!
//! One [`ModelGateway`] interface covers every supported provider; the
//! [`Provider`] tag picks the wire shape. Handlers receive the gateway as
//! injected application data, never through a global.

mod http;
mod retry;

pub use http::HttpGateway;
pub use retry::{backoff_delay, parse_retry_after, retry_on_rate_limit};

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Supported model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gemini `generateContent`.
    Gemini,
    /// OpenAI chat completions.
    OpenAi,
    /// Z.ai (OpenAI-compatible chat completions).
    Zai,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Zai => "zai",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Some(Self::Gemini),
            "openai" => Some(Self::OpenAi),
            "zai" | "z.ai" | "glm" => Some(Self::Zai),
            _ => None,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An image sent inline with a vision request.
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Standard base64 encoding of the image bytes.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// `data:` URL form used by OpenAI-compatible APIs.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

/// Gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Network failure or timeout before a response arrived
    #[error("{provider} request failed: {message}")]
    Transport { provider: Provider, message: String },

    /// Still rate limited after every retry
    #[error("{provider} rate limit exceeded after retries")]
    RateLimited {
        provider: Provider,
        retry_after_secs: Option<u64>,
    },

    /// Non-success status other than 429
    #[error("{provider} returned HTTP {status}: {message}")]
    Upstream {
        provider: Provider,
        status: u16,
        message: String,
    },

    /// Success status but no usable text in the body
    #[error("{provider} returned an unusable response: {message}")]
    InvalidResponse { provider: Provider, message: String },
}

/// Completion interface over a third-party model API.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Text-only completion.
    async fn complete_text(
        &self,
        provider: Provider,
        api_key: &SecretString,
        prompt: &str,
    ) -> Result<String, GatewayError>;

    /// Completion over one inline image plus a text instruction.
    async fn complete_vision(
        &self,
        provider: Provider,
        api_key: &SecretString,
        prompt: &str,
        image: &InlineImage,
    ) -> Result<String, GatewayError>;
}
