//! HTTP implementation of [`ModelGateway`] over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::retry::retry_on_rate_limit;
use super::{GatewayError, InlineImage, ModelGateway, Provider};
use crate::config::ModelSettings;

const MAX_OUTPUT_TOKENS: u32 = 4096;
const TEMPERATURE: f32 = 0.1;

// Gemini generateContent shapes

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart<'a> {
    Text { text: &'a str },
    InlineData { inline_data: GeminiInlineData<'a> },
}

#[derive(Debug, Serialize)]
struct GeminiInlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

// OpenAI-compatible chat completion shapes

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ChatContent<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ChatContent<'a> {
    #[serde(rename = "text")]
    Text { text: &'a str },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ChatImageUrl },
}

#[derive(Debug, Serialize)]
struct ChatImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

// Both APIs report failures as {"error": {"message": ...}}
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Gateway backed by a shared reqwest client.
///
/// Built once at startup; the client's connection pool is shared by every
/// request handler.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    settings: ModelSettings,
}

impl HttpGateway {
    pub fn new(settings: ModelSettings) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Transport {
                provider: settings.default_provider,
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, settings })
    }

    async fn send(
        &self,
        provider: Provider,
        api_key: &SecretString,
        prompt: &str,
        image: Option<&InlineImage>,
    ) -> Result<String, GatewayError> {
        let endpoint = self.settings.endpoint(provider);

        let body = match provider {
            Provider::Gemini => {
                let mut parts = vec![GeminiPart::Text { text: prompt }];
                if let Some(image) = image {
                    parts.push(GeminiPart::InlineData {
                        inline_data: GeminiInlineData {
                            mime_type: &image.mime_type,
                            data: image.to_base64(),
                        },
                    });
                }
                serde_json::to_vec(&GeminiRequest {
                    contents: vec![GeminiContent { parts }],
                    generation_config: GeminiGenerationConfig {
                        temperature: TEMPERATURE,
                        max_output_tokens: MAX_OUTPUT_TOKENS,
                    },
                })
            }
            Provider::OpenAi | Provider::Zai => {
                let mut content = vec![ChatContent::Text { text: prompt }];
                if let Some(image) = image {
                    content.push(ChatContent::ImageUrl {
                        image_url: ChatImageUrl {
                            url: image.to_data_url(),
                        },
                    });
                }
                serde_json::to_vec(&ChatRequest {
                    model: &endpoint.model,
                    messages: vec![ChatMessage {
                        role: "user",
                        content,
                    }],
                    max_tokens: MAX_OUTPUT_TOKENS,
                    temperature: TEMPERATURE,
                })
            }
        }
        .map_err(|e| GatewayError::InvalidResponse {
            provider,
            message: format!("Failed to encode request: {}", e),
        })?;

        let url = match provider {
            Provider::Gemini => format!(
                "{}/models/{}:generateContent",
                endpoint.base_url, endpoint.model
            ),
            Provider::OpenAi | Provider::Zai => format!("{}/chat/completions", endpoint.base_url),
        };

        debug!(
            "Sending {} request to {} ({} bytes, image: {})",
            provider,
            url,
            body.len(),
            image.is_some()
        );

        let response = retry_on_rate_limit(
            provider,
            self.settings.max_retries,
            self.settings.initial_backoff_ms,
            || {
                let request = self
                    .client
                    .post(&url)
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(body.clone());
                let request = match provider {
                    Provider::Gemini => request.header("x-goog-api-key", api_key.expose_secret()),
                    Provider::OpenAi | Provider::Zai => request.bearer_auth(api_key.expose_secret()),
                };
                async move {
                    request.send().await.map_err(|e| GatewayError::Transport {
                        provider,
                        message: e.to_string(),
                    })
                }
            },
        )
        .await?;

        let status = response.status();
        let text = response.text().await.map_err(|e| GatewayError::Transport {
            provider,
            message: e.to_string(),
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| truncate(&text, 500));
            return Err(GatewayError::Upstream {
                provider,
                status: status.as_u16(),
                message,
            });
        }

        extract_completion_text(provider, &text)
    }
}

/// Pull the completion text out of a successful response body.
fn extract_completion_text(provider: Provider, body: &str) -> Result<String, GatewayError> {
    let invalid = |message: String| GatewayError::InvalidResponse { provider, message };

    let text = match provider {
        Provider::Gemini => {
            let response: GeminiResponse =
                serde_json::from_str(body).map_err(|e| invalid(e.to_string()))?;
            response
                .candidates
                .and_then(|candidates| candidates.into_iter().next())
                .and_then(|candidate| candidate.content)
                .map(|content| {
                    content
                        .parts
                        .into_iter()
                        .filter_map(|part| part.text)
                        .collect::<Vec<_>>()
                        .join("")
                })
        }
        Provider::OpenAi | Provider::Zai => {
            let response: ChatResponse =
                serde_json::from_str(body).map_err(|e| invalid(e.to_string()))?;
            response
                .choices
                .and_then(|choices| choices.into_iter().next())
                .and_then(|choice| choice.message.content)
        }
    };

    text.ok_or_else(|| invalid("no completion text".to_string()))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    }
}

#[async_trait]
impl ModelGateway for HttpGateway {
    async fn complete_text(
        &self,
        provider: Provider,
        api_key: &SecretString,
        prompt: &str,
    ) -> Result<String, GatewayError> {
        self.send(provider, api_key, prompt, None).await
    }

    async fn complete_vision(
        &self,
        provider: Provider,
        api_key: &SecretString,
        prompt: &str,
        image: &InlineImage,
    ) -> Result<String, GatewayError> {
        self.send(provider, api_key, prompt, Some(image)).await
    }
}
