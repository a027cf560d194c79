//! Gemini (Google) image generation provider.

use crate::error::{provider_message, LuminaError, Result};
use crate::image::provider::ImageProvider;
use crate::image::types::{GenerationRequest, InlineImage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Image model every request targets.
pub const MODEL_ID: &str = "gemini-2.5-flash-image";

/// Default Generative Language API base URL.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the API key.
pub const DEFAULT_API_KEY_ENV: &str = "API_KEY";

/// Secondary variable consulted when the primary one is unset.
const FALLBACK_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Builder for GeminiProvider.
#[derive(Debug, Clone)]
pub struct GeminiProviderBuilder {
    api_key: Option<String>,
    api_key_env: String,
    endpoint: String,
}

impl Default for GeminiProviderBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl GeminiProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a fixed API key instead of reading the environment per request.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the environment variable the key is read from.
    pub fn api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = var.into();
        self
    }

    /// Sets the API base URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Builds the provider.
    ///
    /// The key is not validated here; a missing key is sent as empty and
    /// rejected upstream.
    pub fn build(self) -> GeminiProvider {
        GeminiProvider {
            client: reqwest::Client::new(),
            api_key: self.api_key,
            api_key_env: self.api_key_env,
            endpoint: self.endpoint,
        }
    }
}

/// Gemini image generation provider.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    api_key_env: String,
    endpoint: String,
}

impl GeminiProvider {
    /// Creates a new `GeminiProviderBuilder`.
    pub fn builder() -> GeminiProviderBuilder {
        GeminiProviderBuilder::new()
    }

    fn resolve_api_key(&self) -> String {
        if let Some(ref key) = self.api_key {
            return key.clone();
        }
        std::env::var(&self.api_key_env)
            .or_else(|_| std::env::var(FALLBACK_API_KEY_ENV))
            .unwrap_or_default()
    }

    async fn generate_impl(&self, request: &GenerationRequest) -> Result<InlineImage> {
        let start = Instant::now();
        let url = format!("{}/models/{}:generateContent", self.endpoint, MODEL_ID);
        let body = GeminiRequest::from_generation_request(request);

        tracing::debug!(model = MODEL_ID, aspect_ratio = %request.aspect_ratio, "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.resolve_api_key())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text));
        }

        let text = response.text().await?;
        let image = parse_response(&text)?;

        tracing::debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            payload_len = image.data.len(),
            "generateContent returned image data"
        );
        Ok(image)
    }
}

fn parse_error(status: u16, text: &str) -> LuminaError {
    let message = provider_message(text);
    match status {
        429 => LuminaError::RateLimited(message),
        401 | 403 => LuminaError::Auth(message),
        _ => LuminaError::Api { status, message },
    }
}

/// Parses a successful `generateContent` body into its image payload.
///
/// A body that is not a valid response surfaces as [`LuminaError::Json`].
fn parse_response(body: &str) -> Result<InlineImage> {
    serde_json::from_str::<GeminiResponse>(body)?.into_first_image()
}

#[async_trait]
impl ImageProvider for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<InlineImage> {
        self.generate_impl(request).await
    }

    fn model(&self) -> &str {
        MODEL_ID
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!("{}/models/{}", self.endpoint, MODEL_ID);

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", self.resolve_api_key())
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(LuminaError::Auth("Invalid API key".into())),
            404 => Err(LuminaError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            )),
            s if !(200..300).contains(&s) => Err(LuminaError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

#[derive(Debug, Serialize)]
struct GeminiRequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    image_config: GeminiImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiImageConfig {
    aspect_ratio: &'static str,
}

impl GeminiRequest {
    fn from_generation_request(req: &GenerationRequest) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiRequestPart {
                    text: req.prompt.trim().to_string(),
                }],
            }],
            generation_config: GeminiConfig {
                image_config: GeminiImageConfig {
                    aspect_ratio: req.aspect_ratio.as_str(),
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Option<Vec<GeminiPartResponse>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

impl GeminiResponse {
    /// Takes the first image-bearing part of the first candidate.
    ///
    /// Later candidates and later image parts are ignored.
    fn into_first_image(self) -> Result<InlineImage> {
        let Some(candidate) = self.candidates.unwrap_or_default().into_iter().next() else {
            tracing::debug!("response carried no candidates");
            return Err(LuminaError::EmptyResult);
        };

        if let Some(ref reason) = candidate.finish_reason {
            tracing::debug!(finish_reason = %reason, "first candidate finish reason");
        }

        candidate
            .content
            .and_then(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.inline_data)
            .find_map(|inline| {
                inline.data.map(|data| InlineImage {
                    mime_type: inline.mime_type,
                    data,
                })
            })
            .ok_or(LuminaError::EmptyResult)
    }
}
