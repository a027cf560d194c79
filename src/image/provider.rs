//! Image provider trait.

use crate::error::Result;
use crate::image::types::{GenerationRequest, InlineImage};
use async_trait::async_trait;

/// Trait for the image generation backend.
///
/// One call to [`generate`](ImageProvider::generate) issues exactly one
/// outbound request. Implementations return [`LuminaError::EmptyResult`]
/// when the provider answered without any image data.
///
/// [`LuminaError::EmptyResult`]: crate::LuminaError::EmptyResult
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generates an image from the given request.
    async fn generate(&self, request: &GenerationRequest) -> Result<InlineImage>;

    /// Returns the model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Checks if the provider is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}
