#![warn(missing_docs)]
//! Lumina - prompt-to-image generation sessions on Gemini image models.
//!
//! A session pairs a [`GenerationController`], which runs at most one
//! generation at a time, with a newest-first [`GalleryStore`] of the
//! results.
//!
//! # Quick Start
//!
//! ```no_run
//! use lumina::{AspectRatio, GeminiProvider, GenerationController, SubmitOutcome};
//!
//! #[tokio::main]
//! async fn main() -> lumina::Result<()> {
//!     let controller = GenerationController::new(GeminiProvider::builder().build());
//!     controller.set_aspect_ratio(AspectRatio::Landscape);
//!     controller.set_prompt("A lighthouse on a cliff at dusk");
//!
//!     match controller.submit_current().await {
//!         SubmitOutcome::Completed(image) => image.save("lighthouse.png")?,
//!         SubmitOutcome::Failed(failure) => eprintln!("{}", failure.message),
//!         SubmitOutcome::Rejected(_) => {}
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The API key is read from `API_KEY` (or `GOOGLE_API_KEY`) on every request.

pub mod config;
pub mod controller;
mod error;
pub mod export;
pub mod gallery;
pub mod image;
pub mod state;

// Re-export error types at crate root
pub use error::{FailureKind, LuminaError, Result, EMPTY_RESULT_MESSAGE, FALLBACK_MESSAGE};

pub use config::Config;
pub use controller::{GenerationController, GenerationFailure, Rejection, SubmitOutcome};
pub use gallery::{GalleryLimit, GalleryStore};
pub use image::providers::{GeminiProvider, GeminiProviderBuilder};
pub use image::{
    AspectRatio, GeneratedImage, GenerationRequest, ImageFormat, ImageProvider, InlineImage,
};
pub use state::{GenerationRequestState, Phase};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::controller::{GenerationController, SubmitOutcome};
    pub use crate::error::{LuminaError, Result};
    pub use crate::image::providers::GeminiProvider;
    pub use crate::image::{AspectRatio, GeneratedImage, ImageProvider};
}
