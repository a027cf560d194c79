//! Image generation providers.

mod gemini;

pub use gemini::{
    GeminiProvider, GeminiProviderBuilder, DEFAULT_API_KEY_ENV, DEFAULT_ENDPOINT, MODEL_ID,
};
