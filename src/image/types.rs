//! Core types for image generation.

use crate::error::{LuminaError, Result};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Maps a MIME type to a format.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Aspect ratios accepted by the image model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 1:1 square aspect ratio.
    #[default]
    #[serde(rename = "1:1")]
    Square,
    /// 3:4 standard portrait aspect ratio.
    #[serde(rename = "3:4")]
    StandardPortrait,
    /// 4:3 standard landscape aspect ratio.
    #[serde(rename = "4:3")]
    Standard,
    /// 16:9 landscape (widescreen) aspect ratio.
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 portrait (tall) aspect ratio.
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    /// Every selectable ratio, in display order.
    pub const ALL: [AspectRatio; 5] = [
        Self::Square,
        Self::StandardPortrait,
        Self::Standard,
        Self::Landscape,
        Self::Portrait,
    ];

    /// Returns the aspect ratio as a string (e.g., "16:9").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::StandardPortrait => "3:4",
            Self::Standard => "4:3",
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = LuminaError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| {
                LuminaError::InvalidRequest(format!(
                    "unsupported aspect ratio '{s}' (expected one of 1:1, 3:4, 4:3, 16:9, 9:16)"
                ))
            })
    }
}

/// A request to generate an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The text prompt describing the desired image.
    pub prompt: String,
    /// Aspect ratio of the requested image.
    pub aspect_ratio: AspectRatio,
}

impl GenerationRequest {
    /// Creates a new request with the given prompt and the default ratio.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: AspectRatio::default(),
        }
    }

    /// Sets the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = ratio;
        self
    }
}

/// Base64 image payload returned inline by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// MIME type reported by the provider, if any.
    pub mime_type: Option<String>,
    /// Base64-encoded image bytes, exactly as returned.
    pub data: String,
}

impl InlineImage {
    /// Wraps the payload as a self-contained `data:` URL.
    ///
    /// Payloads without a MIME type are labelled `image/png`.
    pub fn to_data_url(&self) -> String {
        let mime = self
            .mime_type
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(ImageFormat::Png.mime_type());
        format!("data:{};base64,{}", mime, self.data)
    }
}

/// A completed generation, as held in the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    id: String,
    url: String,
    prompt: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
    aspect_ratio: AspectRatio,
}

impl GeneratedImage {
    /// Creates an image entry with a freshly generated id.
    pub fn new(
        inline: &InlineImage,
        prompt: impl Into<String>,
        timestamp: DateTime<Utc>,
        aspect_ratio: AspectRatio,
    ) -> Self {
        Self {
            id: new_image_id(),
            url: inline.to_data_url(),
            prompt: prompt.into(),
            timestamp,
            aspect_ratio,
        }
    }

    /// Display-list identity token.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Self-contained `data:` URL carrying the image.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The prompt this image was generated from.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// When the image was committed.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The ratio in force when the request was submitted.
    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    /// MIME type declared in the data URL.
    pub fn mime_type(&self) -> &str {
        self.url
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .unwrap_or(ImageFormat::Png.mime_type())
    }

    /// Image format, from the declared MIME type.
    pub fn format(&self) -> ImageFormat {
        ImageFormat::from_mime_type(self.mime_type()).unwrap_or_default()
    }

    /// The base64 payload inside the data URL.
    pub fn payload_base64(&self) -> &str {
        match self.url.find(";base64,") {
            Some(pos) => &self.url[pos + 8..],
            None => "",
        }
    }

    /// Decodes the payload to raw image bytes.
    pub fn decode_payload(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(self.payload_base64())
            .map_err(|e| LuminaError::Decode(e.to_string()))
    }

    /// Saves the decoded image to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.decode_payload()?)?;
        Ok(())
    }
}

fn new_image_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
