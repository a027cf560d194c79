//! Writing gallery images to disk.
//!
//! Export is stateless: it reads an image's payload and never touches the
//! controller or the gallery.

use crate::error::Result;
use crate::image::{GeneratedImage, ImageFormat};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Prefix of exported file names.
const FILE_PREFIX: &str = "lumina";

/// Returns the download file name for an export at `at`.
///
/// Names are `lumina-<millis>-<id>.<ext>`, so distinct images exported in the
/// same millisecond never share a path. The extension comes from the decoded
/// bytes when they are recognizable, else from the image's declared MIME type.
pub fn file_name(image: &GeneratedImage, data: &[u8], at: DateTime<Utc>) -> String {
    let format = ImageFormat::from_magic_bytes(data).unwrap_or_else(|| image.format());
    format!(
        "{}-{}-{}.{}",
        FILE_PREFIX,
        at.timestamp_millis(),
        image.id(),
        format.extension()
    )
}

/// Decodes `image` and writes it into `dir`, returning the written path.
///
/// The directory is created if missing.
pub fn export_image(image: &GeneratedImage, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let data = image.decode_payload()?;
    std::fs::create_dir_all(dir)?;

    let path = dir.join(file_name(image, &data, Utc::now()));
    std::fs::write(&path, &data)?;

    tracing::debug!(id = image.id(), path = %path.display(), bytes = data.len(), "exported image");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{AspectRatio, InlineImage};
    use base64::Engine;

    const PNG_BYTES: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3, 4];

    fn image_with(mime: Option<&str>, data: &[u8]) -> GeneratedImage {
        let inline = InlineImage {
            mime_type: mime.map(str::to_string),
            data: base64::engine::general_purpose::STANDARD.encode(data),
        };
        GeneratedImage::new(&inline, "export me", Utc::now(), AspectRatio::Square)
    }

    #[test]
    fn test_file_name_uses_timestamp_and_extension() {
        let image = image_with(Some("image/png"), &PNG_BYTES);
        let at = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        assert_eq!(
            file_name(&image, &PNG_BYTES, at),
            format!("lumina-1700000000123-{}.png", image.id())
        );
    }

    #[test]
    fn test_file_name_falls_back_to_mime() {
        let image = image_with(Some("image/jpeg"), b"not magic");
        let at = DateTime::from_timestamp_millis(5).unwrap();
        assert_eq!(
            file_name(&image, b"not magic", at),
            format!("lumina-5-{}.jpg", image.id())
        );
    }

    #[test]
    fn test_same_millisecond_exports_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let first = image_with(Some("image/png"), &PNG_BYTES);
        let second = image_with(Some("image/png"), &PNG_BYTES);
        let at = DateTime::from_timestamp_millis(42).unwrap();

        assert_ne!(
            file_name(&first, &PNG_BYTES, at),
            file_name(&second, &PNG_BYTES, at)
        );

        let a = export_image(&first, dir.path()).unwrap();
        let b = export_image(&second, dir.path()).unwrap();
        assert_ne!(a, b);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_export_writes_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");
        let image = image_with(None, &PNG_BYTES);

        let path = export_image(&image, &target).unwrap();

        assert!(path.starts_with(&target));
        assert_eq!(path.extension().unwrap(), "png");
        assert_eq!(std::fs::read(&path).unwrap(), PNG_BYTES);
    }
}
