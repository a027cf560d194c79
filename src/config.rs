//! Session configuration.
//!
//! Values are resolved in order: built-in defaults, then a TOML file
//! (an explicit path, or `lumina.toml` in the working directory if present),
//! then `LUMINA_*` environment variables.

use crate::error::{LuminaError, Result};
use crate::gallery::GalleryLimit;
use crate::image::providers::{GeminiProvider, DEFAULT_API_KEY_ENV, DEFAULT_ENDPOINT};
use crate::image::AspectRatio;
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "lumina.toml";

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// API base URL.
    pub endpoint: String,
    /// Environment variable the API key is read from on every request.
    pub api_key_env: String,
    /// Ratio selected when a session starts.
    pub default_aspect_ratio: AspectRatio,
    /// Gallery cap; absent means unbounded.
    pub gallery_limit: Option<NonZeroUsize>,
    /// Directory exported images are written to.
    pub export_dir: PathBuf,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            default_aspect_ratio: AspectRatio::default(),
            gallery_limit: None,
            export_dir: PathBuf::from("."),
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from defaults, file and environment.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| LuminaError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&raw)
    }

    /// Parses TOML text.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| LuminaError::Config(e.to_string()))
    }

    /// Applies `LUMINA_*` overrides from `lookup`.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("LUMINA_ENDPOINT") {
            self.endpoint = v;
        }
        if let Some(v) = lookup("LUMINA_API_KEY_ENV") {
            self.api_key_env = v;
        }
        if let Some(v) = lookup("LUMINA_ASPECT_RATIO") {
            self.default_aspect_ratio = v.parse()?;
        }
        if let Some(v) = lookup("LUMINA_GALLERY_LIMIT") {
            self.gallery_limit = match v.trim() {
                "" | "unbounded" => None,
                n => Some(n.parse().map_err(|_| {
                    LuminaError::Config(format!(
                        "LUMINA_GALLERY_LIMIT must be a positive number or 'unbounded': {n}"
                    ))
                })?),
            };
        }
        if let Some(v) = lookup("LUMINA_EXPORT_DIR") {
            self.export_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("LUMINA_LOG") {
            self.log_level = v;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.api_key_env.trim().is_empty() {
            return Err(LuminaError::Config("api_key_env must not be empty".into()));
        }
        Ok(())
    }

    /// Gallery size policy.
    pub fn gallery_limit(&self) -> GalleryLimit {
        GalleryLimit::from_cap(self.gallery_limit)
    }

    /// Builds the provider described by this configuration.
    pub fn provider(&self) -> GeminiProvider {
        GeminiProvider::builder()
            .endpoint(&self.endpoint)
            .api_key_env(&self.api_key_env)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.api_key_env, "API_KEY");
        assert_eq!(config.default_aspect_ratio, AspectRatio::Square);
        assert_eq!(config.gallery_limit(), GalleryLimit::Unbounded);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = Config::from_toml(
            r#"
            default_aspect_ratio = "16:9"
            gallery_limit = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.default_aspect_ratio, AspectRatio::Landscape);
        assert_eq!(config.gallery_limit(), GalleryLimit::bounded(50).unwrap());
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_from_toml_rejects_bad_ratio_and_unknown_keys() {
        assert!(Config::from_toml(r#"default_aspect_ratio = "21:9""#).is_err());
        assert!(Config::from_toml(r#"model = "other""#).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("LUMINA_ENDPOINT", "http://localhost:9000/v1beta"),
                ("LUMINA_ASPECT_RATIO", "9:16"),
                ("LUMINA_GALLERY_LIMIT", "10"),
                ("LUMINA_LOG", "debug"),
            ]))
            .unwrap();

        assert_eq!(config.endpoint, "http://localhost:9000/v1beta");
        assert_eq!(config.default_aspect_ratio, AspectRatio::Portrait);
        assert_eq!(config.gallery_limit, NonZeroUsize::new(10));
        assert_eq!(config.log_level, "debug");

        config
            .apply_env(env(&[("LUMINA_GALLERY_LIMIT", "unbounded")]))
            .unwrap();
        assert_eq!(config.gallery_limit, None);
    }

    #[test]
    fn test_env_rejects_invalid_values() {
        let mut config = Config::default();
        assert!(config
            .apply_env(env(&[("LUMINA_ASPECT_RATIO", "2:1")]))
            .is_err());
        assert!(config
            .apply_env(env(&[("LUMINA_GALLERY_LIMIT", "lots")]))
            .is_err());
    }

    #[test]
    fn test_zero_gallery_limit_rejected() {
        assert!(Config::from_toml("gallery_limit = 0").is_err());

        let mut config = Config::default();
        assert!(config
            .apply_env(env(&[("LUMINA_GALLERY_LIMIT", "0")]))
            .is_err());
    }

    #[test]
    fn test_validate_empty_key_env() {
        let config = Config {
            api_key_env: " ".into(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "export_dir = \"out\"\nlog_level = \"info\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.export_dir, PathBuf::from("out"));
        assert_eq!(config.log_level, "info");

        let missing = dir.path().join("missing.toml");
        assert!(Config::load(Some(missing.as_path())).is_err());
    }
}
