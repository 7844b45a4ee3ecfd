//! Host configuration, read from TOML.

use std::path::Path;

use serde::Deserialize;
use tailor_assets::MetadataConventions;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "tailor.toml";

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TailorConfig {
    /// Model to load at startup.
    pub model: Option<String>,
    /// Catalog to load at startup.
    pub catalog: Option<String>,
    pub metadata: MetadataConventions,
    pub app: AppSettings,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub frame_ms: u64,
    /// Queued commands wait this long for pending loads, then run anyway.
    pub load_timeout_ms: u64,
    pub io_threads: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            frame_ms: 16,
            load_timeout_ms: 10_000,
            io_threads: 2,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

impl TailorConfig {
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    /// An explicit path must exist. Without one, `tailor.toml` is used if
    /// present and the defaults otherwise.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    log::info!("[Config] Using {}", DEFAULT_CONFIG_FILE);
                    Self::load_from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(TailorConfig::from_toml("").unwrap(), TailorConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = TailorConfig::from_toml(
            r#"
            model = "https://example.com/chair.glb"

            [metadata]
            colors_key = "palette"

            [app]
            frame_ms = 33
            "#,
        )
        .unwrap();

        assert_eq!(config.model.as_deref(), Some("https://example.com/chair.glb"));
        assert_eq!(config.catalog, None);
        assert_eq!(config.metadata.material_prefix, "material");
        assert_eq!(config.metadata.colors_key, "palette");
        assert_eq!(config.app.frame_ms, 33);
        assert_eq!(config.app.load_timeout_ms, 10_000);
    }

    #[test]
    fn wrong_types_are_errors() {
        assert!(TailorConfig::from_toml("[app]\nframe_ms = \"fast\"").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let result = TailorConfig::resolve(Some(Path::new("/definitely/not/here/tailor.toml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
