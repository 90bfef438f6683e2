//! Studio configuration.
//!
//! One optional `maquette.toml` configures the service endpoint and the
//! defaults the CLI falls back to. All keys have stock values, so a config
//! file only needs the overrides:
//!
//! ```toml
//! [service]
//! base_url = "https://render.example.com"
//! model = "studio-xl-turbo"
//!
//! [defaults]
//! count = 4
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::AspectRatio;
use crate::service::ResolutionTier;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full configuration loaded from `maquette.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudioConfig {
    /// Generation-service connection settings.
    pub service: ServiceConfig,
    /// Defaults for generation requests.
    pub defaults: DefaultsConfig,
    /// Default mask shaping for composites.
    pub compositing: CompositingConfig,
}

impl StudioConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.base_url.is_empty() {
            return Err(ConfigError::Validation(
                "service.base_url must not be empty".into(),
            ));
        }
        if self.service.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "service.timeout_secs must be positive".into(),
            ));
        }
        if !(1..=8).contains(&self.defaults.count) {
            return Err(ConfigError::Validation(
                "defaults.count must be between 1 and 8".into(),
            ));
        }
        if self.defaults.aspect_ratio[0] == 0 || self.defaults.aspect_ratio[1] == 0 {
            return Err(ConfigError::Validation(
                "defaults.aspect_ratio values must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// The default aspect ratio as a geometry type.
    pub fn default_ratio(&self) -> AspectRatio {
        AspectRatio::new(self.defaults.aspect_ratio[0], self.defaults.aspect_ratio[1])
    }
}

/// Generation-service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Base URL of the generation endpoint.
    pub base_url: String,
    /// Name of the environment variable holding the API key. The key itself
    /// never lives in the config file.
    pub api_key_env: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Request timeout. Generations routinely take tens of seconds.
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            api_key_env: "MAQUETTE_API_KEY".into(),
            model: "studio-xl".into(),
            timeout_secs: 120,
        }
    }
}

/// Defaults for generation requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Images per generation call (1-8).
    pub count: u32,
    /// Aspect ratio as `[width, height]`.
    pub aspect_ratio: [u32; 2],
    /// Output resolution tier.
    pub resolution: ResolutionTier,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            count: 1,
            aspect_ratio: [16, 9],
            resolution: ResolutionTier::TwoK,
        }
    }
}

/// Default mask shaping for composites.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositingConfig {
    /// Pixels to grow the mask before blending.
    pub expansion: u32,
    /// Feather radius at the mask boundary.
    pub edge_blend: u32,
}

impl Default for CompositingConfig {
    fn default() -> Self {
        Self {
            expansion: 8,
            edge_blend: 12,
        }
    }
}

/// Load and validate a config file.
pub fn load(path: &Path) -> Result<StudioConfig, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    let config: StudioConfig = toml::from_str(&text)?;
    config.validate()?;
    Ok(config)
}

/// Resolve the effective config: an explicit path must exist; otherwise
/// `maquette.toml` in the working directory is used when present, and stock
/// defaults when not.
pub fn load_or_default(explicit: Option<&Path>) -> Result<StudioConfig, ConfigError> {
    match explicit {
        Some(path) => load(path),
        None => {
            let implicit = Path::new("maquette.toml");
            if implicit.exists() {
                load(implicit)
            } else {
                Ok(StudioConfig::default())
            }
        }
    }
}

/// A fully documented config file with every option at its stock value.
pub fn stock_config_toml() -> String {
    r#"# maquette configuration
# All options are optional - defaults shown below.

[service]
# Base URL of the generation endpoint.
base_url = "http://localhost:8000"
# Environment variable holding the API key (the key never lives here).
api_key_env = "MAQUETTE_API_KEY"
# Model identifier sent with each request.
model = "studio-xl"
# Request timeout in seconds. Generations routinely take tens of seconds.
timeout_secs = 120

[defaults]
# Images per generation call (1-8).
count = 1
# Aspect ratio as [width, height].
aspect_ratio = [16, 9]
# Output resolution tier: "1k", "2k" or "4k".
resolution = "2k"

[compositing]
# Pixels to grow the mask before blending.
expansion = 8
# Feather radius at the mask boundary, in pixels.
edge_blend = 12
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        StudioConfig::default().validate().unwrap();
    }

    #[test]
    fn stock_config_parses_back_to_defaults() {
        let parsed: StudioConfig = toml::from_str(&stock_config_toml()).unwrap();
        parsed.validate().unwrap();
        assert_eq!(parsed.service.model, StudioConfig::default().service.model);
        assert_eq!(parsed.defaults.count, 1);
        assert_eq!(parsed.compositing.edge_blend, 12);
    }

    #[test]
    fn sparse_override_keeps_other_defaults() {
        let cfg: StudioConfig = toml::from_str(
            r#"
            [defaults]
            count = 4
            "#,
        )
        .unwrap();
        assert_eq!(cfg.defaults.count, 4);
        assert_eq!(cfg.defaults.aspect_ratio, [16, 9]);
        assert_eq!(cfg.service.timeout_secs, 120);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = toml::from_str::<StudioConfig>(
            r#"
            [service]
            bas_url = "oops"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn count_out_of_range_fails_validation() {
        let cfg: StudioConfig = toml::from_str("[defaults]\ncount = 9\n").unwrap();
        assert!(matches!(
            cfg.validate().unwrap_err(),
            ConfigError::Validation(_)
        ));
    }

    #[test]
    fn zero_ratio_term_fails_validation() {
        let cfg: StudioConfig = toml::from_str("[defaults]\naspect_ratio = [0, 9]\n").unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_reads_file_and_validates() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("maquette.toml");
        std::fs::write(&path, "[service]\nmodel = \"studio-mini\"\n").unwrap();
        let cfg = load(&path).unwrap();
        assert_eq!(cfg.service.model, "studio-mini");

        std::fs::write(&path, "[defaults]\ncount = 0\n").unwrap();
        assert!(load(&path).is_err());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        assert!(load_or_default(Some(Path::new("/nonexistent/maquette.toml"))).is_err());
    }
}
