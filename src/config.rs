//! Configuration for the reference resolver tooling
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (refs.toml)
//! - Environment variables (REFS__*)
//!
//! ## Example config file (refs.toml):
//! ```toml
//! [resolver]
//! capture_roots_by_ref = true
//!
//! [loader]
//! max_depth = 32
//!
//! [export]
//! output_format = "pretty"
//! reference_prefix = "#/components/schemas/"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefsConfig {
    /// Resolver settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Fragment loader settings
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,
}

/// Resolver configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Name every root fragment up front instead of waiting for reuse
    #[serde(default)]
    pub capture_roots_by_ref: bool,
}

/// Loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Maximum nesting of `$type` requests before loading fails
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Output format (pretty or compact)
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Prefix prepended to reference names in `$ref` values
    #[serde(default = "default_reference_prefix")]
    pub reference_prefix: String,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

fn default_max_depth() -> usize {
    32
}

fn default_reference_prefix() -> String {
    "#/components/schemas/".to_string()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Pretty,
            reference_prefix: default_reference_prefix(),
        }
    }
}

impl RefsConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, optionally layering a specific file on top
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "refs.toml",
            ".refs.toml",
            "config/refs.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "refs") {
            let xdg_config = config_dir.config_dir().join("refs.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // REFS__EXPORT__OUTPUT_FORMAT=compact etc.
        builder = builder.add_source(
            Environment::with_prefix("REFS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RefsConfig::default();
        assert!(!config.resolver.capture_roots_by_ref);
        assert_eq!(config.loader.max_depth, 32);
        assert_eq!(config.export.output_format, OutputFormat::Pretty);
        assert_eq!(config.export.reference_prefix, "#/components/schemas/");
    }

    #[test]
    fn test_serialize_config() {
        let config = RefsConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[resolver]"));
        assert!(toml_str.contains("[export]"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[resolver]\ncapture_roots_by_ref = true\n\n[export]\noutput_format = \"compact\"\n",
        )
        .unwrap();

        let config = RefsConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert!(config.resolver.capture_roots_by_ref);
        assert_eq!(config.export.output_format, OutputFormat::Compact);
        assert_eq!(config.loader.max_depth, 32);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = RefsConfig::default();
        config.loader.max_depth = 8;
        config.save(path.to_str().unwrap()).unwrap();

        let loaded = RefsConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(loaded.loader.max_depth, 8);
    }
}
