pub mod validator;

use crate::request::TagMode;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Optional defaults read from `config.toml`.
///
/// Every field has a built-in default, so a missing file and an empty file
/// behave the same.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Defaults for clone and pull options (`[clone]`).
    #[serde(default, rename = "clone")]
    pub defaults: CloneDefaults,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CloneDefaults {
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default)]
    pub tags: TagMode,
    /// History depth; zero or below is the full history
    #[serde(default)]
    pub depth: i64,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub single_branch: bool,
    /// Key file path or inline key material
    #[serde(default)]
    pub identity: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct OutputConfig {
    #[serde(default = "default_color")]
    pub color: bool,
}

impl Default for CloneDefaults {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            tags: TagMode::default(),
            depth: 0,
            recursive: false,
            single_branch: false,
            identity: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: default_color(),
        }
    }
}

impl Config {
    /// Default location: `<config dir>/gclone/config.toml`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(crate::DEFAULT_CONFIG_PATH))
    }

    /// Loads the configuration for this run.
    ///
    /// An explicitly given path must exist. The default path is optional and
    /// falls back to built-in defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit path does not exist, or if the file
    /// cannot be read or parsed.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Configuration file not found: {}", path.display());
                }
                Self::load(path)
            }
            None => match Self::default_path() {
                Some(path) => Self::load(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Load configuration from a file; a missing file yields the defaults.
    ///
    /// Unknown keys are reported as warnings, not errors.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file exists but cannot be read
    /// - The file contains invalid TOML or invalid values
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        validator::ConfigValidator::new().warn_unknown_fields(&content);

        Ok(config)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value is out of range.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML config")?;

        if config.defaults.origin.trim().is_empty() {
            anyhow::bail!("clone.origin must not be empty");
        }

        Ok(config)
    }

    /// Applies the `[output]` section to the process.
    pub fn apply_output(&self) {
        if !self.output.color {
            colored::control::set_override(false);
        }
    }
}

fn default_origin() -> String {
    crate::DEFAULT_REMOTE_NAME.to_string()
}

const fn default_color() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_parse_all_sections() {
        let config = Config::parse(
            r#"
            [clone]
            origin = "upstream"
            tags = "following"
            depth = 3
            recursive = true
            single_branch = true
            identity = "~/.ssh/deploy_key"

            [output]
            color = false
            "#,
        )
        .unwrap();

        assert_eq!(config.defaults.origin, "upstream");
        assert_eq!(config.defaults.tags, TagMode::Following);
        assert_eq!(config.defaults.depth, 3);
        assert!(config.defaults.recursive);
        assert!(config.defaults.single_branch);
        assert_eq!(config.defaults.identity.as_deref(), Some("~/.ssh/deploy_key"));
        assert!(!config.output.color);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config = Config::parse("[clone]\ndepth = 1\n").unwrap();
        assert_eq!(config.defaults.origin, "origin");
        assert_eq!(config.defaults.tags, TagMode::All);
        assert!(config.output.color);
    }

    #[test]
    fn test_invalid_tag_mode() {
        assert!(Config::parse("[clone]\ntags = \"some\"\n").is_err());
    }

    #[test]
    fn test_empty_origin_rejected() {
        let err = Config::parse("[clone]\norigin = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("clone.origin"));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_resolve_explicit_missing_file_fails() {
        let dir = tempdir().unwrap();
        assert!(Config::resolve(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_resolve_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[clone]\norigin = \"mirror\"\n").unwrap();

        let config = Config::resolve(Some(&path)).unwrap();
        assert_eq!(config.defaults.origin, "mirror");
    }
}
