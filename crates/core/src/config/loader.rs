//! Configuration loader
//!
//! Finds and parses alias configuration files. Files are searched from the
//! working directory upward and merged so that the closest file wins.

use std::path::{Path, PathBuf};

use super::AliasConfig;
use crate::error::{Error, Result};
use crate::resolve::{template_warnings, validate_config};
use crate::shell::Environment;

/// File names recognised during directory discovery, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[".pae.json", ".pae.yaml", ".pae.yml", ".pae.toml"];

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "PAE_CONFIG";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for this invocation.
    ///
    /// An explicit path wins, then `PAE_CONFIG`, then discovery from `cwd`.
    /// Finding nothing is not an error: commands that need no configuration
    /// still work against an empty one.
    pub fn load(explicit: Option<&Path>, env: &Environment, cwd: &Path) -> Result<AliasConfig> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }

        if let Some(path) = env.get(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
            tracing::debug!("Using config from {}: {}", CONFIG_ENV_VAR, path);
            return Self::load_file(Path::new(path));
        }

        Self::load_from_path(cwd, env.get("HOME").map(Path::new))
    }

    /// Walk up from `start`, merging every config file found.
    ///
    /// The walk stops after `home` (when given) or at the filesystem root.
    pub fn load_from_path(start: &Path, home: Option<&Path>) -> Result<AliasConfig> {
        let mut found = Vec::new();
        let mut check_path = if start.is_file() {
            start.parent().unwrap_or(start)
        } else {
            start
        };

        loop {
            if let Some(path) = Self::find_in_dir(check_path) {
                tracing::debug!("Found config at: {:?}", path);
                found.push(path);
            }

            if home == Some(check_path) {
                break;
            }

            match check_path.parent() {
                Some(parent) => check_path = parent,
                None => break,
            }
        }

        if found.is_empty() {
            tracing::debug!("No config files found, using empty config");
            return Ok(AliasConfig::default());
        }

        // Least specific first so closer files override
        let mut merged = AliasConfig::default();
        for path in found.iter().rev() {
            merged.merge(Self::parse_file(path)?);
        }
        Self::validated(merged)
    }

    /// Load and validate a single file
    pub fn load_file(path: &Path) -> Result<AliasConfig> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        Self::validated(Self::parse_file(path)?)
    }

    fn find_in_dir(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    fn parse_file(path: &Path) -> Result<AliasConfig> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("Failed to read config file {:?}: {}", path, e);
                return Err(e.into());
            }
        };

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);
        match extension.as_deref() {
            Some("json") => AliasConfig::from_json(&contents),
            Some("yaml") | Some("yml") => AliasConfig::from_yaml(&contents),
            Some("toml") => AliasConfig::from_toml(&contents),
            _ => Err(Error::UnsupportedFormat(path.to_path_buf())),
        }
    }

    fn validated(config: AliasConfig) -> Result<AliasConfig> {
        for warning in template_warnings(&config) {
            tracing::warn!("{}", warning);
        }

        let errors = validate_config(&config);
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(Error::Config(errors.join("; ")))
        }
    }
}
