//! Configuration file loading for vizbuild.
//!
//! Discovers and loads `vizbuild.toml` from the package root and merges it
//! over [`BuilderSettings::default`]. Every key is optional.

use crate::settings::BuilderSettings;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "vizbuild.toml";

/// Top-level configuration from vizbuild.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VizbuildConfig {
    pub build: BuildConfig,
    pub api: ApiConfig,
    pub watch: WatchConfig,
}

/// `[build]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Build output directory relative to the package root.
    pub drop_folder: Option<Utf8PathBuf>,

    /// Bound on nested `source()` substitutions.
    pub max_source_replacements: Option<usize>,
}

/// `[api]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Folder holding vendored API versions.
    pub folder: Option<Utf8PathBuf>,

    /// Type-definition file tsconfig.json must reference.
    pub type_definitions: Option<String>,

    pub capabilities_schema: Option<String>,
    pub dependencies_schema: Option<String>,
    pub string_resources_schema: Option<String>,
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Scheduler period in milliseconds.
    pub poll_interval_ms: Option<u64>,
}

impl VizbuildConfig {
    /// Applies every configured key over `base`.
    pub fn apply(&self, mut base: BuilderSettings) -> BuilderSettings {
        if let Some(v) = &self.build.drop_folder {
            base.drop_folder = v.clone();
        }
        if let Some(v) = self.build.max_source_replacements {
            base.max_source_replacements = v;
        }
        if let Some(v) = &self.api.folder {
            base.api_folder = v.clone();
        }
        if let Some(v) = &self.api.type_definitions {
            base.type_definitions_file = v.clone();
        }
        if let Some(v) = &self.api.capabilities_schema {
            base.capabilities_schema = v.clone();
        }
        if let Some(v) = &self.api.dependencies_schema {
            base.dependencies_schema = v.clone();
        }
        if let Some(v) = &self.api.string_resources_schema {
            base.string_resources_schema = v.clone();
        }
        if let Some(ms) = self.watch.poll_interval_ms {
            base.poll_interval = Duration::from_millis(ms.max(1));
        }
        base
    }
}

/// Discover the vizbuild.toml config file in the package root.
pub fn discover_config(package_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = package_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

pub fn load_config(path: &Utf8Path) -> anyhow::Result<VizbuildConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<VizbuildConfig> {
    let config: VizbuildConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load settings for a package root, falling back to defaults when no
/// config file exists.
pub fn load_or_default(package_root: &Utf8Path) -> anyhow::Result<BuilderSettings> {
    match discover_config(package_root) {
        Some(path) => Ok(load_config(&path)?.apply(BuilderSettings::default())),
        None => Ok(BuilderSettings::default()),
    }
}
