use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declared package configuration (`pbiviz.json`).
///
/// Only the fields the build engine reads are typed; everything else is kept
/// in `extra` so the assembled manifest is a faithful deep copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualConfig {
    pub visual: VisualInfo,

    pub api_version: String,

    pub assets: Assets,

    /// Package-relative path of the capabilities document.
    pub capabilities: Utf8PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Utf8PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_resources: Option<Vec<Utf8PathBuf>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualInfo {
    pub guid: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assets {
    pub icon: Utf8PathBuf,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A visual package rooted at `base_path`.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualPackage {
    pub base_path: Utf8PathBuf,
    pub config: VisualConfig,
}

impl VisualPackage {
    pub fn new(base_path: impl Into<Utf8PathBuf>, config: VisualConfig) -> Self {
        Self {
            base_path: base_path.into(),
            config,
        }
    }

    /// Resolves a package-relative path against the package root.
    pub fn build_path(&self, rel: impl AsRef<Utf8Path>) -> Utf8PathBuf {
        let rel = rel.as_ref();
        if rel.is_absolute() {
            rel.to_path_buf()
        } else {
            self.base_path.join(rel)
        }
    }

    /// Name of the versioned API folder, e.g. `v1.7.0`.
    pub fn api_version_dir_name(&self) -> String {
        format!("v{}", self.config.api_version)
    }

    pub fn guid(&self) -> &str {
        &self.config.visual.guid
    }
}
