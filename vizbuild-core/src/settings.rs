//! Clap-free settings for the build pipeline and watch engine.

use camino::{Utf8Path, Utf8PathBuf};
use std::time::Duration;
use vizbuild_types::{VisualPackage, files};

/// Default period of the rebuild scheduler.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Upper bound on nested `source()` substitutions per script.
pub const DEFAULT_MAX_SOURCE_REPLACEMENTS: usize = 100;

/// Build-engine settings, injected at construction and fixed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderSettings {
    /// Build output directory, relative to the package root.
    pub drop_folder: Utf8PathBuf,

    /// Folder holding the vendored API versions, relative to the package root.
    pub api_folder: Utf8PathBuf,

    pub poll_interval: Duration,

    pub tsconfig_file: String,
    pub type_definitions_file: String,

    // Schemas inside `<api_folder>/v<version>/`
    pub capabilities_schema: String,
    pub dependencies_schema: String,
    pub string_resources_schema: String,

    // Drop folder contents
    pub compiled_script: String,
    pub compiled_style: String,
    pub manifest_file: String,
    pub status_file: String,

    pub max_source_replacements: usize,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            drop_folder: Utf8PathBuf::from(".tmp/drop"),
            api_folder: Utf8PathBuf::from(".api"),
            poll_interval: DEFAULT_POLL_INTERVAL,
            tsconfig_file: files::TSCONFIG.to_string(),
            type_definitions_file: files::TYPE_DEFINITIONS.to_string(),
            capabilities_schema: files::CAPABILITIES_SCHEMA.to_string(),
            dependencies_schema: files::DEPENDENCIES_SCHEMA.to_string(),
            string_resources_schema: files::STRING_RESOURCES_SCHEMA.to_string(),
            compiled_script: files::COMPILED_SCRIPT.to_string(),
            compiled_style: files::COMPILED_STYLE.to_string(),
            manifest_file: files::MANIFEST.to_string(),
            status_file: files::STATUS.to_string(),
            max_source_replacements: DEFAULT_MAX_SOURCE_REPLACEMENTS,
        }
    }
}

impl BuilderSettings {
    pub fn drop_path(&self, package: &VisualPackage) -> Utf8PathBuf {
        package.build_path(&self.drop_folder)
    }

    pub fn status_path(&self, package: &VisualPackage) -> Utf8PathBuf {
        self.drop_path(package).join(&self.status_file)
    }

    pub fn manifest_path(&self, package: &VisualPackage) -> Utf8PathBuf {
        self.drop_path(package).join(&self.manifest_file)
    }

    /// `<root>/<api_folder>/v<version>`
    pub fn api_version_path(&self, package: &VisualPackage) -> Utf8PathBuf {
        package
            .build_path(&self.api_folder)
            .join(package.api_version_dir_name())
    }

    pub fn schema_path(&self, package: &VisualPackage, schema_file: &str) -> Utf8PathBuf {
        self.api_version_path(package).join(schema_file)
    }

    /// The `files` entry tsconfig must carry, always with forward slashes,
    /// e.g. `.api/v1.7.0/PowerBI-visuals.d.ts`.
    pub fn expected_type_definitions_entry(&self, package: &VisualPackage) -> String {
        let folder = self.api_folder.as_str().trim_end_matches('/');
        format!(
            "{}/{}/{}",
            folder,
            package.api_version_dir_name(),
            self.type_definitions_file
        )
    }

    /// True when `rel` lives under the drop folder.
    pub fn is_in_drop_folder(&self, rel: &Utf8Path) -> bool {
        rel.starts_with(&self.drop_folder)
    }
}
