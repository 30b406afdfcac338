//! Shared DTOs for the vizbuild workspace.
//!
//! # Design constraints
//! - `VisualConfig` must round-trip every field of `pbiviz.json`, including
//!   ones this workspace does not understand, because the assembled manifest
//!   is a deep copy of the declared configuration.
//! - Diagnostics are always carried as ordered sequences.

pub mod diagnostic;
pub mod manifest;
pub mod options;
pub mod package;
pub mod status;

pub use diagnostic::ValidationError;
pub use manifest::ManifestContent;
pub use options::BuildOptions;
pub use package::{Assets, VisualConfig, VisualInfo, VisualPackage};
pub use status::StatusRecord;

/// Well-known file names inside a visual package.
pub mod files {
    /// Declared package configuration at the package root.
    pub const PACKAGE_CONFIG: &str = "pbiviz.json";
    /// Assembled manifest written to the drop folder.
    pub const MANIFEST: &str = "pbiviz.json";
    pub const STATUS: &str = "status";
    pub const COMPILED_SCRIPT: &str = "visual.prod.js";
    pub const COMPILED_STYLE: &str = "visual.prod.css";
    pub const TSCONFIG: &str = "tsconfig.json";
    pub const TYPE_DEFINITIONS: &str = "PowerBI-visuals.d.ts";
    pub const CAPABILITIES_SCHEMA: &str = "schema.capabilities.json";
    pub const DEPENDENCIES_SCHEMA: &str = "schema.dependencies.json";
    pub const STRING_RESOURCES_SCHEMA: &str = "schema.stringResources.json";
}

/// Diagnostic `type` tags.
pub mod kinds {
    pub const VALIDATION: &str = "validation";
    pub const JSON: &str = "json";
    pub const ICON: &str = "icon";
    pub const SCRIPT: &str = "script";
}
