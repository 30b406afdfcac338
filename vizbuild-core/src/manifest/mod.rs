//! Manifest assembly: validates declared resources and embeds compiled
//! output and the icon into one document.
//!
//! Every validation failure is reported as a diagnostic sequence; missing
//! required files (icon, capabilities, compiled output) surface as raw I/O
//! failures.

pub mod capabilities;
pub mod icon;
pub mod inline;

use crate::error::{BuildError, BuildResult};
use crate::ports::{SchemaValidator, WritePort};
use crate::settings::BuilderSettings;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err::tokio as fs;
use serde_json::{Map, Value};
use tracing::{debug, info};
use vizbuild_types::{BuildOptions, ManifestContent, ValidationError, VisualPackage, kinds};

pub const INVALID_ICON_MESSAGE: &str = "Invalid Icon. Must be 20x20 png.";

/// Assembles the manifest for one package. Borrowed per build.
pub struct ManifestAssembler<'a> {
    package: &'a VisualPackage,
    settings: &'a BuilderSettings,
    validator: &'a dyn SchemaValidator,
}

impl<'a> ManifestAssembler<'a> {
    pub fn new(
        package: &'a VisualPackage,
        settings: &'a BuilderSettings,
        validator: &'a dyn SchemaValidator,
    ) -> Self {
        Self {
            package,
            settings,
            validator,
        }
    }

    /// Builds the manifest document without writing it.
    pub async fn assemble(&self, options: &BuildOptions) -> BuildResult<Value> {
        let config = &self.package.config;

        let icon_base64 = self.load_icon().await?;

        let drop = self.settings.drop_path(self.package);
        let js = read_text(&drop.join(&self.settings.compiled_script)).await?;
        let css = read_text(&drop.join(&self.settings.compiled_style)).await?;

        let mut capabilities = self.load_capabilities().await?;
        if let Some(inlined) = capabilities::embed_script_source(
            &mut capabilities,
            self.package,
            self.settings.max_source_replacements,
        )
        .await
        .map_err(BuildError::validation)?
        {
            debug!(passes = inlined.passes, "embedded provider script");
        }

        let dependencies = self.load_dependencies().await?;
        let string_resources = self.load_string_resources().await?;

        let mut draft = match serde_json::to_value(config).context("serialize pbiviz config")? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        draft.insert("capabilities".to_string(), capabilities);
        draft.insert(
            "dependencies".to_string(),
            dependencies.unwrap_or(Value::Null),
        );
        draft.insert(
            "stringResources".to_string(),
            Value::Object(string_resources),
        );
        let content = ManifestContent {
            js,
            css,
            icon_base64,
        };
        draft.insert(
            "content".to_string(),
            serde_json::to_value(content).context("serialize manifest content")?,
        );

        if let Some(namespace) = &options.namespace
            && let Some(visual) = draft.get_mut("visual").and_then(Value::as_object_mut)
        {
            visual.insert("guid".to_string(), Value::String(namespace.clone()));
        }

        Ok(Value::Object(draft))
    }

    /// Assembles and writes `<drop>/pbiviz.json`.
    pub async fn assemble_and_write(
        &self,
        options: &BuildOptions,
        writer: &dyn WritePort,
    ) -> BuildResult<Utf8PathBuf> {
        let manifest = self.assemble(options).await?;
        let path = self.settings.manifest_path(self.package);
        let json = serde_json::to_string(&manifest).context("serialize manifest")?;
        writer.write_file(&path, json.as_bytes()).await?;
        info!(path = %path, bytes = json.len(), "wrote manifest");
        Ok(path)
    }

    async fn load_icon(&self) -> BuildResult<String> {
        let rel = &self.package.config.assets.icon;
        let path = self.package.build_path(rel);
        let bytes = fs::read(&path)
            .await
            .with_context(|| format!("read icon {}", path))?;
        icon::icon_data_uri(&bytes).ok_or_else(|| {
            BuildError::validation(ValidationError::new(
                rel.as_str(),
                INVALID_ICON_MESSAGE,
                kinds::ICON,
            ))
        })
    }

    async fn load_capabilities(&self) -> BuildResult<Value> {
        let rel = &self.package.config.capabilities;
        let document = read_json(&self.package.build_path(rel)).await?;
        self.validate(&document, rel, &self.settings.capabilities_schema)
            .await?;
        Ok(document)
    }

    /// `None` when no dependencies file is declared or it does not exist.
    async fn load_dependencies(&self) -> BuildResult<Option<Value>> {
        let Some(rel) = &self.package.config.dependencies else {
            return Ok(None);
        };
        let path = self.package.build_path(rel);
        let exists = tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("access {}", path))?;
        if !exists {
            debug!(path = %path, "declared dependencies file is absent");
            return Ok(None);
        }
        let document = read_json(&path).await?;
        self.validate(&document, rel, &self.settings.dependencies_schema)
            .await?;
        Ok(Some(document))
    }

    /// Validates every declared file before failing so all violations
    /// surface together.
    async fn load_string_resources(&self) -> BuildResult<Map<String, Value>> {
        let mut merged = Map::new();
        let Some(files) = &self.package.config.string_resources else {
            return Ok(merged);
        };
        if files.is_empty() {
            return Ok(merged);
        }

        let schema = read_json(
            &self
                .settings
                .schema_path(self.package, &self.settings.string_resources_schema),
        )
        .await?;

        let mut errors = Vec::new();
        for rel in files {
            let document = read_json(&self.package.build_path(rel)).await?;
            let violations = self.validator.validate(&document, &schema)?;
            if !violations.is_empty() {
                errors.extend(
                    violations
                        .into_iter()
                        .map(|v| v.into_validation_error(rel.as_str(), kinds::JSON)),
                );
                continue;
            }
            let locale = document
                .get("locale")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let values = document.get("values").cloned().unwrap_or(Value::Null);
            merged.insert(locale, values);
        }

        if errors.is_empty() {
            Ok(merged)
        } else {
            Err(BuildError::Validation(errors))
        }
    }

    async fn validate(&self, document: &Value, rel: &Utf8Path, schema_file: &str) -> BuildResult<()> {
        let schema = read_json(&self.settings.schema_path(self.package, schema_file)).await?;
        let violations = self.validator.validate(document, &schema)?;
        if violations.is_empty() {
            return Ok(());
        }
        Err(BuildError::Validation(
            violations
                .into_iter()
                .map(|v| v.into_validation_error(rel.as_str(), kinds::JSON))
                .collect(),
        ))
    }
}

async fn read_text(path: &Utf8Path) -> anyhow::Result<String> {
    fs::read_to_string(path)
        .await
        .with_context(|| format!("read {}", path))
}

async fn read_json(path: &Utf8Path) -> anyhow::Result<Value> {
    let raw = read_text(path).await?;
    serde_json::from_str(&raw).with_context(|| format!("parse {}", path))
}
