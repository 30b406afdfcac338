//! API version gate: the declared `apiVersion` must be vendored locally and
//! referenced by tsconfig.json.

use crate::error::{BuildError, BuildResult};
use crate::settings::BuilderSettings;
use anyhow::Context;
use fs_err::tokio as fs;
use serde_json::Value;
use std::io::ErrorKind;
use tracing::debug;
use vizbuild_types::{ValidationError, VisualPackage, kinds};

/// Fails fast on the first violated condition, as a one-element
/// diagnostic sequence.
pub async fn validate_api_version(
    package: &VisualPackage,
    settings: &BuilderSettings,
) -> BuildResult<()> {
    let version = package.api_version_dir_name();
    let api_dir = settings.api_version_path(package);

    match fs::metadata(&api_dir).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(BuildError::validation(ValidationError::new(
                format!("{}/{}", settings.api_folder, version),
                format!("Invalid API Version {}", version),
                kinds::VALIDATION,
            )));
        }
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("access {}", api_dir))
                .into());
        }
    }

    let tsconfig_path = package.build_path(&settings.tsconfig_file);
    let raw = fs::read_to_string(&tsconfig_path)
        .await
        .with_context(|| format!("read {}", tsconfig_path))?;
    let tsconfig: Value =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", tsconfig_path))?;

    let expected = settings.expected_type_definitions_entry(package);
    let referenced = tsconfig
        .get("files")
        .and_then(Value::as_array)
        .is_some_and(|files| files.iter().any(|f| f.as_str() == Some(expected.as_str())));

    if !referenced {
        return Err(BuildError::validation(ValidationError::new(
            settings.tsconfig_file.clone(),
            format!(
                "The {} in your {} must match the api version in pbiviz.json (expected: {})",
                settings.type_definitions_file, settings.tsconfig_file, expected
            ),
            kinds::VALIDATION,
        )));
    }

    debug!(version = %version, "api version validated");
    Ok(())
}
