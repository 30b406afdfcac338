//! Default port implementations.

use crate::ports::{CompileService, SchemaValidator, SchemaViolation, WritePort};
use anyhow::Context;
use async_trait::async_trait;
use camino::Utf8Path;
use fs_err::tokio as fs;
use serde_json::Value;
use tracing::debug;
use vizbuild_types::{BuildOptions, ValidationError, VisualPackage};

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

#[async_trait]
impl WritePort for FsWritePort {
    async fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        fs::write(path, contents)
            .await
            .with_context(|| format!("write {}", path))
    }
}

/// Schema validation via the `jsonschema` crate (draft auto-detected).
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaValidator;

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, document: &Value, schema: &Value) -> anyhow::Result<Vec<SchemaViolation>> {
        let validator =
            jsonschema::validator_for(schema).map_err(|e| anyhow::anyhow!("invalid schema: {e}"))?;
        Ok(validator
            .iter_errors(document)
            .map(|e| SchemaViolation {
                message: e.to_string(),
            })
            .collect())
    }
}

/// Handler for categories with nothing to compile.
#[derive(Debug, Clone)]
pub struct NoopCompiler {
    name: String,
}

impl NoopCompiler {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for NoopCompiler {
    fn default() -> Self {
        Self::new("noop")
    }
}

#[async_trait]
impl CompileService for NoopCompiler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn compile(
        &self,
        _package: &VisualPackage,
        _options: &BuildOptions,
    ) -> Result<(), Vec<ValidationError>> {
        Ok(())
    }
}

/// Runs an external compiler process in the package root.
///
/// A non-zero exit becomes a single diagnostic carrying the process's stderr.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    name: String,
    program: String,
    args: Vec<String>,
    source_file: String,
    kind: String,
}

impl CommandCompiler {
    /// `source_file` and `kind` label the diagnostic produced on failure.
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        source_file: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            source_file: source_file.into(),
            kind: kind.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn failure(&self, message: String) -> Vec<ValidationError> {
        vec![ValidationError::new(&self.source_file, message, &self.kind)]
    }
}

#[async_trait]
impl CompileService for CommandCompiler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn compile(
        &self,
        package: &VisualPackage,
        _options: &BuildOptions,
    ) -> Result<(), Vec<ValidationError>> {
        debug!(program = %self.program, args = ?self.args, "running compiler");
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .current_dir(&package.base_path)
            .output()
            .await
            .map_err(|e| self.failure(format!("failed to run {}: {}", self.program, e)))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("{} exited with {}", self.program, output.status)
        } else {
            stderr
        };
        Err(self.failure(message))
    }
}
