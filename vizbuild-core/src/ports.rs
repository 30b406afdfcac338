//! Port traits abstracting compilers, schema validation and writes away
//! from the pipeline.

use async_trait::async_trait;
use camino::Utf8Path;
use serde_json::Value;
use vizbuild_types::{BuildOptions, ValidationError, VisualPackage};

/// An opaque style or script compiler.
///
/// Succeeds silently or fails with the diagnostics it produced; the pipeline
/// passes those through unchanged.
#[async_trait]
pub trait CompileService: Send + Sync {
    fn name(&self) -> &str;

    async fn compile(
        &self,
        package: &VisualPackage,
        options: &BuildOptions,
    ) -> Result<(), Vec<ValidationError>>;
}

/// One schema violation reported by a [`SchemaValidator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub message: String,
}

impl SchemaViolation {
    pub fn into_validation_error(self, filename: &str, kind: &str) -> ValidationError {
        ValidationError::new(filename, self.message, kind)
    }
}

/// JSON Schema validation. An empty result means the document is valid;
/// `Err` is reserved for schemas that cannot be compiled.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, document: &Value, schema: &Value) -> anyhow::Result<Vec<SchemaViolation>>;
}

/// File-system write operations.
#[async_trait]
pub trait WritePort: Send + Sync {
    /// Writes `contents` to `path`, creating missing parent directories.
    async fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
}
