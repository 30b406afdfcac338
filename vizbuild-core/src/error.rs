//! Error types for the build pipeline.
//!
//! Failures come in two shapes:
//! - diagnostic sequences (validation gates, schema checks, compiler output)
//! - raw failures (missing required files, malformed JSON, internal errors)

use thiserror::Error;
use vizbuild_render::{render_errors, render_summary};
use vizbuild_types::ValidationError;

#[derive(Debug, Error)]
pub enum BuildError {
    /// API version, schema, icon or capability checks failed.
    #[error("validation failed: {}", render_summary(.0))]
    Validation(Vec<ValidationError>),

    /// A style or script compiler reported errors.
    #[error("compilation failed: {}", render_summary(.0))]
    Compile(Vec<ValidationError>),

    /// The build options cannot produce any output.
    #[error("invalid build options: {0}")]
    Options(String),

    #[error("{0:#}")]
    Io(#[from] anyhow::Error),
}

impl BuildError {
    pub fn validation(error: ValidationError) -> Self {
        BuildError::Validation(vec![error])
    }

    /// Diagnostics carried by this error, empty for raw failures.
    pub fn diagnostics(&self) -> &[ValidationError] {
        match self {
            BuildError::Validation(errors) | BuildError::Compile(errors) => errors,
            BuildError::Options(_) | BuildError::Io(_) => &[],
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, BuildError::Validation(_))
    }

    /// Multi-line human-readable rendering.
    pub fn render(&self) -> String {
        match self {
            BuildError::Validation(errors) | BuildError::Compile(errors) => render_errors(errors),
            other => format!("{}\n", other),
        }
    }
}

pub type BuildResult<T> = Result<T, BuildError>;
