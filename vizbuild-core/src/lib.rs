//! Embeddable build engine for visual packages.
//!
//! Provides a clap-free, I/O-abstracted build pipeline and watch engine
//! suitable for linking into a dev server or packaging tool.
//!
//! # Port traits
//!
//! Collaborators are abstracted behind port traits in [`ports`]:
//! - [`CompileService`](ports::CompileService): style and script compilers
//! - [`SchemaValidator`](ports::SchemaValidator): JSON Schema validation
//! - [`WritePort`](ports::WritePort): write files and create directories
//!
//! The [`adapters`] module provides the default implementations.
//!
//! # Entry points
//!
//! - [`VisualBuilder::build`](pipeline::VisualBuilder::build): one-shot build
//! - [`VisualBuilder::start_watcher`](pipeline::VisualBuilder::start_watcher):
//!   continuous rebuilds with a status artifact for a preview host

pub mod adapters;
pub mod api_version;
pub mod config;
pub mod error;
pub mod events;
pub mod manifest;
pub mod package;
pub mod pipeline;
pub mod ports;
pub mod settings;
pub mod status;
pub mod watch;

pub use error::{BuildError, BuildResult};
pub use pipeline::{BuildContext, VisualBuilder};
pub use settings::BuilderSettings;

// Re-export the DTOs so embedders don't need vizbuild-types directly.
pub use vizbuild_types::{BuildOptions, StatusRecord, ValidationError, VisualPackage};
