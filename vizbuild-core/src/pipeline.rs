//! Build coordination: the one-shot pipeline and the watch-mode entry points.

use crate::adapters::{FsWritePort, JsonSchemaValidator};
use crate::api_version::validate_api_version;
use crate::error::{BuildError, BuildResult};
use crate::events::EventBus;
use crate::manifest::ManifestAssembler;
use crate::ports::{CompileService, SchemaValidator, WritePort};
use crate::settings::BuilderSettings;
use crate::status::StatusPublisher;
use crate::watch::FileWatchSupervisor;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use vizbuild_types::{BuildOptions, StatusRecord, VisualPackage};

/// Everything a build needs, shared between the one-shot pipeline and
/// watch-triggered rebuilds.
pub struct BuildContext {
    pub package: Arc<VisualPackage>,
    pub options: BuildOptions,
    pub settings: BuilderSettings,
    pub validator: Arc<dyn SchemaValidator>,
    pub writer: Arc<dyn WritePort>,
    pub events: EventBus,
    pub status: StatusPublisher,
    /// Serializes writes into the drop folder across concurrent rebuilds.
    output_lock: Mutex<()>,
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("package", &self.package.base_path)
            .field("options", &self.options)
            .field("settings", &self.settings)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl BuildContext {
    /// Assembles and writes the manifest, then marks the build ready. One
    /// caller at a time, so concurrent rebuilds never interleave writes.
    pub async fn assemble_and_publish(&self) -> BuildResult<StatusRecord> {
        let _output = self.output_lock.lock().await;
        ManifestAssembler::new(&self.package, &self.settings, self.validator.as_ref())
            .assemble_and_write(&self.options, self.writer.as_ref())
            .await?;
        Ok(self.status.publish_ready().await?)
    }

    /// Records the failure marker. A failed write is logged, never raised,
    /// so the build error stays the one reported.
    pub async fn publish_failure(&self) {
        let _output = self.output_lock.lock().await;
        if let Err(e) = self.status.publish_failed().await {
            warn!(error = %format!("{e:#}"), "failed to write failure status");
        }
    }
}

/// Builds one visual package, once or continuously.
pub struct VisualBuilder {
    ctx: Arc<BuildContext>,
    style: Arc<dyn CompileService>,
    script: Arc<dyn CompileService>,
    supervisor: Option<FileWatchSupervisor>,
}

impl std::fmt::Debug for VisualBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualBuilder")
            .field("ctx", &self.ctx)
            .field("style", &self.style.name())
            .field("script", &self.script.name())
            .field("watching", &self.is_watching())
            .finish()
    }
}

impl VisualBuilder {
    /// Uses the default `jsonschema` validator and filesystem writer.
    pub fn new(
        package: VisualPackage,
        options: BuildOptions,
        settings: BuilderSettings,
        style: Arc<dyn CompileService>,
        script: Arc<dyn CompileService>,
    ) -> Self {
        Self::with_ports(
            package,
            options,
            settings,
            style,
            script,
            Arc::new(JsonSchemaValidator),
            Arc::new(FsWritePort),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_ports(
        package: VisualPackage,
        options: BuildOptions,
        settings: BuilderSettings,
        style: Arc<dyn CompileService>,
        script: Arc<dyn CompileService>,
        validator: Arc<dyn SchemaValidator>,
        writer: Arc<dyn WritePort>,
    ) -> Self {
        let plugin_id = options
            .namespace
            .clone()
            .unwrap_or_else(|| package.guid().to_string());
        let status = StatusPublisher::new(
            settings.status_path(&package),
            plugin_id,
            Arc::clone(&writer),
        );
        let ctx = BuildContext {
            package: Arc::new(package),
            options,
            settings,
            validator,
            writer,
            events: EventBus::new(),
            status,
            output_lock: Mutex::new(()),
        };
        Self {
            ctx: Arc::new(ctx),
            style,
            script,
            supervisor: None,
        }
    }

    /// Subscribe here for watch notifications.
    pub fn events(&self) -> &EventBus {
        &self.ctx.events
    }

    pub fn status(&self) -> &StatusPublisher {
        &self.ctx.status
    }

    pub fn context(&self) -> &Arc<BuildContext> {
        &self.ctx
    }

    /// Runs every stage in order and stops at the first failure, which
    /// also records the failure status.
    pub async fn build(&self) -> BuildResult<StatusRecord> {
        let package = &self.ctx.package;
        info!(root = %package.base_path, guid = package.guid(), "build started");
        match self.run_stages().await {
            Ok(record) => {
                info!(root = %package.base_path, "build finished");
                Ok(record)
            }
            Err(err) => {
                debug!(error = %err, "build failed");
                self.ctx.publish_failure().await;
                Err(err)
            }
        }
    }

    async fn run_stages(&self) -> BuildResult<StatusRecord> {
        let ctx = &self.ctx;
        ctx.options.validate().map_err(BuildError::Options)?;

        validate_api_version(&ctx.package, &ctx.settings).await?;
        debug!("api version validated");

        for compiler in [&self.style, &self.script] {
            compiler
                .compile(&ctx.package, &ctx.options)
                .await
                .map_err(BuildError::Compile)?;
            debug!(compiler = compiler.name(), "compiled");
        }

        ctx.assemble_and_publish().await
    }

    /// Starts watch mode. A running session is stopped first. Returns the
    /// number of installed watches.
    pub fn start_watcher(&mut self) -> anyhow::Result<usize> {
        let supervisor = match self.supervisor.take() {
            Some(supervisor) => supervisor,
            None => FileWatchSupervisor::new(
                Arc::clone(&self.ctx),
                Arc::clone(&self.script),
                Arc::clone(&self.style),
            )?,
        };
        self.supervisor.insert(supervisor).start()
    }

    /// Idempotent. An in-flight rebuild finishes without effect.
    pub fn stop_watcher(&mut self) {
        if let Some(supervisor) = self.supervisor.as_mut() {
            supervisor.stop();
        }
    }

    pub fn is_watching(&self) -> bool {
        self.supervisor.as_ref().is_some_and(FileWatchSupervisor::is_running)
    }

    pub fn active_watch_count(&self) -> usize {
        self.supervisor
            .as_ref()
            .map_or(0, FileWatchSupervisor::active_watch_count)
    }
}
