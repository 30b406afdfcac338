//! Installs file watches over the package and feeds changes into the
//! registry.

use super::discovery::discover_watch_dirs;
use super::registry::WatchRegistry;
use super::scheduler::RebuildScheduler;
use crate::error::BuildError;
use crate::events::WatchEvent;
use crate::pipeline::BuildContext;
use crate::ports::CompileService;
use crate::settings::BuilderSettings;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

type WatchResult = notify::Result<Event>;

/// Resources of one running watch session. Dropping it closes the watcher
/// and cancels both tasks.
struct WatchSession {
    /// One watcher (a single inotify instance on Linux) for every directory.
    _watcher: RecommendedWatcher,
    watched: Vec<Utf8PathBuf>,
    forwarder: JoinHandle<()>,
    ticker: JoinHandle<()>,
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.ticker.abort();
        self.forwarder.abort();
    }
}

pub struct FileWatchSupervisor {
    ctx: Arc<BuildContext>,
    registry: Arc<WatchRegistry>,
    scheduler: Arc<RebuildScheduler>,
    session: Option<WatchSession>,
}

impl std::fmt::Debug for FileWatchSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatchSupervisor")
            .field("root", &self.ctx.package.base_path)
            .field("registry", &self.registry)
            .field("watches", &self.active_watch_count())
            .finish()
    }
}

impl FileWatchSupervisor {
    /// Uses the standard category table.
    pub fn new(
        ctx: Arc<BuildContext>,
        script: Arc<dyn CompileService>,
        style: Arc<dyn CompileService>,
    ) -> anyhow::Result<Self> {
        let registry = WatchRegistry::standard(script, style)?;
        Ok(Self::with_registry(ctx, Arc::new(registry)))
    }

    pub fn with_registry(ctx: Arc<BuildContext>, registry: Arc<WatchRegistry>) -> Self {
        let scheduler = Arc::new(RebuildScheduler::new(
            Arc::clone(&ctx),
            Arc::clone(&registry),
        ));
        Self {
            ctx,
            registry,
            scheduler,
            session: None,
        }
    }

    pub fn registry(&self) -> &Arc<WatchRegistry> {
        &self.registry
    }

    pub fn scheduler(&self) -> &Arc<RebuildScheduler> {
        &self.scheduler
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn active_watch_count(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.watched.len())
    }

    /// Stops any running session, then watches every discovered directory
    /// and starts the scheduler. Must be called within a tokio runtime.
    pub fn start(&mut self) -> anyhow::Result<usize> {
        self.stop();

        let root = self.ctx.package.base_path.clone();
        let dirs = discover_watch_dirs(&root)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel::<WatchResult>();

        let mut watcher = RecommendedWatcher::new(
            move |result| {
                if events_tx.send(result).is_err() {
                    trace!("watch event after session end");
                }
            },
            Config::default(),
        )
        .with_context(|| format!("create watcher for {}", root))?;
        for dir in &dirs {
            watcher
                .watch(dir.as_std_path(), RecursiveMode::NonRecursive)
                .with_context(|| format!("watch {}", dir))?;
        }

        let epoch = self.registry.epoch();
        let forwarder = tokio::spawn(forward_events(
            events_rx,
            Arc::clone(&self.ctx),
            Arc::clone(&self.registry),
            epoch,
        ));
        let ticker = Arc::clone(&self.scheduler).spawn_ticker(self.ctx.settings.poll_interval);

        let count = dirs.len();
        self.session = Some(WatchSession {
            _watcher: watcher,
            watched: dirs,
            forwarder,
            ticker,
        });
        info!(root = %root, watches = count, "watching for changes");
        Ok(count)
    }

    /// Closes every watch, cancels the scheduler and resets the registry.
    /// Safe to call when not running.
    ///
    /// Aborting the forwarder only requests cancellation; a forwarder still
    /// mid-event marks against the ended session's epoch, which the reset
    /// has already invalidated, so it cannot flag anything afterwards.
    pub fn stop(&mut self) {
        self.registry.reset();
        if let Some(session) = self.session.take() {
            let count = session.watched.len();
            drop(session);
            info!(root = %self.ctx.package.base_path, watches = count, "stopped watching");
        }
    }
}

impl Drop for FileWatchSupervisor {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn forward_events(
    mut events_rx: mpsc::UnboundedReceiver<WatchResult>,
    ctx: Arc<BuildContext>,
    registry: Arc<WatchRegistry>,
    epoch: u64,
) {
    while let Some(result) = events_rx.recv().await {
        match result {
            Ok(event) => {
                apply_event(&ctx.package.base_path, &registry, &ctx.settings, epoch, &event);
            }
            Err(e) => {
                error!(error = %e, "file watcher error");
                let err = anyhow::Error::new(e).context("file watcher");
                ctx.events
                    .publish(&WatchEvent::Error(Arc::new(BuildError::Io(err))));
            }
        }
    }
    debug!("watch event channel closed");
}

/// Marks the categories touched by one notification within session
/// `epoch`. Returns the marked category keys.
///
/// Access events, dot-files and anything under the drop folder are ignored,
/// as is everything once `epoch` has ended.
pub fn apply_event(
    root: &Utf8Path,
    registry: &WatchRegistry,
    settings: &BuilderSettings,
    epoch: u64,
    event: &Event,
) -> Vec<String> {
    if matches!(event.kind, EventKind::Access(_)) {
        return Vec::new();
    }

    let mut marked = Vec::new();
    for path in &event.paths {
        let Some(path) = Utf8Path::from_path(path) else {
            warn!(path = %path.display(), "ignoring non-UTF-8 path");
            continue;
        };
        let Some(name) = path.file_name() else {
            continue;
        };
        if name.starts_with('.') {
            trace!(path = %path, "ignoring dot-file");
            continue;
        }
        let rel = path.strip_prefix(root).unwrap_or(Utf8Path::new(name));
        if settings.is_in_drop_folder(rel) {
            continue;
        }
        match registry.mark_changed_at(rel, epoch) {
            Some(key) => {
                debug!(path = %rel, category = %key, "change recorded");
                if !marked.contains(&key) {
                    marked.push(key);
                }
            }
            None => trace!(path = %rel, "no category"),
        }
    }
    marked
}
