//! Debounced rebuild loop.
//!
//! Each tick claims every changed, idle category and spawns its rebuild.
//! Rebuilds of different categories run independently; a category is never
//! rebuilt twice at once because its claim holds `building` until finish.

use super::registry::{ReadyRebuild, WatchRegistry};
use crate::error::BuildError;
use crate::events::WatchEvent;
use crate::pipeline::BuildContext;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info};

#[derive(Debug)]
pub struct RebuildScheduler {
    ctx: Arc<BuildContext>,
    registry: Arc<WatchRegistry>,
}

impl RebuildScheduler {
    pub fn new(ctx: Arc<BuildContext>, registry: Arc<WatchRegistry>) -> Self {
        Self { ctx, registry }
    }

    pub fn registry(&self) -> &Arc<WatchRegistry> {
        &self.registry
    }

    /// One scheduling pass. Returns the spawned rebuilds.
    pub fn tick(&self) -> Vec<JoinHandle<()>> {
        self.registry
            .take_ready()
            .into_iter()
            .map(|ready| {
                tokio::spawn(run_rebuild(
                    Arc::clone(&self.ctx),
                    Arc::clone(&self.registry),
                    ready,
                ))
            })
            .collect()
    }

    /// Ticks every `period` until the returned task is aborted. The first
    /// tick fires one period after the call.
    pub fn spawn_ticker(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                self.tick();
            }
        })
    }
}

async fn run_rebuild(ctx: Arc<BuildContext>, registry: Arc<WatchRegistry>, ready: ReadyRebuild) {
    let name = ready.display_name.as_str();
    info!(category = %name, handler = ready.handler.name(), "rebuild started");
    ctx.events.publish(&WatchEvent::Change(name.to_string()));

    let compiled = ready.handler.compile(&ctx.package, &ctx.options).await;
    if !registry.is_current(ready.epoch) {
        debug!(category = %name, "watch session ended during compile; result dropped");
        return;
    }

    let result = match compiled {
        Ok(()) => ctx.assemble_and_publish().await,
        Err(errors) => Err(BuildError::Compile(errors)),
    };
    if !registry.is_current(ready.epoch) {
        debug!(category = %name, "watch session ended during assembly; result dropped");
        return;
    }

    match result {
        Ok(_) => {
            info!(category = %name, "rebuild finished");
            ctx.events.publish(&WatchEvent::Complete(name.to_string()));
        }
        Err(err) => {
            error!(category = %name, error = %err, "rebuild failed");
            ctx.events.publish(&WatchEvent::Error(Arc::new(err)));
            ctx.publish_failure().await;
        }
    }
    registry.finish(&ready.key, ready.epoch);
}
