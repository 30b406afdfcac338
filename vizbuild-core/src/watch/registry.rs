//! Per-category change/building state shared by the watch supervisor
//! (producer) and the rebuild scheduler (consumer).
//!
//! The lock is only ever held for flag updates, never across an await.

use crate::adapters::NoopCompiler;
use crate::ports::CompileService;
use anyhow::Context;
use camino::Utf8Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

#[derive(Debug, Clone)]
enum Matcher {
    /// Lower-cased extension including the dot, e.g. `.ts`.
    Extension(String),
    /// Pattern over the package-relative path with `/` separators.
    Glob(glob::Pattern),
}

impl Matcher {
    fn parse(key: &str) -> anyhow::Result<Self> {
        if key.starts_with('.') && !key.contains(['/', '*', '?', '[']) {
            Ok(Matcher::Extension(key.to_lowercase()))
        } else {
            let pattern =
                glob::Pattern::new(key).with_context(|| format!("invalid watch pattern {key}"))?;
            Ok(Matcher::Glob(pattern))
        }
    }
}

struct WatchCategory {
    key: String,
    display_name: String,
    changed: bool,
    building: bool,
    handler: Arc<dyn CompileService>,
    matcher: Matcher,
}

/// Snapshot of one category's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryState {
    pub changed: bool,
    pub building: bool,
}

/// A category claimed for rebuild by [`WatchRegistry::take_ready`].
#[derive(Clone)]
pub struct ReadyRebuild {
    pub key: String,
    pub display_name: String,
    pub handler: Arc<dyn CompileService>,
    /// Session the claim belongs to; stale after the next reset.
    pub epoch: u64,
}

impl std::fmt::Debug for ReadyRebuild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadyRebuild")
            .field("key", &self.key)
            .field("display_name", &self.display_name)
            .field("handler", &self.handler.name())
            .field("epoch", &self.epoch)
            .finish()
    }
}

#[derive(Default)]
struct RegistryState {
    epoch: u64,
    categories: Vec<WatchCategory>,
}

#[derive(Default)]
pub struct WatchRegistry {
    inner: Mutex<RegistryState>,
}

impl std::fmt::Debug for WatchRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("WatchRegistry")
            .field("epoch", &state.epoch)
            .field(
                "categories",
                &state.categories.iter().map(|c| &c.key).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard categories of a visual package.
    pub fn standard(
        script: Arc<dyn CompileService>,
        style: Arc<dyn CompileService>,
    ) -> anyhow::Result<Self> {
        let noop: Arc<dyn CompileService> = Arc::new(NoopCompiler::default());
        let registry = Self::new();
        let entries: [(&str, &str, &Arc<dyn CompileService>); 6] = [
            (".js", "Javascript", &script),
            (".ts", "Typescript", &script),
            (".less", "Less", &style),
            (".json", "JSON", &noop),
            (".r", "RScript", &noop),
            ("stringResources/*.json", "String resources", &noop),
        ];
        for (key, name, handler) in entries {
            registry.register(key, name, Arc::clone(handler))?;
        }
        Ok(registry)
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a category. `key` is an extension (`.less`) or a glob over the
    /// package-relative path (`stringResources/*.json`).
    pub fn register(
        &self,
        key: &str,
        display_name: &str,
        handler: Arc<dyn CompileService>,
    ) -> anyhow::Result<()> {
        let matcher = Matcher::parse(key)?;
        let mut state = self.lock();
        state.categories.retain(|c| c.key != key);
        state.categories.push(WatchCategory {
            key: key.to_string(),
            display_name: display_name.to_string(),
            changed: false,
            building: false,
            handler,
            matcher,
        });
        Ok(())
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().categories.iter().map(|c| c.key.clone()).collect()
    }

    /// Maps a package-relative path to a category key. Glob categories take
    /// precedence over extension categories.
    pub fn classify(&self, rel: &Utf8Path) -> Option<String> {
        let state = self.lock();
        classify_in(&state.categories, rel).map(|i| state.categories[i].key.clone())
    }

    /// Flags the category owning `rel` as changed. Returns its key.
    pub fn mark_changed(&self, rel: &Utf8Path) -> Option<String> {
        let mut state = self.lock();
        mark_in(&mut state, rel)
    }

    /// Like [`mark_changed`](Self::mark_changed), but a no-op unless
    /// `epoch` is still the current session. The check and the update
    /// happen under one lock, so nothing is marked after a reset.
    pub fn mark_changed_at(&self, rel: &Utf8Path, epoch: u64) -> Option<String> {
        let mut state = self.lock();
        if state.epoch != epoch {
            trace!(path = %rel, epoch, "change from an ended session dropped");
            return None;
        }
        mark_in(&mut state, rel)
    }

    /// Claims every category with `changed && !building`: sets `building`,
    /// clears `changed`.
    pub fn take_ready(&self) -> Vec<ReadyRebuild> {
        let mut state = self.lock();
        let epoch = state.epoch;
        state
            .categories
            .iter_mut()
            .filter(|c| c.changed && !c.building)
            .map(|c| {
                c.building = true;
                c.changed = false;
                ReadyRebuild {
                    key: c.key.clone(),
                    display_name: c.display_name.clone(),
                    handler: Arc::clone(&c.handler),
                    epoch,
                }
            })
            .collect()
    }

    /// Releases a claim. A no-op (returning false) for claims from an
    /// earlier session.
    pub fn finish(&self, key: &str, epoch: u64) -> bool {
        let mut state = self.lock();
        if state.epoch != epoch {
            return false;
        }
        match state.categories.iter_mut().find(|c| c.key == key) {
            Some(c) => {
                c.building = false;
                true
            }
            None => false,
        }
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.lock().epoch == epoch
    }

    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Clears every flag and starts a new session. Returns the new epoch.
    pub fn reset(&self) -> u64 {
        let mut state = self.lock();
        state.epoch += 1;
        for c in &mut state.categories {
            c.changed = false;
            c.building = false;
        }
        state.epoch
    }

    pub fn state(&self, key: &str) -> Option<CategoryState> {
        self.lock()
            .categories
            .iter()
            .find(|c| c.key == key)
            .map(|c| CategoryState {
                changed: c.changed,
                building: c.building,
            })
    }
}

fn mark_in(state: &mut RegistryState, rel: &Utf8Path) -> Option<String> {
    let idx = classify_in(&state.categories, rel)?;
    let category = &mut state.categories[idx];
    category.changed = true;
    trace!(path = %rel, category = %category.key, "marked changed");
    Some(category.key.clone())
}

fn classify_in(categories: &[WatchCategory], rel: &Utf8Path) -> Option<usize> {
    let normalized = rel.as_str().replace('\\', "/");
    let glob_hit = categories.iter().position(|c| match &c.matcher {
        Matcher::Glob(p) => p.matches(&normalized),
        Matcher::Extension(_) => false,
    });
    if glob_hit.is_some() {
        return glob_hit;
    }
    let ext = format!(".{}", rel.extension()?.to_lowercase());
    categories
        .iter()
        .position(|c| matches!(&c.matcher, Matcher::Extension(e) if *e == ext))
}
