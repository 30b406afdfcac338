use serde::{Deserialize, Serialize};

/// Per-run build options, fixed for the lifetime of one builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Overrides the emitted visual GUID.
    pub namespace: Option<String>,

    /// Emit loose resource files (js, css, json).
    pub resources: bool,

    /// Emit the final manifest.
    pub pbiviz: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            namespace: None,
            resources: false,
            pbiviz: true,
        }
    }
}

impl BuildOptions {
    /// Rejects option sets that would produce no output at all.
    pub fn validate(&self) -> Result<(), String> {
        if !self.pbiviz && !self.resources {
            return Err("nothing to build: pbiviz output disabled without resources".to_string());
        }
        if let Some(ns) = &self.namespace
            && ns.trim().is_empty()
        {
            return Err("namespace override must not be empty".to_string());
        }
        Ok(())
    }
}
