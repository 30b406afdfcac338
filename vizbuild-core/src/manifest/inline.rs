//! Recursive `source("file")` inlining for script providers.
//!
//! Each pass replaces the first uncommented `source(...)` line prefix with the
//! referenced file's content. Passes are bounded so cyclic includes terminate.

use anyhow::Context;
use camino::Utf8Path;
use fs_err::tokio as fs;
use regex::{NoExpand, Regex};
use std::sync::LazyLock;
use tracing::{debug, warn};

static SOURCE_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[^#\n]*source\s*?\(\s*?['|"]([^()'"]*)['|"]\s*?\)"#)
        .expect("source() pattern is valid")
});

/// Result of inlining one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlinedScript {
    pub content: String,

    /// Substitutions performed.
    pub passes: usize,

    /// True when the bound was reached with `source(...)` calls left over.
    pub truncated: bool,
}

/// The file name referenced by the first uncommented `source(...)` call.
pub fn first_source_reference(script: &str) -> Option<&str> {
    SOURCE_CALL
        .captures(script)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

pub fn contains_source_call(script: &str) -> bool {
    SOURCE_CALL.is_match(script)
}

/// Expands `script` in place, resolving referenced files against `root`.
pub async fn inline_sources(
    script: String,
    root: &Utf8Path,
    max_passes: usize,
) -> anyhow::Result<InlinedScript> {
    let mut content = script;

    for pass in 0..max_passes {
        let Some(name) = first_source_reference(&content).map(str::to_string) else {
            return Ok(InlinedScript {
                content,
                passes: pass,
                truncated: false,
            });
        };

        let path = root.join(&name);
        let included = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Can not access file: {}", path))?;
        debug!(file = %path, pass, "inlining source()");

        content = SOURCE_CALL
            .replacen(&content, 1, NoExpand(&included))
            .into_owned();
    }

    let truncated = contains_source_call(&content);
    if truncated {
        warn!(
            max_passes,
            "source() expansion hit its bound; output still contains source() calls (cyclic include?)"
        );
    }
    Ok(InlinedScript {
        content,
        passes: max_passes,
        truncated,
    })
}

/// Reads `script_path` and inlines it.
pub async fn inline_script_file(
    script_path: &Utf8Path,
    root: &Utf8Path,
    max_passes: usize,
) -> anyhow::Result<InlinedScript> {
    let script = fs::read_to_string(script_path)
        .await
        .with_context(|| format!("read {}", script_path))?;
    inline_sources(script, root, max_passes).await
}
