//! Directory enumeration for the file watchers.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use walkdir::{DirEntry, WalkDir};

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Every non-hidden directory at or below `root`, root first, sorted by name.
/// Hidden directories are pruned with their whole subtree.
pub fn discover_watch_dirs(root: &Utf8Path) -> anyhow::Result<Vec<Utf8PathBuf>> {
    let mut dirs = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));
    for entry in walker {
        let entry = entry.with_context(|| format!("walk {}", root))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let path = Utf8PathBuf::from_path_buf(entry.into_path())
            .map_err(|p| anyhow::anyhow!("non-UTF-8 path {}", p.display()))?;
        dirs.push(path);
    }
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn skips_hidden_subtrees() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        for dir in ["src/util", "style", ".tmp/drop", ".api/v1.7.0", "node_modules"] {
            std::fs::create_dir_all(root.join(dir)).expect("mkdir");
        }
        std::fs::write(root.join("src/visual.ts"), "").expect("write");

        let rel: Vec<String> = discover_watch_dirs(&root)
            .expect("discover")
            .iter()
            .map(|d| d.strip_prefix(&root).expect("under root").to_string())
            .collect();
        assert_eq!(rel, vec!["", "node_modules", "src", "src/util", "style"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().join("gone")).expect("utf8");
        assert!(discover_watch_dirs(&root).is_err());
    }
}
