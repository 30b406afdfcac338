//! Loading a visual package from disk.

use anyhow::Context;
use camino::Utf8Path;
use fs_err::tokio as fs;
use vizbuild_types::{VisualConfig, VisualPackage, files};

/// Reads and parses `<root>/pbiviz.json`.
pub async fn load_visual_package(root: &Utf8Path) -> anyhow::Result<VisualPackage> {
    let config_path = root.join(files::PACKAGE_CONFIG);
    let raw = fs::read_to_string(&config_path)
        .await
        .with_context(|| format!("read {}", config_path))?;
    let config: VisualConfig =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", config_path))?;
    Ok(VisualPackage::new(root, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[tokio::test]
    async fn loads_declared_config() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        std::fs::write(
            root.join("pbiviz.json"),
            r#"{
                "visual": { "guid": "loadedVisual" },
                "apiVersion": "2.1.0",
                "assets": { "icon": "assets/icon.png" },
                "capabilities": "capabilities.json"
            }"#,
        )
        .expect("write");

        let package = load_visual_package(&root).await.expect("load");
        assert_eq!(package.guid(), "loadedVisual");
        assert_eq!(package.base_path, root);
    }

    #[tokio::test]
    async fn missing_config_is_an_error() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let err = load_visual_package(&root).await.unwrap_err();
        assert!(format!("{err:#}").contains("pbiviz.json"));
    }
}
