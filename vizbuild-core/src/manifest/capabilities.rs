//! Manifest-time capability transforms.

use super::inline::{InlinedScript, inline_script_file};
use serde_json::Value;
use vizbuild_types::{ValidationError, VisualPackage, kinds};

/// Provider of the single script-result mapping that still needs its default
/// source embedded, e.g. `"R"`.
pub fn pending_script_provider(capabilities: &Value) -> Option<&str> {
    let mappings = capabilities.get("dataViewMappings")?.as_array()?;
    if mappings.len() != 1 {
        return None;
    }
    let script = mappings.first()?.get("scriptResult")?.get("script")?;
    let provider = script
        .get("scriptProviderDefault")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())?;
    if has_source(script.get("scriptSourceDefault")) {
        return None;
    }
    Some(provider)
}

fn has_source(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Script file read for a provider: `script.<provider lowercased>`.
pub fn provider_script_name(provider: &str) -> String {
    format!("script.{}", provider.to_lowercase())
}

/// Embeds the provider script (with `source()` calls inlined) as
/// `scriptSourceDefault`. Returns the inlining outcome when a script was
/// embedded.
pub async fn embed_script_source(
    capabilities: &mut Value,
    package: &VisualPackage,
    max_passes: usize,
) -> Result<Option<InlinedScript>, ValidationError> {
    let Some(provider) = pending_script_provider(capabilities) else {
        return Ok(None);
    };
    let script_name = provider_script_name(provider);
    let script_path = package.build_path(&script_name);

    let inlined = inline_script_file(&script_path, &package.base_path, max_passes)
        .await
        .map_err(|e| {
            ValidationError::new(
                script_name.clone(),
                format!("Failed updating visual capabilities: {e:#}"),
                kinds::SCRIPT,
            )
        })?;

    let slot = capabilities
        .pointer_mut("/dataViewMappings/0/scriptResult/script")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| {
            ValidationError::new(
                script_name.clone(),
                "Failed updating visual capabilities: script clause disappeared",
                kinds::SCRIPT,
            )
        })?;
    slot.insert(
        "scriptSourceDefault".to_string(),
        Value::String(inlined.content.clone()),
    );
    Ok(Some(inlined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use serde_json::json;
    use tempfile::TempDir;

    fn r_capabilities() -> Value {
        json!({
            "dataRoles": [{ "displayName": "Values", "kind": "GroupingOrMeasure", "name": "Values" }],
            "dataViewMappings": [{
                "scriptResult": {
                    "dataInput": { "table": { "rows": { "select": [{ "for": { "in": "Values" } }] } } },
                    "script": {
                        "scriptProviderDefault": "R",
                        "scriptOutputType": "png",
                        "source": { "objectName": "rcv_script", "propertyName": "source" },
                        "provider": { "objectName": "rcv_script", "propertyName": "provider" }
                    }
                }
            }]
        })
    }

    fn package(root: &Utf8PathBuf) -> VisualPackage {
        let config = serde_json::from_value(json!({
            "visual": { "guid": "rVisual" },
            "apiVersion": "1.7.0",
            "assets": { "icon": "assets/icon.png" },
            "capabilities": "capabilities.json"
        }))
        .expect("config");
        VisualPackage::new(root.clone(), config)
    }

    #[test]
    fn detects_pending_provider() {
        assert_eq!(pending_script_provider(&r_capabilities()), Some("R"));
        assert_eq!(provider_script_name("R"), "script.r");
    }

    #[test]
    fn existing_source_is_left_alone() {
        let mut caps = r_capabilities();
        caps["dataViewMappings"][0]["scriptResult"]["script"]["scriptSourceDefault"] =
            json!("plot(1)");
        assert_eq!(pending_script_provider(&caps), None);
    }

    #[test]
    fn multiple_mappings_are_ignored() {
        let mut caps = r_capabilities();
        let first = caps["dataViewMappings"][0].clone();
        caps["dataViewMappings"].as_array_mut().unwrap().push(first);
        assert_eq!(pending_script_provider(&caps), None);
    }

    #[tokio::test]
    async fn embeds_inlined_script() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        std::fs::write(root.join("script.r"), "source(\"helpers.r\")\nplot(values)").unwrap();
        std::fs::write(root.join("helpers.r"), "values <- dataset$Values").unwrap();

        let mut caps = r_capabilities();
        let outcome = embed_script_source(&mut caps, &package(&root), 100)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.passes, 1);
        assert_eq!(
            caps["dataViewMappings"][0]["scriptResult"]["script"]["scriptSourceDefault"],
            json!("values <- dataset$Values\nplot(values)")
        );
    }

    #[tokio::test]
    async fn missing_provider_script_fails() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let mut caps = r_capabilities();
        let err = embed_script_source(&mut caps, &package(&root), 100)
            .await
            .unwrap_err();
        assert_eq!(err.filename, "script.r");
        assert_eq!(err.kind, "script");
    }

    #[tokio::test]
    async fn plain_capabilities_are_untouched() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let mut caps = json!({ "dataRoles": [] });
        let before = caps.clone();
        let outcome = embed_script_source(&mut caps, &package(&root), 100)
            .await
            .unwrap();
        assert!(outcome.is_none());
        assert_eq!(caps, before);
    }
}
