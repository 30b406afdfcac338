use serde::{Deserialize, Serialize};

/// Embedded `content` block of the assembled manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestContent {
    pub js: String,

    pub css: String,

    /// `data:image/png;base64,...` URI of the icon.
    #[serde(rename = "iconBase64")]
    pub icon_base64: String,
}
