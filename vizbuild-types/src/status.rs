/// Liveness record read by an external preview host.
///
/// On disk this is either the single token `error` or two newline-separated
/// lines: the epoch-millisecond timestamp and the plugin identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusRecord {
    Failed,
    Ready {
        timestamp_millis: u64,
        plugin_id: String,
    },
}

impl StatusRecord {
    pub const FAILED_MARKER: &'static str = "error";

    pub fn to_artifact(&self) -> String {
        match self {
            StatusRecord::Failed => Self::FAILED_MARKER.to_string(),
            StatusRecord::Ready {
                timestamp_millis,
                plugin_id,
            } => format!("{}\n{}", timestamp_millis, plugin_id),
        }
    }

    /// Parses an artifact. Returns `None` for anything that is neither the
    /// failure marker nor a well-formed two-line record.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim_end();
        if text == Self::FAILED_MARKER {
            return Some(StatusRecord::Failed);
        }
        let (ts, id) = text.split_once('\n')?;
        let timestamp_millis = ts.trim().parse().ok()?;
        let plugin_id = id.trim();
        if plugin_id.is_empty() || plugin_id.contains('\n') {
            return None;
        }
        Some(StatusRecord::Ready {
            timestamp_millis,
            plugin_id: plugin_id.to_string(),
        })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, StatusRecord::Ready { .. })
    }
}
