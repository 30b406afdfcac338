use serde::{Deserialize, Serialize};
use std::fmt;

/// One structured build diagnostic.
///
/// Produced by validation gates, schema checks, and compiler collaborators
/// alike, so a caller can display all of them the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Package-relative file the diagnostic refers to.
    pub filename: String,

    pub message: String,

    /// Diagnostic category, e.g. "json", "icon", "less".
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl ValidationError {
    pub fn new(
        filename: impl Into<String>,
        message: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            message: message.into(),
            kind: kind.into(),
            line: None,
            column: None,
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.filename)?;
        if let (Some(line), Some(column)) = (self.line, self.column) {
            write!(f, " ({},{})", line, column)?;
        }
        write!(f, ": {}", self.message)
    }
}
