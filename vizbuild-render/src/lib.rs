//! Rendering helpers (plain text) for build diagnostics.

use vizbuild_types::ValidationError;

/// Renders one diagnostic per line as `TYPE filename (line,column): message`.
pub fn render_errors(errors: &[ValidationError]) -> String {
    let mut out = String::new();
    for e in errors {
        out.push_str(&render_error(e));
        out.push('\n');
    }
    out
}

pub fn render_error(e: &ValidationError) -> String {
    let tag = if e.kind.trim().is_empty() {
        "UNKNOWN".to_string()
    } else {
        e.kind.to_uppercase()
    };

    let mut line = tag;
    if !e.filename.is_empty() {
        line.push_str(&format!(" {}", e.filename));
    }
    if let (Some(l), Some(c)) = (e.line, e.column) {
        line.push_str(&format!(" ({},{})", l, c));
    }
    line.push_str(&format!(": {}", e.message));
    line
}

/// One-line summary, e.g. `3 errors in capabilities.json, tsconfig.json`.
pub fn render_summary(errors: &[ValidationError]) -> String {
    if errors.is_empty() {
        return "no errors".to_string();
    }
    let mut files: Vec<&str> = Vec::new();
    for e in errors {
        if !e.filename.is_empty() && !files.contains(&e.filename.as_str()) {
            files.push(&e.filename);
        }
    }
    let noun = if errors.len() == 1 { "error" } else { "errors" };
    if files.is_empty() {
        format!("{} {}", errors.len(), noun)
    } else {
        format!("{} {} in {}", errors.len(), noun, files.join(", "))
    }
}
