//! Token-usage accounting files.
//!
//! Each chat model accumulates counters in `tokens_used_<model>.json`
//! under the usage directory; the `/token-usage` endpoint returns every
//! matching file keyed by name. The shape is append-only bookkeeping, not
//! billing.

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;

/// Accumulated counters for one model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageCounts {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub requests: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Read every `tokens_used*.json` file in `dir`, keyed by file name.
/// A missing directory is an empty report, not an error.
pub fn read_usage(dir: &Path) -> Result<serde_json::Map<String, Value>> {
    let mut usage = serde_json::Map::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(usage),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !(name.starts_with("tokens_used") && name.ends_with(".json")) {
            continue;
        }
        let content = fs::read_to_string(entry.path())?;
        let counts: Value = serde_json::from_str(&content)?;
        usage.insert(name, counts);
    }

    Ok(usage)
}

/// Fold one request's token counts into the model's usage file.
pub fn record_usage(dir: &Path, model: &str, input_tokens: u64, output_tokens: u64) -> Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("tokens_used_{}.json", sanitize(model)));

    let mut counts: UsageCounts = match fs::read_to_string(&path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => UsageCounts::default(),
    };

    counts.input_tokens += input_tokens;
    counts.output_tokens += output_tokens;
    counts.requests += 1;
    counts.updated_at = Some(Utc::now().to_rfc3339());

    fs::write(&path, serde_json::to_string_pretty(&counts)?)?;
    debug!(model, input_tokens, output_tokens, "usage recorded");
    Ok(())
}

/// Keep model names filesystem-safe.
fn sanitize(model: &str) -> String {
    model
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_dir_is_empty_report() {
        let tmp = TempDir::new().unwrap();
        let usage = read_usage(&tmp.path().join("nope")).unwrap();
        assert!(usage.is_empty());
    }

    #[test]
    fn test_record_accumulates() {
        let tmp = TempDir::new().unwrap();
        record_usage(tmp.path(), "gpt-4o-mini", 100, 20).unwrap();
        record_usage(tmp.path(), "gpt-4o-mini", 50, 10).unwrap();

        let usage = read_usage(tmp.path()).unwrap();
        assert_eq!(usage.len(), 1);
        let counts = &usage["tokens_used_gpt-4o-mini.json"];
        assert_eq!(counts["input_tokens"], 150);
        assert_eq!(counts["output_tokens"], 30);
        assert_eq!(counts["requests"], 2);
    }

    #[test]
    fn test_models_tracked_separately() {
        let tmp = TempDir::new().unwrap();
        record_usage(tmp.path(), "gpt-4o-mini", 1, 1).unwrap();
        record_usage(tmp.path(), "gpt-3.5-turbo", 2, 2).unwrap();
        let usage = read_usage(tmp.path()).unwrap();
        assert_eq!(usage.len(), 2);
    }

    #[test]
    fn test_unrelated_files_ignored() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("notes.json"), "{}").unwrap();
        record_usage(tmp.path(), "gpt-4", 5, 5).unwrap();
        let usage = read_usage(tmp.path()).unwrap();
        assert_eq!(usage.len(), 1);
    }

    #[test]
    fn test_sanitized_model_name() {
        let tmp = TempDir::new().unwrap();
        record_usage(tmp.path(), "org/model:v1", 1, 1).unwrap();
        let usage = read_usage(tmp.path()).unwrap();
        assert!(usage.contains_key("tokens_used_org_model_v1.json"));
    }
}
