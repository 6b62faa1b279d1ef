//! Endpoint parameter assembly.
//!
//! Each endpoint family starts from a fixed default set; caller-supplied
//! overrides are applied key-by-key on top. An override replaces the value
//! wholesale, it never merges nested structures.

use serde_json::{json, Map, Value};

use crate::tasks::TaskFamily;

/// Vector length the embedding endpoint is asked for, matching the
/// precomputed corpora.
pub const EMBEDDING_DIMENSIONS: u64 = 1024;

/// Default endpoint parameters for a task family.
///
/// Chat: mild repetition penalties and low temperature; `top_p` is left
/// unset (set one of `temperature`/`top_p`, not both). Embedding: fixed
/// dimensionality and float format.
pub fn default_params(family: TaskFamily) -> Map<String, Value> {
    let defaults = match family {
        TaskFamily::Chat => json!({
            "frequency_penalty": 1,
            "presence_penalty": 1,
            "temperature": 0.2,
        }),
        TaskFamily::Embedding => json!({
            "dimensions": EMBEDDING_DIMENSIONS,
            "format": "float",
        }),
    };
    match defaults {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

/// Apply caller overrides onto the defaults, key by key.
pub fn apply_overrides(
    mut params: Map<String, Value>,
    overrides: Option<&Map<String, Value>>,
) -> Map<String, Value> {
    if let Some(overrides) = overrides {
        for (key, value) in overrides {
            params.insert(key.clone(), value.clone());
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_defaults() {
        let params = default_params(TaskFamily::Chat);
        assert_eq!(params["frequency_penalty"], json!(1));
        assert_eq!(params["presence_penalty"], json!(1));
        assert_eq!(params["temperature"], json!(0.2));
        assert!(!params.contains_key("top_p"));
    }

    #[test]
    fn test_embedding_defaults() {
        let params = default_params(TaskFamily::Embedding);
        assert_eq!(params["dimensions"], json!(1024));
        assert_eq!(params["format"], json!("float"));
    }

    #[test]
    fn test_override_replaces_and_extends() {
        let mut overrides = Map::new();
        overrides.insert("temperature".to_string(), json!(0.9));
        overrides.insert("top_p".to_string(), json!(0.5));

        let params = apply_overrides(default_params(TaskFamily::Chat), Some(&overrides));
        assert_eq!(params["temperature"], json!(0.9));
        assert_eq!(params["top_p"], json!(0.5));
        assert_eq!(params["frequency_penalty"], json!(1));
    }

    #[test]
    fn test_override_replaces_nested_wholesale() {
        let mut base = default_params(TaskFamily::Chat);
        base.insert("logit_bias".to_string(), json!({"50256": -100, "11": 5}));

        let mut overrides = Map::new();
        overrides.insert("logit_bias".to_string(), json!({"42": 1}));

        let params = apply_overrides(base, Some(&overrides));
        assert_eq!(params["logit_bias"], json!({"42": 1}));
    }

    #[test]
    fn test_no_overrides_is_identity() {
        let params = apply_overrides(default_params(TaskFamily::Embedding), None);
        assert_eq!(params, default_params(TaskFamily::Embedding));
    }
}
