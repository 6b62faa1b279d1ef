//! Core data types that flow through the dispatch pipeline.
//!
//! These mirror the JSON shapes exchanged with the frontend: documents come
//! in with the query, a [`ResultRecord`] goes back out, and everything in
//! between ([`SentenceUnit`], scored items) is transient.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DispatchError, Result};

/// A document supplied with a query. Ephemeral; never persisted.
///
/// The frontend may send either a bare text string or an `{id, text}`
/// object. Tasks that address documents by identifier (sentence comparison)
/// require the full form.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Full {
                #[serde(default)]
                id: String,
                text: String,
            },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(text) => Document {
                id: String::new(),
                text,
            },
            Repr::Full { id, text } => Document { id, text },
        })
    }
}

/// A precomputed (identifier, vector) pair from one of the static corpora.
#[derive(Debug, Clone)]
pub struct EmbeddingRecord {
    pub id: String,
    pub vector: Vec<f32>,
}

/// Message role in a chat prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One message of a formatted prompt. Every formatted prompt is exactly one
/// system message followed by one user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A ranked corpus item returned by the item search tasks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredText {
    pub id: String,
    pub score: f64,
}

/// One (query sentence, document sentence) pair emitted by sentence
/// comparison, with character spans into the source texts.
#[derive(Debug, Clone, Serialize)]
pub struct SentenceLink {
    pub query_id: String,
    pub query_chars: [usize; 2],
    pub query_sent: String,
    pub document_id: String,
    pub document_chars: [usize; 2],
    pub document_sent: String,
    pub score: f64,
}

/// A segmented sentence tagged with its source, produced transiently during
/// sentence comparison. `source_index` 0 is the query; 1..K are the K
/// supplied documents in order.
#[derive(Debug, Clone)]
pub struct SentenceUnit {
    pub source_id: String,
    pub source_index: usize,
    pub chars: [usize; 2],
    pub text: String,
    pub embedding: Vec<f32>,
}

/// Token-based size reduction of a generated summary.
#[derive(Debug, Clone, Serialize)]
pub struct PercentReduction {
    pub input: u64,
    pub output: u64,
    pub value: f64,
}

/// ROUGE overlap scores plus size reduction for the summarize task.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryStats {
    pub rouge1: f64,
    pub rouge2: f64,
    #[serde(rename = "rougeL")]
    pub rouge_l: f64,
    pub percent_reduction: PercentReduction,
}

/// The uniform result shape returned to the caller.
///
/// Exactly one of the success-path fields (`text`, `stats`, `texts`,
/// `links`) or the failure-path pair (`response`, `status`) is populated.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ResultRecord {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SummaryStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texts: Option<Vec<ScoredText>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<SentenceLink>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ResultRecord {
    pub fn text(text: String) -> Self {
        Self {
            success: true,
            text: Some(text),
            ..Default::default()
        }
    }

    pub fn summary(text: String, stats: SummaryStats) -> Self {
        Self {
            success: true,
            text: Some(text),
            stats: Some(stats),
            ..Default::default()
        }
    }

    pub fn texts(texts: Vec<ScoredText>) -> Self {
        Self {
            success: true,
            texts: Some(texts),
            ..Default::default()
        }
    }

    pub fn links(links: Vec<SentenceLink>) -> Self {
        Self {
            success: true,
            links: Some(links),
            ..Default::default()
        }
    }

    /// A non-200 from the model service: the raw payload and status code
    /// go back to the caller unmodified.
    pub fn failure(status: u16, response: Value) -> Self {
        Self {
            success: false,
            response: Some(response),
            status: Some(status),
            ..Default::default()
        }
    }
}

/// The `/query` request body sent by the frontend.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    /// Model checkpoint, e.g. `"gpt-4o-mini"`.
    pub model_checkpoint: String,
    /// Model kind; only `"openai"` is wired up.
    pub model_type: String,
    /// Caller overrides for endpoint parameters, applied key-by-key.
    #[serde(default)]
    pub model_settings: Option<Map<String, Value>>,
    /// Dataset selector for the static corpora; only `"live"` is wired up.
    pub dataset: String,
    /// Task identifier, e.g. `"summarize"` or `"search_nodes"`.
    pub task: String,
    /// Task-specific settings; required keys vary by task.
    #[serde(default)]
    pub task_settings: TaskSettings,
    /// Documents to operate on, in order.
    #[serde(default)]
    pub documents: Vec<Document>,
    /// Optional sampling seed forwarded to the chat endpoint.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Task-specific settings: a free-form key/value map validated only by key
/// presence. Typed accessors produce descriptive errors naming the key.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskSettings(pub Map<String, Value>);

impl TaskSettings {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// A required string setting. Missing key is a configuration error.
    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| DispatchError::Config(format!("missing task setting '{}'", key)))?
            .as_str()
            .ok_or_else(|| DispatchError::Input(format!("task setting '{}' must be a string", key)))
    }

    /// A required list-of-strings setting.
    pub fn require_str_list(&self, key: &str) -> Result<Vec<&str>> {
        let values = self
            .get(key)
            .ok_or_else(|| DispatchError::Config(format!("missing task setting '{}'", key)))?
            .as_array()
            .ok_or_else(|| {
                DispatchError::Input(format!("task setting '{}' must be a list of strings", key))
            })?;
        values
            .iter()
            .map(|v| {
                v.as_str().ok_or_else(|| {
                    DispatchError::Input(format!(
                        "task setting '{}' must contain only strings",
                        key
                    ))
                })
            })
            .collect()
    }

    /// Optional `top_n`; a present but non-integer value is an input error.
    pub fn top_n(&self) -> Result<Option<usize>> {
        match self.get("top_n") {
            None => Ok(None),
            Some(v) => v.as_u64().map(|n| Some(n as usize)).ok_or_else(|| {
                DispatchError::Input("task setting 'top_n' must be a non-negative integer".into())
            }),
        }
    }

    /// The query string for the item search tasks.
    pub fn query_text(&self) -> Result<&str> {
        self.require_str("query")
    }

    /// The `{id, text}` query document for sentence comparison.
    pub fn query_document(&self) -> Result<Document> {
        let obj = self
            .get("query")
            .ok_or_else(|| DispatchError::Config("missing task setting 'query'".into()))?
            .as_object()
            .ok_or_else(|| {
                DispatchError::Input(
                    "task setting 'query' must be an object with 'id' and 'text'".into(),
                )
            })?;
        let id = obj.get("id").and_then(|v| v.as_str()).ok_or_else(|| {
            DispatchError::Input("task setting 'query' is missing a string 'id'".into())
        })?;
        let text = obj.get("text").and_then(|v| v.as_str()).ok_or_else(|| {
            DispatchError::Input("task setting 'query' is missing a string 'text'".into())
        })?;
        Ok(Document {
            id: id.to_string(),
            text: text.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(value: Value) -> TaskSettings {
        TaskSettings(value.as_object().unwrap().clone())
    }

    #[test]
    fn test_document_accepts_bare_string() {
        let doc: Document = serde_json::from_value(json!("plain text")).unwrap();
        assert_eq!(doc.id, "");
        assert_eq!(doc.text, "plain text");
    }

    #[test]
    fn test_document_accepts_object() {
        let doc: Document = serde_json::from_value(json!({"id": "d1", "text": "body"})).unwrap();
        assert_eq!(doc.id, "d1");
        assert_eq!(doc.text, "body");
    }

    #[test]
    fn test_require_str_missing_is_config_error() {
        let s = settings(json!({}));
        match s.require_str("instructions") {
            Err(DispatchError::Config(msg)) => assert!(msg.contains("instructions")),
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_require_str_wrong_type_is_input_error() {
        let s = settings(json!({"instructions": 42}));
        assert!(matches!(
            s.require_str("instructions"),
            Err(DispatchError::Input(_))
        ));
    }

    #[test]
    fn test_top_n_absent_present_and_malformed() {
        assert_eq!(settings(json!({})).top_n().unwrap(), None);
        assert_eq!(settings(json!({"top_n": 3})).top_n().unwrap(), Some(3));
        assert!(matches!(
            settings(json!({"top_n": "three"})).top_n(),
            Err(DispatchError::Input(_))
        ));
    }

    #[test]
    fn test_query_document_shape() {
        let s = settings(json!({"query": {"id": "q", "text": "A. B."}}));
        let doc = s.query_document().unwrap();
        assert_eq!(doc.id, "q");

        let bad = settings(json!({"query": "just a string"}));
        assert!(matches!(bad.query_document(), Err(DispatchError::Input(_))));
    }

    #[test]
    fn test_result_record_serialization_omits_unset_fields() {
        let rec = ResultRecord::text("hello".into());
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["success"], json!(true));
        assert_eq!(v["text"], json!("hello"));
        assert!(v.get("stats").is_none());
        assert!(v.get("response").is_none());

        let fail = ResultRecord::failure(429, json!({"error": "rate limited"}));
        let v = serde_json::to_value(&fail).unwrap();
        assert_eq!(v["success"], json!(false));
        assert_eq!(v["status"], json!(429));
        assert!(v.get("text").is_none());
    }
}
