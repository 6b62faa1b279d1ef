//! Task dispatcher and result normalizer.
//!
//! Takes one `/query` request, classifies the task, assembles endpoint
//! parameters, issues at most one remote call, and normalizes whatever
//! comes back into a [`ResultRecord`]. The dispatcher is stateless across
//! invocations; the only shared data is the read-only corpus store.
//!
//! A non-200 from the model service is not an error here: the client's
//! [`DispatchError::Remote`] is unwrapped into a structured failure record
//! carrying the raw payload and status, for every task uniformly.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::client::{token_budget, ModelClient};
use crate::config::Config;
use crate::corpus::CorpusStore;
use crate::error::{DispatchError, Result};
use crate::models::{
    Document, PercentReduction, QueryRequest, ResultRecord, SentenceUnit, SummaryStats,
};
use crate::params::{apply_overrides, default_params};
use crate::prompts::format_prompt;
use crate::ranker::{rank_items, top_links};
use crate::rouge;
use crate::segment::split_sentences;
use crate::tasks::{CorpusKind, Task, TaskFamily};
use crate::usage::record_usage;

pub struct Dispatcher {
    config: Arc<Config>,
    client: ModelClient,
    corpora: Arc<CorpusStore>,
}

impl Dispatcher {
    pub fn new(config: Arc<Config>, client: ModelClient, corpora: Arc<CorpusStore>) -> Self {
        Self {
            config,
            client,
            corpora,
        }
    }

    /// Run one request end to end.
    pub async fn dispatch(&self, request: &QueryRequest) -> Result<ResultRecord> {
        if request.model_type != "openai" {
            return Err(DispatchError::Config(format!(
                "unsupported model type '{}'",
                request.model_type
            )));
        }

        let task = Task::parse(&request.task)?;
        info!(
            task = task.name(),
            documents = request.documents.len(),
            "dispatching task"
        );

        let params = apply_overrides(
            default_params(task.family()),
            request.model_settings.as_ref(),
        );

        match task.family() {
            TaskFamily::Chat => self.run_chat(task, request, params).await,
            TaskFamily::Embedding => self.run_embedding(task, request, params).await,
        }
    }

    async fn run_chat(
        &self,
        task: Task,
        request: &QueryRequest,
        params: Map<String, Value>,
    ) -> Result<ResultRecord> {
        let messages = format_prompt(task, &request.task_settings, &request.documents)?;
        debug!(system = %messages[0].content, "formatted prompt");

        let max_tokens = token_budget(&request.model_checkpoint, &messages);
        let outcome = match self
            .client
            .chat(
                &request.model_checkpoint,
                &messages,
                max_tokens,
                &params,
                request.seed,
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(DispatchError::Remote { status, body }) => {
                return Ok(ResultRecord::failure(status, body))
            }
            Err(e) => return Err(e),
        };

        if let Err(e) = record_usage(
            &self.config.usage.dir,
            &request.model_checkpoint,
            outcome.input_tokens,
            outcome.output_tokens,
        ) {
            warn!(error = %e, "failed to record token usage");
        }

        let text = outcome.message_content()?;

        if task == Task::Summarize {
            let stats = summary_stats(
                &text,
                &request.documents,
                outcome.input_tokens,
                outcome.output_tokens,
            );
            return Ok(ResultRecord::summary(text, stats));
        }

        Ok(ResultRecord::text(text))
    }

    async fn run_embedding(
        &self,
        task: Task,
        request: &QueryRequest,
        params: Map<String, Value>,
    ) -> Result<ResultRecord> {
        // All embedding tasks are wired to the live dataset only.
        if request.dataset != "live" {
            return Err(DispatchError::Config(format!(
                "unknown dataset '{}'",
                request.dataset
            )));
        }

        let corpus_kind = task.corpus().ok_or_else(|| {
            DispatchError::Config(format!("task '{}' is not an embedding task", task.name()))
        })?;

        match corpus_kind {
            CorpusKind::Nodes => {
                self.search_corpus(request, &params, &self.corpora.nodes, &self.config.corpus.node_id_col)
                    .await
            }
            CorpusKind::Documents => {
                self.search_corpus(
                    request,
                    &params,
                    &self.corpora.documents,
                    &self.config.corpus.document_id_col,
                )
                .await
            }
            CorpusKind::SuppliedDocuments => self.compare_sentences(request, &params).await,
        }
    }

    /// Item search: embed the query, rank the corpus, return the top N.
    async fn search_corpus(
        &self,
        request: &QueryRequest,
        params: &Map<String, Value>,
        corpus: &[crate::models::EmbeddingRecord],
        id_col: &str,
    ) -> Result<ResultRecord> {
        // `id_col`, when the caller supplies it, must match the column the
        // corpus was actually loaded with.
        if let Some(col) = request.task_settings.get("id_col").and_then(|v| v.as_str()) {
            if col != id_col {
                return Err(DispatchError::Config(format!(
                    "id_col '{}' does not match corpus identifier column '{}'",
                    col, id_col
                )));
            }
        }

        let query = request.task_settings.query_text()?;
        let top_n = request.task_settings.top_n()?;

        let outcome = match self
            .client
            .embed(&self.config.model.embedding_model, json!(query), params)
            .await
        {
            Ok(outcome) => outcome,
            Err(DispatchError::Remote { status, body }) => {
                return Ok(ResultRecord::failure(status, body))
            }
            Err(e) => return Err(e),
        };

        let vectors = outcome.vectors()?;
        let query_embedding = vectors
            .first()
            .ok_or_else(|| DispatchError::Integrity("empty embedding response".into()))?;

        Ok(ResultRecord::texts(rank_items(query_embedding, corpus, top_n)))
    }

    /// Sentence comparison: segment the query and every document, embed the
    /// flattened sentence list in one call, and link each query sentence to
    /// its most similar document sentences.
    async fn compare_sentences(
        &self,
        request: &QueryRequest,
        params: &Map<String, Value>,
    ) -> Result<ResultRecord> {
        let query = request.task_settings.query_document()?;
        if request.documents.is_empty() {
            return Err(DispatchError::Input(
                "compare_sentences requires at least one document".into(),
            ));
        }
        if request.documents.iter().any(|d| d.id.is_empty()) {
            return Err(DispatchError::Input(
                "compare_sentences requires every document to carry an id".into(),
            ));
        }

        let top_n = request.task_settings.top_n()?.unwrap_or(1);

        // Flatten: query sentences first (source index 0), then each
        // document's sentences in order.
        let mut pending: Vec<(String, usize, [usize; 2], String)> = Vec::new();
        for sent in split_sentences(&query.text) {
            pending.push((query.id.clone(), 0, [sent.start, sent.end], sent.text));
        }
        let query_sentence_count = pending.len();
        if query_sentence_count == 0 {
            return Err(DispatchError::Input(
                "query text contains no sentences".into(),
            ));
        }

        for (k, doc) in request.documents.iter().enumerate() {
            for sent in split_sentences(&doc.text) {
                pending.push((doc.id.clone(), k + 1, [sent.start, sent.end], sent.text));
            }
        }
        if pending.len() == query_sentence_count {
            return Err(DispatchError::Input(
                "documents contain no sentences to compare against".into(),
            ));
        }

        let texts: Vec<&str> = pending.iter().map(|(_, _, _, text)| text.as_str()).collect();
        let outcome = match self
            .client
            .embed(&self.config.model.embedding_model, json!(texts), params)
            .await
        {
            Ok(outcome) => outcome,
            Err(DispatchError::Remote { status, body }) => {
                return Ok(ResultRecord::failure(status, body))
            }
            Err(e) => return Err(e),
        };

        let vectors = outcome.vectors()?;
        if vectors.len() != pending.len() {
            return Err(DispatchError::Integrity(format!(
                "requested {} sentence embeddings, received {}",
                pending.len(),
                vectors.len()
            )));
        }

        let sentences: Vec<SentenceUnit> = pending
            .into_iter()
            .zip(vectors)
            .map(|((source_id, source_index, chars, text), embedding)| SentenceUnit {
                source_id,
                source_index,
                chars,
                text,
                embedding,
            })
            .collect();

        Ok(ResultRecord::links(top_links(&sentences, top_n)))
    }
}

/// ROUGE overlap of the summary against the whitespace-normalized
/// concatenation of the input documents, plus the token-count reduction.
fn summary_stats(
    summary: &str,
    documents: &[Document],
    input_tokens: u64,
    output_tokens: u64,
) -> SummaryStats {
    let reference: String = documents
        .iter()
        .map(|doc| {
            doc.text
                .replace('\n', " ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .concat();

    let scores = rouge::score(summary, &reference);

    let value = if input_tokens == 0 {
        0.0
    } else {
        (1.0 - output_tokens as f64 / input_tokens as f64) * 100.0
    };

    SummaryStats {
        rouge1: scores.rouge1,
        rouge2: scores.rouge2,
        rouge_l: scores.rouge_l,
        percent_reduction: PercentReduction {
            input: input_tokens,
            output: output_tokens,
            value,
        },
    }
}
