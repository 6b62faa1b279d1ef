//! Task identifiers and their dispatch classification.
//!
//! Every request names a task; the task decides which endpoint family it
//! uses (chat completion vs. embedding) and, for embedding tasks, which
//! corpus it compares against. Parsing the identifier up front makes an
//! unrecognized task a hard error before any remote call is issued.

use crate::error::{DispatchError, Result};

/// Which remote endpoint a task uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFamily {
    Chat,
    Embedding,
}

/// Which embedding collection an embedding-family task compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusKind {
    /// The static knowledge-graph node corpus.
    Nodes,
    /// The static document corpus.
    Documents,
    /// The documents supplied with the request, segmented into sentences.
    SuppliedDocuments,
}

/// All recognized task identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Analyze,
    Summarize,
    ExtractEntities,
    ClassifyTopics,
    GenerateQuestions,
    GenerateTasks,
    ExplainConcepts,
    AnswerQuestions,
    Custom,
    SearchNodes,
    SearchDocuments,
    CompareSentences,
}

impl Task {
    /// Parse a task identifier from the wire.
    pub fn parse(name: &str) -> Result<Task> {
        Ok(match name {
            "analyze" => Task::Analyze,
            "summarize" => Task::Summarize,
            "extract_entities" => Task::ExtractEntities,
            "classify_topics" => Task::ClassifyTopics,
            "generate_questions" => Task::GenerateQuestions,
            "generate_tasks" => Task::GenerateTasks,
            "explain_concepts" => Task::ExplainConcepts,
            "answer_questions" => Task::AnswerQuestions,
            "custom" => Task::Custom,
            "search_nodes" => Task::SearchNodes,
            "search_documents" => Task::SearchDocuments,
            "compare_sentences" => Task::CompareSentences,
            other => {
                return Err(DispatchError::Config(format!(
                    "unrecognized task '{}'",
                    other
                )))
            }
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Task::Analyze => "analyze",
            Task::Summarize => "summarize",
            Task::ExtractEntities => "extract_entities",
            Task::ClassifyTopics => "classify_topics",
            Task::GenerateQuestions => "generate_questions",
            Task::GenerateTasks => "generate_tasks",
            Task::ExplainConcepts => "explain_concepts",
            Task::AnswerQuestions => "answer_questions",
            Task::Custom => "custom",
            Task::SearchNodes => "search_nodes",
            Task::SearchDocuments => "search_documents",
            Task::CompareSentences => "compare_sentences",
        }
    }

    pub fn family(&self) -> TaskFamily {
        match self {
            Task::SearchNodes | Task::SearchDocuments | Task::CompareSentences => {
                TaskFamily::Embedding
            }
            _ => TaskFamily::Chat,
        }
    }

    /// The comparison corpus for embedding-family tasks; `None` for chat.
    pub fn corpus(&self) -> Option<CorpusKind> {
        match self {
            Task::SearchNodes => Some(CorpusKind::Nodes),
            Task::SearchDocuments => Some(CorpusKind::Documents),
            Task::CompareSentences => Some(CorpusKind::SuppliedDocuments),
            _ => None,
        }
    }
}
