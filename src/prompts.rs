//! Prompt template registry.
//!
//! Pure functions mapping (task, document multiplicity, user settings) to a
//! two-message chat prompt: one system message fixing the role framing and
//! interpolating up to two user-supplied instruction strings verbatim, and
//! one user message carrying the concatenated document text.
//!
//! The behavioral requirements the templates impose on the model ("you MUST
//! cite which documents...") are advisory; nothing here validates the
//! returned text against them.

use crate::error::{DispatchError, Result};
use crate::models::{Document, PromptMessage, TaskSettings};
use crate::tasks::Task;

/// Separator placed between documents in multi-document prompts. Same token
/// as the `multi-news` dataset uses.
pub const DOC_SEP: &str = "|||||";

/// Signature shared by every template: separator token, joined document
/// text, and the per-task instruction strings.
type Formatter = fn(&str, &str, &[String]) -> Vec<PromptMessage>;

/// Format the chat prompt for `task` over `documents`.
///
/// Selection is a pure function of `(task, documents.len() > 1)` plus the
/// settings the task consumes; identical inputs yield byte-identical
/// messages. Zero documents is rejected before template selection.
pub fn format_prompt(
    task: Task,
    settings: &TaskSettings,
    documents: &[Document],
) -> Result<Vec<PromptMessage>> {
    if documents.is_empty() {
        return Err(DispatchError::Input(format!(
            "task '{}' requires at least one document",
            task.name()
        )));
    }
    let multi = documents.len() > 1;
    let instructions = instructions_for(task, settings)?;
    let formatter = select_formatter(task, multi, settings)?;

    let doc_prompt = documents
        .iter()
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join(DOC_SEP);

    Ok(formatter(DOC_SEP, &doc_prompt, &instructions))
}

/// Collect the instruction strings a task interpolates into its template.
fn instructions_for(task: Task, settings: &TaskSettings) -> Result<Vec<String>> {
    Ok(match task {
        Task::Analyze
        | Task::Summarize
        | Task::ClassifyTopics
        | Task::GenerateQuestions
        | Task::GenerateTasks => vec![settings.require_str("instructions")?.to_string()],
        Task::ExtractEntities => vec![
            settings.require_str("entity")?.to_string(),
            settings.require_str("instructions")?.to_string(),
        ],
        Task::ExplainConcepts => {
            let concepts = settings.require_str_list("concepts")?;
            let quoted: Vec<String> = concepts.iter().map(|c| format!("\"{}\"", c)).collect();
            vec![
                quoted.join(", "),
                settings.require_str("instructions")?.to_string(),
            ]
        }
        Task::AnswerQuestions => {
            let questions = settings.require_str_list("questions")?;
            let quoted: Vec<String> = questions.iter().map(|q| format!("\"{}\"", q)).collect();
            vec![
                quoted.join(", "),
                settings.require_str("instructions")?.to_string(),
            ]
        }
        Task::Custom => vec![settings.require_str("prompt")?.to_string()],
        Task::SearchNodes | Task::SearchDocuments | Task::CompareSentences => {
            return Err(DispatchError::Config(format!(
                "task '{}' has no chat prompt template",
                task.name()
            )))
        }
    })
}

fn select_formatter(task: Task, multi: bool, settings: &TaskSettings) -> Result<Formatter> {
    Ok(match (task, multi) {
        (Task::Analyze, false) => analyze_singledoc,
        (Task::Analyze, true) => analyze_multidoc,
        (Task::Summarize, _) => {
            let length = settings.require_str("summary_length")?;
            match (length, multi) {
                ("concise", false) => summarize_concise_singledoc,
                ("concise", true) => summarize_concise_multidoc,
                ("verbose", false) => summarize_verbose_singledoc,
                ("verbose", true) => summarize_verbose_multidoc,
                (other, _) => {
                    return Err(DispatchError::Config(format!(
                        "unknown summary_length '{}' (expected 'concise' or 'verbose')",
                        other
                    )))
                }
            }
        }
        (Task::ExtractEntities, false) => extract_singledoc,
        (Task::ExtractEntities, true) => extract_multidoc,
        (Task::ClassifyTopics, false) => classify_singledoc,
        (Task::ClassifyTopics, true) => classify_multidoc,
        (Task::GenerateQuestions, false) => questions_singledoc,
        (Task::GenerateQuestions, true) => questions_multidoc,
        (Task::GenerateTasks, false) => tasks_singledoc,
        (Task::GenerateTasks, true) => tasks_multidoc,
        (Task::ExplainConcepts, false) => explain_singledoc,
        (Task::ExplainConcepts, true) => explain_multidoc,
        (Task::AnswerQuestions, false) => answer_singledoc,
        (Task::AnswerQuestions, true) => answer_multidoc,
        (Task::Custom, false) => custom_singledoc,
        (Task::Custom, true) => custom_multidoc,
        (Task::SearchNodes | Task::SearchDocuments | Task::CompareSentences, _) => {
            return Err(DispatchError::Config(format!(
                "task '{}' has no chat prompt template",
                task.name()
            )))
        }
    })
}

/// Pair a system prompt with the document payload as the user message.
/// Trailing whitespace left by an empty instruction slot is trimmed.
fn messages(system: String, doc_prompt: &str) -> Vec<PromptMessage> {
    vec![
        PromptMessage::system(system.trim().to_string()),
        PromptMessage::user(doc_prompt),
    ]
}

// ============ analyze ============

fn analyze_singledoc(_sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant for analyzing a single document.\n\n\
             You will be provided a single document.\n\n\
             Your task is to analyze the document as if you are a professional intelligence analyst. \
             You MUST cite how you used the document for analysis in your response. {}",
            instr[0]
        ),
        doc_prompt,
    )
}

fn analyze_multidoc(sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant for analyzing multiple documents.\n\n\
             You will be provided multiple documents, where each document is separated by {}.\n\n\
             Your task is to analyze the documents as if you are a professional intelligence analyst. \
             You MUST cite (1) which documents you used for analysis and (2) how you used the documents \
             in your response. {}",
            sep, instr[0]
        ),
        doc_prompt,
    )
}

// ============ summarize ============

fn summarize_concise_singledoc(_sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant for summarizing a single document.\n\n\
             You will be provided a single document.\n\n\
             In clear and concise language, summarize the main events that are described in the document. \
             Start your response by saying 'This document'. Return your response in a single sentence. {}",
            instr[0]
        ),
        doc_prompt,
    )
}

fn summarize_concise_multidoc(sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant for summarizing multiple documents.\n\n\
             You will be provided multiple documents, where each document is separated by {}.\n\n\
             In clear and concise language, summarize the main events that are described across all of \
             the documents. Start your response by saying 'The documents'. Return your response in a \
             single sentence. {}",
            sep, instr[0]
        ),
        doc_prompt,
    )
}

fn summarize_verbose_singledoc(_sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant for summarizing a single document.\n\n\
             You will be provided a single document.\n\n\
             In clear and concise language, summarize the key points, themes, and events described in \
             the document. {}",
            instr[0]
        ),
        doc_prompt,
    )
}

fn summarize_verbose_multidoc(sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant for summarizing multiple documents.\n\n\
             You will be provided multiple documents, where each document is separated by {}.\n\n\
             In clear and concise language, summarize the key points, themes, and events described in \
             each document. {}",
            sep, instr[0]
        ),
        doc_prompt,
    )
}

// ============ extract_entities ============

fn extract_singledoc(_sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant for extracting all entities from a single document.\n\n\
             You will be provided a single document.\n\n\
             Your task is to extract all entities of the following type: \"{}\". You MUST use ONLY the \
             provided document. You will NOT use any other source of information. {}",
            instr[0], instr[1]
        ),
        doc_prompt,
    )
}

fn extract_multidoc(sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant for extracting all entities from multiple documents.\n\n\
             You will be provided multiple documents, where each document is separated by {}.\n\n\
             Your task is to extract all entities of the following type: \"{}\". If multiple documents \
             contain multiple entities, list all documents that entity is described in. You MUST use \
             ONLY the provided documents. You will NOT use any other source of information. You MUST \
             cite which documents each entity was extracted from in your response. {}",
            sep, instr[0], instr[1]
        ),
        doc_prompt,
    )
}

// ============ classify_topics ============

fn classify_singledoc(_sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant for classifying the topics of a single document.\n\n\
             You will be provided a single document.\n\n\
             Your task is to classify the topics of the document. For each topic, please list two \
             items: (1) the name of the topic; and (2) a short description of the topic. {}",
            instr[0]
        ),
        doc_prompt,
    )
}

fn classify_multidoc(sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant for classifying the topics of multiple documents.\n\n\
             You will be provided multiple documents, where each document is separated by {}.\n\n\
             Your task is to classify the topics in each document. For each topic, please list three \
             items: (1) the name of the topic; (2) a short description of the topic; and (3) which \
             documents the topic belongs to. {}",
            sep, instr[0]
        ),
        doc_prompt,
    )
}

// ============ generate_questions ============

fn questions_singledoc(_sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant for synthesizing analytic questions to ask about a single \
             document.\n\n\
             You will be provided a single document.\n\n\
             Your task is to synthesize analytic questions to ask about the document as if you are a \
             professional intelligence analyst. You MUST cite how you used the document to synthesize \
             the questions in your response. {}",
            instr[0]
        ),
        doc_prompt,
    )
}

fn questions_multidoc(sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant for synthesizing analytic questions to ask about multiple \
             documents.\n\n\
             You will be provided multiple documents, where each document is separated by {}.\n\n\
             Your task is to synthesize analytic questions to ask about the documents as if you are a \
             professional intelligence analyst. You MUST cite (1) which documents you used to \
             synthesize the questions and (2) how you used the documents in your response. {}",
            sep, instr[0]
        ),
        doc_prompt,
    )
}

// ============ generate_tasks ============

fn tasks_singledoc(_sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant for synthesizing analytic tasks to perform with a single \
             document.\n\n\
             You will be provided a single document.\n\n\
             Your task is to synthesize analytic tasks to perform with the document as if you are a \
             professional intelligence analyst. You MUST cite how you used the document to synthesize \
             the tasks in your response. {}",
            instr[0]
        ),
        doc_prompt,
    )
}

fn tasks_multidoc(sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant for synthesizing analytic tasks to ask about multiple \
             documents.\n\n\
             You will be provided multiple documents, where each document is separated by {}.\n\n\
             Your task is to synthesize analytic tasks to ask about the documents as if you are a \
             professional intelligence analyst. You MUST cite (1) which documents you used to \
             synthesize the tasks and (2) how you used the documents in your response. {}",
            sep, instr[0]
        ),
        doc_prompt,
    )
}

// ============ explain_concepts ============

fn explain_singledoc(_sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant for explaining concepts using a single document.\n\n\
             You will be provided a single document.\n\n\
             Your task is to use the document to explain the following concepts: {}. You MUST use ONLY \
             the provided document. You will NOT use any other source of information. {}",
            instr[0], instr[1]
        ),
        doc_prompt,
    )
}

fn explain_multidoc(sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant for explaining concepts using multiple documents.\n\n\
             You will be provided multiple documents, where each document is separated by {}.\n\n\
             Your task is to use the documents to explain the following concepts: {}. You MUST use \
             ONLY the provided documents. You will NOT use any other source of information. You MUST \
             cite which documents you used to explain each concept in your response. {}",
            sep, instr[0], instr[1]
        ),
        doc_prompt,
    )
}

// ============ answer_questions ============

fn answer_singledoc(_sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant for answering questions using a single document.\n\n\
             You will be provided a single document.\n\n\
             Your task is to use the document to answer the following questions: {}. You MUST use ONLY \
             the provided document. You will NOT use any other source of information. Please explain \
             how you used the provided document in your response. {}",
            instr[0], instr[1]
        ),
        doc_prompt,
    )
}

fn answer_multidoc(sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant for answering questions using multiple documents.\n\n\
             You will be provided multiple documents, where each document is separated by {}.\n\n\
             Your task is to use the documents to answer the following questions: {}. You MUST use \
             ONLY the provided documents. You will NOT use any other source of information. Please \
             explain how you used the provided documents in your response. {}",
            sep, instr[0], instr[1]
        ),
        doc_prompt,
    )
}

// ============ custom ============

fn custom_singledoc(_sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant that expertly uses a single document to perform tasks.\n\n\
             You will be provided a single document.\n\n\
             You will use the document to perform the following task: {}",
            instr[0]
        ),
        doc_prompt,
    )
}

fn custom_multidoc(sep: &str, doc_prompt: &str, instr: &[String]) -> Vec<PromptMessage> {
    messages(
        format!(
            "You are a helpful assistant that expertly uses multiple documents to perform tasks.\n\n\
             You will be provided multiple documents, where each document is separated by {}.\n\n\
             You will use the documents to perform the following task: {}",
            sep, instr[0]
        ),
        doc_prompt,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use serde_json::json;

    fn settings(value: serde_json::Value) -> TaskSettings {
        TaskSettings(value.as_object().unwrap().clone())
    }

    fn doc(id: &str, text: &str) -> Document {
        Document {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_system_then_user_invariant() {
        let s = settings(json!({"instructions": "Be brief."}));
        let msgs = format_prompt(Task::Analyze, &s, &[doc("d1", "body")]).unwrap();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[1].role, Role::User);
        assert_eq!(msgs[1].content, "body");
    }

    #[test]
    fn test_zero_documents_rejected() {
        let s = settings(json!({"instructions": ""}));
        assert!(matches!(
            format_prompt(Task::Analyze, &s, &[]),
            Err(DispatchError::Input(_))
        ));
    }

    #[test]
    fn test_selection_is_pure() {
        let s = settings(json!({"instructions": "Focus on dates.", "summary_length": "concise"}));
        let docs = [doc("a", "First."), doc("b", "Second.")];
        let one = format_prompt(Task::Summarize, &s, &docs).unwrap();
        let two = format_prompt(Task::Summarize, &s, &docs).unwrap();
        assert_eq!(one, two);
    }

    #[test]
    fn test_multidoc_prompt_names_separator_and_joins_docs() {
        let s = settings(json!({"instructions": ""}));
        let docs = [doc("a", "First."), doc("b", "Second.")];
        let msgs = format_prompt(Task::Analyze, &s, &docs).unwrap();
        assert!(msgs[0].content.contains(DOC_SEP));
        assert_eq!(msgs[1].content, format!("First.{}Second.", DOC_SEP));
    }

    #[test]
    fn test_summarize_selects_on_length() {
        let docs = [doc("a", "text")];
        let concise = settings(json!({"instructions": "", "summary_length": "concise"}));
        let msgs = format_prompt(Task::Summarize, &concise, &docs).unwrap();
        assert!(msgs[0].content.contains("single sentence"));

        let verbose = settings(json!({"instructions": "", "summary_length": "verbose"}));
        let msgs = format_prompt(Task::Summarize, &verbose, &docs).unwrap();
        assert!(msgs[0].content.contains("key points, themes, and events"));

        let bad = settings(json!({"instructions": "", "summary_length": "medium"}));
        assert!(matches!(
            format_prompt(Task::Summarize, &bad, &docs),
            Err(DispatchError::Config(_))
        ));
    }

    #[test]
    fn test_explain_quotes_concepts() {
        let s = settings(json!({"instructions": "", "concepts": ["alpha", "beta"]}));
        let msgs = format_prompt(Task::ExplainConcepts, &s, &[doc("a", "text")]).unwrap();
        assert!(msgs[0].content.contains("\"alpha\", \"beta\""));
    }

    #[test]
    fn test_answer_requires_questions_key() {
        let s = settings(json!({"instructions": ""}));
        match format_prompt(Task::AnswerQuestions, &s, &[doc("a", "text")]) {
            Err(DispatchError::Config(msg)) => assert!(msg.contains("questions")),
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_instructions_interpolated_verbatim() {
        let s = settings(json!({"instructions": "Use <b>HTML</b> & symbols."}));
        let msgs = format_prompt(Task::ClassifyTopics, &s, &[doc("a", "text")]).unwrap();
        assert!(msgs[0].content.ends_with("Use <b>HTML</b> & symbols."));
    }

    #[test]
    fn test_empty_instructions_trimmed() {
        let s = settings(json!({"instructions": ""}));
        let msgs = format_prompt(Task::Analyze, &s, &[doc("a", "text")]).unwrap();
        assert!(!msgs[0].content.ends_with(' '));
    }
}
