//! Relatedness ranking over embedding vectors.
//!
//! Two algorithms: a full O(N) cosine scan of a pre-embedded corpus for the
//! item search tasks, and a pairwise query-sentence x document-sentence
//! similarity matrix for sentence comparison. No index structures; the
//! corpora are small enough that a scan is the honest choice.

use crate::models::{EmbeddingRecord, ScoredText, SentenceLink, SentenceUnit};

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`; `0.0` for empty vectors or vectors of
/// different lengths. Relatedness in the ranking sense is
/// `1 - cosine_distance`, which is this same value.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// Rank every corpus item by relatedness to the query embedding.
///
/// Full scan, stable sort descending by score (ties keep corpus order),
/// truncated to `top_n` (default: the whole corpus).
pub fn rank_items(
    query: &[f32],
    corpus: &[EmbeddingRecord],
    top_n: Option<usize>,
) -> Vec<ScoredText> {
    let mut scored: Vec<ScoredText> = corpus
        .iter()
        .map(|record| ScoredText {
            id: record.id.clone(),
            score: cosine_similarity(query, &record.vector) as f64,
        })
        .collect();

    // Stable sort: equal scores keep their corpus order.
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_n.unwrap_or(corpus.len()));
    scored
}

/// Link each query sentence to its `top_n` most similar document sentences.
///
/// `sentences` is the flattened list produced during comparison: the query
/// sentences (`source_index == 0`) followed by each document's sentences in
/// order. The full pairwise matrix has one row per query sentence and one
/// column per document sentence; per row, the `top_n` largest entries are
/// selected, ties broken by the document sentence's position in the
/// flattened list. Links are emitted row by row, best match first.
pub fn top_links(sentences: &[SentenceUnit], top_n: usize) -> Vec<SentenceLink> {
    let query_sents: Vec<&SentenceUnit> = sentences
        .iter()
        .filter(|s| s.source_index == 0)
        .collect();
    let doc_sents: Vec<&SentenceUnit> = sentences
        .iter()
        .filter(|s| s.source_index > 0)
        .collect();

    let mut links = Vec::new();

    for query_sent in &query_sents {
        let mut row: Vec<(usize, f64)> = doc_sents
            .iter()
            .enumerate()
            .map(|(col, doc_sent)| {
                (
                    col,
                    cosine_similarity(&query_sent.embedding, &doc_sent.embedding) as f64,
                )
            })
            .collect();

        // Stable sort keeps earlier flattened positions first on ties.
        row.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        for &(col, score) in row.iter().take(top_n) {
            let doc_sent = doc_sents[col];
            links.push(SentenceLink {
                query_id: query_sent.source_id.clone(),
                query_chars: query_sent.chars,
                query_sent: query_sent.text.clone(),
                document_id: doc_sent.source_id.clone(),
                document_chars: doc_sent.chars,
                document_sent: doc_sent.text.clone(),
                score,
            });
        }
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, vector: Vec<f32>) -> EmbeddingRecord {
        EmbeddingRecord {
            id: id.to_string(),
            vector,
        }
    }

    fn unit(source_id: &str, source_index: usize, text: &str, embedding: Vec<f32>) -> SentenceUnit {
        SentenceUnit {
            source_id: source_id.to_string(),
            source_index,
            chars: [0, text.chars().count()],
            text: text.to_string(),
            embedding,
        }
    }

    #[test]
    fn test_cosine_identical() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_rank_identical_vector_scores_one() {
        let corpus = vec![
            record("N1", vec![0.0, 1.0, 0.0]),
            record("N7", vec![1.0, 0.0, 0.0]),
            record("N9", vec![0.0, 0.0, 1.0]),
        ];
        let ranked = rank_items(&[1.0, 0.0, 0.0], &corpus, Some(1));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "N7");
        assert!((ranked[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rank_returns_whole_corpus_by_default() {
        let corpus = vec![
            record("a", vec![1.0, 0.0]),
            record("b", vec![0.7, 0.7]),
            record("c", vec![0.0, 1.0]),
        ];
        let ranked = rank_items(&[1.0, 0.0], &corpus, None);
        assert_eq!(ranked.len(), 3);
        let ids: Vec<&str> = ranked.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_rank_scores_non_increasing_and_recomputable() {
        let corpus = vec![
            record("x", vec![0.3, 0.9, 0.1]),
            record("y", vec![0.9, 0.1, 0.2]),
            record("z", vec![0.5, 0.5, 0.5]),
        ];
        let query = [0.8, 0.2, 0.3];
        let ranked = rank_items(&query, &corpus, None);
        for pair in ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        for item in &ranked {
            let expected = corpus
                .iter()
                .find(|r| r.id == item.id)
                .map(|r| cosine_similarity(&query, &r.vector) as f64)
                .unwrap();
            assert!((item.score - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rank_ties_keep_corpus_order() {
        let corpus = vec![
            record("first", vec![1.0, 0.0]),
            record("second", vec![1.0, 0.0]),
            record("third", vec![2.0, 0.0]),
        ];
        let ranked = rank_items(&[1.0, 0.0], &corpus, None);
        // All three are cosine-identical to the query.
        let ids: Vec<&str> = ranked.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_rank_top_n_clamped_to_corpus() {
        let corpus = vec![record("only", vec![1.0, 0.0])];
        let ranked = rank_items(&[1.0, 0.0], &corpus, Some(10));
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_links_one_per_query_sentence() {
        let sentences = vec![
            unit("q", 0, "A.", vec![1.0, 0.0]),
            unit("q", 0, "B.", vec![0.0, 1.0]),
            unit("d1", 1, "C.", vec![1.0, 0.1]),
            unit("d1", 1, "D.", vec![0.1, 1.0]),
        ];
        let links = top_links(&sentences, 1);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].query_sent, "A.");
        assert_eq!(links[0].document_sent, "C.");
        assert_eq!(links[1].query_sent, "B.");
        assert_eq!(links[1].document_sent, "D.");
        for link in &links {
            assert_eq!(link.query_id, "q");
            assert_eq!(link.document_id, "d1");
        }
    }

    #[test]
    fn test_links_per_row_top_n_are_row_maxima() {
        let sentences = vec![
            unit("q", 0, "Q.", vec![1.0, 0.0, 0.0]),
            unit("d1", 1, "far.", vec![0.0, 1.0, 0.0]),
            unit("d1", 1, "near.", vec![0.9, 0.1, 0.0]),
            unit("d2", 2, "mid.", vec![0.5, 0.5, 0.0]),
        ];
        let links = top_links(&sentences, 2);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].document_sent, "near.");
        assert_eq!(links[1].document_sent, "mid.");
        assert!(links[0].score >= links[1].score);
    }

    #[test]
    fn test_links_tie_prefers_earlier_flattened_position() {
        let sentences = vec![
            unit("q", 0, "Q.", vec![1.0, 0.0]),
            unit("d1", 1, "same1.", vec![2.0, 0.0]),
            unit("d2", 2, "same2.", vec![3.0, 0.0]),
        ];
        let links = top_links(&sentences, 1);
        assert_eq!(links.len(), 1);
        // Both document sentences are cosine-identical to the query.
        assert_eq!(links[0].document_sent, "same1.");
    }
}
