//! ROUGE overlap scoring for generated summaries.
//!
//! Computes ROUGE-1, ROUGE-2 (n-gram overlap F-measures) and ROUGE-L
//! (longest common subsequence F-measure) between a generated summary and
//! the source text. Tokenization is lowercase alphanumeric words; no
//! stemming is applied.

use std::collections::HashMap;

/// ROUGE-1/2/L F-measures, each in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RougeScores {
    pub rouge1: f64,
    pub rouge2: f64,
    pub rouge_l: f64,
}

/// Score `prediction` against `reference`.
pub fn score(prediction: &str, reference: &str) -> RougeScores {
    let pred = tokenize(prediction);
    let refr = tokenize(reference);

    RougeScores {
        rouge1: ngram_f1(&pred, &refr, 1),
        rouge2: ngram_f1(&pred, &refr, 2),
        rouge_l: lcs_f1(&pred, &refr),
    }
}

/// Lowercase alphanumeric word tokens.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], u64> {
    let mut counts: HashMap<&[String], u64> = HashMap::new();
    if tokens.len() >= n {
        for gram in tokens.windows(n) {
            *counts.entry(gram).or_insert(0) += 1;
        }
    }
    counts
}

/// F-measure of clipped n-gram overlap.
fn ngram_f1(pred: &[String], refr: &[String], n: usize) -> f64 {
    let pred_counts = ngram_counts(pred, n);
    let ref_counts = ngram_counts(refr, n);

    let pred_total: u64 = pred_counts.values().sum();
    let ref_total: u64 = ref_counts.values().sum();
    if pred_total == 0 || ref_total == 0 {
        return 0.0;
    }

    let overlap: u64 = pred_counts
        .iter()
        .map(|(gram, &count)| count.min(ref_counts.get(*gram).copied().unwrap_or(0)))
        .sum();

    f1(overlap as f64 / pred_total as f64, overlap as f64 / ref_total as f64)
}

/// F-measure of the longest common subsequence length.
fn lcs_f1(pred: &[String], refr: &[String]) -> f64 {
    if pred.is_empty() || refr.is_empty() {
        return 0.0;
    }

    // Two-row DP over token sequences.
    let mut prev = vec![0usize; refr.len() + 1];
    let mut curr = vec![0usize; refr.len() + 1];
    for p in pred {
        for (j, r) in refr.iter().enumerate() {
            curr[j + 1] = if p == r {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    let lcs = prev[refr.len()];

    f1(lcs as f64 / pred.len() as f64, lcs as f64 / refr.len() as f64)
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts_score_one() {
        let s = score("the quick brown fox", "the quick brown fox");
        assert!((s.rouge1 - 1.0).abs() < 1e-9);
        assert!((s.rouge2 - 1.0).abs() < 1e-9);
        assert!((s.rouge_l - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_texts_score_zero() {
        let s = score("alpha beta gamma", "delta epsilon zeta");
        assert_eq!(s.rouge1, 0.0);
        assert_eq!(s.rouge2, 0.0);
        assert_eq!(s.rouge_l, 0.0);
    }

    #[test]
    fn test_empty_prediction() {
        let s = score("", "some reference text");
        assert_eq!(s.rouge1, 0.0);
        assert_eq!(s.rouge_l, 0.0);
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let a = score("The Fox, jumped!", "the fox jumped");
        assert!((a.rouge1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_unigram_overlap() {
        // pred: {a, b}; ref: {a, c}. overlap 1, P = R = 1/2, F1 = 1/2.
        let s = score("a b", "a c");
        assert!((s.rouge1 - 0.5).abs() < 1e-9);
        assert_eq!(s.rouge2, 0.0);
    }

    #[test]
    fn test_rouge_l_respects_order() {
        // Same unigram bag, reversed order: rouge1 is 1, rougeL is not.
        let s = score("a b c d", "d c b a");
        assert!((s.rouge1 - 1.0).abs() < 1e-9);
        assert!(s.rouge_l < 1.0);
        // LCS of any single token => P = R = 1/4.
        assert!((s.rouge_l - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_clipped_counts() {
        // "a a a" vs "a": overlap clipped to 1. P = 1/3, R = 1, F1 = 0.5.
        let s = score("a a a", "a");
        assert!((s.rouge1 - 0.5).abs() < 1e-9);
    }
}
