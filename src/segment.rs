//! Sentence boundary segmentation.
//!
//! Splits text into sentences with character spans into the source. The
//! rules are deliberately simple and fully deterministic: a sentence ends
//! at `.`, `!` or `?` (plus any closing quotes/brackets) followed by
//! whitespace and a capital letter, digit, or opening quote. Dotted
//! abbreviations (`Dr.`, `e.g.`, `U.S.`) and decimal numbers do not end a
//! sentence. Segmenting the same text twice yields identical spans.

/// A segmented sentence. `start`/`end` are char offsets into the source
/// text (`end` exclusive), with surrounding whitespace trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Abbreviations that take a trailing period mid-sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "rev", "gen", "sen", "rep", "st", "sr", "jr", "vs", "etc",
    "inc", "ltd", "co", "corp", "dept", "univ", "assn", "fig", "no", "vol", "approx", "est",
    "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
];

/// Split `text` into sentences with char spans.
///
/// Whitespace-only input produces no sentences. Text without a terminal
/// punctuation mark is a single sentence.
pub fn split_sentences(text: &str) -> Vec<Sentence> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        if c == '.' || c == '!' || c == '?' {
            // Absorb closing quotes/brackets after the terminal mark.
            let mut end = i + 1;
            while end < chars.len() && is_closer(chars[end]) {
                end += 1;
            }

            if is_boundary(&chars, i, end) {
                push_sentence(&mut sentences, &chars, start, end);
                // Advance past whitespace to the next sentence start.
                while end < chars.len() && chars[end].is_whitespace() {
                    end += 1;
                }
                start = end;
                i = end;
                continue;
            }
        }
        i += 1;
    }

    push_sentence(&mut sentences, &chars, start, chars.len());
    sentences
}

/// Whether the terminal mark at `term` (closers absorbed up to `end`)
/// actually ends a sentence.
fn is_boundary(chars: &[char], term: usize, end: usize) -> bool {
    // End of text always closes the sentence.
    if end >= chars.len() {
        return true;
    }
    if !chars[end].is_whitespace() {
        return false;
    }

    // The next non-whitespace char must look like a sentence opener.
    let mut next = end;
    while next < chars.len() && chars[next].is_whitespace() {
        next += 1;
    }
    if next < chars.len() {
        let c = chars[next];
        if !(c.is_uppercase() || c.is_ascii_digit() || is_opener(c)) {
            return false;
        }
    }

    if chars[term] != '.' {
        return true;
    }

    // Periods need an abbreviation check on the preceding token.
    let mut tok_start = term;
    while tok_start > 0 && !chars[tok_start - 1].is_whitespace() {
        tok_start -= 1;
    }
    let token: String = chars[tok_start..term].iter().collect();

    // Dotted initialisms ("U.S", "e.g", "i.e") continue the sentence.
    if token.contains('.') {
        return false;
    }
    let lower = token.trim_start_matches(is_opener).to_lowercase();
    !ABBREVIATIONS.contains(&lower.as_str())
}

fn push_sentence(sentences: &mut Vec<Sentence>, chars: &[char], start: usize, end: usize) {
    let mut s = start;
    let mut e = end;
    while s < e && chars[s].is_whitespace() {
        s += 1;
    }
    while e > s && chars[e - 1].is_whitespace() {
        e -= 1;
    }
    if s < e {
        sentences.push(Sentence {
            start: s,
            end: e,
            text: chars[s..e].iter().collect(),
        });
    }
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '\u{201d}' | '\u{2019}')
}

fn is_opener(c: char) -> bool {
    matches!(c, '"' | '\'' | '(' | '[' | '\u{201c}' | '\u{2018}')
}
