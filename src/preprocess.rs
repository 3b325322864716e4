use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

/// English stop words filtered out before stemming. High-frequency words that
/// carry no retrieval value, including bare contraction fragments left behind
/// by tokenization ("don't" -> "don", "t").
pub const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such",
    "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
    "will", "just", "don", "should", "now",
];

/// The n-gram models the index is built over, in their on-disk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NgramModel {
    Unigram,
    Bigram,
}

impl NgramModel {
    pub const ALL: [NgramModel; 2] = [NgramModel::Unigram, NgramModel::Bigram];

    pub fn n(self) -> usize {
        match self {
            NgramModel::Unigram => 1,
            NgramModel::Bigram => 2,
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            NgramModel::Unigram => "unigram",
            NgramModel::Bigram => "bigram",
        }
    }

    pub fn index(self) -> usize {
        match self {
            NgramModel::Unigram => 0,
            NgramModel::Bigram => 1,
        }
    }
}

/// Turns raw document content into a sequence of stemmed tokens. The pipeline
/// order matters: CSS stripping works on raw text, stop-word removal runs
/// before stemming so the stop list matches surface forms.
pub struct Preprocessor {
    css_regex: Regex,
    token_regex: Regex,
    stopwords: HashSet<&'static str>,
    stemmer: Stemmer,
}

impl Preprocessor {
    pub fn new() -> Self {
        Preprocessor {
            // CSS rule fragments embedded in scraped case documents:
            // a selector run followed by a braced declaration block.
            css_regex: Regex::new(r"(?ms)[.#@][\w.\-]+[ \t]*[\w.\-]+\{.+\} *$").unwrap(),
            token_regex: Regex::new(r"[a-z0-9]+|[^\sa-z0-9]").unwrap(),
            stopwords: STOP_WORDS.iter().copied().collect(),
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// The full pipeline: CSS strip, tokenize, drop punctuation and stop
    /// words, stem.
    pub fn preprocess(&self, text: &str) -> Vec<String> {
        let cleaned = self.remove_css_text(text);
        let tokens = self.tokenize(&cleaned);
        let tokens = self.remove_punctuation(tokens);
        let tokens = self.remove_stopwords(tokens);
        self.stem(tokens)
    }

    pub fn remove_css_text<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.css_regex.replace_all(text, "")
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.token_regex
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    pub fn remove_punctuation(&self, tokens: Vec<String>) -> Vec<String> {
        tokens
            .into_iter()
            .filter(|token| token.chars().any(|c| c.is_alphanumeric()))
            .collect()
    }

    pub fn remove_stopwords(&self, tokens: Vec<String>) -> Vec<String> {
        tokens
            .into_iter()
            .filter(|token| !self.stopwords.contains(token.as_str()))
            .collect()
    }

    pub fn stem(&self, tokens: Vec<String>) -> Vec<String> {
        tokens
            .iter()
            .map(|token| self.stemmer.stem(token).into_owned())
            .collect()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Preprocessor::new()
    }
}

/// Space-joined n-grams over a token sequence. `n == 1` returns the tokens
/// themselves; a sequence shorter than `n` yields nothing.
pub fn generate_ngrams(tokens: &[String], n: usize) -> Vec<String> {
    if n <= 1 {
        return tokens.to_vec();
    }
    tokens.windows(n).map(|window| window.join(" ")).collect()
}

/// Term frequency map. BTreeMap so that every later iteration over the counts
/// is in term order and runs reproduce bit-identical scores.
pub fn count_tokens(tokens: &[String]) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for token in tokens {
        *counts.entry(token.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_strips_stopwords_and_stems() {
        let pre = Preprocessor::new();
        let tokens = pre.preprocess("The quick brown foxes were running!");
        assert_eq!(tokens, vec!["quick", "brown", "fox", "run"]);
    }

    #[test]
    fn test_tokenize_splits_punctuation() {
        let pre = Preprocessor::new();
        let tokens = pre.tokenize("don't stop, now.");
        assert_eq!(tokens, vec!["don", "'", "t", "stop", ",", "now", "."]);
    }

    #[test]
    fn test_punctuation_and_contraction_fragments_removed() {
        let pre = Preprocessor::new();
        let tokens = pre.preprocess("don't stop believing");
        assert_eq!(tokens, vec!["stop", "believ"]);
    }

    #[test]
    fn test_remove_css_text() {
        let pre = Preprocessor::new();
        let text = "before\n.header-class p.x{color: red;} \nafter";
        let cleaned = pre.remove_css_text(text);
        assert!(!cleaned.contains("color"));
        assert!(cleaned.contains("before"));
    }

    #[test]
    fn test_generate_bigrams() {
        let tokens: Vec<String> = ["quick", "brown", "fox"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(generate_ngrams(&tokens, 2), vec!["quick brown", "brown fox"]);
        assert_eq!(generate_ngrams(&tokens, 1), tokens);
    }

    #[test]
    fn test_ngrams_shorter_than_n() {
        let tokens = vec!["lone".to_string()];
        assert!(generate_ngrams(&tokens, 2).is_empty());
    }

    #[test]
    fn test_count_tokens() {
        let tokens: Vec<String> = ["a", "b", "a"].iter().map(|s| s.to_string()).collect();
        let counts = count_tokens(&tokens);
        assert_eq!(counts.get("a"), Some(&2));
        assert_eq!(counts.get("b"), Some(&1));
    }

    #[test]
    fn test_all_stopword_input_yields_nothing() {
        let pre = Preprocessor::new();
        assert!(pre.preprocess("the of and").is_empty());
    }
}
