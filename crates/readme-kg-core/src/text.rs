//! Query and passage normalization.
//!
//! Two views of the same text are used downstream:
//!
//! - [`tokenize`] — lower-cased tokens with punctuation replaced by
//!   whitespace. Stop words are kept, so the classifier can match phrases
//!   such as `"what is"`.
//! - [`normalize_terms`] — the tokens that carry content: stop words and
//!   single-character tokens are dropped. Both scoring strategies operate
//!   on these terms.
//!
//! Both functions are pure: the same input always yields the same output.
//!
//! # Example
//!
//! ```rust
//! use readme_kg_core::text::{normalize_terms, tokenize};
//!
//! assert_eq!(tokenize("What's the SDK for?"), vec!["what", "s", "the", "sdk", "for"]);
//! assert_eq!(normalize_terms("What's the SDK for?"), vec!["sdk"]);
//! ```

/// English function words ignored by the scorers.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "all", "also", "am", "an", "and", "any", "are",
    "as", "at", "be", "been", "being", "but", "by", "can", "could", "did", "do", "does",
    "doing", "for", "from", "had", "has", "have", "having", "he", "her", "here", "him", "his",
    "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "me", "more", "most",
    "my", "no", "nor", "not", "of", "off", "on", "once", "only", "or", "other", "our", "out",
    "over", "own", "same", "she", "should", "so", "some", "such", "than", "that", "the",
    "their", "them", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your",
];

/// Lower-case `text`, treat every non-alphanumeric character as a
/// separator, and split into tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Content-bearing terms of `text`, in order of appearance.
///
/// Duplicates are preserved (term frequency matters to TF-IDF).
pub fn normalize_terms(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| t.chars().count() > 1 && !is_stop_word(t))
        .collect()
}

/// Returns true when `text` has no tokens at all after normalization.
pub fn is_blank(text: &str) -> bool {
    tokenize(text).is_empty()
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_strips_punctuation() {
        assert_eq!(
            tokenize("Run: pip install example-sdk"),
            vec!["run", "pip", "install", "example", "sdk"]
        );
    }

    #[test]
    fn test_tokenize_code() {
        assert_eq!(tokenize("import sdk; sdk.run()"), vec!["import", "sdk", "sdk", "run"]);
    }

    #[test]
    fn test_normalize_drops_stop_words_keeps_duplicates() {
        assert_eq!(
            normalize_terms("The sdk and the SDK"),
            vec!["sdk".to_string(), "sdk".to_string()]
        );
    }

    #[test]
    fn test_normalize_drops_single_chars() {
        assert_eq!(normalize_terms("Python 3.11 x"), vec!["python", "11"]);
    }

    #[test]
    fn test_blank() {
        assert!(is_blank(""));
        assert!(is_blank("   \t\n"));
        assert!(is_blank("?!..."));
        assert!(!is_blank("what is it"));
    }

    #[test]
    fn test_unicode_lowercase() {
        assert_eq!(tokenize("ÉNERGIE Übersicht"), vec!["énergie", "übersicht"]);
    }
}
