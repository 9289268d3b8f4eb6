//! Keyword-pattern query classifier.
//!
//! Maps a free-text question to one of the six [`BucketId`]s by looking for
//! trigger words in the normalized query. Buckets are checked in a fixed
//! priority order and the first bucket with any matching trigger wins, so
//! a question mentioning both "install" and "example" resolves to
//! [`BucketId::Install`] under the default order.
//!
//! # Default priority
//!
//! `purpose`, `install`, `example`, `features`, `license`, `dependencies`
//! ([`DEFAULT_PRIORITY`]).
//!
//! # Trigger table
//!
//! | Bucket | Triggers |
//! |--------|----------|
//! | purpose | `what is`, `what does`, `use case`, `used for`, `… for`, `purpose*`, `why`, `descri*`, `overview*`, `about`, `summar*` |
//! | install | `install*`, `pip`, `pip3`, `setup`, `set up`, `getting started`, `get started` |
//! | example | `example*`, `code`, `snippet*`, `usage*`, `demo*`, `sample*`, `how to use` |
//! | features | `feature*`, `component*`, `capabilit*`, `supports`, `abilit*` |
//! | license | `licen*`, `mit`, `apache`, `gpl`, `bsd` |
//! | dependencies | `dependenc*`, `require*`, `python`, `version*`, `depends` |
//!
//! (`*` marks a stem: any token starting with it matches. `… for` matches
//! a query whose last token is `for`, as in "What's it for?".)
//!
//! "What's" tokenizes to `what s`, which is not a purpose trigger:
//! "What's the weather today?" stays unclassified.

use serde::Serialize;

use crate::error::ParamsError;
use crate::models::BucketId;
use crate::text::tokenize;

/// Bucket checking order used unless the caller configures another.
pub const DEFAULT_PRIORITY: [BucketId; 6] = BucketId::ALL;

/// How a trigger is matched against the tokenized query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum Trigger {
    /// A whole token equal to the word.
    Word(&'static str),
    /// Any token that starts with the stem.
    Stem(&'static str),
    /// A run of consecutive tokens equal to the phrase's tokens.
    Phrase(&'static str),
    /// The query's last token equal to the word.
    Trailing(&'static str),
}

impl Trigger {
    pub fn matches(&self, tokens: &[String]) -> bool {
        match *self {
            Trigger::Word(w) => tokens.iter().any(|t| t == w),
            Trigger::Stem(s) => tokens.iter().any(|t| t.starts_with(s)),
            Trigger::Phrase(p) => {
                let phrase: Vec<&str> = p.split_whitespace().collect();
                !phrase.is_empty()
                    && tokens
                        .windows(phrase.len())
                        .any(|w| w.iter().zip(&phrase).all(|(t, p)| t == p))
            }
            Trigger::Trailing(w) => tokens.last().is_some_and(|t| t == w),
        }
    }

    pub fn text(&self) -> &'static str {
        match *self {
            Trigger::Word(t) | Trigger::Stem(t) | Trigger::Phrase(t) | Trigger::Trailing(t) => t,
        }
    }
}

/// The trigger set for one bucket.
#[derive(Debug)]
pub struct QueryPattern {
    pub bucket: BucketId,
    pub triggers: &'static [Trigger],
}

/// Static trigger table, one entry per bucket, in [`BucketId`] order.
pub static PATTERNS: [QueryPattern; 6] = [
    QueryPattern {
        bucket: BucketId::Purpose,
        triggers: &[
            Trigger::Phrase("what is"),
            Trigger::Phrase("what does"),
            Trigger::Phrase("use case"),
            Trigger::Phrase("used for"),
            Trigger::Trailing("for"),
            Trigger::Stem("purpose"),
            Trigger::Word("why"),
            Trigger::Stem("descri"),
            Trigger::Stem("overview"),
            Trigger::Word("about"),
            Trigger::Stem("summar"),
        ],
    },
    QueryPattern {
        bucket: BucketId::Install,
        triggers: &[
            Trigger::Stem("install"),
            Trigger::Word("pip"),
            Trigger::Word("pip3"),
            Trigger::Word("setup"),
            Trigger::Phrase("set up"),
            Trigger::Phrase("getting started"),
            Trigger::Phrase("get started"),
        ],
    },
    QueryPattern {
        bucket: BucketId::Example,
        triggers: &[
            Trigger::Stem("example"),
            Trigger::Word("code"),
            Trigger::Stem("snippet"),
            Trigger::Stem("usage"),
            Trigger::Stem("demo"),
            Trigger::Stem("sample"),
            Trigger::Phrase("how to use"),
        ],
    },
    QueryPattern {
        bucket: BucketId::Features,
        triggers: &[
            Trigger::Stem("feature"),
            Trigger::Stem("component"),
            Trigger::Stem("capabilit"),
            Trigger::Word("supports"),
            Trigger::Stem("abilit"),
        ],
    },
    QueryPattern {
        bucket: BucketId::License,
        triggers: &[
            Trigger::Stem("licen"),
            Trigger::Word("mit"),
            Trigger::Word("apache"),
            Trigger::Word("gpl"),
            Trigger::Word("bsd"),
        ],
    },
    QueryPattern {
        bucket: BucketId::Dependencies,
        triggers: &[
            Trigger::Stem("dependenc"),
            Trigger::Stem("require"),
            Trigger::Word("python"),
            Trigger::Stem("version"),
            Trigger::Word("depends"),
        ],
    },
];

/// Trigger set for `bucket`.
pub fn pattern_for(bucket: BucketId) -> &'static QueryPattern {
    // PATTERNS is laid out in BucketId order.
    &PATTERNS[bucket as usize]
}

/// A bucket whose pattern matched, with the first trigger that fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketMatch {
    pub bucket: BucketId,
    pub trigger: Trigger,
}

/// Classifies queries by walking buckets in a fixed priority order.
#[derive(Debug, Clone)]
pub struct BucketClassifier {
    priority: Vec<BucketId>,
}

impl Default for BucketClassifier {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PRIORITY.to_vec(),
        }
    }
}

impl BucketClassifier {
    /// Use a custom priority order. It must name every bucket exactly once.
    pub fn with_priority(priority: Vec<BucketId>) -> Result<Self, ParamsError> {
        validate_priority(&priority)?;
        Ok(Self { priority })
    }

    pub fn priority(&self) -> &[BucketId] {
        &self.priority
    }

    /// First bucket (in priority order) whose triggers appear in `query`,
    /// or `None` when nothing matches.
    pub fn classify(&self, query: &str) -> Option<BucketId> {
        let tokens = tokenize(query);
        self.priority
            .iter()
            .copied()
            .find(|b| first_trigger(*b, &tokens).is_some())
    }

    /// Every matching bucket in priority order.
    pub fn classify_all(&self, query: &str) -> Vec<BucketMatch> {
        let tokens = tokenize(query);
        self.priority
            .iter()
            .filter_map(|b| {
                first_trigger(*b, &tokens).map(|trigger| BucketMatch { bucket: *b, trigger })
            })
            .collect()
    }
}

/// Classify with the default priority order.
pub fn classify(query: &str) -> Option<BucketId> {
    BucketClassifier::default().classify(query)
}

pub(crate) fn validate_priority(priority: &[BucketId]) -> Result<(), ParamsError> {
    if priority.len() != BucketId::ALL.len() {
        return Err(ParamsError::InvalidPriority(format!(
            "expected 6 entries, got {}",
            priority.len()
        )));
    }
    for bucket in BucketId::ALL {
        let count = priority.iter().filter(|b| **b == bucket).count();
        if count != 1 {
            return Err(ParamsError::InvalidPriority(format!(
                "'{}' appears {} times",
                bucket, count
            )));
        }
    }
    Ok(())
}

fn first_trigger(bucket: BucketId, tokens: &[String]) -> Option<Trigger> {
    pattern_for(bucket)
        .triggers
        .iter()
        .find(|t| t.matches(tokens))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_exhaustive_and_ordered() {
        for (i, bucket) in BucketId::ALL.iter().enumerate() {
            assert_eq!(PATTERNS[i].bucket, *bucket);
            assert_eq!(pattern_for(*bucket).bucket, *bucket);
            assert!(!PATTERNS[i].triggers.is_empty());
        }
    }

    #[test]
    fn test_every_trigger_classifies_to_its_bucket_alone() {
        // A query made only of one trigger must land in that trigger's bucket,
        // otherwise a higher-priority bucket shadows it entirely.
        for pattern in &PATTERNS {
            for trigger in pattern.triggers {
                let query = format!("{}?", trigger.text());
                assert_eq!(
                    classify(&query),
                    Some(pattern.bucket),
                    "trigger {:?} did not classify to {}",
                    trigger,
                    pattern.bucket
                );
            }
        }
    }

    #[test]
    fn test_canonical_questions() {
        let cases = [
            ("What is the Frequenz SDK for?", BucketId::Purpose),
            ("How do I install the sdk?", BucketId::Install),
            ("Show me an example of how to use it.", BucketId::Example),
            ("What features does it have?", BucketId::Features),
            ("What license is it under?", BucketId::License),
            ("Which python versions does it require?", BucketId::Dependencies),
        ];
        for (q, expected) in cases {
            assert_eq!(classify(q), Some(expected), "query: {}", q);
        }
    }

    #[test]
    fn test_whats_it_for_is_purpose() {
        for q in ["What's the SDK for?", "What's it for?", "what is this for"] {
            assert_eq!(classify(q), Some(BucketId::Purpose), "query: {}", q);
        }
        let matches = BucketClassifier::default().classify_all("What's it for?");
        assert_eq!(matches[0].trigger, Trigger::Trailing("for"));
    }

    #[test]
    fn test_trailing_trigger_only_at_end() {
        assert!(!Trigger::Trailing("for").matches(&tokenize("good for you")));
        assert!(Trigger::Trailing("for").matches(&tokenize("what's it for?")));
        assert!(!Trigger::Trailing("for").matches(&[]));
    }

    #[test]
    fn test_no_match_is_unknown() {
        assert_eq!(classify("What's the weather today?"), None);
        assert_eq!(classify(""), None);
        assert_eq!(classify("   "), None);
    }

    #[test]
    fn test_word_trigger_needs_whole_token() {
        // "mit" must not fire inside "submit" or "summit".
        assert_eq!(classify("how do I submit a patch to the summit"), None);
    }

    #[test]
    fn test_stem_trigger_matches_inflections() {
        assert_eq!(classify("installation steps"), Some(BucketId::Install));
        assert_eq!(classify("list the dependencies"), Some(BucketId::Dependencies));
        assert_eq!(classify("licensing terms"), Some(BucketId::License));
    }

    #[test]
    fn test_phrase_requires_adjacent_tokens() {
        assert_eq!(classify("what features is it shipping"), Some(BucketId::Features));
        assert_eq!(classify("what, is it?"), Some(BucketId::Purpose));
    }

    #[test]
    fn test_priority_breaks_ties() {
        let q = "install the example";
        assert_eq!(classify(q), Some(BucketId::Install));

        let mut order = DEFAULT_PRIORITY.to_vec();
        order.swap(1, 2);
        let classifier = BucketClassifier::with_priority(order).unwrap();
        assert_eq!(classifier.classify(q), Some(BucketId::Example));
    }

    #[test]
    fn test_classify_all_reports_every_match() {
        let matches = BucketClassifier::default().classify_all("install the example under MIT");
        let buckets: Vec<BucketId> = matches.iter().map(|m| m.bucket).collect();
        assert_eq!(
            buckets,
            vec![BucketId::Install, BucketId::Example, BucketId::License]
        );
        assert_eq!(matches[0].trigger, Trigger::Stem("install"));
    }

    #[test]
    fn test_invalid_priority_rejected() {
        assert!(BucketClassifier::with_priority(vec![BucketId::Install]).is_err());
        let mut dup = DEFAULT_PRIORITY.to_vec();
        dup[0] = BucketId::Install;
        assert!(BucketClassifier::with_priority(dup).is_err());
    }
}
