//! Free-text search over transactions.

use crate::transaction::Transaction;

/// The lower-cased words of a search term.
///
/// A transaction matches when every word is a prefix of some whitespace
/// delimited token in at least one searchable field. Different words may be
/// found in different fields. No words means every transaction matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerms {
    words: Vec<String>,
}

impl SearchTerms {
    /// Split `term` into lower-cased words.
    pub fn parse(term: &str) -> Self {
        Self {
            words: term
                .to_lowercase()
                .split_whitespace()
                .map(str::to_owned)
                .collect(),
        }
    }

    /// Whether the search places no constraint on transactions.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The lower-cased words of the search.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Check whether `transaction` satisfies every word of the search.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        let fields = transaction.searchable_fields();

        self.words
            .iter()
            .all(|word| fields.iter().any(|field| has_word_prefix(field, word)))
    }
}

/// Check whether some whitespace delimited token of `field` starts with `word`.
///
/// The comparison folds `field` to lower case, `word` must already be lower
/// case. This is a word-boundary match: "neha" is found in "Neha Yadav" but not
/// in "Sneha Rao".
pub fn has_word_prefix(field: &str, word: &str) -> bool {
    field
        .split_whitespace()
        .any(|token| token.to_lowercase().starts_with(word))
}
