//! Lexical-equivalence collaborator used by the accuracy criterion.
//!
//! Stands in for a dictionary or thesaurus lookup. The grading engine only
//! asks whether two words are interchangeable; it never inspects meaning.

use std::collections::HashMap;

/// Decides whether two words count as the same lexical item.
pub trait LexicalEquivalence: Send + Sync {
    fn are_equivalent(&self, word_a: &str, word_b: &str) -> bool;
}

/// Lowercase a word and strip surrounding punctuation (`¿Qué?` -> `qué`).
pub fn normalize_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase()
}

/// Words match when they are equal after [`normalize_word`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitiveMatch;

impl LexicalEquivalence for CaseInsensitiveMatch {
    fn are_equivalent(&self, word_a: &str, word_b: &str) -> bool {
        let a = normalize_word(word_a);
        !a.is_empty() && a == normalize_word(word_b)
    }
}

/// Groups of interchangeable words, falling back to [`CaseInsensitiveMatch`].
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    /// Normalized word -> group index.
    groups: HashMap<String, usize>,
    next_group: usize,
}

impl SynonymTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group of words that are all equivalent to each other.
    ///
    /// A word already registered moves to the new group.
    pub fn with_group<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let group = self.next_group;
        self.next_group += 1;
        for word in words {
            let key = normalize_word(word.as_ref());
            if !key.is_empty() {
                self.groups.insert(key, group);
            }
        }
        self
    }
}

impl LexicalEquivalence for SynonymTable {
    fn are_equivalent(&self, word_a: &str, word_b: &str) -> bool {
        if CaseInsensitiveMatch.are_equivalent(word_a, word_b) {
            return true;
        }
        match (
            self.groups.get(&normalize_word(word_a)),
            self.groups.get(&normalize_word(word_b)),
        ) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
