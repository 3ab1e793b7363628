// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Words that look like chords.
//!
//! Short Portuguese words such as "A", "E" or "Em" are also valid chord
//! symbols. A token matching one of these words (case-insensitive, exact
//! match after stripping surrounding punctuation) is never treated as a
//! chord, even on a line that is otherwise all chords.

use std::collections::HashSet;

/// Built-in list of chord-shaped words
pub const DEFAULT_WORDS: [&str; 15] = [
    "A", "E", "O", "DA", "DE", "DO", "EM", "AS", "OS", "AO", "DAS", "DOS", "NA", "NO", "UM",
];

/// Case-insensitive set of words excluded from chord detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordBlacklist {
    words: HashSet<String>,
}

impl WordBlacklist {
    /// Create an empty blacklist
    pub fn empty() -> Self {
        Self {
            words: HashSet::new(),
        }
    }

    /// Create a blacklist from a list of words
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::empty();
        list.extend(words);
        list
    }

    /// Add words to the list
    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            let word = word.as_ref().trim();
            if !word.is_empty() {
                self.words.insert(word.to_uppercase());
            }
        }
    }

    /// Check whether a (punctuation-stripped) token is blacklisted
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(&token.to_uppercase())
    }

    /// Number of words in the list
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for WordBlacklist {
    fn default() -> Self {
        Self::from_words(DEFAULT_WORDS)
    }
}
