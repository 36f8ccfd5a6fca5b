// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lexical profanity filter.
//!
//! The filter runs before any model call and must stay biased towards
//! false negatives: a miss here is caught by the tone classifier later,
//! while a false positive deletes a clean message with no recourse.
//!
//! Matching happens on a normalized form of the text: lowercased,
//! homoglyphs folded into Cyrillic, every non-Russian character dropped,
//! and letter runs collapsed ("сууука" -- "сука"). Two passes run over
//! it: a substring scan of the whole collapsed text, gated so that a
//! root buried deep inside a longer word does not count, and a fuzzy
//! Levenshtein pass over individual words for misspellings.

use crate::lexicon::Lexicon;

/// Words shorter than this are never fuzzy-matched; the edit budget
/// would flag too many clean short words.
const MIN_WORD_CHARS: usize = 3;

/// Roots longer than this get an edit budget of two instead of one.
const LONG_ROOT_CHARS: usize = 5;

/// A root hit this close to the start of the collapsed text always
/// counts, whatever the lead-in characters are.
const MAX_LEAD_CHARS: usize = 2;

/// Stateless lexical stage of the moderation pipeline.
#[derive(Debug, Clone)]
pub struct ProfanityFilter {
    lexicon: Lexicon,
}

impl ProfanityFilter {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    /// Whether `text` contains profanity under the loaded lexicon.
    ///
    /// # Arguments
    ///
    /// * `text` - Raw message text, punctuation and emoji included.
    pub fn is_profane(&self, text: &str) -> bool {
        let collapsed = self.normalize_and_collapse(text);
        if self.collapsed_text_hit(&collapsed) && !self.absorbed_by_whitelist(&collapsed) {
            return true;
        }
        text.split_whitespace()
            .any(|raw| self.word_hit(&self.normalize_and_collapse(raw)))
    }

    /// Lowercases, folds homoglyphs, drops everything outside а-яё, and
    /// collapses runs of the same letter.
    fn normalize_and_collapse(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = None;
        for c in text.to_lowercase().chars() {
            let mapped = self.lexicon.map_homoglyph(c);
            if !is_russian_letter(mapped) || last == Some(mapped) {
                continue;
            }
            out.push(mapped);
            last = Some(mapped);
        }
        out
    }

    /// Scans the collapsed text for banned roots, keeping only matches
    /// whose lead-in passes [`Self::lead_in_allows`].
    fn collapsed_text_hit(&self, collapsed: &str) -> bool {
        self.lexicon.banned.iter().any(|root| {
            collapsed
                .match_indices(root.as_str())
                .any(|(at, _)| self.lead_in_allows(&collapsed[..at]))
        })
    }

    /// A mid-text root hit counts when almost nothing precedes it, or
    /// when the lead-in is exactly a known verb prefix. Anything else is
    /// treated as a longer stem that happens to contain the root.
    fn lead_in_allows(&self, preceding: &str) -> bool {
        preceding.chars().count() <= MAX_LEAD_CHARS
            || self
                .lexicon
                .allowed_prefixes
                .iter()
                .any(|prefix| prefix == preceding)
    }

    /// Whether the collapsed text is essentially one whitelisted word,
    /// in which case a substring hit inside it is ignored.
    fn absorbed_by_whitelist(&self, collapsed: &str) -> bool {
        let total = collapsed.chars().count();
        self.lexicon
            .whitelist
            .iter()
            .any(|white| collapsed.contains(white.as_str()) && white.chars().count() + 1 >= total)
    }

    /// Fuzzy match of one normalized word against every banned root.
    fn word_hit(&self, word: &str) -> bool {
        if word.chars().count() < MIN_WORD_CHARS || self.lexicon.is_whitelisted(word) {
            return false;
        }
        self.lexicon.banned.iter().any(|root| {
            let budget = if root.chars().count() > LONG_ROOT_CHARS {
                2
            } else {
                1
            };
            strsim::levenshtein(word, root) <= budget
        })
    }
}

fn is_russian_letter(c: char) -> bool {
    matches!(c, 'а'..='я' | 'ё')
}
