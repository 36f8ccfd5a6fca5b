// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lexicon loading and validation.
//!
//! The lexicon carries four word lists: profanity roots, a whitelist of
//! clean words that look like roots, verb prefixes that legitimise a
//! mid-word root hit, and a homoglyph table folding Latin and digit
//! look-alikes into Cyrillic. A copy ships embedded in the binary;
//! operators can swap it for a file via `moderation.lexicon_path`.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use vezha_core::error::VezhaError;

/// Lexicon compiled into the binary, used when no override path is set.
const EMBEDDED_LEXICON: &str = include_str!("../lexicon.toml");

/// Longest allowed verb prefix, in characters. Anything longer would let
/// whole words legitimise root hits.
const MAX_PREFIX_CHARS: usize = 4;

/// On-disk shape of a lexicon file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLexicon {
    whitelist: Vec<String>,
    banned: Vec<String>,
    #[serde(default)]
    allowed_prefixes: Vec<String>,
    #[serde(default)]
    homoglyphs: HashMap<String, String>,
}

/// Validated word lists backing the profanity filter.
#[derive(Debug, Clone)]
pub struct Lexicon {
    /// Words never flagged, even when they contain a banned root.
    pub whitelist: Vec<String>,
    /// Profanity roots, matched as substrings and fuzzy targets.
    pub banned: Vec<String>,
    /// Prefixes that may legitimately precede a root inside a word.
    pub allowed_prefixes: Vec<String>,
    homoglyphs: HashMap<char, char>,
}

impl Lexicon {
    /// Parses the embedded lexicon.
    pub fn embedded() -> Result<Self, VezhaError> {
        Self::from_toml_str(EMBEDDED_LEXICON)
    }

    /// Loads the lexicon from `path` when set, the embedded copy otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, VezhaError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::embedded(),
        }
    }

    /// Reads and validates a lexicon file.
    pub fn from_path(path: &Path) -> Result<Self, VezhaError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            VezhaError::Config(format!(
                "cannot read lexicon file {}: {err}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parses and validates lexicon TOML.
    pub fn from_toml_str(raw: &str) -> Result<Self, VezhaError> {
        let raw: RawLexicon = toml::from_str(raw)
            .map_err(|err| VezhaError::Config(format!("invalid lexicon: {err}")))?;

        if raw.banned.is_empty() {
            return Err(VezhaError::Config(
                "lexicon has no banned roots; the filter would never match".into(),
            ));
        }
        for (list, words) in [
            ("whitelist", &raw.whitelist),
            ("banned", &raw.banned),
            ("allowed_prefixes", &raw.allowed_prefixes),
        ] {
            if words.iter().any(|word| word.trim().is_empty()) {
                return Err(VezhaError::Config(format!(
                    "lexicon {list} contains an empty entry"
                )));
            }
        }
        for prefix in &raw.allowed_prefixes {
            if prefix.chars().count() > MAX_PREFIX_CHARS {
                return Err(VezhaError::Config(format!(
                    "lexicon prefix {prefix:?} is longer than {MAX_PREFIX_CHARS} characters"
                )));
            }
        }

        let mut homoglyphs = HashMap::with_capacity(raw.homoglyphs.len());
        for (from, to) in &raw.homoglyphs {
            let (Some(from), Some(to)) = (single_char(from), single_char(to)) else {
                return Err(VezhaError::Config(format!(
                    "lexicon homoglyph {from:?} -> {to:?} must map one character to one character"
                )));
            };
            homoglyphs.insert(from, to);
        }

        Ok(Self {
            whitelist: raw.whitelist,
            banned: raw.banned,
            allowed_prefixes: raw.allowed_prefixes,
            homoglyphs,
        })
    }

    /// Folds a homoglyph into its Cyrillic equivalent, or returns the
    /// character unchanged.
    pub fn map_homoglyph(&self, c: char) -> char {
        self.homoglyphs.get(&c).copied().unwrap_or(c)
    }

    /// Whether `word` is on the whitelist.
    pub fn is_whitelisted(&self, word: &str) -> bool {
        self.whitelist.iter().any(|white| white == word)
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let first = chars.next()?;
    chars.next().is_none().then_some(first)
}
