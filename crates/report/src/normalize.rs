use std::collections::HashSet;
use std::fmt;

use rust_stemmers::{Algorithm, Stemmer};
use serde::Serialize;

use crate::error::{ReportError, Result};

/// Administrative-unit words that carry no identity ("г.", "обл.", ...).
pub const DEFAULT_STOP_WORDS: [&str; 6] = ["г", "обл", "область", "республика", "автономная", "ао"];

/// Normalized label used to join report rows to fetched records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Folds free-text entity labels into canonical keys.
///
/// The pipeline is: trim, lower-case, drop periods, turn hyphens into
/// spaces, split on whitespace, drop stop words, stem each remaining token
/// (Russian Snowball) and join with single spaces.
pub struct KeyNormalizer {
    stop_words: HashSet<String>,
    stemmer: Stemmer,
}

impl KeyNormalizer {
    pub fn new<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stop_words: stop_words
                .into_iter()
                .map(|word| word.as_ref().to_lowercase())
                .collect(),
            stemmer: Stemmer::create(Algorithm::Russian),
        }
    }

    /// Normalize a label; empty or all-stop-word input yields `""`.
    pub fn normalize(&self, raw: &str) -> String {
        let folded = raw.trim().to_lowercase().replace('.', "").replace('-', " ");
        folded
            .split_whitespace()
            .filter(|token| !self.stop_words.contains(*token))
            .map(|token| self.stemmer.stem(token).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Normalize a label into a key, rejecting labels that fold to nothing.
    pub fn canonical(&self, raw: &str) -> Result<CanonicalKey> {
        let key = self.normalize(raw);
        if key.is_empty() {
            return Err(ReportError::NormalizationEmpty {
                label: raw.to_string(),
            });
        }
        Ok(CanonicalKey(key))
    }
}

impl Default for KeyNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_WORDS)
    }
}

impl fmt::Debug for KeyNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words: Vec<&str> = self.stop_words.iter().map(String::as_str).collect();
        words.sort_unstable();
        f.debug_struct("KeyNormalizer")
            .field("stop_words", &words)
            .field("stemmer", &"russian")
            .finish()
    }
}
