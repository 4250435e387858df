//! Ingredient name normalization
//!
//! Two ingredients are considered the same iff their normalized names are
//! equal. There is no fuzzy matching, stemming or pluralization:
//! `"tomato"` and `"tomatoes"` are different ingredients.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Descriptive words that don't change what the ingredient is
pub const DEFAULT_QUALIFIERS: &[&str] = &[
    "fresh",
    "freshly",
    "chopped",
    "diced",
    "minced",
    "sliced",
    "grated",
    "shredded",
    "crushed",
    "ground",
    "dried",
    "peeled",
    "finely",
    "roughly",
    "large",
    "medium",
    "small",
    "whole",
    "raw",
    "ripe",
];

// everything that is not a letter, a mark, a digit or a joining character
static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{M}\p{N}'&-]+").unwrap());

static DEFAULT: Lazy<Normalizer> = Lazy::new(Normalizer::default);

/// Canonicalizes free text ingredient names into a matching key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    qualifiers: HashSet<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_QUALIFIERS.iter().copied())
    }
}

impl Normalizer {
    /// Creates a normalizer that strips the given qualifiers
    ///
    /// The qualifiers themselves are normalized, so `"Fresh"` and `"fresh"`
    /// are the same qualifier.
    pub fn new<S: AsRef<str>>(qualifiers: impl IntoIterator<Item = S>) -> Self {
        let qualifiers = qualifiers
            .into_iter()
            .flat_map(|q| tokens(q.as_ref()))
            .collect();
        Self { qualifiers }
    }

    /// Normalize a name
    ///
    /// - Lower case.
    /// - Punctuation becomes whitespace, whitespace is collapsed and trimmed.
    /// - Qualifier words are removed, unless the name is made only of them.
    ///
    /// This is idempotent.
    pub fn normalize(&self, name: &str) -> String {
        let all: Vec<String> = tokens(name).collect();
        let kept: Vec<&str> = all
            .iter()
            .filter(|t| !self.qualifiers.contains(t.as_str()))
            .map(String::as_str)
            .collect();
        if kept.is_empty() {
            all.join(" ")
        } else {
            kept.join(" ")
        }
    }

    /// Checks if two names refer to the same ingredient
    pub fn same_ingredient(&self, a: &str, b: &str) -> bool {
        self.normalize(a) == self.normalize(b)
    }

    /// Checks if a single word is a qualifier
    pub fn is_qualifier(&self, word: &str) -> bool {
        self.qualifiers.contains(&word.to_lowercase())
    }
}

// lower case before splitting, some characters lower to more than one char
fn tokens(text: &str) -> impl Iterator<Item = String> {
    let lower = text.to_lowercase();
    SEPARATOR
        .split(&lower)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>()
        .into_iter()
}

/// Normalize a name with the default qualifiers
///
/// ```
/// # use pantry_reconcile::normalize::normalize;
/// assert_eq!(normalize("Fresh Basil"), "basil");
/// assert_eq!(normalize("basil, chopped"), "basil");
/// assert_eq!(normalize("  Olive   OIL "), "olive oil");
/// ```
pub fn normalize(name: &str) -> String {
    DEFAULT.normalize(name)
}
