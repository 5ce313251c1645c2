use crate::index::types::StoreMeta;
use crate::query::expr::Expr;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// How multiple search terms combine into one match decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FtMode {
    /// Every term must match
    All,
    /// Every whitespace separated word of every term must match
    #[value(name = "allwords")]
    AllWords,
    /// At least one term must match
    #[default]
    Any,
    /// At least one word of any term must match
    #[value(name = "anyword")]
    AnyWord,
    /// All terms, joined by spaces, must match as a single phrase
    Phrase,
}

impl FtMode {
    /// Modes whose match decision can be delegated to a single index lookup
    pub fn is_index_decomposable(&self) -> bool {
        matches!(self, FtMode::Any | FtMode::All | FtMode::Phrase)
    }
}

impl fmt::Display for FtMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FtMode::All => "all",
            FtMode::AllWords => "all words",
            FtMode::Any => "any",
            FtMode::AnyWord => "any word",
            FtMode::Phrase => "phrase",
        };
        f.write_str(name)
    }
}

/// Full-text matching options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FtOptions {
    pub case_sensitive: bool,
    pub diacritics_sensitive: bool,
    pub stemming: bool,
    pub wildcards: bool,
    pub stop_words: Option<BTreeSet<String>>,
    /// Score multiplier, evaluated per match
    #[serde(skip)]
    pub weight: Option<Expr>,
}

impl FtOptions {
    /// Checks if the normalization flags comply with those of a store's full-text index
    pub fn complies_with(&self, meta: &StoreMeta) -> bool {
        self.case_sensitive == meta.case_sensitive
            && self.diacritics_sensitive == meta.diacritics_sensitive
            && self.stemming == meta.stemming
    }

    /// Options used to build a store's full-text index
    pub fn for_store(meta: &StoreMeta) -> Self {
        Self {
            case_sensitive: meta.case_sensitive,
            diacritics_sensitive: meta.diacritics_sensitive,
            stemming: meta.stemming,
            ..Self::default()
        }
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words
            .as_ref()
            .is_some_and(|words| words.contains(&token.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decomposable_modes() {
        assert!(FtMode::Any.is_index_decomposable());
        assert!(FtMode::All.is_index_decomposable());
        assert!(FtMode::Phrase.is_index_decomposable());
        assert!(!FtMode::AllWords.is_index_decomposable());
        assert!(!FtMode::AnyWord.is_index_decomposable());
    }

    #[test]
    fn test_compliance() {
        let meta = StoreMeta::default();
        let opts = FtOptions::for_store(&meta);
        assert!(opts.complies_with(&meta));

        let cs = FtOptions {
            case_sensitive: true,
            ..FtOptions::default()
        };
        assert!(!cs.complies_with(&meta));
    }

    #[test]
    fn test_stop_words() {
        let opts: FtOptions = serde_json::from_str(r#"{"stop_words": ["the", "a"]}"#).unwrap();
        assert!(opts.is_stop_word("The"));
        assert!(!opts.is_stop_word("fox"));
        assert!(!FtOptions::default().is_stop_word("the"));
    }
}
