use crate::fulltext::matches::FtMatches;
use crate::fulltext::options::FtOptions;
use crate::fulltext::tokenizer::{TokenList, Tokenizer};
use crate::fulltext::wildcard::{WildcardCache, has_wildcard};
use regex::Regex;

/// Result of matching one term against a text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hits {
    /// Matched sub-token units (occurrences times `width`)
    pub units: usize,
    /// Number of sub-tokens of the term
    pub width: usize,
}

impl Hits {
    pub fn occurrences(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.units / self.width
        }
    }

    pub fn is_match(&self) -> bool {
        self.units > 0
    }
}

enum TokenPattern {
    Exact(String),
    Wildcard(Regex),
    /// Stop words match any single token
    Any,
    /// A pattern that cannot be compiled never matches
    Never,
}

impl TokenPattern {
    fn matches(&self, token: &str) -> bool {
        match self {
            TokenPattern::Exact(text) => text == token,
            TokenPattern::Wildcard(re) => re.is_match(token),
            TokenPattern::Any => true,
            TokenPattern::Never => false,
        }
    }
}

impl FtOptions {
    /// Matches a term against a tokenized text.
    ///
    /// The sub-tokens of the term must occur as a contiguous sequence. Each
    /// occurrence is recorded as a span in `matches` unless `fast` is set.
    pub fn contains(
        &self,
        term: &[u8],
        text: &TokenList,
        matches: &mut FtMatches,
        fast: bool,
        cache: &mut WildcardCache,
    ) -> Hits {
        let patterns: Vec<TokenPattern> = Tokenizer::new(term, self, fast)
            .map(|token| {
                if self.is_stop_word(&token.text) {
                    TokenPattern::Any
                } else if self.wildcards && has_wildcard(&token.text) {
                    cache
                        .get(&token.text)
                        .map_or(TokenPattern::Never, TokenPattern::Wildcard)
                } else if self.wildcards && token.text.contains('\\') {
                    TokenPattern::Exact(unescape(&token.text))
                } else {
                    TokenPattern::Exact(token.text)
                }
            })
            .collect();

        let width = patterns.len();
        let tokens = text.tokens();
        if width == 0 || tokens.len() < width {
            return Hits { units: 0, width };
        }

        let mut occurrences = 0;
        for window in tokens.windows(width) {
            let hit = patterns
                .iter()
                .zip(window)
                .all(|(pattern, token)| pattern.matches(&token.text));
            if hit {
                occurrences += 1;
                if !fast {
                    matches.add(window[0].pos, window[width - 1].pos);
                }
            }
        }
        Hits {
            units: occurrences * width,
            width,
        }
    }
}

fn unescape(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn run(opts: &FtOptions, term: &str, text: &str) -> (Hits, FtMatches) {
        let list = TokenList::new(text.as_bytes(), opts);
        let mut matches = FtMatches::new(1);
        let hits = opts.contains(
            term.as_bytes(),
            &list,
            &mut matches,
            false,
            &mut WildcardCache::new(),
        );
        (hits, matches)
    }

    #[test]
    fn test_single_token_occurrences() {
        let opts = FtOptions::default();
        let (hits, matches) = run(&opts, "cat", "Cat and cat and dog");
        assert_eq!(hits.occurrences(), 2);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches.iter().nth(1).map(|m| m.start), Some(2));
    }

    #[test]
    fn test_sequence_requires_adjacency() {
        let opts = FtOptions::default();
        let (hits, matches) = run(&opts, "quick fox", "the quick fox jumps");
        assert_eq!(hits, Hits { units: 2, width: 2 });
        let span = matches.iter().next().unwrap();
        assert_eq!((span.start, span.end), (1, 2));

        let (hits, _) = run(&opts, "quick jumps", "the quick fox jumps");
        assert!(!hits.is_match());
    }

    #[test]
    fn test_wildcards() {
        let opts = FtOptions {
            wildcards: true,
            ..FtOptions::default()
        };
        assert!(run(&opts, "qu.*k", "the quick fox").0.is_match());
        assert!(!run(&opts, "qu.k", "the quick fox").0.is_match());
        // without wildcard matching, the dot is an ordinary boundary
        assert!(!run(&FtOptions::default(), "qu.*k", "the quick fox").0.is_match());
    }

    #[test]
    fn test_stop_words_match_any_token() {
        let opts = FtOptions {
            stop_words: Some(BTreeSet::from(["the".to_string()])),
            ..FtOptions::default()
        };
        assert!(run(&opts, "the fox", "a fox").0.is_match());
    }

    #[test]
    fn test_fast_mode_records_no_spans() {
        let opts = FtOptions::default();
        let list = TokenList::new(b"cat cat", &opts);
        let mut matches = FtMatches::new(1);
        let hits = opts.contains(b"cat", &list, &mut matches, true, &mut WildcardCache::new());
        assert_eq!(hits.occurrences(), 2);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_empty_term_never_matches() {
        let (hits, _) = run(&FtOptions::default(), "  ", "anything");
        assert_eq!(hits, Hits::default());
    }
}
