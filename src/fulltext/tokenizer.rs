use crate::fulltext::options::FtOptions;
use crate::fulltext::wildcard::has_wildcard;
use unicode_segmentation::UnicodeSegmentation;

/// Sub-tokens longer than this are cut at a character boundary
pub const MAX_TOKEN_LENGTH: usize = 128;

/// A normalized sub-token with its location in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtToken {
    /// Normalized token text
    pub text: String,
    /// Token offset (0-based)
    pub pos: u32,
    /// Byte range in the source text
    pub start: usize,
    pub end: usize,
}

/// Splits a search term into normalized sub-tokens.
///
/// With wildcard matching enabled, whitespace separated words that use
/// wildcard syntax are kept whole so that pattern characters survive; all
/// other words are split at Unicode word boundaries.
pub struct Tokenizer {
    tokens: std::vec::IntoIter<FtToken>,
    count: usize,
    /// Fast evaluation: matches are counted, spans are not recorded
    pub fast: bool,
}

impl Tokenizer {
    pub fn new(term: &[u8], opts: &FtOptions, fast: bool) -> Self {
        let tokens = segment(term, opts, opts.wildcards);
        Self {
            count: tokens.len(),
            tokens: tokens.into_iter(),
            fast,
        }
    }

    /// Total number of sub-tokens
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Iterator for Tokenizer {
    type Item = FtToken;

    fn next(&mut self) -> Option<FtToken> {
        self.tokens.next()
    }
}

/// A fully tokenized text, used as the focus of atomic evaluation
#[derive(Debug, Clone, Default)]
pub struct TokenList {
    tokens: Vec<FtToken>,
}

impl TokenList {
    pub fn new(text: &[u8], opts: &FtOptions) -> Self {
        Self {
            tokens: segment(text, opts, false),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[FtToken] {
        &self.tokens
    }
}

fn segment(text: &[u8], opts: &FtOptions, wildcards: bool) -> Vec<FtToken> {
    let text = String::from_utf8_lossy(text);
    // (byte offset, word, is pattern)
    let words: Vec<(usize, &str, bool)> = if wildcards {
        whitespace_words(&text)
            .into_iter()
            .flat_map(|(start, word)| pattern_or_words(start, word))
            .collect()
    } else {
        text.unicode_word_indices().map(|(start, word)| (start, word, false)).collect()
    };

    words
        .into_iter()
        .enumerate()
        .map(|(pos, (start, word, pattern))| FtToken {
            text: normalize(word, opts, pattern),
            pos: pos as u32,
            start,
            end: start + word.len(),
        })
        .collect()
}

/// Keeps a whitespace word whole if it uses wildcard syntax, otherwise
/// splits it at word boundaries like text
fn pattern_or_words(start: usize, word: &str) -> Vec<(usize, &str, bool)> {
    if has_wildcard(word) || word.contains('\\') {
        return vec![(start, word, true)];
    }
    word.unicode_word_indices()
        .map(|(offset, sub)| (start + offset, sub, false))
        .collect()
}

/// Applies case folding, diacritics removal and stemming as configured
pub fn normalize(word: &str, opts: &FtOptions, pattern: bool) -> String {
    let mut token: String = if opts.diacritics_sensitive {
        word.to_string()
    } else {
        word.chars().map(strip_diacritic).collect()
    };
    if !opts.case_sensitive {
        token = token.to_lowercase();
    }
    if opts.stemming && !pattern {
        token = stem(&token);
    }
    if token.len() > MAX_TOKEN_LENGTH {
        let mut boundary = MAX_TOKEN_LENGTH;
        while !token.is_char_boundary(boundary) {
            boundary -= 1;
        }
        token.truncate(boundary);
    }
    token
}

fn strip_diacritic(ch: char) -> char {
    match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => 'A',
        'ç' | 'ć' | 'č' => 'c',
        'Ç' | 'Ć' | 'Č' => 'C',
        'ď' => 'd',
        'Ď' => 'D',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę' | 'Ě' => 'E',
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'Į' => 'I',
        'ł' => 'l',
        'Ł' => 'L',
        'ñ' | 'ń' | 'ň' => 'n',
        'Ñ' | 'Ń' | 'Ň' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => 'O',
        'ř' => 'r',
        'Ř' => 'R',
        'ś' | 'š' => 's',
        'Ś' | 'Š' => 'S',
        'ť' => 't',
        'Ť' => 'T',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' | 'Ÿ' => 'Y',
        'ź' | 'ż' | 'ž' => 'z',
        'Ź' | 'Ż' | 'Ž' => 'Z',
        _ => ch,
    }
}

/// Light suffix-stripping stemmer for English
fn stem(word: &str) -> String {
    let stripped = if let Some(base) = word.strip_suffix("sses") {
        format!("{base}ss")
    } else if let Some(base) = word.strip_suffix("ies") {
        format!("{base}y")
    } else if word.ends_with('s') && !word.ends_with("ss") && word.len() > 3 {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    };

    for suffix in ["ing", "ed"] {
        if let Some(base) = stripped.strip_suffix(suffix) {
            if base.len() >= 3 && base.chars().any(is_vowel) {
                return base.to_string();
            }
        }
    }
    stripped
}

fn is_vowel(ch: char) -> bool {
    matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(term: &str, opts: &FtOptions) -> Vec<String> {
        Tokenizer::new(term.as_bytes(), opts, false)
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_word_segmentation() {
        let opts = FtOptions::default();
        let tokenizer = Tokenizer::new(b"The quick, brown fox!", &opts, false);
        assert_eq!(tokenizer.len(), 4);
        let tokens: Vec<_> = tokenizer.collect();
        assert_eq!(tokens[0].text, "the");
        assert_eq!(tokens[3].text, "fox");
        assert_eq!(tokens[3].pos, 3);
        assert_eq!((tokens[1].start, tokens[1].end), (4, 9));
    }

    #[test]
    fn test_case_and_diacritics() {
        let insensitive = FtOptions::default();
        assert_eq!(texts("Café Über", &insensitive), vec!["cafe", "uber"]);

        let sensitive = FtOptions {
            case_sensitive: true,
            diacritics_sensitive: true,
            ..FtOptions::default()
        };
        assert_eq!(texts("Café", &sensitive), vec!["Café"]);
    }

    #[test]
    fn test_stemming() {
        let opts = FtOptions {
            stemming: true,
            ..FtOptions::default()
        };
        assert_eq!(texts("jumping jumped jumps", &opts), vec!["jump", "jump", "jump"]);
        assert_eq!(texts("classes ponies", &opts), vec!["class", "pony"]);
        assert_eq!(texts("bed is", &opts), vec!["bed", "is"]);
    }

    #[test]
    fn test_wildcard_terms_keep_pattern_characters() {
        let opts = FtOptions {
            wildcards: true,
            ..FtOptions::default()
        };
        assert_eq!(texts("Hel.* wor.d", &opts), vec!["hel.*", "wor.d"]);
    }

    #[test]
    fn test_wildcards_leave_plain_words_alone() {
        let opts = FtOptions {
            wildcards: true,
            stemming: true,
            ..FtOptions::default()
        };
        assert_eq!(texts("jumps fox, cat.*", &opts), vec!["jump", "fox", "cat.*"]);

        let tokens: Vec<_> = Tokenizer::new(b"fox, jum.s", &opts, false).collect();
        assert_eq!(tokens[1].pos, 1);
        assert_eq!((tokens[1].start, tokens[1].end), (5, 10));
        assert_eq!(texts(r"a\.b", &opts), vec![r"a\.b"]);
    }

    #[test]
    fn test_token_list() {
        let list = TokenList::new(b"  cat  ", &FtOptions::default());
        assert_eq!(list.len(), 1);
        assert_eq!(list.tokens()[0].text, "cat");
        assert!(TokenList::new(b"", &FtOptions::default()).is_empty());
    }
}
