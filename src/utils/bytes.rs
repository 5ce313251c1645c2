use memchr::memchr3_iter;

/// Removes leading and trailing whitespace (all bytes <= 0x20)
#[inline]
pub fn trim(token: &[u8]) -> &[u8] {
    let start = token.iter().position(|&b| b > b' ').unwrap_or(token.len());
    let end = token.iter().rposition(|&b| b > b' ').map_or(start, |e| e + 1);
    &token[start..end]
}

/// Splits a term into whitespace-delimited words, skipping empty words
pub fn split_spaces(token: &[u8]) -> Vec<&[u8]> {
    let mut words = Vec::new();
    let mut start = 0;
    for i in memchr3_iter(b' ', b'\t', b'\n', token).chain([token.len()]) {
        // carriage returns and other control bytes are trimmed off
        let word = trim(&token[start..i]);
        if !word.is_empty() {
            words.push(word);
        }
        start = i + 1;
    }
    words
}

/// Splits a value into whitespace-separated tokens
pub fn split_tokens(value: &[u8]) -> impl Iterator<Item = &[u8]> {
    value
        .split(|b| b.is_ascii_whitespace())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim() {
        assert_eq!(trim(b"  Hello \n"), b"Hello");
        assert_eq!(trim(b"Hello"), b"Hello");
        assert_eq!(trim(b" \t "), b"");
        assert_eq!(trim(b""), b"");
    }

    #[test]
    fn test_split_spaces() {
        let words = split_spaces(b"quick  brown fox ");
        assert_eq!(words, vec![&b"quick"[..], b"brown", b"fox"]);
        assert!(split_spaces(b"   ").is_empty());

        let words = split_spaces(b"quick\tfox\r\njumps");
        assert_eq!(words, vec![&b"quick"[..], b"fox", b"jumps"]);
    }

    #[test]
    fn test_split_tokens() {
        let tokens: Vec<_> = split_tokens(b"a\tbc  d\n").collect();
        assert_eq!(tokens, vec![&b"a"[..], b"bc", b"d"]);
    }
}
