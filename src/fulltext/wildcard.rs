//! Wildcard patterns for full-text terms.
//!
//! Syntax: `.` matches one character, `.?` zero or one, `.*` any number,
//! `.+` one or more, `.{n,m}` between `n` and `m` characters. A backslash
//! escapes the next character.

use lru::LruCache;
use regex::Regex;
use std::num::NonZeroUsize;

/// Number of compiled patterns kept per query context
const CACHE_SIZE: NonZeroUsize = NonZeroUsize::new(64).unwrap();

/// Checks if a term contains an unescaped wildcard
pub fn has_wildcard(pattern: &str) -> bool {
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '.' => return true,
            _ => {}
        }
    }
    false
}

/// Translates a wildcard pattern into an anchored regular expression
pub fn to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut re = String::with_capacity(pattern.len() * 2 + 8);
    re.push_str("^(?s:");

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                if let Some(&next) = chars.get(i + 1) {
                    re.push_str(&regex::escape(&next.to_string()));
                    i += 1;
                }
            }
            '.' => match chars.get(i + 1) {
                Some(&q @ ('?' | '*' | '+')) => {
                    re.push('.');
                    re.push(q);
                    i += 1;
                }
                Some('{') => match parse_bounds(&chars[i + 2..]) {
                    Some((min, max, len)) => {
                        re.push_str(&format!(".{{{min},{max}}}"));
                        i += len + 1;
                    }
                    None => re.push('.'),
                },
                _ => re.push('.'),
            },
            ch => re.push_str(&regex::escape(&ch.to_string())),
        }
        i += 1;
    }
    re.push_str(")$");
    re
}

/// Parses `n,m}` and returns the bounds plus the number of consumed characters
fn parse_bounds(chars: &[char]) -> Option<(usize, usize, usize)> {
    let close = chars.iter().position(|&c| c == '}')?;
    let body: String = chars[..close].iter().collect();
    let (min, max) = body.split_once(',')?;
    let min: usize = min.trim().parse().ok()?;
    let max: usize = max.trim().parse().ok()?;
    (min <= max).then_some((min, max, close + 1))
}

/// LRU cache of compiled wildcard patterns
pub struct WildcardCache {
    cache: LruCache<String, Option<Regex>>,
}

impl Default for WildcardCache {
    fn default() -> Self {
        Self::new()
    }
}

impl WildcardCache {
    pub fn new() -> Self {
        Self {
            cache: LruCache::new(CACHE_SIZE),
        }
    }

    /// Returns the compiled pattern, or `None` if it exceeds the regex limits
    pub fn get(&mut self, pattern: &str) -> Option<Regex> {
        if let Some(re) = self.cache.get(pattern) {
            return re.clone();
        }
        let compiled = match Regex::new(&to_regex(pattern)) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::debug!(pattern, error = %e, "wildcard pattern rejected");
                None
            }
        };
        self.cache.put(pattern.to_string(), compiled.clone());
        compiled
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, text: &str) -> bool {
        Regex::new(&to_regex(pattern)).unwrap().is_match(text)
    }

    #[test]
    fn test_has_wildcard() {
        assert!(has_wildcard("hel.o"));
        assert!(!has_wildcard("hello"));
        assert!(!has_wildcard("end\\."));
    }

    #[test]
    fn test_wildcard_forms() {
        assert!(matches("hel.o", "hello"));
        assert!(!matches("hel.o", "helo"));
        assert!(matches("hel.?o", "helo"));
        assert!(matches("hel.*", "helicopter"));
        assert!(matches("hel.*", "hel"));
        assert!(!matches("hel.+", "hel"));
        assert!(matches("a.{1,2}b", "axxb"));
        assert!(!matches("a.{1,2}b", "axxxb"));
    }

    #[test]
    fn test_escapes_and_literals() {
        assert!(matches("3\\.5", "3.5"));
        assert!(!matches("3\\.5", "345"));
        assert!(matches("a+b", "a+b"));
        assert!(!matches("a+b", "aab"));
        // malformed bounds fall back to a single-character wildcard
        assert!(matches(".{x}", "a{x}"));
    }

    #[test]
    fn test_cache_reuses_compiled_patterns() {
        let mut cache = WildcardCache::new();
        assert!(cache.get("fo.").is_some());
        assert!(cache.get("fo.").is_some());
        assert_eq!(cache.len(), 1);
    }
}
