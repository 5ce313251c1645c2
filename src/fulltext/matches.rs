//! Match spans recorded during full-text evaluation, used for highlighting.

/// A matched interval of token offsets (inclusive on both ends)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FtMatch {
    pub start: u32,
    pub end: u32,
    /// Token number of the evaluation that recorded this span
    pub token_num: u32,
}

impl FtMatch {
    pub fn contains(&self, pos: u32) -> bool {
        pos >= self.start && pos <= self.end
    }
}

/// Accumulated match spans of one evaluation.
///
/// The set is reset, never appended to, when a new evaluation starts; the
/// token number identifies which evaluation the spans belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FtMatches {
    token_num: u32,
    matches: Vec<FtMatch>,
}

impl FtMatches {
    pub fn new(token_num: u32) -> Self {
        Self {
            token_num,
            matches: Vec::new(),
        }
    }

    /// Build a span set from raw `(start, end)` offsets
    pub fn from_spans(token_num: u32, spans: &[(u32, u32)]) -> Self {
        let mut matches = Self::new(token_num);
        for &(start, end) in spans {
            matches.add(start, end);
        }
        matches
    }

    /// Discards all spans and starts a new evaluation scope
    pub fn reset(&mut self, token_num: u32) {
        self.token_num = token_num;
        self.matches.clear();
    }

    pub fn add(&mut self, start: u32, end: u32) {
        self.matches.push(FtMatch {
            start,
            end,
            token_num: self.token_num,
        });
    }

    pub fn token_num(&self) -> u32 {
        self.token_num
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FtMatch> {
        self.matches.iter()
    }

    /// Checks if a token offset is covered by any span
    pub fn covers(&self, pos: u32) -> bool {
        self.matches.iter().any(|m| m.contains(pos))
    }
}

impl<'a> IntoIterator for &'a FtMatches {
    type Item = &'a FtMatch;
    type IntoIter = std::slice::Iter<'a, FtMatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_discards_previous_spans() {
        let mut all = FtMatches::new(1);
        all.add(0, 0);
        all.add(3, 4);
        assert_eq!(all.len(), 2);

        all.reset(2);
        assert!(all.is_empty());
        all.add(1, 1);
        assert_eq!(all.token_num(), 2);
        assert_eq!(all.iter().next().map(|m| m.token_num), Some(2));
    }

    #[test]
    fn test_covers() {
        let all = FtMatches::from_spans(7, &[(2, 4)]);
        assert!(all.covers(2));
        assert!(all.covers(4));
        assert!(!all.covers(5));
    }
}
