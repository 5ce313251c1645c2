//! Lazy position streams produced by index probes and scans.
//!
//! All iterators here are single-pass and forward-only. They yield
//! positions in ascending document order, which the intersection and union
//! operations rely on.

use crate::fulltext::FtMatches;
use crate::index::types::Pre;
use roaring::RoaringBitmap;
use std::cmp::Ordering;

/// A stream of node positions with a cost estimate
pub trait IndexIterator: Iterator<Item = Pre> {
    /// Estimated number of results, consumed by the optimizer
    fn size(&self) -> usize;
}

/// Position stream backed by a posting bitmap
pub struct PostingIter {
    iter: roaring::bitmap::IntoIter,
    size: usize,
}

impl PostingIter {
    pub fn new(bitmap: RoaringBitmap) -> Self {
        let size = bitmap.len() as usize;
        Self {
            iter: bitmap.into_iter(),
            size,
        }
    }

    pub fn empty() -> Self {
        Self::new(RoaringBitmap::new())
    }
}

impl Iterator for PostingIter {
    type Item = Pre;

    fn next(&mut self) -> Option<Pre> {
        self.iter.next()
    }
}

impl IndexIterator for PostingIter {
    fn size(&self) -> usize {
        self.size
    }
}

/// Occurrences of one or more sub-tokens in a single text node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtPosting {
    pub pre: Pre,
    /// Token offset intervals `(start, end)`, ascending by start
    pub spans: Vec<(u32, u32)>,
}

enum FtSource {
    Postings(std::vec::IntoIter<FtPosting>),
    Intersect {
        left: Box<FtSource>,
        right: Box<FtSource>,
        phrase: bool,
    },
}

impl FtSource {
    fn next(&mut self) -> Option<FtPosting> {
        match self {
            FtSource::Postings(iter) => iter.next(),
            FtSource::Intersect {
                left,
                right,
                phrase,
            } => {
                let mut l = left.next()?;
                let mut r = right.next()?;
                loop {
                    // Advance the lagging stream only
                    match l.pre.cmp(&r.pre) {
                        Ordering::Less => l = left.next()?,
                        Ordering::Greater => r = right.next()?,
                        Ordering::Equal => {
                            if let Some(spans) = combine(&l.spans, &r.spans, *phrase) {
                                return Some(FtPosting { pre: l.pre, spans });
                            }
                            l = left.next()?;
                            r = right.next()?;
                        }
                    }
                }
            }
        }
    }
}

/// Combines the spans of two postings of the same node.
/// In phrase mode, a right span must start directly after a left span.
fn combine(left: &[(u32, u32)], right: &[(u32, u32)], phrase: bool) -> Option<Vec<(u32, u32)>> {
    if !phrase {
        let mut spans: Vec<_> = left.iter().chain(right).copied().collect();
        spans.sort_unstable();
        spans.dedup();
        return Some(spans);
    }
    let spans: Vec<_> = left
        .iter()
        .filter_map(|&(ls, le)| {
            right
                .iter()
                .find(|&&(rs, _)| rs == le + 1)
                .map(|&(_, re)| (ls, re))
        })
        .collect();
    (!spans.is_empty()).then_some(spans)
}

/// Full-text position stream: yields text node positions together with the
/// spans of the matched sub-tokens.
pub struct FtIndexIterator {
    source: FtSource,
    size: usize,
    token_num: u32,
    fast: bool,
}

impl FtIndexIterator {
    /// Creates a stream from postings sorted by position
    pub fn new(postings: Vec<FtPosting>) -> Self {
        debug_assert!(postings.windows(2).all(|w| w[0].pre < w[1].pre));
        Self {
            size: postings.len(),
            source: FtSource::Postings(postings.into_iter()),
            token_num: 0,
            fast: false,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Intersects two streams: a node is returned if it occurs in both.
    /// With `phrase` set, the sub-tokens of `right` must directly follow those of `left`.
    pub fn intersect(left: FtIndexIterator, right: FtIndexIterator, phrase: bool) -> Self {
        Self {
            size: left.size.min(right.size),
            token_num: left.token_num,
            fast: left.fast && right.fast,
            source: FtSource::Intersect {
                left: Box::new(left.source),
                right: Box::new(right.source),
                phrase,
            },
        }
    }

    /// Tags all subsequently returned matches with the given token number
    pub fn set_token_num(&mut self, token_num: u32) {
        self.token_num = token_num;
    }

    /// In fast mode, no spans are recorded
    pub fn set_fast(&mut self, fast: bool) {
        self.fast = fast;
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl Iterator for FtIndexIterator {
    type Item = (Pre, FtMatches);

    fn next(&mut self) -> Option<Self::Item> {
        let posting = self.source.next()?;
        let matches = if self.fast {
            FtMatches::new(self.token_num)
        } else {
            FtMatches::from_spans(self.token_num, &posting.spans)
        };
        Some((posting.pre, matches))
    }
}
