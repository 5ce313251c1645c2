//! Full-text predicate over the text nodes of a store.
//!
//! The access path is chosen once at compile time: the index when the
//! analyzer approves it, a scan over all text nodes otherwise.

use crate::error::Result;
use crate::index::types::{DbNode, NodeKind};
use crate::query::context::QueryContext;
use crate::query::ft_words::{FtItem, FtWords, IndexContext};
use std::fmt;

/// How matching nodes are retrieved
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AccessPath {
    /// Full-text index, with the estimated number of results
    Index { selectivity: f64 },
    /// Atomic evaluation of every text node
    Scan,
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessPath::Index { selectivity } => write!(f, "index (~{selectivity} hits)"),
            AccessPath::Scan => f.write_str("scan"),
        }
    }
}

/// Text nodes satisfying a full-text expression
#[derive(Debug, Clone)]
pub struct FtContains {
    words: FtWords,
    path: AccessPath,
}

impl FtContains {
    pub fn new(words: FtWords) -> Self {
        Self {
            words,
            path: AccessPath::Scan,
        }
    }

    /// Compiles the expression and selects the access path
    pub fn compile(self, ctx: &QueryContext) -> Result<Self> {
        let mut words = self.words.compile(ctx)?;
        let mut ic = IndexContext::new(ctx);
        let path = if words.index_accessible(&mut ic) {
            AccessPath::Index {
                selectivity: ic.selectivity,
            }
        } else {
            AccessPath::Scan
        };
        tracing::debug!(expr = %words, %path, "full-text access path");
        Ok(Self { words, path })
    }

    /// Evaluates by scanning, even if the index is accessible
    pub fn force_scan(mut self) -> Self {
        self.path = AccessPath::Scan;
        self
    }

    pub fn path(&self) -> AccessPath {
        self.path
    }

    pub fn words(&self) -> &FtWords {
        &self.words
    }

    /// Returns all matching text nodes in document order with their scores
    pub fn eval(&mut self, ctx: &mut QueryContext) -> Result<Vec<(DbNode, FtItem)>> {
        let mut results = Vec::new();
        match self.path {
            AccessPath::Index { .. } => {
                let mut iter = self.words.iter();
                while let Some(item) = iter.advance(ctx) {
                    if let Some(node) = item.node {
                        results.push((node, item));
                    }
                }
            }
            AccessPath::Scan => {
                let scanned = self.scan(ctx, &mut results);
                ctx.clear_focus();
                scanned?;
            }
        }
        tracing::debug!(path = %self.path, results = results.len(), "full-text evaluation");
        Ok(results)
    }

    fn scan(&mut self, ctx: &mut QueryContext, results: &mut Vec<(DbNode, FtItem)>) -> Result<()> {
        let store = ctx.store().clone();
        for pre in 0..store.len() {
            if store.kind(pre) != NodeKind::Text {
                continue;
            }
            ctx.focus(store.text(pre, true));
            let item = self.words.atomic(ctx)?;
            if item.is_match() {
                results.push((DbNode::new(pre, NodeKind::Text), item));
            }
        }
        Ok(())
    }
}
