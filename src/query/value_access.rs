//! Term index evaluator: retrieves text and attribute nodes by value.
//!
//! Each search term is answered from the matching value index when the store
//! has built it and the term can be indexed at all; otherwise the store is
//! scanned. Both paths yield the same nodes in document order.

use crate::error::Result;
use crate::index::iter::IndexIterator;
use crate::index::store::{NodeStore, StoreRef};
use crate::index::types::{DbNode, IndexType, NodeKind, Pre};
use crate::query::context::QueryContext;
use crate::query::expr::{Expr, Item, VarId, VarMap};
use crate::query::name_test::NameTest;
use crate::query::union::{NodeIter, union};
use crate::utils::{split_tokens, trim};
use roaring::RoaringBitmap;
use std::fmt;

/// Index access for values of text nodes, attributes or attribute tokens
#[derive(Debug, Clone, PartialEq)]
pub struct ValueAccess {
    expr: Expr,
    index: IndexType,
    /// Test on the name of the parent element
    test: Option<NameTest>,
    trim: bool,
}

impl ValueAccess {
    pub fn new(expr: Expr, index: IndexType, test: Option<NameTest>) -> Self {
        Self {
            expr,
            index,
            test,
            trim: false,
        }
    }

    /// Trims whitespace from search terms before the lookup
    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn term_source(&self) -> &Expr {
        &self.expr
    }

    pub fn index_type(&self) -> IndexType {
        self.index
    }

    pub fn optimize(mut self) -> Self {
        self.expr = self.expr.optimize();
        self
    }

    /// Returns the matching nodes in document order, without duplicates
    pub fn iter(&self, ctx: &QueryContext) -> Result<NodeIter> {
        let store = ctx.store();
        if self.expr.zero_or_one() {
            return Ok(match self.expr.item(ctx)? {
                Some(item) => self.iter_item(&item, store),
                None => Box::new(std::iter::empty()),
            });
        }

        let iters: Vec<NodeIter> = self
            .expr
            .value(ctx)?
            .iter()
            .map(|item| self.iter_item(item, store))
            .collect();
        Ok(union(iters))
    }

    fn iter_item(&self, item: &Item, store: &StoreRef) -> NodeIter {
        let token = item.string(store.as_ref());
        let term = if self.trim { trim(&token) } else { &token[..] };
        self.iter_term(term, store)
    }

    /// Returns the nodes matching a single term
    pub fn iter_term(&self, term: &[u8], store: &StoreRef) -> NodeIter {
        // Empty text nodes are never indexed: without a name test there are
        // no results, otherwise scan for elements without content
        if term.is_empty() && self.index == IndexType::Text {
            return match &self.test {
                None => Box::new(std::iter::empty()),
                Some(test) => Box::new(ScanEmpty::new(store.clone(), test.clone())),
            };
        }

        let meta = store.meta();
        let mut use_index = meta.index(self.index);
        if self.index.is_length_limited() {
            use_index &= !term.is_empty() && term.len() <= meta.max_len;
        }

        let source: Box<dyn IndexIterator> = if use_index {
            Box::new(store.iter(self.index, term))
        } else {
            Box::new(ScanIter::new(store.clone(), self.index, term))
        };
        let path = if use_index { "index" } else { "scan" };
        tracing::debug!(
            index = %self.index,
            term = %String::from_utf8_lossy(term),
            path,
            estimate = source.size(),
            "value access"
        );

        let kind = self.index.node_kind();
        match &self.test {
            None => Box::new(source.map(move |pre| DbNode::new(pre, kind))),
            Some(test) => Box::new(ParentIter::new(store.clone(), source, kind, test.clone())),
        }
    }

    /// Substitutes `with` for `var` in the term source
    pub fn inline(&self, var: VarId, with: &Expr) -> Option<ValueAccess> {
        let expr = self.expr.inline(var, with)?;
        Some(
            ValueAccess {
                expr,
                ..self.clone()
            }
            .optimize(),
        )
    }

    pub fn copy(&self, vars: &VarMap) -> ValueAccess {
        ValueAccess {
            expr: self.expr.copy(vars),
            ..self.clone()
        }
    }

    pub fn expr_size(&self) -> usize {
        1 + self.expr.expr_size()
    }
}

impl fmt::Display for ValueAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let func = self.index.function_name();
        match &self.expr {
            Expr::Seq(_) => write!(f, "{func}{}", self.expr)?,
            expr => write!(f, "{func}({expr})")?,
        }
        if let Some(test) = &self.test {
            write!(f, "/parent::{test}")?;
        }
        Ok(())
    }
}

/// Sequential scan for text or attribute nodes with a given value
struct ScanIter {
    store: StoreRef,
    kind: NodeKind,
    term: Vec<u8>,
    /// Compare against the whitespace separated tokens of a value
    tokens: bool,
    pre: Pre,
    len: Pre,
}

impl ScanIter {
    fn new(store: StoreRef, index: IndexType, term: &[u8]) -> Self {
        let len = store.len();
        Self {
            store,
            kind: index.node_kind(),
            term: term.to_vec(),
            tokens: index == IndexType::Token,
            pre: 0,
            len,
        }
    }
}

impl Iterator for ScanIter {
    type Item = Pre;

    fn next(&mut self) -> Option<Pre> {
        let text = self.kind == NodeKind::Text;
        while self.pre < self.len {
            let pre = self.pre;
            self.pre += 1;
            if self.store.kind(pre) != self.kind {
                continue;
            }
            let value = self.store.text(pre, text);
            let hit = if self.tokens {
                split_tokens(value).any(|token| token == self.term.as_slice())
            } else {
                value == self.term.as_slice()
            };
            if hit {
                return Some(pre);
            }
        }
        None
    }
}

impl IndexIterator for ScanIter {
    /// Pessimistic estimate for the optimizer
    fn size(&self) -> usize {
        (self.len as usize / 2).max(1)
    }
}

/// Maps hits to their parent elements that pass the name test.
///
/// Parents of document-ordered hits are not necessarily document-ordered
/// (a text following a nested element belongs to the outer element), so
/// the qualifying parents are collected on the first advance.
struct ParentIter {
    store: StoreRef,
    source: Option<Box<dyn IndexIterator>>,
    kind: NodeKind,
    test: NameTest,
    parents: Option<roaring::bitmap::IntoIter>,
}

impl ParentIter {
    fn new(store: StoreRef, source: Box<dyn IndexIterator>, kind: NodeKind, test: NameTest) -> Self {
        Self {
            store,
            source: Some(source),
            kind,
            test,
            parents: None,
        }
    }

    fn qualifying_parents(&mut self) -> RoaringBitmap {
        let mut parents = RoaringBitmap::new();
        if let Some(source) = self.source.take() {
            for pre in source {
                let Some(parent) = self.store.parent(pre, self.kind) else {
                    continue;
                };
                if self.store.kind(parent) == NodeKind::Element
                    && self.test.matches(self.store.name(parent))
                {
                    parents.insert(parent);
                }
            }
        }
        parents
    }
}

impl Iterator for ParentIter {
    type Item = DbNode;

    fn next(&mut self) -> Option<DbNode> {
        if self.parents.is_none() {
            self.parents = Some(self.qualifying_parents().into_iter());
        }
        let pre = self.parents.as_mut()?.next()?;
        Some(DbNode::new(pre, NodeKind::Element))
    }
}

/// Scan for elements without content that pass the name test: elements
/// without child nodes, or with a single empty text node as their only child
struct ScanEmpty {
    store: StoreRef,
    test: NameTest,
    pre: Pre,
    len: Pre,
}

impl ScanEmpty {
    fn new(store: StoreRef, test: NameTest) -> Self {
        let len = store.len();
        Self {
            store,
            test,
            pre: 0,
            len,
        }
    }
}

fn is_empty_element(store: &dyn NodeStore, pre: Pre) -> bool {
    let end = pre + store.size(pre, NodeKind::Element);
    let mut child = pre + 1;
    while child < end && store.kind(child) == NodeKind::Attribute {
        child += 1;
    }
    match end - child {
        0 => true,
        1 => store.kind(child) == NodeKind::Text && store.text(child, true).is_empty(),
        _ => false,
    }
}

impl Iterator for ScanEmpty {
    type Item = DbNode;

    fn next(&mut self) -> Option<DbNode> {
        while self.pre < self.len {
            let pre = self.pre;
            self.pre += 1;
            if self.store.kind(pre) == NodeKind::Element
                && self.test.matches(self.store.name(pre))
                && is_empty_element(self.store.as_ref(), pre)
            {
                return Some(DbNode::new(pre, NodeKind::Element));
            }
        }
        None
    }
}
