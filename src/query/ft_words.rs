//! Full-text match evaluator.
//!
//! An [`FtWords`] expression decides whether the focus text of the context
//! contains its search terms ([`FtWords::atomic`]), or, once the analyzer has
//! approved index access, enumerates the matching text nodes from the
//! full-text index ([`FtWords::iter`]).

use crate::error::{QueryError, Result};
use crate::fulltext::{FtMatches, FtMode, FtOptions, Hits, TokenList, Tokenizer, WildcardCache};
use crate::index::iter::FtIndexIterator;
use crate::index::store::StoreRef;
use crate::index::types::{DbNode, NodeKind};
use crate::query::context::QueryContext;
use crate::query::expr::{Expr, Item, VarId, VarMap};
use crate::utils::split_spaces;
use std::fmt;
use std::sync::Arc;

/// Maximum absolute value of a full-text weight
pub const MAX_WEIGHT: f64 = 1000.0;

/// Result of a full-text evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct FtItem {
    pub matches: FtMatches,
    pub score: f64,
    /// Matching text node (index iteration only)
    pub node: Option<DbNode>,
}

impl FtItem {
    pub fn is_match(&self) -> bool {
        self.score != 0.0
    }
}

/// Input and output of the index applicability analyzer
pub struct IndexContext<'a> {
    pub ctx: &'a QueryContext,
    pub store: StoreRef,
    /// Estimated number of results, set by the analyzer
    pub selectivity: f64,
}

impl<'a> IndexContext<'a> {
    pub fn new(ctx: &'a QueryContext) -> Self {
        Self {
            store: ctx.store().clone(),
            ctx,
            selectivity: 0.0,
        }
    }
}

/// Full-text words expression
#[derive(Clone)]
pub struct FtWords {
    /// Store for index iteration
    store: Option<StoreRef>,
    /// Literal search term
    txt: Option<Vec<u8>>,
    /// Fast evaluation: count matches, skip spans
    fast: bool,
    /// Spans of the current evaluation
    all: FtMatches,
    /// Minimum and maximum occurrences
    occ: Option<Box<[Expr; 2]>>,
    mode: FtMode,
    query: Expr,
    /// Token number of this expression, assigned on first evaluation
    tok_num: u32,
    /// Single literal term in ANY mode without occurrence range
    simple: bool,
}

impl FtWords {
    pub fn new(query: Expr, mode: FtMode, occ: Option<[Expr; 2]>) -> Self {
        Self {
            store: None,
            txt: None,
            fast: false,
            all: FtMatches::default(),
            occ: occ.map(Box::new),
            mode,
            query,
            tok_num: 0,
            simple: false,
        }
    }

    /// Index-driven expression for a literal term
    pub fn index(store: StoreRef, txt: &[u8], fast: bool) -> Self {
        Self {
            store: Some(store),
            txt: Some(txt.to_vec()),
            fast,
            simple: true,
            ..Self::new(Expr::Str(txt.to_vec()), FtMode::Any, None)
        }
    }

    pub fn mode(&self) -> FtMode {
        self.mode
    }

    pub fn is_simple(&self) -> bool {
        self.simple
    }

    pub fn is_fast(&self) -> bool {
        self.fast
    }

    pub fn term(&self) -> Option<&[u8]> {
        self.txt.as_deref()
    }

    pub fn compile(mut self, ctx: &QueryContext) -> Result<Self> {
        if let Some(occ) = self.occ.take() {
            let [min, max] = *occ;
            self.occ = Some(Box::new([min.optimize(), max.optimize()]));
        }
        self.query = self.query.optimize();
        if let Expr::Str(txt) = &self.query {
            self.txt = Some(txt.clone());
        }
        self.simple = self.mode == FtMode::Any && self.txt.is_some() && self.occ.is_none();
        self.fast = ctx.ft_fast && self.occ.is_none();
        Ok(self)
    }

    /// Evaluates the expression against the focus text of the context
    pub fn atomic(&mut self, ctx: &mut QueryContext) -> Result<FtItem> {
        if self.tok_num == 0 {
            self.tok_num = ctx.next_token_num();
        }
        self.all.reset(self.tok_num);

        let count = self.contains(ctx)?;
        let mut score = if count == 0 {
            0.0
        } else {
            let tokens = ctx.focus_text()?.len();
            ctx.scoring().word(count, tokens)
        };

        if let Some(weight) = &ctx.ft_opt.weight {
            let w = match weight.item(ctx)? {
                Some(item) => item.double()?,
                None => return Err(QueryError::type_error("xs:double", "empty-sequence()")),
            };
            if !w.is_finite() || w.abs() > MAX_WEIGHT {
                return Err(QueryError::FtWeight(w));
            }
            score *= w;
        }

        Ok(FtItem {
            matches: self.all.clone(),
            score,
            node: None,
        })
    }

    /// Computes the match magnitude for the focus text; 0 means no match
    fn contains(&mut self, ctx: &mut QueryContext) -> Result<usize> {
        let fast = self.fast;
        if self.simple {
            if let Some(txt) = &self.txt {
                let hits = matches(txt, ctx, &mut self.all, fast)?;
                return Ok(if hits.is_match() { txt.len() } else { 0 });
            }
        }

        let items = self.query.value(ctx)?;
        let store = ctx.store().clone();
        let mut len = 0;
        let mut tally = 0;

        match self.mode {
            FtMode::All => {
                for item in &items {
                    let term = term_text(item, &store)?;
                    let hits = matches(&term, ctx, &mut self.all, fast)?;
                    if !hits.is_match() {
                        return Ok(0);
                    }
                    len += term.len();
                    tally += hits.units / hits.width;
                }
            }
            FtMode::AllWords => {
                for item in &items {
                    let term = term_text(item, &store)?;
                    for word in split_spaces(&term) {
                        let hits = matches(word, ctx, &mut self.all, fast)?;
                        if !hits.is_match() {
                            return Ok(0);
                        }
                        len += word.len();
                        tally += hits.occurrences();
                    }
                }
            }
            FtMode::Any => {
                for item in &items {
                    let term = term_text(item, &store)?;
                    tally += matches(&term, ctx, &mut self.all, fast)?.occurrences();
                    len += term.len();
                }
            }
            FtMode::AnyWord => {
                for item in &items {
                    let term = term_text(item, &store)?;
                    for word in split_spaces(&term) {
                        tally += matches(word, ctx, &mut self.all, fast)?.occurrences();
                        len += word.len();
                    }
                }
            }
            FtMode::Phrase => {
                let mut phrase = Vec::new();
                for item in &items {
                    if !phrase.is_empty() {
                        phrase.push(b' ');
                    }
                    phrase.extend_from_slice(&term_text(item, &store)?);
                }
                tally += matches(&phrase, ctx, &mut self.all, fast)?.occurrences();
                len += phrase.len();
            }
        }

        let (min, max) = self.occurrences(ctx)?;
        // min > max leaves no valid count
        let tally = tally as i64;
        Ok(if tally < min || tally > max { 0 } else { len.max(1) })
    }

    /// Evaluates the occurrence range; defaults to at least once
    fn occurrences(&self, ctx: &QueryContext) -> Result<(i64, i64)> {
        let Some(occ) = &self.occ else {
            return Ok((1, i64::MAX));
        };
        let bound = |expr: &Expr| -> Result<i64> {
            match expr.item(ctx)? {
                Some(item) => item.integer(),
                None => Err(QueryError::type_error("xs:integer", "empty-sequence()")),
            }
        };
        Ok((bound(&occ[0])?, bound(&occ[1])?))
    }

    /// Lazily enumerates the text nodes that contain the literal term
    pub fn iter(&self) -> FtIter {
        let state = match (&self.store, &self.txt) {
            (Some(_), Some(_)) => IterState::Uninitialized,
            _ => IterState::Exhausted,
        };
        FtIter {
            store: self.store.clone(),
            txt: self.txt.clone().unwrap_or_default(),
            fast: self.fast,
            state,
        }
    }

    /// Checks if the expression can be answered by the full-text index and
    /// stores the estimated number of results in `ic.selectivity`
    pub fn index_accessible(&mut self, ic: &mut IndexContext<'_>) -> bool {
        let ctx = ic.ctx;
        let opts = &ctx.ft_opt;
        let store = ic.store.clone();
        let meta = store.meta();

        let Some(txt) = self.txt.clone() else {
            tracing::debug!("no index access: term is not a literal");
            return false;
        };
        if self.occ.is_some()
            || opts.weight.is_some()
            || !self.mode.is_index_decomposable()
            || !meta.ft_index
            || !opts.complies_with(meta)
            || opts.stop_words.is_some()
        {
            tracing::debug!(mode = %self.mode, "no index access: options not supported by index");
            return false;
        }

        if opts.wildcards && !wildcards_supported(&txt, meta.fuzzy_support) {
            tracing::debug!("no index access: wildcard pattern not supported by index");
            return false;
        }

        ic.selectivity = 0.0;
        for token in Tokenizer::new(&txt, opts, self.fast) {
            let frequency = store.frequency(token.text.as_bytes(), opts.wildcards);
            // no hits are expected if a single token is missing
            if frequency == 0 {
                ic.selectivity = 0.0;
                break;
            }
            ic.selectivity += frequency as f64;
        }
        tracing::debug!(
            term = %String::from_utf8_lossy(&txt),
            selectivity = ic.selectivity,
            "index access"
        );
        self.store = Some(store);
        true
    }

    /// Substitutes `with` for `var` in the search terms and occurrence range
    pub fn inline(&self, var: VarId, with: &Expr) -> Option<FtWords> {
        let query = self.query.inline(var, with);
        let occ = self.occ.as_ref().and_then(|occ| {
            let min = occ[0].inline(var, with);
            let max = occ[1].inline(var, with);
            if min.is_none() && max.is_none() {
                return None;
            }
            Some(Box::new([
                min.unwrap_or_else(|| occ[0].clone()),
                max.unwrap_or_else(|| occ[1].clone()),
            ]))
        });
        if query.is_none() && occ.is_none() {
            return None;
        }

        let mut words = self.clone();
        if let Some(query) = query {
            words.query = query.optimize();
            words.txt = words.query.as_str().map(<[u8]>::to_vec);
        }
        if occ.is_some() {
            words.occ = occ;
        }
        words.simple = words.mode == FtMode::Any && words.txt.is_some() && words.occ.is_none();
        Some(words)
    }

    pub fn copy(&self, vars: &VarMap) -> FtWords {
        let mut words = self.clone();
        words.query = self.query.copy(vars);
        words.occ = self
            .occ
            .as_ref()
            .map(|occ| Box::new([occ[0].copy(vars), occ[1].copy(vars)]));
        words.all = FtMatches::default();
        words.tok_num = 0;
        words
    }

    pub fn expr_size(&self) -> usize {
        let occ = self
            .occ
            .as_ref()
            .map_or(0, |occ| occ[0].expr_size() + occ[1].expr_size());
        1 + self.query.expr_size() + occ
    }

    /// An occurrence range may exclude matches that were found
    pub fn uses_exclude(&self) -> bool {
        self.occ.is_some()
    }
}

/// Wildcard patterns the index can answer: no leading wildcard, no
/// escapes or bounded repeats, at most one wildcard
fn wildcards_supported(txt: &[u8], fuzzy_support: bool) -> bool {
    if !fuzzy_support || txt.first() == Some(&b'.') {
        return false;
    }
    let mut dots = 0;
    for &b in txt {
        if b == b'{' || b == b'\\' {
            return false;
        }
        if b == b'.' {
            dots += 1;
            if dots > 1 {
                return false;
            }
        }
    }
    true
}

fn term_text(item: &Item, store: &StoreRef) -> Result<Vec<u8>> {
    Ok(item.text(store.as_ref())?.into_owned())
}

fn matches(term: &[u8], ctx: &mut QueryContext, all: &mut FtMatches, fast: bool) -> Result<Hits> {
    let text: &TokenList = ctx.ft_token.as_ref().ok_or(QueryError::NoFocus)?;
    let cache: &mut WildcardCache = &mut ctx.wildcards;
    Ok(ctx.ft_opt.contains(term, text, all, fast, cache))
}

impl fmt::Debug for FtWords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtWords")
            .field("query", &self.query)
            .field("mode", &self.mode)
            .field("occ", &self.occ)
            .field("simple", &self.simple)
            .field("fast", &self.fast)
            .field("indexed", &self.store.is_some())
            .finish()
    }
}

impl PartialEq for FtWords {
    fn eq(&self, other: &Self) -> bool {
        let same_store = match (&self.store, &other.store) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_store
            && self.query == other.query
            && self.mode == other.mode
            && self.occ == other.occ
            && self.txt == other.txt
    }
}

impl fmt::Display for FtWords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.query)?;
        if self.mode != FtMode::Any {
            write!(f, " {}", self.mode)?;
        }
        if let Some(occ) = &self.occ {
            write!(f, " occurs {} to {} times", occ[0], occ[1])?;
        }
        Ok(())
    }
}

enum IterState {
    Uninitialized,
    Streaming(FtIndexIterator),
    Exhausted,
}

/// Lazy stream of index matches for a literal term.
///
/// The sub-token streams are fetched and intersected on the first advance.
pub struct FtIter {
    store: Option<StoreRef>,
    txt: Vec<u8>,
    fast: bool,
    state: IterState,
}

impl FtIter {
    fn init(&self, store: &StoreRef, ctx: &mut QueryContext) -> IterState {
        let opts: &FtOptions = &ctx.ft_opt;
        let mut tokens = Tokenizer::new(&self.txt, opts, self.fast);
        // fast evaluation is only valid for single tokens
        tokens.fast &= tokens.len() == 1;
        let fast = tokens.fast;

        let mut combined: Option<FtIndexIterator> = None;
        for token in tokens {
            let mut iter = store.ft_iter(token.text.as_bytes(), opts.wildcards);
            iter.set_fast(fast);
            combined = Some(match combined {
                None => iter,
                Some(prev) => FtIndexIterator::intersect(prev, iter, true),
            });
        }
        let Some(mut iter) = combined else {
            return IterState::Exhausted;
        };
        tracing::trace!(estimate = iter.size(), fast, "full-text index streams intersected");
        iter.set_token_num(ctx.next_token_num());
        IterState::Streaming(iter)
    }

    /// Returns the next matching text node, or `None` when exhausted
    pub fn advance(&mut self, ctx: &mut QueryContext) -> Option<FtItem> {
        if matches!(self.state, IterState::Uninitialized) {
            let store = self.store.clone()?;
            self.state = self.init(&store, ctx);
        }
        let IterState::Streaming(iter) = &mut self.state else {
            return None;
        };
        let Some((pre, matches)) = iter.next() else {
            self.state = IterState::Exhausted;
            return None;
        };

        let store = self.store.as_ref()?;
        let tokens = TokenList::new(store.text(pre, true), &ctx.ft_opt).len();
        let score = ctx.scoring().word(self.txt.len().max(1), tokens);
        Some(FtItem {
            matches,
            score,
            node: Some(DbNode::new(pre, NodeKind::Text)),
        })
    }
}
