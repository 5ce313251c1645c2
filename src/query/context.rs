use crate::error::{QueryError, Result};
use crate::fulltext::{FtOptions, TokenList, WildcardCache};
use crate::index::store::StoreRef;
use crate::index::types::Pre;
use crate::query::expr::{Item, Var, VarId};
use crate::query::scorer::{Scorer, Scoring};
use rustc_hash::FxHashMap;

/// Evaluation context shared by all expressions of one query.
///
/// A context is owned by a single evaluation sequence; iterators created
/// from it hold their own store handle and never borrow the context.
pub struct QueryContext {
    store: StoreRef,
    /// Matching options of the enclosing full-text predicate
    pub ft_opt: FtOptions,
    /// Request fast evaluation (match counts without spans)
    pub ft_fast: bool,
    ft_token_num: u32,
    /// Tokenized focus text for atomic full-text evaluation
    pub(crate) ft_token: Option<TokenList>,
    pub(crate) wildcards: WildcardCache,
    bindings: FxHashMap<VarId, Vec<Item>>,
    scoring: Box<dyn Scoring>,
}

impl QueryContext {
    pub fn new(store: StoreRef) -> Self {
        Self {
            store,
            ft_opt: FtOptions::default(),
            ft_fast: false,
            ft_token_num: 0,
            ft_token: None,
            wildcards: WildcardCache::new(),
            bindings: FxHashMap::default(),
            scoring: Box::new(Scorer::with_defaults()),
        }
    }

    pub fn with_options(mut self, opts: FtOptions) -> Self {
        self.ft_opt = opts;
        self
    }

    /// Replaces the scoring function
    pub fn with_scoring(mut self, scoring: impl Scoring + 'static) -> Self {
        self.scoring = Box::new(scoring);
        self
    }

    pub fn store(&self) -> &StoreRef {
        &self.store
    }

    pub fn bind(&mut self, var: &Var, items: Vec<Item>) {
        self.bindings.insert(var.id, items);
    }

    pub fn binding(&self, var: &Var) -> Result<&[Item]> {
        self.bindings
            .get(&var.id)
            .map(Vec::as_slice)
            .ok_or_else(|| QueryError::UnboundVariable(var.name.clone()))
    }

    /// Returns a fresh token number; 0 is reserved for "unassigned"
    pub fn next_token_num(&mut self) -> u32 {
        self.ft_token_num = self.ft_token_num.wrapping_add(1);
        if self.ft_token_num == 0 {
            self.ft_token_num = 1;
        }
        self.ft_token_num
    }

    /// Sets the focus text of atomic evaluation
    pub fn focus(&mut self, text: &[u8]) {
        self.ft_token = Some(TokenList::new(text, &self.ft_opt));
    }

    /// Sets the focus to the string value of a stored node
    pub fn focus_node(&mut self, pre: Pre) {
        let text = self.store.string_value(pre);
        self.focus(&text);
    }

    pub fn clear_focus(&mut self) {
        self.ft_token = None;
    }

    pub(crate) fn focus_text(&self) -> Result<&TokenList> {
        self.ft_token.as_ref().ok_or(QueryError::NoFocus)
    }

    pub fn scoring(&self) -> &dyn Scoring {
        self.scoring.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::MemStoreBuilder;
    use crate::index::types::StoreMeta;
    use std::sync::Arc;

    fn ctx() -> QueryContext {
        let store = MemStoreBuilder::new().leaf("p", "Quick Fox").finish(StoreMeta::default());
        QueryContext::new(Arc::new(store))
    }

    #[test]
    fn test_token_numbers_are_fresh() {
        let mut ctx = ctx();
        let a = ctx.next_token_num();
        let b = ctx.next_token_num();
        assert!(a > 0);
        assert!(b > a);

        ctx.ft_token_num = u32::MAX;
        assert_eq!(ctx.next_token_num(), 1);
    }

    #[test]
    fn test_focus() {
        let mut ctx = ctx();
        assert!(matches!(ctx.focus_text(), Err(QueryError::NoFocus)));
        ctx.focus_node(0);
        let tokens: Vec<_> = ctx.focus_text().unwrap().tokens().iter().map(|t| t.text.clone()).collect();
        assert_eq!(tokens, vec!["quick", "fox"]);
        ctx.clear_focus();
        assert!(ctx.focus_text().is_err());
    }

    #[test]
    fn test_injected_scoring() {
        let ctx = ctx().with_scoring(|count: usize, _tokens: usize| count as f64);
        assert_eq!(ctx.scoring().word(3, 1), 3.0);
    }
}
