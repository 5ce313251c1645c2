//! Index construction for the in-memory store.

use crate::fulltext::options::FtOptions;
use crate::fulltext::tokenizer::TokenList;
use crate::index::iter::FtPosting;
use crate::index::memory::NodeEntry;
use crate::index::types::{NodeKind, Pre, StoreMeta};
use crate::utils::split_tokens;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::time::Instant;

/// Value index: exact value to node positions
pub type ValueIndex = FxHashMap<Vec<u8>, RoaringBitmap>;

/// All indexes of a store
#[derive(Default)]
pub struct Indexes {
    pub text: ValueIndex,
    pub attr: ValueIndex,
    pub token: ValueIndex,
    /// Normalized sub-token to postings, sorted by position
    pub fulltext: BTreeMap<String, Vec<FtPosting>>,
}

/// Builds the indexes enabled in `meta`
pub fn build_indexes(nodes: &[NodeEntry], meta: &StoreMeta) -> Indexes {
    let start = Instant::now();
    let mut indexes = Indexes::default();

    for (pre, node) in nodes.iter().enumerate() {
        let pre = pre as Pre;
        let value = node.value.as_slice();
        let indexable = !value.is_empty() && value.len() <= meta.max_len;
        match node.kind {
            NodeKind::Text if meta.text_index && indexable => {
                indexes.text.entry(value.to_vec()).or_default().insert(pre);
            }
            NodeKind::Attribute => {
                if meta.attr_index && indexable {
                    indexes.attr.entry(value.to_vec()).or_default().insert(pre);
                }
                if meta.token_index {
                    for token in split_tokens(value) {
                        indexes.token.entry(token.to_vec()).or_default().insert(pre);
                    }
                }
            }
            _ => {}
        }
    }

    if meta.ft_index {
        indexes.fulltext = build_fulltext(nodes, meta);
    }

    tracing::debug!(
        nodes = nodes.len(),
        text_keys = indexes.text.len(),
        attr_keys = indexes.attr.len(),
        token_keys = indexes.token.len(),
        ft_keys = indexes.fulltext.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "indexes built"
    );
    indexes
}

fn build_fulltext(nodes: &[NodeEntry], meta: &StoreMeta) -> BTreeMap<String, Vec<FtPosting>> {
    let opts = FtOptions::for_store(meta);
    let texts: Vec<(Pre, &[u8])> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.kind == NodeKind::Text && !n.value.is_empty())
        .map(|(pre, n)| (pre as Pre, n.value.as_slice()))
        .collect();

    // Tokenize in parallel, merge sequentially to keep postings in position order
    #[cfg(feature = "parallel")]
    let tokenized: Vec<(Pre, TokenList)> = texts
        .par_iter()
        .map(|&(pre, text)| (pre, TokenList::new(text, &opts)))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let tokenized: Vec<(Pre, TokenList)> = texts
        .iter()
        .map(|&(pre, text)| (pre, TokenList::new(text, &opts)))
        .collect();

    let mut fulltext: BTreeMap<String, Vec<FtPosting>> = BTreeMap::new();
    for (pre, list) in tokenized {
        let mut positions: BTreeMap<&str, Vec<(u32, u32)>> = BTreeMap::new();
        for token in list.tokens() {
            positions
                .entry(token.text.as_str())
                .or_default()
                .push((token.pos, token.pos));
        }
        for (token, spans) in positions {
            fulltext
                .entry(token.to_string())
                .or_default()
                .push(FtPosting { pre, spans });
        }
    }
    fulltext
}
