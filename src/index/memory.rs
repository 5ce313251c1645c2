//! In-memory node store.
//!
//! Nodes are kept in pre-order: an element is followed by its attributes,
//! then by its children. Each entry records its parent and subtree size, so
//! ancestor and descendant lookups are positional.

use crate::error::{QueryError, Result};
use crate::fulltext::wildcard::{has_wildcard, to_regex};
use crate::index::build::{Indexes, build_indexes};
use crate::index::iter::{FtIndexIterator, FtPosting, PostingIter};
use crate::index::store::NodeStore;
use crate::index::types::{IndexType, NodeKind, Pre, StoreMeta};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Stored node
#[derive(Debug, Clone)]
pub struct NodeEntry {
    pub kind: NodeKind,
    pub name: Vec<u8>,
    pub value: Vec<u8>,
    pub parent: Option<Pre>,
    pub size: u32,
}

/// Node store held entirely in memory, with roaring-backed indexes
pub struct MemStore {
    meta: StoreMeta,
    nodes: Vec<NodeEntry>,
    indexes: Indexes,
}

impl MemStore {
    /// Builds the store and all indexes enabled in `meta`
    pub fn new(nodes: Vec<NodeEntry>, mut meta: StoreMeta) -> Self {
        meta.size = nodes.len() as u32;
        let indexes = build_indexes(&nodes, &meta);
        Self {
            meta,
            nodes,
            indexes,
        }
    }

    /// Loads a document from a JSON file
    pub fn open(path: &Path, meta: StoreMeta) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let doc: Value = serde_json::from_reader(std::io::BufReader::new(file))?;
        Self::from_json(&doc, meta)
    }

    /// Builds a store from a JSON document.
    ///
    /// Elements are objects with a `name`, optional `attributes` and optional
    /// `children`; string children are text nodes and `{"comment": "..."}`
    /// objects are comments.
    pub fn from_json(doc: &Value, meta: StoreMeta) -> Result<Self> {
        let mut builder = MemStoreBuilder::new();
        add_json_element(&mut builder, doc)?;
        Ok(builder.finish(meta))
    }

    pub fn nodes(&self) -> &[NodeEntry] {
        &self.nodes
    }

    pub(crate) fn indexes(&self) -> &Indexes {
        &self.indexes
    }

    /// Full-text postings of all keys matching a sub-token, merged by position
    fn ft_postings(&self, token: &[u8], wildcard: bool) -> Vec<FtPosting> {
        let token = String::from_utf8_lossy(token);
        let fulltext = &self.indexes.fulltext;

        let pattern = wildcard && self.meta.fuzzy_support && has_wildcard(&token);
        if !pattern {
            return fulltext.get(&*token).cloned().unwrap_or_default();
        }

        let Ok(re) = Regex::new(&to_regex(&token)) else {
            return Vec::new();
        };
        let mut merged: BTreeMap<Pre, Vec<(u32, u32)>> = BTreeMap::new();
        for (_, postings) in fulltext.iter().filter(|(key, _)| re.is_match(key)) {
            for posting in postings {
                merged
                    .entry(posting.pre)
                    .or_default()
                    .extend_from_slice(&posting.spans);
            }
        }
        merged
            .into_iter()
            .map(|(pre, mut spans)| {
                spans.sort_unstable();
                FtPosting { pre, spans }
            })
            .collect()
    }
}

impl NodeStore for MemStore {
    fn meta(&self) -> &StoreMeta {
        &self.meta
    }

    fn kind(&self, pre: Pre) -> NodeKind {
        self.nodes[pre as usize].kind
    }

    fn text(&self, pre: Pre, _text: bool) -> &[u8] {
        &self.nodes[pre as usize].value
    }

    fn name(&self, pre: Pre) -> &[u8] {
        &self.nodes[pre as usize].name
    }

    fn parent(&self, pre: Pre, _kind: NodeKind) -> Option<Pre> {
        self.nodes[pre as usize].parent
    }

    fn size(&self, pre: Pre, _kind: NodeKind) -> u32 {
        self.nodes[pre as usize].size
    }

    fn iter(&self, ty: IndexType, term: &[u8]) -> PostingIter {
        let index = match ty {
            IndexType::Text => &self.indexes.text,
            IndexType::Attribute => &self.indexes.attr,
            IndexType::Token => &self.indexes.token,
            IndexType::FullText => {
                let pres = self.ft_postings(term, false).into_iter().map(|p| p.pre);
                return PostingIter::new(pres.collect());
            }
        };
        index
            .get(term)
            .map(|bitmap| PostingIter::new(bitmap.clone()))
            .unwrap_or_else(PostingIter::empty)
    }

    fn ft_iter(&self, token: &[u8], wildcard: bool) -> FtIndexIterator {
        FtIndexIterator::new(self.ft_postings(token, wildcard))
    }

    fn frequency(&self, token: &[u8], wildcard: bool) -> usize {
        let token_str = String::from_utf8_lossy(token);
        if wildcard && self.meta.fuzzy_support && has_wildcard(&token_str) {
            self.ft_postings(token, wildcard).len()
        } else {
            self.indexes
                .fulltext
                .get(&*token_str)
                .map_or(0, Vec::len)
        }
    }
}

/// Incremental construction of a [`MemStore`] in document order
#[derive(Default)]
pub struct MemStoreBuilder {
    nodes: Vec<NodeEntry>,
    open: Vec<Pre>,
}

impl MemStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: NodeKind, name: &[u8], value: &[u8]) -> Pre {
        let pre = self.nodes.len() as Pre;
        self.nodes.push(NodeEntry {
            kind,
            name: name.to_vec(),
            value: value.to_vec(),
            parent: self.open.last().copied(),
            size: 1,
        });
        pre
    }

    /// Opens an element; subsequent nodes become its attributes and children
    pub fn open(&mut self, name: &str) -> &mut Self {
        let pre = self.push(NodeKind::Element, name.as_bytes(), b"");
        self.open.push(pre);
        self
    }

    /// Adds an attribute to the open element
    pub fn attr(&mut self, name: &str, value: &str) -> &mut Self {
        debug_assert!(
            self.open
                .last()
                .is_some_and(|&p| p as usize + self.attr_count(p) + 1 == self.nodes.len()),
            "attributes must precede children"
        );
        self.push(NodeKind::Attribute, name.as_bytes(), value.as_bytes());
        self
    }

    pub fn text(&mut self, value: &str) -> &mut Self {
        self.push(NodeKind::Text, b"", value.as_bytes());
        self
    }

    pub fn comment(&mut self, value: &str) -> &mut Self {
        self.push(NodeKind::Comment, b"", value.as_bytes());
        self
    }

    /// Closes the innermost open element
    pub fn close(&mut self) -> &mut Self {
        if let Some(pre) = self.open.pop() {
            self.nodes[pre as usize].size = (self.nodes.len() - pre as usize) as u32;
        }
        self
    }

    /// Shorthand for an element containing a single text node
    pub fn leaf(&mut self, name: &str, text: &str) -> &mut Self {
        self.open(name).text(text).close()
    }

    fn attr_count(&self, pre: Pre) -> usize {
        self.nodes[pre as usize + 1..]
            .iter()
            .take_while(|n| n.kind == NodeKind::Attribute)
            .count()
    }

    /// Closes all open elements and builds the store
    pub fn finish(&mut self, meta: StoreMeta) -> MemStore {
        while !self.open.is_empty() {
            self.close();
        }
        MemStore::new(std::mem::take(&mut self.nodes), meta)
    }
}

fn add_json_element(builder: &mut MemStoreBuilder, value: &Value) -> Result<()> {
    let obj = value
        .as_object()
        .ok_or_else(|| QueryError::InvalidDocument(format!("element expected, found {value}")))?;

    if let Some(comment) = obj.get("comment") {
        let text = comment
            .as_str()
            .ok_or_else(|| QueryError::InvalidDocument("comment must be a string".into()))?;
        builder.comment(text);
        return Ok(());
    }

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| QueryError::InvalidDocument("element without name".into()))?;
    builder.open(name);

    if let Some(attrs) = obj.get("attributes") {
        let attrs = attrs
            .as_object()
            .ok_or_else(|| QueryError::InvalidDocument(format!("attributes of <{name}> must be an object")))?;
        for (key, value) in attrs {
            match value {
                Value::String(s) => builder.attr(key, s),
                other => builder.attr(key, &other.to_string()),
            };
        }
    }

    if let Some(children) = obj.get("children") {
        let children = children
            .as_array()
            .ok_or_else(|| QueryError::InvalidDocument(format!("children of <{name}> must be an array")))?;
        for child in children {
            match child {
                Value::String(text) => {
                    builder.text(text);
                }
                other => add_json_element(builder, other)?,
            }
        }
    }

    builder.close();
    Ok(())
}
