use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a node in the pre-order encoding of a store
pub type Pre = u32;

/// Default maximum length of an indexed value (in bytes)
pub const DEFAULT_MAX_LEN: usize = 96;

/// Node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeKind {
    Element = 0,
    Text = 1,
    Attribute = 2,
    Comment = 3,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Element => "element",
            NodeKind::Text => "text",
            NodeKind::Attribute => "attribute",
            NodeKind::Comment => "comment",
        }
    }
}

/// Category of a pre-built index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    Text,
    Attribute,
    Token,
    FullText,
}

impl IndexType {
    /// Kind of the nodes referenced by this index
    pub fn node_kind(&self) -> NodeKind {
        match self {
            IndexType::Text | IndexType::FullText => NodeKind::Text,
            IndexType::Attribute | IndexType::Token => NodeKind::Attribute,
        }
    }

    /// Value indexes only store terms up to the configured maximum length
    pub fn is_length_limited(&self) -> bool {
        matches!(self, IndexType::Text | IndexType::Attribute)
    }

    pub fn function_name(&self) -> &'static str {
        match self {
            IndexType::Text => "db:text",
            IndexType::Attribute => "db:attribute",
            IndexType::Token => "db:token",
            IndexType::FullText => "ft:search",
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexType::Text => "TEXT",
            IndexType::Attribute => "ATTRIBUTE",
            IndexType::Token => "TOKEN",
            IndexType::FullText => "FULLTEXT",
        };
        f.write_str(name)
    }
}

/// Transient handle to a node of a store: a position plus its kind.
/// Handles never own the store they point into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DbNode {
    pub pre: Pre,
    pub kind: NodeKind,
}

impl DbNode {
    pub fn new(pre: Pre, kind: NodeKind) -> Self {
        Self { pre, kind }
    }
}

/// Store metadata and index configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreMeta {
    /// Total number of nodes (derived when the store is built)
    #[serde(skip)]
    pub size: u32,
    /// Maximum length of values stored in the text and attribute indexes
    pub max_len: usize,
    pub text_index: bool,
    pub attr_index: bool,
    pub token_index: bool,
    pub ft_index: bool,
    /// Full-text index flags
    pub case_sensitive: bool,
    pub diacritics_sensitive: bool,
    pub stemming: bool,
    /// The full-text index supports wildcard pattern lookups
    pub fuzzy_support: bool,
}

impl Default for StoreMeta {
    fn default() -> Self {
        Self {
            size: 0,
            max_len: DEFAULT_MAX_LEN,
            text_index: true,
            attr_index: true,
            token_index: true,
            ft_index: true,
            case_sensitive: false,
            diacritics_sensitive: false,
            stemming: false,
            fuzzy_support: true,
        }
    }
}

impl StoreMeta {
    /// Metadata of a store without any index
    pub fn without_indexes() -> Self {
        Self {
            text_index: false,
            attr_index: false,
            token_index: false,
            ft_index: false,
            ..Self::default()
        }
    }

    /// Checks if the index of the given type has been built
    pub fn index(&self, ty: IndexType) -> bool {
        match ty {
            IndexType::Text => self.text_index,
            IndexType::Attribute => self.attr_index,
            IndexType::Token => self.token_index,
            IndexType::FullText => self.ft_index,
        }
    }
}
