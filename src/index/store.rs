use crate::index::iter::{FtIndexIterator, PostingIter};
use crate::index::types::{IndexType, NodeKind, Pre, StoreMeta};
use std::sync::Arc;

/// Shared handle to a node store
pub type StoreRef = Arc<dyn NodeStore>;

/// Positional document store with pre-built indexes.
///
/// Nodes are addressed by their pre-order position. Index probes return
/// lazy streams in ascending position order.
pub trait NodeStore {
    /// Store metadata: size, built indexes and full-text flags
    fn meta(&self) -> &StoreMeta;

    fn kind(&self, pre: Pre) -> NodeKind;

    /// Value of a text node (`text == true`) or attribute
    fn text(&self, pre: Pre, text: bool) -> &[u8];

    /// Name of an element or attribute (empty for other kinds)
    fn name(&self, pre: Pre) -> &[u8];

    /// Position of the owning element, if any
    fn parent(&self, pre: Pre, kind: NodeKind) -> Option<Pre>;

    /// Number of nodes in the subtree rooted at `pre` (including attributes)
    fn size(&self, pre: Pre, kind: NodeKind) -> u32;

    /// Probes a value index (text, attribute or token)
    fn iter(&self, ty: IndexType, term: &[u8]) -> PostingIter;

    /// Probes the full-text index for a normalized sub-token
    fn ft_iter(&self, token: &[u8], wildcard: bool) -> FtIndexIterator;

    /// Number of text nodes containing a normalized sub-token
    fn frequency(&self, token: &[u8], wildcard: bool) -> usize;

    /// Total number of nodes
    fn len(&self) -> u32 {
        self.meta().size
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// String value of a node: the value of a text, attribute or comment,
    /// or the concatenated descendant texts of an element
    fn string_value(&self, pre: Pre) -> Vec<u8> {
        let kind = self.kind(pre);
        match kind {
            NodeKind::Text => self.text(pre, true).to_vec(),
            NodeKind::Attribute | NodeKind::Comment => self.text(pre, false).to_vec(),
            NodeKind::Element => {
                let end = pre + self.size(pre, kind);
                let mut value = Vec::new();
                for p in pre + 1..end {
                    if self.kind(p) == NodeKind::Text {
                        value.extend_from_slice(self.text(p, true));
                    }
                }
                value
            }
        }
    }
}
