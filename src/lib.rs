//! # nodex - index-backed retrieval for tree-shaped documents
//!
//! nodex answers value lookups and full-text predicates over a positional
//! document store. Every request is served from a pre-built index when the
//! store has one that can answer it, and from a document scan otherwise;
//! both paths return the same nodes.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`index`] - Node store interface, in-memory store and its indexes
//! - [`fulltext`] - Tokenizer, matching options and match spans
//! - [`query`] - Value access, full-text evaluation and the index analyzer
//! - [`output`] - Result formatting with highlighted matches
//! - [`utils`] - Byte helpers
//!
//! ## Quick Start
//!
//! ```ignore
//! use nodex::index::{IndexType, MemStore, StoreMeta};
//! use nodex::query::{Expr, QueryContext, ValueAccess};
//! use std::sync::Arc;
//!
//! let store = MemStore::open("doc.json".as_ref(), StoreMeta::default()).unwrap();
//! let ctx = QueryContext::new(Arc::new(store));
//!
//! let access = ValueAccess::new(Expr::str("Hello"), IndexType::Text, None);
//! for node in access.iter(&ctx).unwrap() {
//!     println!("{}", node.pre);
//! }
//! ```

pub mod error;
pub mod fulltext;
pub mod index;
pub mod output;
pub mod query;
pub mod utils;

pub use error::{QueryError, Result};
