//! Full-text matching primitives.
//!
//! ## Modules
//!
//! - [`options`] - Matching options and quantifier modes
//! - [`tokenizer`] - Sub-token extraction and normalization
//! - [`matcher`] - Matching a term against a tokenized text
//! - [`matches`] - Match spans used for highlighting
//! - [`wildcard`] - Wildcard pattern translation

pub mod matcher;
pub mod matches;
pub mod options;
pub mod tokenizer;
pub mod wildcard;

pub use matcher::Hits;
pub use matches::{FtMatch, FtMatches};
pub use options::{FtMode, FtOptions};
pub use tokenizer::{FtToken, TokenList, Tokenizer};
pub use wildcard::WildcardCache;
