pub mod build;
pub mod iter;
pub mod memory;
pub mod stats;
pub mod store;
pub mod types;

pub use iter::{FtIndexIterator, FtPosting, IndexIterator, PostingIter};
pub use memory::{MemStore, MemStoreBuilder};
pub use store::{NodeStore, StoreRef};
pub use types::*;
