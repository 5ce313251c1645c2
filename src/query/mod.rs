pub mod context;
pub mod expr;
pub mod ft_contains;
pub mod ft_words;
pub mod scorer;
pub mod union;
pub mod value_access;

pub use context::QueryContext;
pub use expr::{Expr, Item, Var, VarId, VarMap};
pub use ft_contains::{AccessPath, FtContains};
pub use ft_words::{FtItem, FtIter, FtWords, IndexContext};
pub use name_test::NameTest;
pub use scorer::{Scorer, Scoring, ScoringWeights};
pub use union::{NodeIter, union};
pub use value_access::ValueAccess;
