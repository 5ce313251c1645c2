//! Expression tree used as the source of search terms.
//!
//! Rewrites follow one discipline throughout: a rewrite borrows the node and
//! returns `Some(replacement)` when something changed, or `None` when the
//! node is unchanged. Callers install the replacement.

use crate::error::{QueryError, Result};
use crate::index::store::NodeStore;
use crate::index::types::DbNode;
use crate::query::context::QueryContext;
use crate::query::value_access::ValueAccess;
use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::fmt;

/// Variable identifier, unique within a query
pub type VarId = u32;

/// Maps old variables to their replacements when copying a tree
pub type VarMap = FxHashMap<VarId, Var>;

/// Variable reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
    pub id: VarId,
    pub name: String,
    /// Statically known to be bound to at most one item
    pub single: bool,
}

impl Var {
    pub fn new(id: VarId, name: &str, single: bool) -> Self {
        Self {
            id,
            name: name.to_string(),
            single,
        }
    }
}

/// Evaluated item
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Str(Vec<u8>),
    Int(i64),
    Dbl(f64),
    Bool(bool),
    Node(DbNode),
}

impl Item {
    pub fn str(value: &str) -> Self {
        Item::Str(value.as_bytes().to_vec())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Item::Str(_) => "xs:string",
            Item::Int(_) => "xs:integer",
            Item::Dbl(_) => "xs:double",
            Item::Bool(_) => "xs:boolean",
            Item::Node(_) => "node()",
        }
    }

    /// Atomized string value
    pub fn string<'a>(&'a self, store: &dyn NodeStore) -> Cow<'a, [u8]> {
        match self {
            Item::Str(s) => Cow::Borrowed(s),
            Item::Int(i) => Cow::Owned(i.to_string().into_bytes()),
            Item::Dbl(d) => Cow::Owned(format_double(*d).into_bytes()),
            Item::Bool(b) => Cow::Owned(b.to_string().into_bytes()),
            Item::Node(node) => Cow::Owned(store.string_value(node.pre)),
        }
    }

    /// String value of a string or node item; other types are rejected
    pub fn text<'a>(&'a self, store: &dyn NodeStore) -> Result<Cow<'a, [u8]>> {
        match self {
            Item::Str(_) | Item::Node(_) => Ok(self.string(store)),
            other => Err(QueryError::type_error("xs:string", other.type_name())),
        }
    }

    pub fn integer(&self) -> Result<i64> {
        match self {
            Item::Int(i) => Ok(*i),
            other => Err(QueryError::type_error("xs:integer", other.type_name())),
        }
    }

    pub fn double(&self) -> Result<f64> {
        match self {
            Item::Int(i) => Ok(*i as f64),
            Item::Dbl(d) => Ok(*d),
            other => Err(QueryError::type_error("xs:double", other.type_name())),
        }
    }
}

fn format_double(d: f64) -> String {
    if d.is_finite() && d.fract() == 0.0 && d.abs() < 1e15 {
        format!("{}", d as i64)
    } else {
        d.to_string()
    }
}

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(Vec<u8>),
    Int(i64),
    Dbl(f64),
    /// Sequence constructor
    Seq(Vec<Expr>),
    Var(Var),
    ValueAccess(Box<ValueAccess>),
}

impl Expr {
    pub fn str(value: &str) -> Self {
        Expr::Str(value.as_bytes().to_vec())
    }

    pub fn empty() -> Self {
        Expr::Seq(Vec::new())
    }

    /// Sequence of string literals
    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Expr::Seq(values.into_iter().map(|v| Expr::str(v.as_ref())).collect())
    }

    /// Statically known to yield at most one item
    pub fn zero_or_one(&self) -> bool {
        match self {
            Expr::Str(_) | Expr::Int(_) | Expr::Dbl(_) => true,
            Expr::Seq(exprs) => match exprs.as_slice() {
                [] => true,
                [single] => single.zero_or_one(),
                _ => false,
            },
            Expr::Var(var) => var.single,
            Expr::ValueAccess(_) => false,
        }
    }

    /// Evaluates the expression to a sequence of items
    pub fn value(&self, ctx: &QueryContext) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        self.collect(ctx, &mut items)?;
        Ok(items)
    }

    fn collect(&self, ctx: &QueryContext, items: &mut Vec<Item>) -> Result<()> {
        match self {
            Expr::Str(s) => items.push(Item::Str(s.clone())),
            Expr::Int(i) => items.push(Item::Int(*i)),
            Expr::Dbl(d) => items.push(Item::Dbl(*d)),
            Expr::Seq(exprs) => {
                for expr in exprs {
                    expr.collect(ctx, items)?;
                }
            }
            Expr::Var(var) => items.extend_from_slice(ctx.binding(var)?),
            Expr::ValueAccess(va) => items.extend(va.iter(ctx)?.map(Item::Node)),
        }
        Ok(())
    }

    /// Evaluates an expression that yields at most one item
    pub fn item(&self, ctx: &QueryContext) -> Result<Option<Item>> {
        Ok(self.value(ctx)?.into_iter().next())
    }

    /// Literal string value, if the expression is one
    pub fn as_str(&self) -> Option<&[u8]> {
        match self {
            Expr::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Flattens nested sequences and unwraps singleton sequences
    pub fn optimize(self) -> Expr {
        match self {
            Expr::Seq(exprs) => {
                let mut flat = Vec::with_capacity(exprs.len());
                for expr in exprs {
                    match expr.optimize() {
                        Expr::Seq(inner) => flat.extend(inner),
                        other => flat.push(other),
                    }
                }
                if flat.len() == 1 {
                    flat.pop().unwrap_or_else(Expr::empty)
                } else {
                    Expr::Seq(flat)
                }
            }
            Expr::ValueAccess(va) => Expr::ValueAccess(Box::new(va.optimize())),
            other => other,
        }
    }

    /// Substitutes `with` for all references to `var`
    pub fn inline(&self, var: VarId, with: &Expr) -> Option<Expr> {
        match self {
            Expr::Var(v) if v.id == var => Some(with.clone()),
            Expr::Seq(exprs) => {
                let inlined: Vec<Option<Expr>> = exprs.iter().map(|e| e.inline(var, with)).collect();
                if inlined.iter().all(Option::is_none) {
                    return None;
                }
                let exprs = exprs
                    .iter()
                    .zip(inlined)
                    .map(|(old, new)| new.unwrap_or_else(|| old.clone()))
                    .collect();
                Some(Expr::Seq(exprs).optimize())
            }
            Expr::ValueAccess(va) => va.inline(var, with).map(|va| Expr::ValueAccess(Box::new(va))),
            _ => None,
        }
    }

    /// Deep copy with variables renamed according to `vars`
    pub fn copy(&self, vars: &VarMap) -> Expr {
        match self {
            Expr::Var(v) => Expr::Var(vars.get(&v.id).cloned().unwrap_or_else(|| v.clone())),
            Expr::Seq(exprs) => Expr::Seq(exprs.iter().map(|e| e.copy(vars)).collect()),
            Expr::ValueAccess(va) => Expr::ValueAccess(Box::new(va.copy(vars))),
            other => other.clone(),
        }
    }

    /// Checks if the expression references the given variable
    pub fn uses(&self, var: VarId) -> bool {
        match self {
            Expr::Var(v) => v.id == var,
            Expr::Seq(exprs) => exprs.iter().any(|e| e.uses(var)),
            Expr::ValueAccess(va) => va.term_source().uses(var),
            _ => false,
        }
    }

    /// Number of nodes in the expression tree
    pub fn expr_size(&self) -> usize {
        match self {
            Expr::Seq(exprs) => 1 + exprs.iter().map(Expr::expr_size).sum::<usize>(),
            Expr::ValueAccess(va) => va.expr_size(),
            _ => 1,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Str(s) => write!(f, "\"{}\"", String::from_utf8_lossy(s).replace('"', "\"\"")),
            Expr::Int(i) => write!(f, "{i}"),
            Expr::Dbl(d) => write!(f, "{}", format_double(*d)),
            Expr::Seq(exprs) => {
                f.write_str("(")?;
                for (i, expr) in exprs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{expr}")?;
                }
                f.write_str(")")
            }
            Expr::Var(var) => write!(f, "${}", var.name),
            Expr::ValueAccess(va) => write!(f, "{va}"),
        }
    }
}
