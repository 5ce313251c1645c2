//! Integration tests for index-backed retrieval over a sample document.
//!
//! Every lookup is run twice, once against a store with all indexes built
//! and once against the same document without indexes, and both runs must
//! agree.

use nodex::fulltext::{FtMode, FtOptions};
use nodex::index::{DbNode, IndexType, MemStore, MemStoreBuilder, NodeKind, StoreMeta, StoreRef};
use nodex::query::{AccessPath, Expr, FtContains, FtItem, FtWords, IndexContext, NameTest, QueryContext, ValueAccess};
use nodex::QueryError;
use std::path::PathBuf;
use std::sync::Arc;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("library.json")
}

fn library(meta: StoreMeta) -> StoreRef {
    Arc::new(MemStore::open(&fixture_path(), meta).expect("Failed to load fixture"))
}

fn values(ctx: &QueryContext, access: &ValueAccess) -> Vec<DbNode> {
    access.iter(ctx).expect("value access failed").collect()
}

fn pres(nodes: &[DbNode]) -> Vec<u32> {
    nodes.iter().map(|n| n.pre).collect()
}

// ============================================================================
// Value Access
// ============================================================================

#[test]
fn test_value_index_scan_equivalence() {
    let indexed = QueryContext::new(library(StoreMeta::default()));
    let scanned = QueryContext::new(library(StoreMeta::without_indexes()));

    let cases = [
        ("Hello", IndexType::Text, None),
        ("World", IndexType::Text, Some("title")),
        ("A cat sat on the mat. The cat slept.", IndexType::Text, None),
        ("b2", IndexType::Attribute, None),
        ("b3", IndexType::Attribute, Some("book")),
        ("fiction animals", IndexType::Attribute, None),
        ("animals", IndexType::Token, None),
        ("animals", IndexType::Token, Some("*")),
        ("nothing", IndexType::Attribute, None),
    ];
    for (term, index, test) in cases {
        let access = ValueAccess::new(Expr::str(term), index, test.map(NameTest::new));
        let a = values(&indexed, &access);
        let b = values(&scanned, &access);
        assert_eq!(a, b, "index and scan disagree on {}", access);
    }
}

#[test]
fn test_scan_returns_exact_text_matches_in_order() {
    let ctx = QueryContext::new(library(StoreMeta::without_indexes()));
    let access = ValueAccess::new(Expr::str("Hello"), IndexType::Text, None);
    let nodes = values(&ctx, &access);
    assert_eq!(pres(&nodes), vec![6, 22]);
    assert!(nodes.iter().all(|n| n.kind == NodeKind::Text));

    // byte-exact comparison
    let access = ValueAccess::new(Expr::str("hello"), IndexType::Text, None);
    assert!(values(&ctx, &access).is_empty());
}

#[test]
fn test_parent_name_test() {
    let ctx = QueryContext::new(library(StoreMeta::default()));
    let access = ValueAccess::new(Expr::str("Hello"), IndexType::Text, Some(NameTest::new("title")));
    let nodes = values(&ctx, &access);
    assert_eq!(pres(&nodes), vec![5, 21]);
    assert!(nodes.iter().all(|n| n.kind == NodeKind::Element));

    let access = ValueAccess::new(Expr::str("Hello"), IndexType::Text, Some(NameTest::new("summary")));
    assert!(values(&ctx, &access).is_empty());
}

#[test]
fn test_empty_text_lookup() {
    for meta in [StoreMeta::default(), StoreMeta::without_indexes()] {
        let ctx = QueryContext::new(library(meta));
        let access = ValueAccess::new(Expr::str(""), IndexType::Text, None);
        assert!(values(&ctx, &access).is_empty());

        let access = ValueAccess::new(Expr::str(""), IndexType::Text, Some(NameTest::new("note")));
        assert_eq!(pres(&values(&ctx, &access)), vec![16, 25]);
    }
}

#[test]
fn test_multiple_terms_are_ordered_and_distinct() {
    let ctx = QueryContext::new(library(StoreMeta::default()));
    let access = ValueAccess::new(Expr::strings(["World", "Hello", "Hello"]), IndexType::Text, None);
    assert_eq!(pres(&values(&ctx, &access)), vec![6, 13, 22]);

    let access = ValueAccess::new(Expr::strings(["poetry", "fiction"]), IndexType::Token, Some(NameTest::new("book")));
    assert_eq!(pres(&values(&ctx, &access)), vec![2, 9]);
}

// ============================================================================
// Full-Text Evaluation
// ============================================================================

fn atomic(words: FtWords, text: &str) -> Result<FtItem, QueryError> {
    let store: StoreRef = Arc::new(MemStoreBuilder::new().leaf("p", text).finish(StoreMeta::default()));
    let mut ctx = QueryContext::new(store);
    let mut words = words.compile(&ctx)?;
    ctx.focus(text.as_bytes());
    words.atomic(&mut ctx)
}

#[test]
fn test_single_term_scenario() {
    let item = atomic(FtWords::new(Expr::str("cat"), FtMode::Any, None), "cat").unwrap();
    assert_eq!(item.matches.len(), 1);
    assert!(item.score > 0.0);
}

#[test]
fn test_all_mode_requires_every_term() {
    let text = "A cat sat on the mat";
    let item = atomic(FtWords::new(Expr::strings(["cat", "dog"]), FtMode::All, None), text).unwrap();
    assert!(!item.is_match());
    let item = atomic(FtWords::new(Expr::strings(["cat", "mat"]), FtMode::All, None), text).unwrap();
    assert!(item.is_match());
}

#[test]
fn test_any_mode_sums_occurrences() {
    let text = "A cat sat on the mat. The cat slept.";
    let range = |n: i64| Some([Expr::Int(n), Expr::Int(n)]);
    // cat twice, mat once, dog never
    let terms = || Expr::strings(["cat", "mat", "dog"]);
    assert!(atomic(FtWords::new(terms(), FtMode::Any, range(3)), text).unwrap().is_match());
    assert!(!atomic(FtWords::new(terms(), FtMode::Any, range(2)), text).unwrap().is_match());
    assert!(!atomic(FtWords::new(terms(), FtMode::Any, range(4)), text).unwrap().is_match());
}

#[test]
fn test_phrase_requires_adjacency() {
    let text = "the quick fox jumps";
    let item = atomic(FtWords::new(Expr::strings(["quick", "fox"]), FtMode::Phrase, None), text).unwrap();
    assert!(item.is_match());
    let item = atomic(FtWords::new(Expr::strings(["quick", "jumps"]), FtMode::Phrase, None), text).unwrap();
    assert!(!item.is_match());
}

#[test]
fn test_occurrence_bounds() {
    let cases = [("fox", false), ("fox fox", true), ("fox fox fox", true), ("fox fox fox fox", false)];
    for (text, expected) in cases {
        let words = FtWords::new(Expr::str("fox"), FtMode::Any, Some([Expr::Int(2), Expr::Int(3)]));
        assert_eq!(atomic(words, text).unwrap().is_match(), expected, "{text}");
    }
}

#[test]
fn test_weight_bound() {
    let weighted = |w: f64| -> Result<FtItem, QueryError> {
        let store: StoreRef = Arc::new(MemStoreBuilder::new().leaf("p", "cat").finish(StoreMeta::default()));
        let mut ctx = QueryContext::new(store).with_options(FtOptions {
            weight: Some(Expr::Dbl(w)),
            ..FtOptions::default()
        });
        let mut words = FtWords::new(Expr::str("cat"), FtMode::Any, None).compile(&ctx)?;
        ctx.focus(b"cat");
        words.atomic(&mut ctx)
    };
    assert!(weighted(1000.0).is_ok());
    assert!(matches!(weighted(1000.0001), Err(QueryError::FtWeight(_))));
    assert!(matches!(weighted(f64::NAN), Err(QueryError::FtWeight(_))));
}

#[test]
fn test_analyzer_rejects_occurrence_ranges() {
    let ctx = QueryContext::new(library(StoreMeta::default()));
    for mode in [FtMode::Any, FtMode::All, FtMode::Phrase, FtMode::AnyWord] {
        let occ = Some([Expr::Int(1), Expr::Int(10)]);
        let mut words = FtWords::new(Expr::str("cat"), mode, occ).compile(&ctx).unwrap();
        assert!(!words.index_accessible(&mut IndexContext::new(&ctx)), "{mode}");
    }
}

// ============================================================================
// Full-Text Access Paths
// ============================================================================

fn search(ctx: &mut QueryContext, term: &str, mode: FtMode, scan: bool) -> Vec<u32> {
    let words = FtWords::new(Expr::str(term), mode, None);
    let mut contains = FtContains::new(words).compile(ctx).unwrap();
    if scan {
        contains = contains.force_scan();
    } else {
        assert!(matches!(contains.path(), AccessPath::Index { .. }), "{term}");
    }
    contains.eval(ctx).unwrap().iter().map(|(node, _)| node.pre).collect()
}

#[test]
fn test_fulltext_index_scan_equivalence() {
    let mut ctx = QueryContext::new(library(StoreMeta::default()));
    let cases = [
        ("cat", FtMode::Any, vec![8, 15]),
        ("quick fox", FtMode::Phrase, vec![24]),
        ("quick fox", FtMode::All, vec![24]),
        ("hello", FtMode::Any, vec![6, 22]),
        ("unicorn", FtMode::Any, vec![]),
    ];
    for (term, mode, expected) in cases {
        assert_eq!(search(&mut ctx, term, mode, false), expected, "{term} via index");
        assert_eq!(search(&mut ctx, term, mode, true), expected, "{term} via scan");
    }
}

#[test]
fn test_fulltext_wildcards() {
    let mut ctx = QueryContext::new(library(StoreMeta::default())).with_options(FtOptions {
        wildcards: true,
        ..FtOptions::default()
    });
    assert_eq!(search(&mut ctx, "fox.*", FtMode::Any, false), vec![8, 24]);
    assert_eq!(search(&mut ctx, "fox.*", FtMode::Any, true), vec![8, 24]);
}
