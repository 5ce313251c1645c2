use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use nodex::fulltext::{FtMode, FtOptions};
use nodex::index::stats::show_stats;
use nodex::index::{IndexType, MemStore, StoreMeta, StoreRef};
use nodex::output;
use nodex::query::{Expr, FtContains, FtWords, NameTest, QueryContext, ValueAccess};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "nodex")]
#[command(about = "Index-backed value and full-text lookups over JSON-encoded documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Store configuration (JSON): max_len, built indexes, full-text flags
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Find text nodes or attributes by value
    Value {
        /// Document to search
        doc: PathBuf,

        /// Search terms (several terms are combined)
        #[arg(required = true)]
        terms: Vec<String>,

        /// Index to use
        #[arg(short = 't', long = "type", value_enum, default_value = "text")]
        index: ValueIndex,

        /// Return parent elements with this name (`*` for any)
        #[arg(short, long)]
        parent: Option<String>,

        /// Trim whitespace from search terms
        #[arg(long)]
        trim: bool,

        /// Ignore indexes and scan the document
        #[arg(long)]
        scan: bool,

        /// Only print the number of results
        #[arg(long)]
        count: bool,
    },
    /// Full-text search over text nodes
    Ft {
        /// Document to search
        doc: PathBuf,

        /// Search terms
        #[arg(required = true)]
        terms: Vec<String>,

        /// How multiple terms combine
        #[arg(short, long, value_enum, default_value = "any")]
        mode: FtMode,

        /// Minimum number of occurrences
        #[arg(long, requires = "max")]
        min: Option<i64>,

        /// Maximum number of occurrences
        #[arg(long, requires = "min")]
        max: Option<i64>,

        /// Score weight (|w| <= 1000)
        #[arg(short, long)]
        weight: Option<f64>,

        #[arg(long)]
        case_sensitive: bool,

        #[arg(long)]
        diacritics_sensitive: bool,

        #[arg(long)]
        stemming: bool,

        /// Enable wildcard patterns (`.`, `.*`, `.+`, `.?`, `.{n,m}`)
        #[arg(long)]
        wildcards: bool,

        /// Stop word (repeatable)
        #[arg(long = "stop-word")]
        stop_words: Vec<String>,

        /// Count matches without recording spans
        #[arg(long)]
        fast: bool,

        /// Ignore the full-text index and scan the document
        #[arg(long)]
        scan: bool,

        /// Only print the number of results
        #[arg(long)]
        count: bool,
    },
    /// Show store statistics
    Stats {
        /// Document to load
        doc: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ValueIndex {
    Text,
    Attribute,
    Token,
}

impl From<ValueIndex> for IndexType {
    fn from(index: ValueIndex) -> Self {
        match index {
            ValueIndex::Text => IndexType::Text,
            ValueIndex::Attribute => IndexType::Attribute,
            ValueIndex::Token => IndexType::Token,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("nodex=warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let meta = load_meta(cli.config.as_deref())?;
    let color = !cli.no_color;

    match cli.command {
        Commands::Value {
            doc,
            terms,
            index,
            parent,
            trim,
            scan,
            count,
        } => {
            let meta = if scan { without_value_indexes(meta) } else { meta };
            let store = open_store(&doc, meta)?;
            let ctx = QueryContext::new(store.clone());

            let access = ValueAccess::new(terms_expr(terms), index.into(), parent.as_deref().map(NameTest::new))
                .trim(trim)
                .optimize();
            tracing::info!(expr = %access, "value access");
            let nodes: Vec<_> = access.iter(&ctx)?.collect();

            if count {
                output::print_count(nodes.len())?;
            } else {
                output::print_nodes(store.as_ref(), &nodes, color)?;
            }
        }
        Commands::Ft {
            doc,
            terms,
            mode,
            min,
            max,
            weight,
            case_sensitive,
            diacritics_sensitive,
            stemming,
            wildcards,
            stop_words,
            fast,
            scan,
            count,
        } => {
            let store = open_store(&doc, meta)?;
            let opts = FtOptions {
                case_sensitive,
                diacritics_sensitive,
                stemming,
                wildcards,
                stop_words: (!stop_words.is_empty())
                    .then(|| stop_words.iter().map(|w| w.to_lowercase()).collect::<BTreeSet<_>>()),
                weight: weight.map(Expr::Dbl),
            };
            let mut ctx = QueryContext::new(store.clone()).with_options(opts.clone());
            ctx.ft_fast = fast;

            let occ = min.zip(max).map(|(min, max)| [Expr::Int(min), Expr::Int(max)]);
            let words = FtWords::new(terms_expr(terms), mode, occ);
            let mut contains = FtContains::new(words).compile(&ctx)?;
            if scan {
                contains = contains.force_scan();
            }
            tracing::info!(expr = %contains.words(), path = %contains.path(), "full-text search");
            let results = contains.eval(&mut ctx)?;

            if count {
                output::print_count(results.len())?;
            } else {
                output::print_ft_results(store.as_ref(), &results, &opts, color)?;
            }
        }
        Commands::Stats { doc } => {
            let store = MemStore::open(&doc, meta).with_context(|| format!("Failed to load {}", doc.display()))?;
            show_stats(&store, &doc);
        }
    }

    Ok(())
}

fn load_meta(config: Option<&Path>) -> Result<StoreMeta> {
    let Some(path) = config else {
        return Ok(StoreMeta::default());
    };
    let data = std::fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Invalid config {}", path.display()))
}

fn without_value_indexes(meta: StoreMeta) -> StoreMeta {
    StoreMeta {
        text_index: false,
        attr_index: false,
        token_index: false,
        ..meta
    }
}

fn open_store(doc: &Path, meta: StoreMeta) -> Result<StoreRef> {
    let store: StoreRef =
        Arc::new(MemStore::open(doc, meta).with_context(|| format!("Failed to load {}", doc.display()))?);
    Ok(store)
}

fn terms_expr(terms: Vec<String>) -> Expr {
    Expr::strings(terms).optimize()
}
