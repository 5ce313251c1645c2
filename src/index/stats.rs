use crate::index::memory::MemStore;
use crate::index::store::NodeStore;
use crate::index::types::NodeKind;
use std::collections::HashMap;
use std::path::Path;

/// Summary of a store's contents and indexes
#[derive(Debug, Default)]
pub struct StoreStats {
    pub nodes: usize,
    pub elements: usize,
    pub texts: usize,
    pub attributes: usize,
    pub comments: usize,
    pub empty_texts: usize,
    /// Element names by frequency, most frequent first
    pub names: Vec<(String, usize)>,
    pub text_keys: usize,
    pub attr_keys: usize,
    pub token_keys: usize,
    pub ft_keys: usize,
    /// Approximate size of node values in bytes
    pub value_bytes: u64,
}

impl StoreStats {
    pub fn collect(store: &MemStore) -> Self {
        let mut stats = StoreStats {
            nodes: store.nodes().len(),
            ..Default::default()
        };
        let mut names: HashMap<String, usize> = HashMap::new();

        for node in store.nodes() {
            stats.value_bytes += (node.value.len() + node.name.len()) as u64;
            match node.kind {
                NodeKind::Element => {
                    stats.elements += 1;
                    *names
                        .entry(String::from_utf8_lossy(&node.name).into_owned())
                        .or_insert(0) += 1;
                }
                NodeKind::Text => {
                    stats.texts += 1;
                    if node.value.is_empty() {
                        stats.empty_texts += 1;
                    }
                }
                NodeKind::Attribute => stats.attributes += 1,
                NodeKind::Comment => stats.comments += 1,
            }
        }

        let mut names: Vec<_> = names.into_iter().collect();
        names.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        stats.names = names;

        let indexes = store.indexes();
        stats.text_keys = indexes.text.len();
        stats.attr_keys = indexes.attr.len();
        stats.token_keys = indexes.token.len();
        stats.ft_keys = indexes.fulltext.len();
        stats
    }
}

/// Display store statistics
pub fn show_stats(store: &MemStore, path: &Path) {
    let stats = StoreStats::collect(store);
    let meta = store.meta();

    println!("Store Statistics");
    println!("================");
    println!();
    println!("Document:         {}", path.display());
    println!("Nodes:            {}", stats.nodes);
    println!("  elements        {}", stats.elements);
    println!("  texts           {} ({} empty)", stats.texts, stats.empty_texts);
    println!("  attributes      {}", stats.attributes);
    println!("  comments        {}", stats.comments);
    println!("Value size:       {}", format_size(stats.value_bytes));

    println!();
    println!("Elements by name:");
    for (name, count) in stats.names.iter().take(15) {
        println!("  {:15} {}", name, count);
    }
    if stats.names.len() > 15 {
        println!("  ... and {} more", stats.names.len() - 15);
    }

    println!();
    println!("Indexes (max value length {}):", meta.max_len);
    println!("  text            {}", index_status(meta.text_index, stats.text_keys));
    println!("  attribute       {}", index_status(meta.attr_index, stats.attr_keys));
    println!("  token           {}", index_status(meta.token_index, stats.token_keys));
    println!("  fulltext        {}", index_status(meta.ft_index, stats.ft_keys));
    if meta.ft_index {
        println!(
            "  fulltext flags  case-sensitive={} diacritics={} stemming={} wildcards={}",
            meta.case_sensitive, meta.diacritics_sensitive, meta.stemming, meta.fuzzy_support
        );
    }
}

fn index_status(built: bool, keys: usize) -> String {
    if built {
        format!("{} keys", keys)
    } else {
        "not built".to_string()
    }
}

/// Format byte size to human readable
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
