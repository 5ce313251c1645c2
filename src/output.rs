//! Output formatting for node and full-text results

use crate::fulltext::{FtMatches, FtOptions, TokenList};
use crate::index::store::NodeStore;
use crate::index::types::{DbNode, NodeKind};
use crate::query::FtItem;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn stdout(color: bool) -> StandardStream {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

/// Print nodes, one per line: position, label and string value
pub fn print_nodes(store: &dyn NodeStore, nodes: &[DbNode], color: bool) -> io::Result<()> {
    write_nodes(&mut stdout(color), store, nodes)
}

/// Print full-text hits with score and highlighted matches
pub fn print_ft_results(
    store: &dyn NodeStore,
    results: &[(DbNode, FtItem)],
    opts: &FtOptions,
    color: bool,
) -> io::Result<()> {
    write_ft_results(&mut stdout(color), store, results, opts)
}

/// Print only the number of results (for --count)
pub fn print_count(count: usize) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", count)
}

pub fn write_nodes<W: WriteColor>(out: &mut W, store: &dyn NodeStore, nodes: &[DbNode]) -> io::Result<()> {
    for node in nodes {
        write_prefix(out, store, *node)?;
        writeln!(out, "{}", String::from_utf8_lossy(&store.string_value(node.pre)))?;
    }
    Ok(())
}

pub fn write_ft_results<W: WriteColor>(
    out: &mut W,
    store: &dyn NodeStore,
    results: &[(DbNode, FtItem)],
    opts: &FtOptions,
) -> io::Result<()> {
    for (node, item) in results {
        write_prefix(out, store, *node)?;

        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        write!(out, "{:.4}", item.score)?;
        out.reset()?;
        write!(out, ":")?;

        let text = store.string_value(node.pre);
        let mut last = 0;
        for (start, end) in highlight_ranges(&text, &item.matches, opts) {
            // Text before match
            out.write_all(&text[last..start])?;
            out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
            out.write_all(&text[start..end])?;
            out.reset()?;
            last = end;
        }
        out.write_all(&text[last..])?;
        writeln!(out)?;
    }
    Ok(())
}

fn write_prefix<W: WriteColor>(out: &mut W, store: &dyn NodeStore, node: DbNode) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(out, "{}", node.pre)?;
    out.reset()?;
    write!(out, ":")?;

    out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
    let name = String::from_utf8_lossy(store.name(node.pre));
    match node.kind {
        NodeKind::Element => write!(out, "<{}>", name)?,
        NodeKind::Attribute => write!(out, "@{}", name)?,
        kind => write!(out, "{}()", kind.name())?,
    }
    out.reset()?;
    write!(out, ":")
}

/// Byte ranges of the tokens covered by match spans, ascending and merged
pub fn highlight_ranges(text: &[u8], matches: &FtMatches, opts: &FtOptions) -> Vec<(usize, usize)> {
    if matches.is_empty() {
        return Vec::new();
    }
    // Token byte offsets refer to the lossily decoded text
    if std::str::from_utf8(text).is_err() {
        return Vec::new();
    }

    let tokens = TokenList::new(text, opts);
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for token in tokens.tokens().iter().filter(|t| matches.covers(t.pos)) {
        match ranges.last_mut() {
            // Join adjacent tokens of one span, including the gap between them
            Some(last) if matches.iter().any(|m| m.contains(token.pos) && token.pos > m.start) => {
                last.1 = token.end;
            }
            _ => ranges.push((token.start, token.end)),
        }
    }
    ranges
}
