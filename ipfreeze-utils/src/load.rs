//! Building trees from a text listing.
//!
//! Each line is a network followed by whitespace and a json value:
//!
//! ```text
//! # comment
//! 10.0.0.0/8 {"country":"XX"}
//! 2001:db8::/32 "documentation"
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.
use anyhow::{anyhow, Context, Result};
use ipfreeze::{Network, Tree, TreeConfig};
use libipld::{codec::Codec, json::DagJsonCodec, Ipld};
use tracing::*;

/// parses one line of a listing, `None` for blank and comment lines
pub fn parse_line(line: &str) -> Result<Option<(Network, Ipld)>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (network, json) = line
        .split_once(char::is_whitespace)
        .ok_or_else(|| anyhow!("expected a network and a value"))?;
    let network: Network = network.parse()?;
    let value: Ipld = DagJsonCodec
        .decode(json.trim().as_bytes())
        .context("invalid json value")?;
    Ok(Some((network, value)))
}

/// Parses a whole listing. Errors name the line they occurred on.
pub fn parse_listing(text: &str) -> Result<Vec<(Network, Ipld)>> {
    let mut res = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if let Some(entry) = parse_line(line).with_context(|| format!("line {}", i + 1))? {
            res.push(entry);
        }
    }
    Ok(res)
}

/// inserts all entries of a listing into a new tree, in listing order
pub fn load_tree(text: &str, config: TreeConfig) -> Result<Tree<Ipld>> {
    let mut tree = Tree::new(config);
    let entries = parse_listing(text)?;
    let count = entries.len();
    for (network, value) in entries {
        tree.insert(network, value)?;
    }
    debug!("loaded {} networks", count);
    Ok(tree)
}
