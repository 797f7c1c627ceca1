use crate::params::FrozenParams;
use anyhow::{Context, Result};
use ipfreeze::{read_frozen_params, thaw_tree, DagCborValues, Tree};
use libipld::{codec::Codec, json::DagJsonCodec, Ipld};
use std::{io::Write, path::Path};

/// Thaws a frozen file written by the cli, using the config stored in its params.
pub fn thaw_file(path: impl AsRef<Path>) -> Result<Tree<Ipld>> {
    let path = path.as_ref();
    let (params, offset) = read_frozen_params(path)?;
    let config = FrozenParams::from_bytes(&params)
        .and_then(|params| params.config())
        .context("frozen params are not a tree config")?;
    thaw_tree(path, offset, config, &DagCborValues)
}

/// Writes all networks of a tree with their values as dag-json, one per line.
pub fn dump_tree(tree: &Tree<Ipld>, mut out: impl Write) -> Result<usize> {
    let entries = tree.entries();
    for (network, value) in &entries {
        let json = DagJsonCodec.encode(*value)?;
        writeln!(out, "{}\t{}", network, String::from_utf8_lossy(&json))?;
    }
    Ok(entries.len())
}
