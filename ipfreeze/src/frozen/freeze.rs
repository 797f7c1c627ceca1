use super::{frozen_buffer_size, FrozenBuffer, RecordDictionary, ValueCodec, FREEZE_SEPARATOR};
use crate::{
    error::Error,
    key::DataKey,
    network::{flip_network_bit, Network, NETWORK_WIRE_SIZE},
    tree::{Node, Record, Tree, TreeValue},
};
use anyhow::{Context, Result};
use memmap2::MmapMut;
use std::{
    convert::TryFrom,
    fs::OpenOptions,
    io::Write,
    path::Path,
    time::Instant,
};
use tracing::*;

/// What a freeze wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezeStats {
    /// number of network records
    pub records: usize,
    /// number of distinct values in the dictionary
    pub values: usize,
    /// size the mapped part of the file was allocated with
    pub capacity: usize,
    /// bytes actually used of the mapped part: header, records and terminator
    pub used: usize,
    /// final size of the file, including the dictionary
    pub file_size: u64,
}

struct RecordWriter<'a, V> {
    tree: &'a Tree<V>,
    buffer: FrozenBuffer,
    dictionary: RecordDictionary<V>,
    records: usize,
}

impl<'a, V: TreeValue> RecordWriter<'a, V> {
    fn freeze_node(&mut self, node: &Node, network: u128, depth: u8) -> Result<(), Error> {
        let max_depth0 = self.tree.ip_version().max_depth0();
        if let Record::Data(key) = &node.left {
            self.freeze_data_record(network, depth + 1, key)?;
        }
        if let Record::Data(key) = &node.right {
            let right_network = flip_network_bit(network, max_depth0, depth);
            self.freeze_data_record(right_network, depth + 1, key)?;
        }
        Ok(())
    }

    fn freeze_data_record(
        &mut self,
        address: u128,
        prefix_length: u8,
        key: &DataKey,
    ) -> Result<(), Error> {
        let network = Network::new(address, prefix_length, self.tree.ip_version())?;
        trace!("freeze {} -> {}", network, key);
        self.buffer.write("network", &network.encode())?;
        self.buffer.write("key", key.as_bytes())?;
        if !self.dictionary.contains_key(key) {
            let value = self
                .tree
                .data_for_key(key)
                .ok_or(Error::MissingData(*key))?;
            self.dictionary.insert(*key, value.clone());
        }
        self.records += 1;
        Ok(())
    }
}

/// Freezes `tree` into the file at `path`, replacing it.
///
/// The tree is finalized first. `frozen_params` is stored at the start of the file as is; it is
/// meant for whatever the caller needs to recreate the tree's surroundings, and can be read back
/// with [super::read_frozen_params].
///
/// A failed freeze can leave a partial file behind, which must not be thawed.
pub fn freeze_tree<V: TreeValue, C: ValueCodec<V>>(
    tree: &mut Tree<V>,
    path: impl AsRef<Path>,
    frozen_params: &[u8],
    codec: &C,
) -> Result<FreezeStats> {
    let t0 = Instant::now();
    let path = path.as_ref();
    tree.finalize()?;
    let tree = &*tree;
    let params_len =
        u32::try_from(frozen_params.len()).map_err(|_| Error::ParamsTooLarge(frozen_params.len()))?;
    let capacity = frozen_buffer_size(tree.node_count(), frozen_params.len());
    debug!(
        "freezing {} nodes to {} capacity={}",
        tree.node_count(),
        path.display(),
        capacity
    );

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("Could not open file {}", path.display()))?;
    file.set_len(capacity as u64)
        .with_context(|| format!("Could not resize file {}", path.display()))?;
    let mmap = unsafe { MmapMut::map_mut(&file)? };

    let mut writer = RecordWriter {
        tree,
        buffer: FrozenBuffer::new(mmap),
        dictionary: RecordDictionary::new(),
        records: 0,
    };
    writer
        .buffer
        .write("frozen_params_size", &params_len.to_le_bytes())?;
    writer.buffer.write("frozen_params", frozen_params)?;
    // the default route has no parent node
    if let Record::Data(key) = tree.root() {
        writer.freeze_data_record(0, 0, key)?;
    }
    tree.iterate(|node, network, depth| writer.freeze_node(node, network, depth))?;
    writer
        .buffer
        .write("terminator", &[0u8; NETWORK_WIRE_SIZE])?;
    writer.buffer.write("separator", FREEZE_SEPARATOR)?;

    let RecordWriter {
        buffer,
        dictionary,
        records,
        ..
    } = writer;
    // flush and unmap before truncating to the used size
    let used = buffer.finish()?;
    file.set_len(used as u64)
        .with_context(|| format!("Could not truncate file {}", path.display()))?;
    drop(file);

    let encoded = codec
        .encode(&dictionary)
        .context("Could not encode frozen data")?;
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .with_context(|| format!("Could not append to file {}", path.display()))?;
    file.write_all(&(encoded.len() as u64).to_le_bytes())?;
    file.write_all(&encoded)?;
    let file_size = file.metadata()?.len();

    let stats = FreezeStats {
        records,
        values: dictionary.len(),
        capacity,
        used,
        file_size,
    };
    #[cfg(feature = "metrics")]
    {
        crate::prom::FROZEN_RECORDS.inc_by(records as u64);
        crate::prom::FREEZE_HIST.observe(t0.elapsed().as_secs_f64());
    }
    info!(
        "froze tree to {} records={} values={} bytes={} elapsed={}",
        path.display(),
        stats.records,
        stats.values,
        stats.file_size,
        t0.elapsed().as_secs_f64()
    );
    Ok(stats)
}
