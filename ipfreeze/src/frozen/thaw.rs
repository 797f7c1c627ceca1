use super::{RecordDictionary, ValueCodec, FREEZE_SEPARATOR};
use crate::{
    error::Error,
    key::{DataKey, KEY_LENGTH},
    network::{IpVersion, Network, NETWORK_WIRE_SIZE},
    tree::{Tree, TreeConfig, TreeValue},
};
use anyhow::{Context, Result};
use memmap2::Mmap;
use std::{
    convert::TryFrom,
    fs::File,
    path::Path,
    time::Instant,
};
use tracing::*;

/// Cursor over the bytes of a frozen file.
///
/// Every read is checked against the end of the data, so a truncated or corrupt file results in
/// [Error::UnexpectedEof] instead of reading garbage.
#[derive(Debug, Clone)]
pub struct FrozenReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> FrozenReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    pub fn read_bytes(&mut self, what: &'static str, size: usize) -> Result<&'a [u8], Error> {
        let data = self.peek(size).ok_or(Error::UnexpectedEof {
            what,
            offset: self.offset,
            size,
            len: self.bytes.len(),
        })?;
        self.offset += size;
        Ok(data)
    }

    pub fn skip(&mut self, what: &'static str, size: usize) -> Result<(), Error> {
        self.read_bytes(what, size).map(|_| ())
    }

    fn peek(&self, size: usize) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(size)?;
        self.bytes.get(self.offset..end)
    }

    fn read_array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N], Error> {
        let bytes = self.read_bytes(what, N)?;
        let mut res = [0u8; N];
        res.copy_from_slice(bytes);
        Ok(res)
    }

    pub fn read_u32(&mut self, what: &'static str) -> Result<u32, Error> {
        Ok(u32::from_le_bytes(self.read_array(what)?))
    }

    pub fn read_u64(&mut self, what: &'static str) -> Result<u64, Error> {
        Ok(u64::from_le_bytes(self.read_array(what)?))
    }

    /// reads the length prefixed params at the start of a frozen file
    pub fn read_params(&mut self) -> Result<&'a [u8], Error> {
        let len = self.read_u32("frozen_params_size")?;
        self.read_bytes("frozen_params", usize::try_from(len)?)
    }

    /// Reads the next record, or `None` once the terminator has been consumed.
    ///
    /// 17 zero bytes are the terminator only if they are followed by the separator. Otherwise they
    /// are the default route, and its key follows right after them.
    pub fn next_record(
        &mut self,
        ip_version: IpVersion,
    ) -> Result<Option<(Network, DataKey)>, Error> {
        let wire: [u8; NETWORK_WIRE_SIZE] = self.read_array("network")?;
        if wire == [0u8; NETWORK_WIRE_SIZE]
            && self.peek(FREEZE_SEPARATOR.len()) == Some(FREEZE_SEPARATOR)
        {
            self.offset += FREEZE_SEPARATOR.len();
            return Ok(None);
        }
        let network = Network::decode(&wire, ip_version)?;
        let key = DataKey::try_from(self.read_bytes("key", KEY_LENGTH)?)?;
        Ok(Some((network, key)))
    }

    /// reads the length prefixed dictionary that follows the terminator
    pub fn read_dictionary(&mut self) -> Result<&'a [u8], Error> {
        let len = self.read_u64("frozen_data_size")?;
        self.read_bytes("frozen_data", usize::try_from(len)?)
    }
}

fn map_file(path: &Path) -> Result<Mmap> {
    let file =
        File::open(path).with_context(|| format!("Could not open file {}", path.display()))?;
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Could not map file {}", path.display()))?;
    Ok(mmap)
}

/// Reads the params stored at the start of a frozen file.
///
/// Returns the params and the offset at which the records start, to be passed to [thaw_tree].
pub fn read_frozen_params(path: impl AsRef<Path>) -> Result<(Vec<u8>, usize)> {
    let mmap = map_file(path.as_ref())?;
    let mut reader = FrozenReader::new(&mmap);
    let params = reader.read_params()?.to_vec();
    Ok((params, reader.offset()))
}

/// Rebuilds a tree from the frozen file at `path`, starting to read records at `initial_offset`.
///
/// The address family of the tree must match the one it was frozen with. Colliding records are
/// merged according to `config`. The returned tree is finalized.
pub fn thaw_tree<V: TreeValue, C: ValueCodec<V>>(
    path: impl AsRef<Path>,
    initial_offset: usize,
    config: TreeConfig,
    codec: &C,
) -> Result<Tree<V>> {
    let path = path.as_ref();
    let mmap = map_file(path)?;
    let mut reader = FrozenReader::new(&mmap);
    reader.skip("initial offset", initial_offset)?;
    let tree = thaw_records(reader, config, codec)
        .with_context(|| format!("Could not thaw tree from {}", path.display()))?;
    Ok(tree)
}

/// Reads the params and rebuilds the tree from the frozen file at `path`.
pub fn thaw_with_params<V: TreeValue, C: ValueCodec<V>>(
    path: impl AsRef<Path>,
    config: TreeConfig,
    codec: &C,
) -> Result<(Vec<u8>, Tree<V>)> {
    let path = path.as_ref();
    let mmap = map_file(path)?;
    let mut reader = FrozenReader::new(&mmap);
    let params = reader.read_params()?.to_vec();
    let tree = thaw_records(reader, config, codec)
        .with_context(|| format!("Could not thaw tree from {}", path.display()))?;
    Ok((params, tree))
}

fn thaw_records<V: TreeValue, C: ValueCodec<V>>(
    mut reader: FrozenReader,
    config: TreeConfig,
    codec: &C,
) -> Result<Tree<V>> {
    let t0 = Instant::now();
    let mut tree = Tree::new(config);
    let mut records = 0usize;
    while let Some((network, key)) = reader.next_record(config.ip_version)? {
        trace!("thaw {} -> {}", network, key);
        tree.insert_record(network, key, config.merge_record_collisions)?;
        records += 1;
    }
    let frozen_data = reader.read_dictionary()?;
    let values: RecordDictionary<V> = codec
        .decode(frozen_data)
        .context("Could not decode frozen data")?;
    let value_count = values.len();
    for (key, value) in values {
        tree.store_data(key, value);
    }
    tree.finalize()?;
    if reader.remaining() > 0 {
        warn!("{} trailing bytes after frozen data", reader.remaining());
    }
    #[cfg(feature = "metrics")]
    {
        crate::prom::THAWED_RECORDS.inc_by(records as u64);
        crate::prom::THAW_HIST.observe(t0.elapsed().as_secs_f64());
    }
    info!(
        "thawed tree records={} values={} nodes={} elapsed={}",
        records,
        value_count,
        tree.node_count(),
        t0.elapsed().as_secs_f64()
    );
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(content: &[u8]) -> DataKey {
        DataKey::from_content(content)
    }

    fn record(network: &str, key: &DataKey) -> Vec<u8> {
        let network: Network = network.parse().unwrap();
        let mut res = network.encode().to_vec();
        res.extend_from_slice(key.as_bytes());
        res
    }

    fn terminator() -> Vec<u8> {
        let mut res = vec![0u8; NETWORK_WIRE_SIZE];
        res.extend_from_slice(FREEZE_SEPARATOR);
        res
    }

    #[test]
    fn records_until_terminator() -> anyhow::Result<()> {
        let (a, b) = (key(b"a"), key(b"b"));
        let mut bytes = record("10.0.0.0/8", &a);
        bytes.extend(record("192.168.0.0/16", &b));
        bytes.extend(terminator());
        bytes.extend(&3u64.to_le_bytes());
        bytes.extend(b"abc");

        let mut reader = FrozenReader::new(&bytes);
        let (network, k) = reader.next_record(IpVersion::V4)?.unwrap();
        assert_eq!(network.to_string(), "10.0.0.0/8");
        assert_eq!(k, a);
        let (network, k) = reader.next_record(IpVersion::V4)?.unwrap();
        assert_eq!(network.to_string(), "192.168.0.0/16");
        assert_eq!(k, b);
        assert_eq!(reader.next_record(IpVersion::V4)?, None);
        assert_eq!(reader.read_dictionary()?, b"abc");
        assert_eq!(reader.remaining(), 0);
        Ok(())
    }

    #[test]
    fn zero_network_followed_by_key_is_a_record() -> anyhow::Result<()> {
        let a = key(b"default");
        let mut bytes = vec![0u8; NETWORK_WIRE_SIZE];
        bytes.extend_from_slice(a.as_bytes());
        bytes.extend(terminator());

        let mut reader = FrozenReader::new(&bytes);
        let (network, k) = reader.next_record(IpVersion::V6)?.unwrap();
        assert_eq!(network, Network::default_route(IpVersion::V6));
        assert_eq!(k, a);
        assert_eq!(reader.offset(), NETWORK_WIRE_SIZE + KEY_LENGTH);
        assert_eq!(reader.next_record(IpVersion::V6)?, None);
        assert_eq!(reader.remaining(), 0);
        Ok(())
    }

    #[test]
    fn v4_records_keep_low_32_bits() -> anyhow::Result<()> {
        let a = key(b"a");
        let mut bytes = vec![0xffu8; 16];
        bytes.push(24);
        bytes.extend_from_slice(a.as_bytes());
        let mut reader = FrozenReader::new(&bytes);
        let (network, _) = reader.next_record(IpVersion::V4)?.unwrap();
        assert_eq!(network.to_string(), "255.255.255.0/24");
        assert_eq!(network.address() >> 32, 0);
        Ok(())
    }

    #[test]
    fn truncated_record_is_an_error() {
        let bytes = record("10.0.0.0/8", &key(b"a"));
        let mut reader = FrozenReader::new(&bytes[..30]);
        assert!(matches!(
            reader.next_record(IpVersion::V4),
            Err(Error::UnexpectedEof {
                what: "key",
                offset: 17,
                size: 27,
                len: 30
            })
        ));
    }

    #[test]
    fn dictionary_length_past_end_is_an_error() {
        let mut bytes = terminator();
        bytes.extend(&100u64.to_le_bytes());
        bytes.extend(b"short");
        let mut reader = FrozenReader::new(&bytes);
        assert_eq!(reader.next_record(IpVersion::V4).unwrap(), None);
        assert!(matches!(
            reader.read_dictionary(),
            Err(Error::UnexpectedEof {
                what: "frozen_data",
                ..
            })
        ));
    }

    #[test]
    fn params_header() -> anyhow::Result<()> {
        let mut bytes = 3u32.to_le_bytes().to_vec();
        bytes.extend(b"xyz");
        bytes.extend(terminator());
        let mut reader = FrozenReader::new(&bytes);
        assert_eq!(reader.read_params()?, b"xyz");
        assert_eq!(reader.offset(), 7);
        Ok(())
    }
}
