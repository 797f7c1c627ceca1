//! Layout of a frozen file, read without building a tree
use anyhow::Result;
use ipfreeze::{frozen::FrozenReader, IpVersion};
use std::{fmt, fs, path::Path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenInfo {
    pub params: Vec<u8>,
    pub records: usize,
    pub default_route: bool,
    /// offset of the dictionary length, right after the separator
    pub records_end: usize,
    pub dictionary_size: usize,
    pub trailing_bytes: usize,
}

impl FrozenInfo {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse(&fs::read(path)?)
    }

    /// Records are decoded as IPv6. Prefix lengths of IPv4 records are always valid IPv6 prefix
    /// lengths, and the address family does not change the layout.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = FrozenReader::new(bytes);
        let params = reader.read_params()?.to_vec();
        let mut records = 0;
        let mut default_route = false;
        while let Some((network, _)) = reader.next_record(IpVersion::V6)? {
            default_route |= network.prefix_length() == 0;
            records += 1;
        }
        let records_end = reader.offset();
        let dictionary_size = reader.read_dictionary()?.len();
        Ok(Self {
            params,
            records,
            default_route,
            records_end,
            dictionary_size,
            trailing_bytes: reader.remaining(),
        })
    }
}

impl fmt::Display for FrozenInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "params: {} bytes {}",
            self.params.len(),
            String::from_utf8_lossy(&self.params)
        )?;
        writeln!(f, "records: {}", self.records)?;
        writeln!(f, "default route: {}", self.default_route)?;
        writeln!(f, "records end: {}", self.records_end)?;
        writeln!(f, "dictionary: {} bytes", self.dictionary_size)?;
        if self.trailing_bytes > 0 {
            writeln!(f, "trailing: {} bytes", self.trailing_bytes)?;
        }
        Ok(())
    }
}
