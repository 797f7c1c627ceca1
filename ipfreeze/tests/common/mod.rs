//! helper methods for the tests
use ipfreeze::{IpVersion, Network, Tree, TreeConfig};
use libipld::Ipld;
use quickcheck::{Arbitrary, Gen};

#[allow(dead_code)]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn prefix_mask(prefix_length: u8, ip_version: IpVersion) -> u128 {
    if prefix_length == 0 {
        0
    } else {
        let bits = ip_version.bits() as u32;
        u128::MAX << (128 - prefix_length as u32) >> (128 - bits)
    }
}

/// true if one of the networks contains the other
pub fn overlaps(a: &Network, b: &Network) -> bool {
    let mask = prefix_mask(
        a.prefix_length().min(b.prefix_length()),
        a.ip_version(),
    );
    a.address() & mask == b.address() & mask
}

/// A set of networks of one family, none containing another, with small text values.
///
/// Values are drawn from a few choices so that trees share values between networks.
#[derive(Debug, Clone)]
pub struct Listing {
    pub ip_version: IpVersion,
    pub entries: Vec<(Network, String)>,
}

impl Listing {
    pub fn tree(&self) -> anyhow::Result<Tree<Ipld>> {
        let mut tree = Tree::new(TreeConfig {
            ip_version: self.ip_version,
            ..TreeConfig::default()
        });
        for (network, value) in &self.entries {
            tree.insert(*network, Ipld::String(value.clone()))?;
        }
        Ok(tree)
    }
}

fn arbitrary_network(g: &mut Gen, ip_version: IpVersion) -> Network {
    let bits = ip_version.bits();
    // mostly short prefixes, so that networks end up as neighbours
    let prefix_length = if bool::arbitrary(g) {
        u8::arbitrary(g) % 24
    } else {
        u8::arbitrary(g) % (bits + 1)
    };
    let address = match ip_version {
        IpVersion::V4 => u32::arbitrary(g) as u128,
        IpVersion::V6 => u128::arbitrary(g),
    };
    Network::new(address, prefix_length, ip_version).unwrap()
}

impl Listing {
    pub fn arbitrary_of(g: &mut Gen, ip_version: IpVersion) -> Self {
        let n = usize::arbitrary(g) % 32;
        let mut entries: Vec<(Network, String)> = Vec::new();
        for _ in 0..n {
            let network = arbitrary_network(g, ip_version);
            if entries.iter().all(|(other, _)| !overlaps(&network, other)) {
                let value = format!("value{}", u8::arbitrary(g) % 4);
                entries.push((network, value));
            }
        }
        Self {
            ip_version,
            entries,
        }
    }
}

impl Arbitrary for Listing {
    fn arbitrary(g: &mut Gen) -> Self {
        let ip_version = *g.choose(&[IpVersion::V4, IpVersion::V6]).unwrap();
        Self::arbitrary_of(g, ip_version)
    }

    /// drops one entry at a time, which keeps the networks disjoint
    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let this = self.clone();
        Box::new((0..self.entries.len()).map(move |i| {
            let mut entries = this.entries.clone();
            entries.remove(i);
            Listing {
                ip_version: this.ip_version,
                entries,
            }
        }))
    }
}
