use super::{Node, Record, Tree, TreeValue};
use crate::{
    error::Error,
    key::DataKey,
    network::{IpVersion, Network},
};
use fnv::FnvHashMap;
use tracing::*;

impl Record {
    /// Turns this record into a node, pushing existing data down into both children.
    fn split(&mut self) -> &mut Node {
        if !matches!(self, Record::Node(_)) {
            let existing = std::mem::take(self);
            *self = Record::Node(Box::new(Node {
                left: existing.clone(),
                right: existing,
            }));
        }
        match self {
            Record::Node(node) => &mut **node,
            _ => unreachable!("record was just split"),
        }
    }
}

impl<V: TreeValue> Tree<V> {
    /// Inserts a value for a network, storing the value under its fingerprint.
    pub fn insert(&mut self, network: Network, value: V) -> anyhow::Result<()> {
        let key = value.fingerprint()?;
        self.data.entry(key).or_insert(value);
        self.insert_record(network, key, self.config.merge_record_collisions)?;
        Ok(())
    }

    /// Inserts a data record for a network.
    ///
    /// The value for `key` may be attached later using [Tree::store_data]. Merging colliding
    /// records needs both values, so without them the new record replaces the old one.
    pub fn insert_record(
        &mut self,
        network: Network,
        key: DataKey,
        merge: bool,
    ) -> anyhow::Result<()> {
        let network = match (self.config.ip_version, network.ip_version()) {
            (IpVersion::V6, IpVersion::V4) => network.to_ipv6(),
            (IpVersion::V4, IpVersion::V6) => {
                return Err(Error::IpVersionMismatch {
                    network: IpVersion::V6,
                    tree: IpVersion::V4,
                }
                .into())
            }
            _ => network,
        };
        trace!("insert {} -> {}", network, key);
        self.finalized = false;
        let mut current = &mut self.root;
        for depth in 0..network.prefix_length() {
            let node = current.split();
            current = if network.bit(depth) {
                &mut node.right
            } else {
                &mut node.left
            };
        }
        set_record(current, key, merge, &mut self.data)
    }
}

fn set_record<V: TreeValue>(
    record: &mut Record,
    key: DataKey,
    merge: bool,
    data: &mut FnvHashMap<DataKey, V>,
) -> anyhow::Result<()> {
    if !merge {
        *record = Record::Data(key);
        return Ok(());
    }
    match record {
        Record::Empty => *record = Record::Data(key),
        Record::Data(existing) => {
            let existing = *existing;
            if existing == key {
                return Ok(());
            }
            let merged = match (data.get(&existing), data.get(&key)) {
                (Some(old), Some(new)) => Some(old.merge(new)),
                _ => None,
            };
            match merged {
                Some(merged) => {
                    let merged_key = merged.fingerprint()?;
                    data.entry(merged_key).or_insert(merged);
                    *record = Record::Data(merged_key);
                }
                None => *record = Record::Data(key),
            }
        }
        Record::Node(node) => {
            set_record(&mut node.left, key, merge, data)?;
            set_record(&mut node.right, key, merge, data)?;
        }
    }
    Ok(())
}
