//! in memory binary radix tree mapping networks to values
//!
//! Every node has a left and a right record. A record is either empty, a link to a child node, or a
//! [DataKey] referring to a value in the tree's data map. Networks are implicit in the topology:
//! the left child of a node shares the node's network, the right child sets one more bit.
use crate::{error::Error, key::DataKey, network::IpVersion};
use core::fmt::Debug;
use fnv::FnvHashMap;
use std::{collections::HashSet, convert::TryFrom};
use tracing::*;
mod insert;
mod read;

/// Values stored in a tree.
pub trait TreeValue: Debug + Clone {
    /// content fingerprint of the value. Equal values must have equal fingerprints.
    fn fingerprint(&self) -> anyhow::Result<DataKey>;

    /// combine this value with a newer one inserted for the same network, when the tree is
    /// configured to merge record collisions
    fn merge(&self, newer: &Self) -> Self {
        newer.clone()
    }
}

/// Width of the node pointers in the final database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSize {
    Bits24,
    Bits28,
    Bits32,
}

impl RecordSize {
    pub fn bits(self) -> u8 {
        match self {
            Self::Bits24 => 24,
            Self::Bits28 => 28,
            Self::Bits32 => 32,
        }
    }

    /// largest node number a record of this size can hold
    pub fn max_record_value(self) -> u64 {
        (1u64 << self.bits()) - 1
    }
}

impl TryFrom<u8> for RecordSize {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        match value {
            24 => Ok(Self::Bits24),
            28 => Ok(Self::Bits28),
            32 => Ok(Self::Bits32),
            x => Err(Error::InvalidRecordSize(x)),
        }
    }
}

/// Construction parameters of a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    pub ip_version: IpVersion,
    pub record_size: RecordSize,
    /// merge the values of colliding inserts instead of replacing them
    pub merge_record_collisions: bool,
}

impl TreeConfig {
    pub fn ipv4() -> Self {
        Self {
            ip_version: IpVersion::V4,
            ..Self::default()
        }
    }

    pub fn ipv6() -> Self {
        Self::default()
    }

    pub fn with_merge(self, merge_record_collisions: bool) -> Self {
        Self {
            merge_record_collisions,
            ..self
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            ip_version: IpVersion::V6,
            record_size: RecordSize::Bits28,
            merge_record_collisions: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Empty,
    Data(DataKey),
    Node(Box<Node>),
}

impl Default for Record {
    fn default() -> Self {
        Self::Empty
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    pub left: Record,
    pub right: Record,
}

impl Node {
    pub fn child(&self, right: bool) -> &Record {
        if right {
            &self.right
        } else {
            &self.left
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tree<V> {
    config: TreeConfig,
    root: Record,
    data: FnvHashMap<DataKey, V>,
    node_count: usize,
    finalized: bool,
}

impl<V: TreeValue> Tree<V> {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            root: Record::Empty,
            data: FnvHashMap::default(),
            node_count: 0,
            finalized: false,
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn ip_version(&self) -> IpVersion {
        self.config.ip_version
    }

    pub fn root(&self) -> &Record {
        &self.root
    }

    /// number of nodes as of the last [Tree::finalize]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// number of distinct values stored in the tree
    pub fn data_count(&self) -> usize {
        self.data.len()
    }

    /// attach a value to the tree under its key
    pub fn store_data(&mut self, key: DataKey, value: V) {
        self.data.insert(key, value);
    }

    pub fn data_for_key(&self, key: &DataKey) -> Option<&V> {
        self.data.get(key)
    }

    /// Prepares the tree for freezing or writing.
    ///
    /// Counts the nodes, drops values that are no longer referenced by any record, and checks that
    /// the configured record size can address all nodes.
    pub fn finalize(&mut self) -> Result<(), Error> {
        let mut referenced = HashSet::new();
        let node_count = count_nodes(&self.root, &mut referenced);
        let before = self.data.len();
        self.data.retain(|key, _| referenced.contains(key));
        let record_size = self.config.record_size;
        if node_count as u64 > record_size.max_record_value() {
            return Err(Error::TooManyNodes {
                nodes: node_count,
                record_size: record_size.bits(),
            });
        }
        debug!(
            "finalized tree nodes={} values={} dropped={}",
            node_count,
            self.data.len(),
            before - self.data.len()
        );
        self.node_count = node_count;
        self.finalized = true;
        Ok(())
    }
}

fn count_nodes(record: &Record, referenced: &mut HashSet<DataKey>) -> usize {
    match record {
        Record::Empty => 0,
        Record::Data(key) => {
            referenced.insert(*key);
            0
        }
        Record::Node(node) => {
            1 + count_nodes(&node.left, referenced) + count_nodes(&node.right, referenced)
        }
    }
}
