//! # Frozen network trees
//!
//! A binary radix tree maps IPv4 or IPv6 networks to values, the way the search tree of an ip
//! geolocation database does. Building such a tree from a large source is slow, so this library
//! can *freeze* a tree into a compact checkpoint file and *thaw* it back later, possibly in
//! another process.
//!
//! ## Records and values
//!
//! Values are not stored in the tree itself. Each value is identified by a [DataKey] derived from
//! its content, and the tree only holds keys. Many networks usually share a value, so a frozen
//! file stores every network once, as a fixed size record pointing to a key, and every distinct
//! value once, in a dictionary at the end of the file.
//!
//! ## Format
//!
//! See [frozen] for the layout. Integers in the header and trailer are little endian, network
//! addresses are big endian. The record section is written through a memory map that is sized
//! up front from the node count of the tree, then truncated to what was actually used.
//!
//! ## Values
//!
//! Anything implementing [TreeValue] can be stored. The dictionary is encoded by a [ValueCodec],
//! so the tree does not care how values are serialized. [Ipld] values with a [DAG-CBOR] dictionary
//! are provided in [ipld].
//!
//! [DAG-CBOR]: https://ipld.io/specs/codecs/dag-cbor/spec/
//! [Ipld]: libipld::Ipld
pub mod error;
pub mod frozen;
pub mod ipld;
pub mod key;
pub mod network;
#[cfg(feature = "metrics")]
mod prom;
pub mod tree;

pub use error::Error;
pub use frozen::{
    freeze_tree, read_frozen_params, thaw_tree, thaw_with_params, FreezeStats, RecordDictionary,
    ValueCodec,
};
pub use ipld::DagCborValues;
pub use key::DataKey;
pub use network::{IpVersion, Network};
#[cfg(feature = "metrics")]
pub use prom::register_metrics;
pub use tree::{Record, RecordSize, Tree, TreeConfig, TreeValue};

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;
