//! The frozen checkpoint format
//!
//! A frozen tree is a single file:
//!
//! ```text
//! [u32 le: params length][params]
//! repeat {
//!     [16 bytes: network address, big endian][u8: prefix length][27 bytes: data key]
//! }
//! [17 zero bytes][separator]
//! [u64 le: dictionary length][dictionary]
//! ```
//!
//! The params are opaque to this crate. The dictionary maps every data key used by a record to its
//! value and is encoded by a pluggable [ValueCodec].
//!
//! A record for the default route `0.0.0.0/0` or `::/0` also starts with 17 zero bytes, so the zero
//! network alone does not end the record section. Only 17 zero bytes followed by the separator
//! do. This requires that no data key starts with the separator.
use crate::{key::KEY_LENGTH, network::NETWORK_WIRE_SIZE};
use anyhow::Result;
mod buffer;
mod dictionary;
mod freeze;
mod thaw;

pub use buffer::FrozenBuffer;
pub use dictionary::RecordDictionary;
pub use freeze::{freeze_tree, FreezeStats};
pub use thaw::{read_frozen_params, thaw_tree, thaw_with_params, FrozenReader};

/// Follows the 17 zero bytes at the end of the record section.
pub const FREEZE_SEPARATOR: &[u8] = b"not an SHA1 key";

/// size of one frozen record
pub const FROZEN_RECORD_MAX_SIZE: usize = NETWORK_WIRE_SIZE + KEY_LENGTH;

/// a node can have at most two data records
pub const FROZEN_NODE_MAX_SIZE: usize = FROZEN_RECORD_MAX_SIZE * 2;

/// Encodes and decodes the dictionary of values at the end of a frozen file.
pub trait ValueCodec<V> {
    fn encode(&self, values: &RecordDictionary<V>) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<RecordDictionary<V>>;
}

/// Upper bound for the size of the mapped part of a frozen file: header, records and terminator.
///
/// This assumes that every node has two data records, which never happens. A tree that is just a
/// data record for the default route has no nodes, but still needs room for one record.
pub fn frozen_buffer_size(node_count: usize, params_len: usize) -> usize {
    4 + params_len
        + node_count.max(1) * FROZEN_NODE_MAX_SIZE
        + NETWORK_WIRE_SIZE
        + FREEZE_SEPARATOR.len()
}
