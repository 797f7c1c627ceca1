use crate::{key::DataKey, network::IpVersion};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "About to write past end of frozen buffer with {}: {} + {} > {}",
        .what, .used, .size, .capacity
    )]
    CapacityExceeded {
        what: &'static str,
        used: usize,
        size: usize,
        capacity: usize,
    },

    #[error(
        "Unexpected end of frozen data reading {}: {} + {} > {}",
        .what, .offset, .size, .len
    )]
    UnexpectedEof {
        what: &'static str,
        offset: usize,
        size: usize,
        len: usize,
    },

    #[error("Invalid prefix length {} for {}", .prefix_length, .ip_version)]
    InvalidPrefixLength {
        prefix_length: u8,
        ip_version: IpVersion,
    },

    #[error("Cannot use {} network in {} tree", .network, .tree)]
    IpVersionMismatch { network: IpVersion, tree: IpVersion },

    #[error("Invalid data key length: {}", .0)]
    InvalidKeyLength(usize),

    #[error("Invalid record size: {}", .0)]
    InvalidRecordSize(u8),

    #[error("Tree has {} nodes, more than {}-bit records can address", .nodes, .record_size)]
    TooManyNodes { nodes: usize, record_size: u8 },

    #[error("Frozen params too large: {} bytes", .0)]
    ParamsTooLarge(usize),

    #[error("No data stored for key {}", .0)]
    MissingData(DataKey),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    FromInt(#[from] std::num::TryFromIntError),
}
