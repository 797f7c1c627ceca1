//! Networks and their 17 byte wire form
//!
//! A network is stored as a `u128` holding either a 32 bit or a 128 bit address in its low bits,
//! plus a prefix length. The wire form is always the full 16 byte address in network byte order,
//! followed by one byte of prefix length, regardless of the address family. That wastes 12 bytes
//! per IPv4 record, but keeps the reader trivial.
use crate::error::Error;
use anyhow::Context;
use core::fmt;
use std::{
    convert::TryFrom,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

/// size of an encoded network: 16 bytes of address, 1 byte of prefix length
pub const NETWORK_WIRE_SIZE: usize = 16 + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// number of meaningful address bits
    pub fn bits(self) -> u8 {
        match self {
            Self::V4 => 32,
            Self::V6 => 128,
        }
    }

    /// index of the most significant meaningful bit, counting from 0
    pub fn max_depth0(self) -> u8 {
        self.bits() - 1
    }

    fn address_mask(self) -> u128 {
        match self {
            Self::V4 => u32::MAX as u128,
            Self::V6 => u128::MAX,
        }
    }
}

impl TryFrom<u8> for IpVersion {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> anyhow::Result<Self> {
        match value {
            4 => Ok(Self::V4),
            6 => Ok(Self::V6),
            x => Err(anyhow::anyhow!("invalid ip version {}", x)),
        }
    }
}

impl From<IpVersion> for u8 {
    fn from(value: IpVersion) -> Self {
        match value {
            IpVersion::V4 => 4,
            IpVersion::V6 => 6,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 => write!(f, "IPv4"),
            Self::V6 => write!(f, "IPv6"),
        }
    }
}

/// Sets the bit that distinguishes the right child from the left child of a node at `depth`.
///
/// The left child of a node has the same network as the node itself.
#[inline]
pub fn flip_network_bit(network: u128, max_depth0: u8, depth: u8) -> u128 {
    network | (1u128 << (max_depth0 - depth))
}

#[inline]
pub(crate) fn address_bit(address: u128, max_depth0: u8, depth: u8) -> bool {
    (address >> (max_depth0 - depth)) & 1 == 1
}

/// An address prefix of a given family. Host bits are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Network {
    address: u128,
    prefix_length: u8,
    ip_version: IpVersion,
}

impl Network {
    pub fn new(address: u128, prefix_length: u8, ip_version: IpVersion) -> Result<Self, Error> {
        let bits = ip_version.bits();
        if prefix_length > bits {
            return Err(Error::InvalidPrefixLength {
                prefix_length,
                ip_version,
            });
        }
        let prefix_mask = if prefix_length == 0 {
            0
        } else {
            u128::MAX << (128 - prefix_length as u32) >> (128 - bits as u32)
        };
        Ok(Self {
            address: address & ip_version.address_mask() & prefix_mask,
            prefix_length,
            ip_version,
        })
    }

    pub fn from_ip(address: IpAddr, prefix_length: u8) -> Result<Self, Error> {
        match address {
            IpAddr::V4(address) => Self::new(u32::from(address).into(), prefix_length, IpVersion::V4),
            IpAddr::V6(address) => Self::new(u128::from(address), prefix_length, IpVersion::V6),
        }
    }

    /// the all zero network of length 0, covering the whole address space
    pub fn default_route(ip_version: IpVersion) -> Self {
        Self {
            address: 0,
            prefix_length: 0,
            ip_version,
        }
    }

    pub fn address(&self) -> u128 {
        self.address
    }

    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    pub fn ip_version(&self) -> IpVersion {
        self.ip_version
    }

    pub fn first_address(&self) -> IpAddr {
        match self.ip_version {
            IpVersion::V4 => IpAddr::V4(Ipv4Addr::from(self.address as u32)),
            IpVersion::V6 => IpAddr::V6(Ipv6Addr::from(self.address)),
        }
    }

    /// branch direction at `depth` when walking down from the root, true meaning right
    pub fn bit(&self, depth: u8) -> bool {
        address_bit(self.address, self.ip_version.max_depth0(), depth)
    }

    /// Widens an IPv4 network to its place in an IPv6 tree, `::a.b.c.d/(96 + prefix)`.
    pub fn to_ipv6(self) -> Self {
        match self.ip_version {
            IpVersion::V4 => Self {
                address: self.address,
                prefix_length: self.prefix_length + 96,
                ip_version: IpVersion::V6,
            },
            IpVersion::V6 => self,
        }
    }

    pub fn encode(&self) -> [u8; NETWORK_WIRE_SIZE] {
        let mut res = [0u8; NETWORK_WIRE_SIZE];
        res[..16].copy_from_slice(&self.address.to_be_bytes());
        res[16] = self.prefix_length;
        res
    }

    /// Decodes the wire form for a tree of family `ip_version`.
    ///
    /// For IPv4 only the last 4 bytes of the address field are meaningful, the rest is dropped.
    pub fn decode(wire: &[u8; NETWORK_WIRE_SIZE], ip_version: IpVersion) -> Result<Self, Error> {
        let mut address = [0u8; 16];
        address.copy_from_slice(&wire[..16]);
        Self::new(u128::from_be_bytes(address), wire[16], ip_version)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.first_address(), self.prefix_length)
    }
}

impl FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let (address, prefix_length) = match s.split_once('/') {
            Some((address, prefix_length)) => (address, Some(prefix_length)),
            None => (s, None),
        };
        let address: IpAddr = address
            .parse()
            .with_context(|| format!("invalid address in network {}", s))?;
        let prefix_length = match (prefix_length, address) {
            (Some(prefix_length), _) => prefix_length
                .parse()
                .with_context(|| format!("invalid prefix length in network {}", s))?,
            (None, IpAddr::V4(_)) => 32,
            (None, IpAddr::V6(_)) => 128,
        };
        Ok(Self::from_ip(address, prefix_length)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen};

    impl Arbitrary for IpVersion {
        fn arbitrary(g: &mut Gen) -> Self {
            if bool::arbitrary(g) {
                Self::V4
            } else {
                Self::V6
            }
        }
    }

    impl Arbitrary for Network {
        fn arbitrary(g: &mut Gen) -> Self {
            let ip_version = IpVersion::arbitrary(g);
            let prefix_length = u8::arbitrary(g) % (ip_version.bits() + 1);
            Network::new(u128::arbitrary(g), prefix_length, ip_version).unwrap()
        }
    }

    #[test]
    fn parse_and_display() -> anyhow::Result<()> {
        let net: Network = "10.0.0.0/8".parse()?;
        assert_eq!(net.address(), 0x0a00_0000);
        assert_eq!(net.prefix_length(), 8);
        assert_eq!(net.ip_version(), IpVersion::V4);
        assert_eq!(net.to_string(), "10.0.0.0/8");

        let net: Network = "2001:db8::/32".parse()?;
        assert_eq!(net.ip_version(), IpVersion::V6);
        assert_eq!(net.to_string(), "2001:db8::/32");

        let host: Network = "192.168.1.1".parse()?;
        assert_eq!(host.prefix_length(), 32);

        assert!("10.0.0.0/33".parse::<Network>().is_err());
        assert!("10.0.0/8".parse::<Network>().is_err());
        Ok(())
    }

    #[test]
    fn host_bits_are_zeroed() -> anyhow::Result<()> {
        let net: Network = "10.1.2.3/8".parse()?;
        assert_eq!(net.to_string(), "10.0.0.0/8");
        let net = Network::new(u128::MAX, 0, IpVersion::V6)?;
        assert_eq!(net, Network::default_route(IpVersion::V6));
        // only the low 32 bits are meaningful for v4
        let net = Network::new(u128::MAX, 32, IpVersion::V4)?;
        assert_eq!(net.address(), u32::MAX as u128);
        Ok(())
    }

    #[test]
    fn wire_form_is_big_endian() -> anyhow::Result<()> {
        let net: Network = "10.0.0.0/8".parse()?;
        let wire = net.encode();
        assert_eq!(&wire[..12], &[0u8; 12]);
        assert_eq!(&wire[12..16], &[10, 0, 0, 0]);
        assert_eq!(wire[16], 8);
        Ok(())
    }

    #[test]
    fn v4_decode_keeps_low_32_bits() -> anyhow::Result<()> {
        let mut wire = [0xffu8; NETWORK_WIRE_SIZE];
        wire[16] = 32;
        let net = Network::decode(&wire, IpVersion::V4)?;
        assert_eq!(net.address(), 0xffff_ffff);
        assert_eq!(net.address() >> 32, 0);
        Ok(())
    }

    #[test]
    fn decode_rejects_long_prefix() {
        let mut wire = [0u8; NETWORK_WIRE_SIZE];
        wire[16] = 33;
        assert!(matches!(
            Network::decode(&wire, IpVersion::V4),
            Err(Error::InvalidPrefixLength {
                prefix_length: 33,
                ..
            })
        ));
        wire[16] = 129;
        assert!(Network::decode(&wire, IpVersion::V6).is_err());
    }

    #[test]
    fn flip_sets_the_branch_bit() {
        // right child of the v4 root is 128.0.0.0/1
        assert_eq!(flip_network_bit(0, 31, 0), 0x8000_0000);
        // right child of 10.0.0.0/8 at depth 8 is 10.128.0.0/9
        assert_eq!(flip_network_bit(0x0a00_0000, 31, 8), 0x0a80_0000);
        assert_eq!(flip_network_bit(0, 127, 0), 1u128 << 127);
        assert_eq!(flip_network_bit(0, 127, 127), 1);
    }

    #[test]
    fn widen_v4_to_v6() -> anyhow::Result<()> {
        let net: Network = "10.0.0.0/8".parse()?;
        let wide = net.to_ipv6();
        assert_eq!(wide.ip_version(), IpVersion::V6);
        assert_eq!(wide.prefix_length(), 104);
        assert_eq!(wide.address(), 0x0a00_0000);
        assert_eq!(wide.to_ipv6(), wide);
        Ok(())
    }

    #[quickcheck]
    fn wire_roundtrip(net: Network) -> bool {
        Network::decode(&net.encode(), net.ip_version()).ok() == Some(net)
    }

    #[quickcheck]
    fn bits_follow_address(net: Network) -> bool {
        let max_depth0 = net.ip_version().max_depth0();
        (0..net.prefix_length()).all(|depth| {
            net.bit(depth) == ((net.address() >> (max_depth0 - depth)) & 1 == 1)
        })
    }
}
