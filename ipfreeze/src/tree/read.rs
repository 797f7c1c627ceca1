use super::{Node, Record, Tree, TreeValue};
use crate::network::{address_bit, flip_network_bit, IpVersion, Network};
use std::net::IpAddr;

impl<V: TreeValue> Tree<V> {
    /// Depth first, pre-order walk over all nodes, left before right.
    ///
    /// `visit` is called with each node, the network of the node and its depth. The network of the
    /// left child of a node is the node's network, the right child's network is derived with
    /// [flip_network_bit]. The first error returned by `visit` ends the walk.
    pub fn iterate<E>(
        &self,
        mut visit: impl FnMut(&Node, u128, u8) -> Result<(), E>,
    ) -> Result<(), E> {
        if let Record::Node(root) = &self.root {
            iterate0(root, 0, 0, self.ip_version().max_depth0(), &mut visit)?;
        }
        Ok(())
    }

    /// All networks that have data, with their values, in iteration order
    pub fn entries(&self) -> Vec<(Network, &V)> {
        let ip_version = self.ip_version();
        let max_depth0 = ip_version.max_depth0();
        let mut res = Vec::new();
        if let Record::Data(key) = &self.root {
            if let Some(value) = self.data.get(key) {
                res.push((Network::default_route(ip_version), value));
            }
        }
        let _ = self.iterate(|node, network, depth| -> Result<(), ()> {
            for (right, record) in [(false, &node.left), (true, &node.right)] {
                if let Record::Data(key) = record {
                    let address = if right {
                        flip_network_bit(network, max_depth0, depth)
                    } else {
                        network
                    };
                    let network = Network::new(address, depth + 1, ip_version).map_err(|_| ())?;
                    if let Some(value) = self.data.get(key) {
                        res.push((network, value));
                    }
                }
            }
            Ok(())
        });
        res
    }

    /// Finds the value for the most specific network containing `address`.
    ///
    /// IPv4 addresses are looked up below `::/96` in IPv6 trees.
    pub fn lookup(&self, address: IpAddr) -> Option<&V> {
        let address = match (address, self.ip_version()) {
            (IpAddr::V4(address), _) => u32::from(address) as u128,
            (IpAddr::V6(address), IpVersion::V6) => u128::from(address),
            (IpAddr::V6(_), IpVersion::V4) => return None,
        };
        let max_depth0 = self.ip_version().max_depth0();
        let mut current = &self.root;
        let mut depth = 0u8;
        loop {
            match current {
                Record::Empty => return None,
                Record::Data(key) => return self.data.get(key),
                Record::Node(node) => {
                    current = node.child(address_bit(address, max_depth0, depth));
                    depth += 1;
                }
            }
        }
    }
}

fn iterate0<E>(
    node: &Node,
    network: u128,
    depth: u8,
    max_depth0: u8,
    visit: &mut impl FnMut(&Node, u128, u8) -> Result<(), E>,
) -> Result<(), E> {
    visit(node, network, depth)?;
    if let Record::Node(left) = &node.left {
        iterate0(left, network, depth + 1, max_depth0, visit)?;
    }
    if let Record::Node(right) = &node.right {
        let network = flip_network_bit(network, max_depth0, depth);
        iterate0(right, network, depth + 1, max_depth0, visit)?;
    }
    Ok(())
}
