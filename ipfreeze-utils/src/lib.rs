//! Tools for frozen network trees with [Ipld](libipld::Ipld) values
pub mod dump;
pub mod info;
pub mod load;
pub mod params;
