//! the params stored in frozen files written by the cli
use anyhow::Result;
use ipfreeze::{IpVersion, RecordSize, TreeConfig};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// [TreeConfig] as json, so a frozen file can be thawed without being told how it was built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrozenParams {
    pub ip_version: u8,
    pub record_size: u8,
    #[serde(default)]
    pub merge_record_collisions: bool,
}

impl From<TreeConfig> for FrozenParams {
    fn from(config: TreeConfig) -> Self {
        Self {
            ip_version: config.ip_version.into(),
            record_size: config.record_size.bits(),
            merge_record_collisions: config.merge_record_collisions,
        }
    }
}

impl FrozenParams {
    pub fn config(&self) -> Result<TreeConfig> {
        Ok(TreeConfig {
            ip_version: IpVersion::try_from(self.ip_version)?,
            record_size: RecordSize::try_from(self.record_size)?,
            merge_record_collisions: self.merge_record_collisions,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
