//! [Ipld] as tree values, and a DAG-CBOR codec for the frozen dictionary
use crate::{
    frozen::{RecordDictionary, ValueCodec},
    key::DataKey,
    tree::TreeValue,
};
use anyhow::{anyhow, Result};
use libipld::{cbor::DagCborCodec, codec::Codec, Ipld};
use std::{collections::BTreeMap, convert::TryFrom};

impl TreeValue for Ipld {
    fn fingerprint(&self) -> Result<DataKey> {
        let bytes = DagCborCodec.encode(self)?;
        Ok(DataKey::from_content(&bytes))
    }

    /// Maps are merged key by key, recursively. For everything else the newer value wins.
    fn merge(&self, newer: &Self) -> Self {
        match (self, newer) {
            (Ipld::Map(older), Ipld::Map(newer)) => {
                let mut res = older.clone();
                for (k, v) in newer {
                    let merged = match res.get(k) {
                        Some(existing) => existing.merge(v),
                        None => v.clone(),
                    };
                    res.insert(k.clone(), merged);
                }
                Ipld::Map(res)
            }
            (_, newer) => newer.clone(),
        }
    }
}

/// Stores the dictionary as a single DAG-CBOR map from key text to value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DagCborValues;

impl ValueCodec<Ipld> for DagCborValues {
    fn encode(&self, values: &RecordDictionary<Ipld>) -> Result<Vec<u8>> {
        let map = values
            .iter()
            .map(|(key, value)| -> Result<_> { Ok((key_text(key)?, value.clone())) })
            .collect::<Result<BTreeMap<_, _>>>()?;
        DagCborCodec.encode(&Ipld::Map(map))
    }

    fn decode(&self, bytes: &[u8]) -> Result<RecordDictionary<Ipld>> {
        let ipld: Ipld = DagCborCodec.decode(bytes)?;
        match ipld {
            Ipld::Map(map) => map
                .into_iter()
                .map(|(key, value)| -> Result<_> {
                    Ok((DataKey::try_from(key.as_bytes())?, value))
                })
                .collect(),
            other => Err(anyhow!("frozen data is not a map: {:?}", other)),
        }
    }
}

fn key_text(key: &DataKey) -> Result<String> {
    Ok(std::str::from_utf8(key.as_bytes())
        .map_err(|_| anyhow!("key {:?} is not text", key))?
        .to_owned())
}
