//! content derived keys for tree data
use crate::error::Error;
use core::fmt;
use sha2::{Digest, Sha256};
use std::convert::TryFrom;

/// length of a data key in bytes
pub const KEY_LENGTH: usize = 27;

/// A fixed length token identifying a value stored in a tree.
///
/// Keys are derived from the content of the value, so equal values share a key and are only
/// stored once. The frozen format relies on keys never being equal to the separator that ends
/// the record section, see [crate::frozen::FREEZE_SEPARATOR]. Keys created with
/// [DataKey::from_content] are base64 text and can never contain the separator's spaces.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataKey([u8; KEY_LENGTH]);

impl DataKey {
    pub fn new(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// key for some encoded content: the first 20 bytes of its sha256 digest, base64 without padding
    pub fn from_content(content: &[u8]) -> Self {
        let digest = Sha256::digest(content);
        let text = base64::encode_config(&digest[..20], base64::STANDARD_NO_PAD);
        let mut res = [0u8; KEY_LENGTH];
        res.copy_from_slice(text.as_bytes());
        Self(res)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

impl TryFrom<&[u8]> for DataKey {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Error> {
        let bytes = <[u8; KEY_LENGTH]>::try_from(value)
            .map_err(|_| Error::InvalidKeyLength(value.len()))?;
        Ok(Self(bytes))
    }
}

impl AsRef<[u8]> for DataKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataKey({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_keys_are_27_bytes_of_base64() {
        let key = DataKey::from_content(b"hello");
        assert_eq!(key.as_bytes().len(), KEY_LENGTH);
        assert!(key
            .as_bytes()
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b'+' || *b == b'/'));
        assert_eq!(key, DataKey::from_content(b"hello"));
        assert_ne!(key, DataKey::from_content(b"hello!"));
    }

    #[test]
    fn key_length_is_checked() {
        assert!(matches!(
            DataKey::try_from(&b"too short"[..]),
            Err(Error::InvalidKeyLength(9))
        ));
        let key = DataKey::from_content(b"x");
        assert_eq!(DataKey::try_from(key.as_ref()).unwrap(), key);
    }
}
