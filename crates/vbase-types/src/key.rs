use std::fmt::Debug;

use crate::error::TypeError;

/// A typed primary key that maps to substrate row bytes.
///
/// The substrate orders rows by these bytes, so range scans follow the byte
/// order of `to_row_key`. Generated keys (random and sequential) are always
/// ASCII, which makes them valid for every implementation below.
pub trait RowKey: Clone + Debug + Send + Sync + 'static {
    /// Encode the key as substrate row bytes.
    fn to_row_key(&self) -> Vec<u8>;

    /// Decode a key from substrate row bytes.
    fn from_row_key(bytes: &[u8]) -> Result<Self, TypeError>;
}

impl RowKey for Vec<u8> {
    fn to_row_key(&self) -> Vec<u8> {
        self.clone()
    }

    fn from_row_key(bytes: &[u8]) -> Result<Self, TypeError> {
        Ok(bytes.to_vec())
    }
}

impl RowKey for String {
    fn to_row_key(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn from_row_key(bytes: &[u8]) -> Result<Self, TypeError> {
        String::from_utf8(bytes.to_vec()).map_err(|e| TypeError::InvalidKey(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_key_roundtrip() {
        let key = "4321".to_string();
        assert_eq!(String::from_row_key(&key.to_row_key()).unwrap(), key);
    }

    #[test]
    fn string_key_rejects_invalid_utf8() {
        assert!(matches!(
            String::from_row_key(&[0xff, 0xfe]),
            Err(TypeError::InvalidKey(_))
        ));
    }

    #[test]
    fn byte_key_is_identity() {
        let key = vec![0u8, 1, 2, 255];
        assert_eq!(Vec::<u8>::from_row_key(&key.to_row_key()).unwrap(), key);
    }
}
