use serde::de::DeserializeOwned;
use serde::Serialize;
use vbase_types::{Format, Schema};

use crate::error::{CodecError, CodecResult};

/// Serializes values of `T` against a schema.
///
/// Implementations must support decoding every [`Format`] they can encode,
/// since rows keep the format they were written with.
pub trait Codec<T>: Send + Sync {
    /// Encode `value`, written under `schema`, in `format`.
    fn encode(&self, value: &T, schema: &Schema, format: Format) -> CodecResult<Vec<u8>>;

    /// Decode bytes that were written under `schema` in `format`.
    fn decode(&self, bytes: &[u8], schema: &Schema, format: Format) -> CodecResult<T>;
}

/// Serde-backed codec: bincode for [`Format::Binary`], JSON for
/// [`Format::Json`].
///
/// Serde types describe their own shape, so the writer schema is only used
/// to label errors.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerdeCodec;

impl<T> Codec<T> for SerdeCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T, schema: &Schema, format: Format) -> CodecResult<Vec<u8>> {
        let encoded = match format {
            Format::Binary => bincode::serialize(value).map_err(|e| e.to_string()),
            Format::Json => serde_json::to_vec(value).map_err(|e| e.to_string()),
        };
        encoded.map_err(|reason| CodecError::Encode {
            format,
            schema: schema.name().to_string(),
            reason,
        })
    }

    fn decode(&self, bytes: &[u8], schema: &Schema, format: Format) -> CodecResult<T> {
        let decoded = match format {
            Format::Binary => bincode::deserialize(bytes).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
        };
        decoded.map_err(|reason| CodecError::Decode {
            format,
            schema: schema.name().to_string(),
            reason,
        })
    }
}
