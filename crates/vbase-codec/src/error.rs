use vbase_types::Format;

/// Errors from encoding or decoding a payload.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The value could not be encoded.
    #[error("failed to encode {schema} as {format}: {reason}")]
    Encode {
        format: Format,
        schema: String,
        reason: String,
    },

    /// The bytes could not be decoded.
    #[error("failed to decode {schema} from {format}: {reason}")]
    Decode {
        format: Format,
        schema: String,
        reason: String,
    },
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
