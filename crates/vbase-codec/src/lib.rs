//! Payload codecs for VBase.
//!
//! The object store never encodes values itself. It hands the value, the
//! writer schema, and a [`Format`] to a [`Codec`], and stores the format tag
//! next to the bytes so the row can be decoded later even if the store has
//! since switched formats.
//!
//! [`Format`]: vbase_types::Format

pub mod codec;
pub mod error;

pub use codec::{Codec, SerdeCodec};
pub use error::{CodecError, CodecResult};
