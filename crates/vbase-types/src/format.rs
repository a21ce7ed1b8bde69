use std::fmt;

use serde::{Deserialize, Serialize};

/// Serialization scheme used for a row's payload.
///
/// The tag is stored next to every payload so rows written under an older
/// format stay readable after the store switches its write format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Compact binary encoding.
    #[default]
    Binary,
    /// JSON text encoding.
    Json,
}

impl Format {
    /// Numeric tag persisted in the format cell.
    pub fn tag(&self) -> u32 {
        match self {
            Self::Binary => 0,
            Self::Json => 1,
        }
    }

    /// Parse a persisted tag. Returns `None` for tags this build does not know.
    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(Self::Binary),
            1 => Some(Self::Json),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary => write!(f, "binary"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_roundtrip() {
        for format in [Format::Binary, Format::Json] {
            assert_eq!(Format::from_tag(format.tag()), Some(format));
        }
    }

    #[test]
    fn unknown_tag() {
        assert_eq!(Format::from_tag(9), None);
    }

    #[test]
    fn serde_names() {
        assert_eq!(serde_json::to_string(&Format::Json).unwrap(), "\"json\"");
        let parsed: Format = serde_json::from_str("\"binary\"").unwrap();
        assert_eq!(parsed, Format::Binary);
    }
}
