use std::fmt;

use serde_json::Value;

use crate::error::TypeError;

/// A schema definition in canonical form.
///
/// Definitions are JSON documents (record schemas in the Avro style, for
/// example). Parsing re-serializes the document with sorted object keys and
/// no insignificant whitespace, so two spellings of the same definition have
/// identical canonical bytes and therefore identical hashes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Schema {
    name: String,
    canonical: String,
}

impl Schema {
    /// Parse and canonicalize a JSON schema definition.
    pub fn parse(definition: &str) -> Result<Self, TypeError> {
        let value: Value = serde_json::from_str(definition)
            .map_err(|e| TypeError::InvalidSchema(e.to_string()))?;
        let canonical = serde_json::to_string(&value)
            .map_err(|e| TypeError::InvalidSchema(e.to_string()))?;
        let name = match &value {
            Value::Object(map) => map
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("anonymous")
                .to_string(),
            Value::String(primitive) => primitive.clone(),
            _ => "anonymous".to_string(),
        };
        Ok(Self { name, canonical })
    }

    /// Parse canonical bytes as stored in the schema table.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        let definition =
            std::str::from_utf8(bytes).map_err(|e| TypeError::InvalidSchema(e.to_string()))?;
        Self::parse(definition)
    }

    /// The `name` of the schema, or `"anonymous"` when it has none.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The canonical definition text.
    pub fn definition(&self) -> &str {
        &self.canonical
    }

    /// The canonical definition bytes (the input to the schema hash).
    pub fn as_bytes(&self) -> &[u8] {
        self.canonical.as_bytes()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("len", &self.canonical.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn canonical_form_ignores_whitespace_and_key_order() {
        let a = Schema::parse(r#"{"type":"record","name":"User","fields":[]}"#).unwrap();
        let b = Schema::parse(
            r#"{
                "fields": [],
                "name": "User",
                "type": "record"
            }"#,
        )
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn name_is_extracted() {
        let schema = Schema::parse(r#"{"type":"record","name":"Order","fields":[]}"#).unwrap();
        assert_eq!(schema.name(), "Order");

        let primitive = Schema::parse(r#""string""#).unwrap();
        assert_eq!(primitive.name(), "string");

        let unnamed = Schema::parse(r#"["null","long"]"#).unwrap();
        assert_eq!(unnamed.name(), "anonymous");
    }

    #[test]
    fn invalid_json_is_rejected() {
        assert!(matches!(
            Schema::parse("{not json"),
            Err(TypeError::InvalidSchema(_))
        ));
    }

    #[test]
    fn from_bytes_matches_parse() {
        let schema = Schema::parse(r#"{"name":"X","type":"record","fields":[]}"#).unwrap();
        let reloaded = Schema::from_bytes(schema.as_bytes()).unwrap();
        assert_eq!(schema, reloaded);
    }

    proptest! {
        #[test]
        fn canonicalization_is_idempotent(name in "[A-Za-z][A-Za-z0-9_]{0,16}", n in 0usize..4) {
            let fields: Vec<String> = (0..n)
                .map(|i| format!(r#"{{"name":"f{i}","type":"string"}}"#))
                .collect();
            let def = format!(
                r#"{{ "type": "record", "name": "{name}", "fields": [{}] }}"#,
                fields.join(",")
            );
            let once = Schema::parse(&def).unwrap();
            let twice = Schema::parse(once.definition()).unwrap();
            prop_assert_eq!(once.definition(), twice.definition());
            prop_assert_eq!(once.name(), name.as_str());
        }
    }
}
