use vbase_types::{Schema, SchemaHash};

/// Domain-separated BLAKE3 hasher for schema definitions.
///
/// The domain tag is prepended to every computation, so a schema digest can
/// never collide with a digest of the same bytes taken for another purpose.
#[derive(Clone, Copy, Debug)]
pub struct SchemaHasher {
    domain: &'static str,
}

impl SchemaHasher {
    /// Hasher for registered schema definitions.
    pub const SCHEMA: Self = Self {
        domain: "vbase-schema-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> SchemaHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        SchemaHash::from_digest(*hasher.finalize().as_bytes())
    }

    /// Hash the canonical bytes of a schema.
    pub fn hash_schema(&self, schema: &Schema) -> SchemaHash {
        self.hash(schema.as_bytes())
    }

    /// Verify that data produces the expected hash.
    pub fn verify(&self, data: &[u8], expected: &SchemaHash) -> bool {
        self.hash(data) == *expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let a = SchemaHasher::SCHEMA.hash(b"{}");
        let b = SchemaHasher::SCHEMA.hash(b"{}");
        assert_eq!(a, b);
    }

    #[test]
    fn equivalent_definitions_share_a_hash() {
        let a = Schema::parse(r#"{"name":"A","type":"record","fields":[]}"#).unwrap();
        let b = Schema::parse(r#"{ "type": "record", "fields": [], "name": "A" }"#).unwrap();
        assert_eq!(
            SchemaHasher::SCHEMA.hash_schema(&a),
            SchemaHasher::SCHEMA.hash_schema(&b)
        );
    }

    #[test]
    fn different_definitions_differ() {
        let a = Schema::parse(r#"{"name":"A","type":"record","fields":[]}"#).unwrap();
        let b = Schema::parse(r#"{"name":"B","type":"record","fields":[]}"#).unwrap();
        assert_ne!(
            SchemaHasher::SCHEMA.hash_schema(&a),
            SchemaHasher::SCHEMA.hash_schema(&b)
        );
    }

    #[test]
    fn domain_separates() {
        let plain = SchemaHash::from_digest(*blake3::hash(b"data").as_bytes());
        assert_ne!(SchemaHasher::SCHEMA.hash(b"data"), plain);
    }

    #[test]
    fn verify_detects_tampering() {
        let hash = SchemaHasher::SCHEMA.hash(b"original");
        assert!(SchemaHasher::SCHEMA.verify(b"original", &hash));
        assert!(!SchemaHasher::SCHEMA.verify(b"tampered", &hash));
    }
}
