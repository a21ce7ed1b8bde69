/// A value type that can be stored in a VBase object store.
///
/// `SCHEMA` is the JSON definition of the type as it is written today. The
/// store registers it on every write and records its hash in the row, so the
/// definition a row was written with can always be recovered.
pub trait Record: Clone + Send + Sync + 'static {
    /// JSON schema definition for this type.
    const SCHEMA: &'static str;
}
