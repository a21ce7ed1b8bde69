/// Settings for one column family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FamilyDescriptor {
    /// Family name.
    pub name: String,
    /// Number of timestamped cells retained per qualifier.
    pub max_versions: u32,
    /// Hint that the family should be kept hot in memory.
    pub in_memory: bool,
}

impl FamilyDescriptor {
    /// A family retaining a single version per cell.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_versions: 1,
            in_memory: false,
        }
    }

    /// Override the number of retained versions (at least one).
    pub fn with_max_versions(mut self, max_versions: u32) -> Self {
        self.max_versions = max_versions.max(1);
        self
    }

    /// Mark the family as memory-resident.
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }
}

/// Definition of a table and its column families.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub families: Vec<FamilyDescriptor>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            families: Vec::new(),
        }
    }

    pub fn with_family(mut self, family: FamilyDescriptor) -> Self {
        self.families.push(family);
        self
    }
}
