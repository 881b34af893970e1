use std::collections::HashSet;

/// Identities claimed during this run.
///
/// Membership is permanent for the run: restoring a concealed item changes
/// its display state but never releases its identity.
#[derive(Debug, Clone, Default)]
pub struct ProcessedIndex {
    identities: HashSet<String>,
}

impl ProcessedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `identity`. Returns false if it was already claimed.
    pub fn insert(&mut self, identity: impl Into<String>) -> bool {
        self.identities.insert(identity.into())
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.identities.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.identities.iter().map(String::as_str)
    }
}
