//! Explicit name registry.
//!
//! Entries are registered once at startup under a canonical name. Lookups
//! try an exact (case-insensitive) match first, then a case-insensitive
//! prefix match. When several entries share the prefix, the one registered
//! first wins.

/// Error type for registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("An entry named '{0}' is already registered")]
    Duplicate(String),

    #[error("No entry registered with a name like '{0}'")]
    NotFound(String),

    #[error("Registry names must not be empty")]
    EmptyName,
}

/// Canonical name → entry mapping, kept in registration order.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entry` under `name`. Names are unique ignoring case.
    pub fn register(&mut self, name: impl Into<String>, entry: T) -> Result<(), RegistryError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.position_exact(&name).is_some() {
            return Err(RegistryError::Duplicate(name));
        }
        self.entries.push((name, entry));
        Ok(())
    }

    /// Find the entry for `query`: exact match first, then first prefix match.
    pub fn lookup(&self, query: &str) -> Option<(&str, &T)> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        let index = self.position_exact(query).or_else(|| {
            let query = query.to_lowercase();
            self.entries
                .iter()
                .position(|(name, _)| name.to_lowercase().starts_with(&query))
        })?;
        let (name, entry) = &self.entries[index];
        Some((name.as_str(), entry))
    }

    /// Like [`lookup`](Self::lookup), failing with [`RegistryError::NotFound`].
    pub fn resolve(&self, query: &str) -> Result<(&str, &T), RegistryError> {
        self.lookup(query)
            .ok_or_else(|| RegistryError::NotFound(query.to_string()))
    }

    /// Canonical names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position_exact(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
