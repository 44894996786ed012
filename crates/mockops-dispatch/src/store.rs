//! Response store
//!
//! Provides [`ResponseStore`], the ordered response collection owned by one
//! mock operation.
//!
//! # Invariants
//! - Entry names are unique and non-empty.
//! - The default name is empty or names an entry, except after the default
//!   entry is removed: the name then dangles and [`ResponseStore::default_response`]
//!   reports no default.
//! - Renaming the default entry moves the default in the same call.

use crate::error::StoreError;
use crate::response::ResponseDefinition;
use std::sync::Arc;

/// Ordered, uniquely named responses with one default designation
#[derive(Debug, Clone, Default)]
pub struct ResponseStore {
    entries: Vec<Arc<ResponseDefinition>>,
    default_name: String,
}

impl ResponseStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted parts
    ///
    /// Entries are loaded as persisted: the first entry is not promoted to
    /// default. The persisted default is kept even if it names no entry.
    ///
    /// # Errors
    /// `StoreError::DuplicateName` / `StoreError::EmptyName` on invalid entries
    pub fn from_parts(
        entries: impl IntoIterator<Item = ResponseDefinition>,
        default_name: Option<String>,
    ) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for entry in entries {
            store.push(entry)?;
        }
        let name = default_name.unwrap_or_default();
        if !name.is_empty() && store.by_name(&name).is_none() {
            tracing::warn!("persisted default response [{}] does not exist", name);
        }
        store.default_name = name;
        Ok(store)
    }

    /// Append a response
    ///
    /// The first entry added to an empty store becomes the default.
    ///
    /// # Returns
    /// Index of the new entry
    ///
    /// # Errors
    /// - `StoreError::EmptyName` for an empty name
    /// - `StoreError::DuplicateName` if the name is taken
    pub fn add(&mut self, definition: ResponseDefinition) -> Result<usize, StoreError> {
        let index = self.push(definition)?;
        if index == 0 {
            self.default_name.clone_from(&self.entries[0].name);
        }
        Ok(index)
    }

    fn push(&mut self, definition: ResponseDefinition) -> Result<usize, StoreError> {
        if definition.name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        if self.index_of(&definition.name).is_some() {
            return Err(StoreError::DuplicateName(definition.name));
        }
        self.entries.push(Arc::new(definition));
        Ok(self.entries.len() - 1)
    }

    /// Remove the entry at `index`
    ///
    /// Removing the default entry does not pick a new default.
    ///
    /// # Errors
    /// `StoreError::IndexOutOfRange` if `index >= len()`
    pub fn remove_at(&mut self, index: usize) -> Result<Arc<ResponseDefinition>, StoreError> {
        if index >= self.entries.len() {
            return Err(StoreError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.remove(index))
    }

    /// Rename an entry
    ///
    /// # Returns
    /// `true` if the renamed entry was the default (and the default moved)
    ///
    /// # Errors
    /// - `StoreError::UnknownResponse` if `old` is not present
    /// - `StoreError::DuplicateName` if `new` is taken by another entry
    /// - `StoreError::EmptyName` for an empty new name
    pub fn rename(&mut self, old: &str, new: &str) -> Result<bool, StoreError> {
        if new.is_empty() {
            return Err(StoreError::EmptyName);
        }
        let index = self
            .index_of(old)
            .ok_or_else(|| StoreError::UnknownResponse(old.to_string()))?;
        if old == new {
            return Ok(false);
        }
        if self.index_of(new).is_some() {
            return Err(StoreError::DuplicateName(new.to_string()));
        }

        let mut renamed = ResponseDefinition::clone(&self.entries[index]);
        renamed.name = new.to_string();
        self.entries[index] = Arc::new(renamed);

        let was_default = self.default_name == old;
        if was_default {
            self.default_name = new.to_string();
        }
        Ok(was_default)
    }

    /// Replace the content of an entry
    ///
    /// # Errors
    /// `StoreError::UnknownResponse` if `name` is not present
    pub fn set_content(&mut self, name: &str, content: impl Into<String>) -> Result<(), StoreError> {
        let index = self
            .index_of(name)
            .ok_or_else(|| StoreError::UnknownResponse(name.to_string()))?;
        let mut updated = ResponseDefinition::clone(&self.entries[index]);
        updated.content = content.into();
        self.entries[index] = Arc::new(updated);
        Ok(())
    }

    /// Entry by name
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<Arc<ResponseDefinition>> {
        self.entries.iter().find(|e| e.name == name).cloned()
    }

    /// Entry by index
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Arc<ResponseDefinition>> {
        self.entries.get(index).cloned()
    }

    /// Index of a name
    #[inline]
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Designate the default response
    ///
    /// An empty name clears the designation.
    ///
    /// # Errors
    /// `StoreError::UnknownResponse` if a non-empty name is not present
    pub fn set_default(&mut self, name: &str) -> Result<(), StoreError> {
        if !name.is_empty() && self.index_of(name).is_none() {
            return Err(StoreError::UnknownResponse(name.to_string()));
        }
        self.default_name = name.to_string();
        Ok(())
    }

    /// Current default name (may be empty or dangling)
    #[inline]
    #[must_use]
    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Default entry, if the default name resolves
    #[must_use]
    pub fn default_response(&self) -> Option<Arc<ResponseDefinition>> {
        if self.default_name.is_empty() {
            return None;
        }
        self.by_name(&self.default_name)
    }

    /// Iterate entries in order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResponseDefinition>> {
        self.entries.iter()
    }

    /// Entry names in order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }
}
