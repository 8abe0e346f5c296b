//! Keyed resource ownership with reverse-order teardown.

use crate::error::{HsaError, Result};
use tracing::debug;

/// Resources owned by one test, released last-created-first.
///
/// Anything created later may depend on anything created earlier (a
/// dispatch on its executable, an executable on its code object), so
/// releasing in reverse creation order never frees a resource that a
/// later one still refers to.
#[derive(Debug)]
pub struct ResourceStack<R> {
    entries: Vec<(String, R)>,
}

impl<R> Default for ResourceStack<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<R> ResourceStack<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, resource: R) -> Result<()> {
        let key = key.into();
        if self.contains(&key) {
            return Err(HsaError::DuplicateKey(key));
        }
        debug!(key = %key, "registered resource");
        self.entries.push((key, resource));
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&R> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, r)| r)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Releases everything, newest first.
    pub fn clear(&mut self) {
        while let Some((key, resource)) = self.entries.pop() {
            debug!(key = %key, "releasing resource");
            drop(resource);
        }
    }
}

impl<R> Drop for ResourceStack<R> {
    fn drop(&mut self) {
        self.clear();
    }
}
