use parking_lot::RwLock;

use super::Storage;
use crate::error::StorageError;
use crate::namespace::Namespace;

/// In-memory provider; `update` has nothing to pull.
#[derive(Debug, Default)]
pub struct MemStore {
    namespaces: RwLock<Vec<Namespace>>,
}

impl MemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_namespaces(namespaces: Vec<Namespace>) -> Self {
        Self {
            namespaces: RwLock::new(namespaces),
        }
    }

    /// Add or replace (by name) one namespace.
    pub fn add_namespace(&self, namespace: Namespace) {
        let mut guard = self.namespaces.write();
        match guard.iter().position(|ns| ns.name() == namespace.name()) {
            Some(index) => guard[index] = namespace,
            None => guard.push(namespace),
        }
    }

    pub fn remove_namespace(&self, name: &str) -> bool {
        let mut guard = self.namespaces.write();
        let before = guard.len();
        guard.retain(|ns| ns.name() != name);
        guard.len() != before
    }

    pub fn replace_all(&self, namespaces: Vec<Namespace>) {
        *self.namespaces.write() = namespaces;
    }
}

impl Storage for MemStore {
    fn update(&self) -> Result<(), StorageError> {
        Ok(())
    }

    fn read(&self) -> Vec<Namespace> {
        self.namespaces.read().clone()
    }

    fn ready(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
