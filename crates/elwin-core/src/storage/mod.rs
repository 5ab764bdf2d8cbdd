//! Storage contract the registry refreshes from, plus bundled providers.

mod json;
mod mem;

pub use json::{ConfigDocument, ExperimentDoc, JsonFileStore, NamespaceDoc, ParamDoc, ValueDoc};
pub use mem::MemStore;

use crate::error::StorageError;
use crate::namespace::Namespace;

/// A source of namespace configuration.
///
/// `read` must be safe to call while another thread is inside `update`, and
/// must return the last fully parsed set of namespaces.
pub trait Storage: Send + Sync {
    /// Pull a fresh copy from wherever the configuration lives.
    fn update(&self) -> Result<(), StorageError>;

    /// Last successfully updated set of namespaces.
    fn read(&self) -> Vec<Namespace>;

    /// Liveness check.
    fn ready(&self) -> Result<(), StorageError>;
}
