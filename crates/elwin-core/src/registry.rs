//! The live snapshot registry.
//!
//! Readers take the read lock only long enough to clone an `Arc` to the
//! current [`Snapshot`]; evaluation then runs lock-free against that one
//! generation. Publishing builds and validates the next snapshot off to the
//! side and swaps the `Arc` under the write lock, so a reader sees either the
//! old generation or the new one, never a mix.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

use crate::config::EngineConfig;
use crate::error::{ConfigError, EvalError, RefreshError, StorageError};
use crate::namespace::{Namespace, UnitMap};
use crate::snapshot::{Response, Snapshot};
use crate::storage::Storage;
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};

/// Unit key used by [`Registry::resolve_user`].
pub const USER_ID_UNIT: &str = "userid";

#[derive(Debug)]
pub struct Registry {
    config: EngineConfig,
    current: RwLock<Arc<Snapshot>>,
    // Serializes publishers and holds the last generation handed out.
    publish: Mutex<u64>,
    emitter: Option<Mutex<LogEmitter>>,
}

impl Registry {
    /// A registry serving an empty generation-0 snapshot.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            current: RwLock::new(Arc::new(Snapshot::default())),
            publish: Mutex::new(0),
            emitter: None,
        }
    }

    /// Route registry events to `emitter`.
    #[must_use]
    pub fn with_emitter(mut self, emitter: LogEmitter) -> Self {
        self.emitter = Some(Mutex::new(emitter));
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current generation. Holding it pins that generation for as long
    /// as the caller needs it.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read())
    }

    /// Resolve every experiment the caller is in across the team's namespaces.
    pub fn namespaces(&self, team_id: &str, units: &UnitMap) -> Result<Response, EvalError> {
        self.snapshot().resolve(self.config.salt(), team_id, units)
    }

    /// [`Registry::namespaces`] keyed on a single user id.
    pub fn resolve_user(&self, team_id: &str, user_id: &str) -> Result<Response, EvalError> {
        let units = UnitMap::from([(USER_ID_UNIT.to_string(), user_id.to_string())]);
        self.namespaces(team_id, &units)
    }

    /// Validate `namespaces` as the next generation and swap it in.
    ///
    /// On error the current snapshot is left untouched.
    pub fn publish(&self, namespaces: Vec<Namespace>) -> Result<u64, ConfigError> {
        let mut last = self.publish.lock();
        let generation = *last + 1;
        let count = namespaces.len();
        let next = Arc::new(Snapshot::build(generation, namespaces)?);
        *self.current.write() = next;
        *last = generation;
        drop(last);
        self.log(
            LogEntry::new(LogLevel::Info, "snapshot.published")
                .with_generation(generation)
                .with_namespace_count(count)
                .with_outcome(Outcome::Ok),
        );
        Ok(generation)
    }

    /// Pull from `storage` and publish what it returns.
    ///
    /// Any failure is logged and returned; the previous snapshot keeps serving.
    pub fn refresh(&self, storage: &dyn Storage) -> Result<u64, RefreshError> {
        let started = Instant::now();
        let result = storage
            .update()
            .map_err(RefreshError::from)
            .and_then(|()| self.publish(storage.read()).map_err(RefreshError::from));
        if let Err(err) = &result {
            let outcome = match err {
                RefreshError::Storage(_) => Outcome::Failed,
                RefreshError::Config(_) => Outcome::Rejected,
            };
            self.log(
                LogEntry::new(LogLevel::Warn, "refresh.failed")
                    .with_generation(self.snapshot().generation())
                    .with_outcome(outcome)
                    .with_duration_ms(started.elapsed().as_millis() as u64)
                    .with_details(serde_json::json!({ "error": err.to_string() })),
            );
        }
        result
    }

    /// Storage health check.
    pub fn ready(&self, storage: &dyn Storage) -> Result<(), StorageError> {
        storage.ready()
    }

    pub(crate) fn log(&self, entry: LogEntry) {
        if let Some(emitter) = &self.emitter {
            // Logging must never disturb serving.
            let _ = emitter.lock().emit_entry(entry);
        }
    }
}
