//! Deterministic experiment assignment.
//!
//! Given a team and a caller's units, [`Registry::namespaces`] decides which
//! variant of every active experiment the caller falls into, with no
//! coordinator round trip and no per-user state. The same salt, configuration
//! and units give the same answer on every host.
//!
//! Pipeline, leaves first:
//! - [`hash`]: salt + namespace + units (+ experiment + param) to a 64-bit draw.
//! - [`segments`]: 128-slot bitmask and unbiased sampling of free slots.
//! - [`value`]: uniform and weighted choice from a draw.
//! - [`experiment`] / [`namespace`]: segment routing and param resolution.
//! - [`snapshot`] / [`registry`]: immutable generations behind an atomic swap.
//! - [`storage`] / [`refresh`]: where generations come from, and how often.

pub mod config;
pub mod error;
pub mod example;
pub mod experiment;
pub mod hash;
pub mod namespace;
pub mod refresh;
pub mod registry;
pub mod segments;
pub mod snapshot;
pub mod storage;
pub mod structured_log;
pub mod value;

pub use config::EngineConfig;
pub use error::{ConfigError, EvalError, RefreshError, StorageError, ValueError};
pub use experiment::{Experiment, Param, ParamValue};
pub use namespace::{Assignment, Namespace, UnitMap};
pub use refresh::Refresher;
pub use registry::Registry;
pub use segments::{SEGMENT_COUNT, SegmentSet};
pub use snapshot::{Response, Snapshot};
pub use storage::{JsonFileStore, MemStore, Storage};
pub use value::{Uniform, Value, Weighted};
