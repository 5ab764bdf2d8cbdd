//! Error taxonomy for configuration, evaluation, storage and refresh.

use thiserror::Error;

/// Rejected distribution parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("no choices given")]
    EmptyChoices,
    #[error("{choices} choices but {weights} weights")]
    WeightLengthMismatch { choices: usize, weights: usize },
    #[error("weight {weight} is negative or not finite")]
    InvalidWeight { weight: f64 },
    #[error("weights sum to zero")]
    ZeroTotalWeight,
}

/// A configuration change that must be rejected before it reaches a snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("namespace '{namespace}': no units given")]
    NoUnits { namespace: String },
    #[error(
        "namespace '{namespace}': not enough segments for experiment '{experiment}', want {requested}, have {available}"
    )]
    NotEnoughSegments {
        namespace: String,
        experiment: String,
        requested: usize,
        available: usize,
    },
    #[error("param '{param}': {source}")]
    InvalidParam {
        param: String,
        #[source]
        source: ValueError,
    },
    #[error("namespace '{namespace}': experiment '{experiment}' overlaps another owner's segments")]
    OverlappingSegments {
        namespace: String,
        experiment: String,
    },
    #[error("namespace '{namespace}': {missing} segments are neither free nor owned")]
    UnclaimedSegments { namespace: String, missing: usize },
    #[error("namespace '{namespace}': duplicate experiment '{experiment}'")]
    DuplicateExperiment {
        namespace: String,
        experiment: String,
    },
    #[error("duplicate namespace '{namespace}'")]
    DuplicateNamespace { namespace: String },
    #[error(
        "team '{team_id}': experiment '{experiment}' appears in both namespace '{first}' and '{second}'"
    )]
    ExperimentNameClash {
        team_id: String,
        experiment: String,
        first: String,
        second: String,
    },
    #[error("'{owner}': bad segment encoding: {reason}")]
    InvalidSegmentEncoding { owner: String, reason: String },
}

/// Request-time failure while resolving one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("namespace '{namespace}': segment {segment} is neither free nor owned by an experiment")]
    UnownedSegment { namespace: String, segment: usize },
}

/// Failure reported by a storage provider.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Why a refresh left the current snapshot in place.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("storage update failed: {0}")]
    Storage(#[from] StorageError),
    #[error("snapshot rejected: {0}")]
    Config(#[from] ConfigError),
}
