//! JSON document provider.
//!
//! Document shape:
//!
//! ```json
//! {"namespaces": [{
//!     "name": "t4", "team_ids": ["test"], "units": ["userid"],
//!     "segments": "00000000000000000000000000000000",
//!     "experiments": [{
//!         "name": "multi", "segments": "ffffffffffffffffffffffffffffffff",
//!         "params": [
//!             {"name": "a", "type": "uniform", "choices": ["on", "off"]},
//!             {"name": "b", "type": "weighted", "choices": ["up", "down"], "weights": [1, 2]}
//!         ]
//!     }]
//! }]}
//! ```

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::Storage;
use crate::error::{ConfigError, StorageError};
use crate::experiment::{Experiment, Param};
use crate::namespace::Namespace;
use crate::segments::SegmentSet;
use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub namespaces: Vec<NamespaceDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceDoc {
    pub name: String,
    #[serde(default)]
    pub team_ids: Vec<String>,
    pub units: Vec<String>,
    /// Free pool, 32 hex characters.
    pub segments: String,
    #[serde(default)]
    pub experiments: Vec<ExperimentDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentDoc {
    pub name: String,
    /// Owned segments, 32 hex characters.
    pub segments: String,
    #[serde(default)]
    pub params: Vec<ParamDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDoc {
    pub name: String,
    #[serde(flatten)]
    pub value: ValueDoc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ValueDoc {
    Uniform {
        choices: Vec<String>,
    },
    Weighted {
        choices: Vec<String>,
        weights: Vec<f64>,
    },
}

impl ConfigDocument {
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        Ok(serde_json::from_str(raw)?)
    }

    #[must_use]
    pub fn from_namespaces(namespaces: &[Namespace]) -> Self {
        Self {
            namespaces: namespaces.iter().map(NamespaceDoc::from).collect(),
        }
    }

    /// Build and validate every namespace in the document.
    pub fn into_namespaces(self) -> Result<Vec<Namespace>, ConfigError> {
        self.namespaces
            .into_iter()
            .map(Namespace::try_from)
            .collect()
    }

    pub fn to_json_pretty(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), StorageError> {
        let mut body = self.to_json_pretty()?;
        body.push('\n');
        std::fs::write(path, body)?;
        Ok(())
    }
}

fn decode_segments(owner: &str, hex: &str) -> Result<SegmentSet, ConfigError> {
    SegmentSet::from_hex(hex).map_err(|reason| ConfigError::InvalidSegmentEncoding {
        owner: owner.to_string(),
        reason,
    })
}

impl From<&Namespace> for NamespaceDoc {
    fn from(ns: &Namespace) -> Self {
        Self {
            name: ns.name().to_string(),
            team_ids: ns.team_ids().to_vec(),
            units: ns.units().to_vec(),
            segments: ns.segments().to_hex(),
            experiments: ns.experiments().iter().map(ExperimentDoc::from).collect(),
        }
    }
}

impl From<&Experiment> for ExperimentDoc {
    fn from(exp: &Experiment) -> Self {
        Self {
            name: exp.name().to_string(),
            segments: exp.segments().to_hex(),
            params: exp.params().iter().map(ParamDoc::from).collect(),
        }
    }
}

impl From<&Param> for ParamDoc {
    fn from(param: &Param) -> Self {
        let value = match &param.value {
            Value::Uniform(u) => ValueDoc::Uniform {
                choices: u.choices().to_vec(),
            },
            Value::Weighted(w) => ValueDoc::Weighted {
                choices: w.choices().to_vec(),
                weights: w.weights().to_vec(),
            },
        };
        Self {
            name: param.name.clone(),
            value,
        }
    }
}

impl TryFrom<ParamDoc> for Param {
    type Error = ConfigError;

    fn try_from(doc: ParamDoc) -> Result<Self, Self::Error> {
        match doc.value {
            ValueDoc::Uniform { choices } => Param::uniform(doc.name, choices),
            ValueDoc::Weighted { choices, weights } => Param::weighted(doc.name, choices, weights),
        }
    }
}

impl TryFrom<ExperimentDoc> for Experiment {
    type Error = ConfigError;

    fn try_from(doc: ExperimentDoc) -> Result<Self, Self::Error> {
        let segments = decode_segments(&doc.name, &doc.segments)?;
        let params = doc
            .params
            .into_iter()
            .map(Param::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Experiment::new(doc.name, params, segments))
    }
}

impl TryFrom<NamespaceDoc> for Namespace {
    type Error = ConfigError;

    fn try_from(doc: NamespaceDoc) -> Result<Self, Self::Error> {
        let segments = decode_segments(&doc.name, &doc.segments)?;
        let experiments = doc
            .experiments
            .into_iter()
            .map(Experiment::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Namespace::from_parts(doc.name, doc.team_ids, doc.units, segments, experiments)
    }
}

/// Provider backed by a JSON document on disk.
///
/// `update` re-reads the whole file and only replaces the cached namespaces
/// when every one of them parses and validates.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    namespaces: RwLock<Vec<Namespace>>,
}

impl JsonFileStore {
    /// A provider with nothing cached yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            namespaces: RwLock::new(Vec::new()),
        }
    }

    /// A provider that has already loaded `path` once.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let store = Self::new(path);
        store.update()?;
        Ok(store)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for JsonFileStore {
    fn update(&self) -> Result<(), StorageError> {
        let raw = std::fs::read_to_string(&self.path)?;
        let namespaces = ConfigDocument::parse(&raw)?.into_namespaces()?;
        *self.namespaces.write() = namespaces;
        Ok(())
    }

    fn read(&self) -> Vec<Namespace> {
        self.namespaces.read().clone()
    }

    fn ready(&self) -> Result<(), StorageError> {
        let meta = std::fs::metadata(&self.path)?;
        if meta.is_file() {
            Ok(())
        } else {
            Err(StorageError::Unavailable(format!(
                "{} is not a regular file",
                self.path.display()
            )))
        }
    }
}
