//! Namespaces: unit allowlist, free segment pool, experiments, routing.

use std::collections::{BTreeMap, HashSet};

use rand::Rng;

use crate::error::{ConfigError, EvalError};
use crate::experiment::{Experiment, Param, ParamValue};
use crate::hash::{HashPipeline, Unit};
use crate::segments::{SEGMENT_COUNT, SegmentSet};

/// Caller identity as supplied on a request: unit key to value.
pub type UnitMap = BTreeMap<String, String>;

/// Outcome of routing one caller through one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub experiment: String,
    pub params: Vec<ParamValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    name: String,
    team_ids: Vec<String>,
    units: Vec<String>,
    segments: SegmentSet,
    experiments: Vec<Experiment>,
}

impl Namespace {
    /// A namespace with every segment free. Fails when `units` is empty.
    pub fn new<I, S>(
        name: impl Into<String>,
        team_id: impl Into<String>,
        units: I,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let units: Vec<String> = units.into_iter().map(Into::into).collect();
        if units.is_empty() {
            return Err(ConfigError::NoUnits { namespace: name });
        }
        Ok(Self {
            name,
            team_ids: vec![team_id.into()],
            units,
            segments: SegmentSet::full(),
            experiments: Vec::new(),
        })
    }

    /// Reassemble a namespace read back from storage and check its invariants.
    pub fn from_parts(
        name: impl Into<String>,
        team_ids: Vec<String>,
        units: Vec<String>,
        segments: SegmentSet,
        experiments: Vec<Experiment>,
    ) -> Result<Self, ConfigError> {
        let ns = Self {
            name: name.into(),
            team_ids,
            units,
            segments,
            experiments,
        };
        ns.validate()?;
        Ok(ns)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn team_ids(&self) -> &[String] {
        &self.team_ids
    }

    #[must_use]
    pub fn units(&self) -> &[String] {
        &self.units
    }

    /// The free pool: segments no experiment owns.
    #[must_use]
    pub fn segments(&self) -> &SegmentSet {
        &self.segments
    }

    #[must_use]
    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    /// Make the namespace visible to another team as well.
    pub fn add_team(&mut self, team_id: impl Into<String>) {
        let team_id = team_id.into();
        if !self.team_ids.contains(&team_id) {
            self.team_ids.push(team_id);
        }
    }

    /// [`Namespace::add_experiment_with_rng`] using the thread RNG.
    pub fn add_experiment(
        &mut self,
        name: impl Into<String>,
        params: Vec<Param>,
        num_segments: usize,
    ) -> Result<(), ConfigError> {
        self.add_experiment_with_rng(name, params, num_segments, &mut rand::thread_rng())
    }

    /// Claim `num_segments` free segments at random for a new experiment.
    ///
    /// Configuration-time only: never call this on a namespace that is part
    /// of a published snapshot.
    pub fn add_experiment_with_rng<R: Rng + ?Sized>(
        &mut self,
        name: impl Into<String>,
        params: Vec<Param>,
        num_segments: usize,
        rng: &mut R,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if self.experiments.iter().any(|e| e.name() == name) {
            return Err(ConfigError::DuplicateExperiment {
                namespace: self.name.clone(),
                experiment: name,
            });
        }
        let owned = self.segments.sample(num_segments, rng).map_err(|e| {
            ConfigError::NotEnoughSegments {
                namespace: self.name.clone(),
                experiment: name.clone(),
                requested: e.requested,
                available: e.available,
            }
        })?;
        self.experiments.push(Experiment::new(name, params, owned));
        Ok(())
    }

    /// Project a caller's units onto this namespace's declared keys, in
    /// declaration order. Missing keys hash as the empty string.
    #[must_use]
    pub fn project<'a>(&'a self, units: &'a UnitMap) -> Vec<Unit<'a>> {
        self.units
            .iter()
            .map(|key| Unit {
                key,
                value: units.get(key).map_or("", String::as_str),
            })
            .collect()
    }

    fn pipeline(&self, salt: &str, units: &[Unit<'_>]) -> HashPipeline {
        let mut pipeline = HashPipeline::new(salt);
        pipeline.push(self.name.as_bytes()).push_units(units);
        pipeline
    }

    /// Segment index in `[0, 128)` the caller hashes to.
    #[must_use]
    pub fn segment_for(&self, salt: &str, units: &[Unit<'_>]) -> usize {
        self.pipeline(salt, units)
            .draw()
            .uniform(0, SEGMENT_COUNT as u64) as usize
    }

    /// Route the caller to at most one experiment.
    ///
    /// `Ok(None)` means the caller landed on a free segment.
    pub fn eval(&self, salt: &str, units: &[Unit<'_>]) -> Result<Option<Assignment>, EvalError> {
        let pipeline = self.pipeline(salt, units);
        let segment = pipeline.draw().uniform(0, SEGMENT_COUNT as u64) as usize;
        if self.segments.contains(segment) {
            return Ok(None);
        }
        match self
            .experiments
            .iter()
            .find(|e| e.segments().contains(segment))
        {
            Some(exp) => Ok(Some(Assignment {
                experiment: exp.name().to_string(),
                params: exp.eval(&pipeline),
            })),
            None => Err(EvalError::UnownedSegment {
                namespace: self.name.clone(),
                segment,
            }),
        }
    }

    /// Check unit keys, experiment name uniqueness, and that free pool plus
    /// owned segments tile the 128 slots exactly once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.units.is_empty() {
            return Err(ConfigError::NoUnits {
                namespace: self.name.clone(),
            });
        }
        let mut names = HashSet::with_capacity(self.experiments.len());
        let mut covered = self.segments;
        for exp in &self.experiments {
            if !names.insert(exp.name()) {
                return Err(ConfigError::DuplicateExperiment {
                    namespace: self.name.clone(),
                    experiment: exp.name().to_string(),
                });
            }
            if !covered.is_disjoint(exp.segments()) {
                return Err(ConfigError::OverlappingSegments {
                    namespace: self.name.clone(),
                    experiment: exp.name().to_string(),
                });
            }
            covered = covered.union(exp.segments());
        }
        let missing = SEGMENT_COUNT - covered.count();
        if missing != 0 {
            return Err(ConfigError::UnclaimedSegments {
                namespace: self.name.clone(),
                missing,
            });
        }
        Ok(())
    }
}
