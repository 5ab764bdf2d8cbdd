//! Immutable generations of namespace configuration.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::error::{ConfigError, EvalError};
use crate::experiment::ParamValue;
use crate::namespace::{Namespace, UnitMap};

/// Assignments for one request, keyed by experiment name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Response {
    pub experiments: BTreeMap<String, Vec<ParamValue>>,
}

impl Response {
    fn add(&mut self, experiment: String, params: Vec<ParamValue>) {
        self.experiments.insert(experiment, params);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    #[must_use]
    pub fn get(&self, experiment: &str) -> Option<&[ParamValue]> {
        self.experiments.get(experiment).map(Vec::as_slice)
    }

    /// Resolved value of one param, if the caller is in that experiment.
    #[must_use]
    pub fn value(&self, experiment: &str, param: &str) -> Option<&str> {
        self.get(experiment)?
            .iter()
            .find(|p| p.name == param)
            .map(|p| p.value.as_str())
    }
}

/// One consistent generation of every active namespace.
#[derive(Debug, Default)]
pub struct Snapshot {
    generation: u64,
    namespaces: Vec<Namespace>,
    by_team: HashMap<String, Vec<usize>>,
}

impl Snapshot {
    /// Validate every namespace and index them by team.
    pub fn build(generation: u64, namespaces: Vec<Namespace>) -> Result<Self, ConfigError> {
        let mut names = HashSet::with_capacity(namespaces.len());
        let mut by_team: HashMap<String, Vec<usize>> = HashMap::new();
        // Responses are keyed by experiment name, so a name may appear only
        // once across everything one team can see.
        let mut owners: HashMap<(&str, &str), &str> = HashMap::new();
        for (index, ns) in namespaces.iter().enumerate() {
            if !names.insert(ns.name()) {
                return Err(ConfigError::DuplicateNamespace {
                    namespace: ns.name().to_string(),
                });
            }
            ns.validate()?;
            for team in ns.team_ids() {
                for exp in ns.experiments() {
                    if let Some(first) = owners.insert((team.as_str(), exp.name()), ns.name()) {
                        return Err(ConfigError::ExperimentNameClash {
                            team_id: team.clone(),
                            experiment: exp.name().to_string(),
                            first: first.to_string(),
                            second: ns.name().to_string(),
                        });
                    }
                }
                by_team.entry(team.clone()).or_default().push(index);
            }
        }
        Ok(Self {
            generation,
            namespaces,
            by_team,
        })
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.name() == name)
    }

    /// Namespaces visible to `team_id`, in load order.
    pub fn namespaces_for<'a>(&'a self, team_id: &str) -> impl Iterator<Item = &'a Namespace> + 'a {
        self.by_team
            .get(team_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(move |&i| &self.namespaces[i])
    }

    /// Evaluate every namespace of `team_id` for this caller.
    ///
    /// Namespaces where the caller lands on a free segment contribute nothing.
    /// The first evaluation error aborts the whole response.
    pub fn resolve(&self, salt: &str, team_id: &str, units: &UnitMap) -> Result<Response, EvalError> {
        let mut response = Response::default();
        for ns in self.namespaces_for(team_id) {
            let projected = ns.project(units);
            if let Some(assignment) = ns.eval(salt, &projected)? {
                response.add(assignment.experiment, assignment.params);
            }
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::Param;
    use crate::segments::SEGMENT_COUNT;

    fn whole(name: &str, team: &str, exp: &str) -> Namespace {
        let mut ns = Namespace::new(name, team, ["userid"]).expect("ns");
        ns.add_experiment(
            exp,
            vec![Param::uniform("p", ["x", "y"]).expect("p")],
            SEGMENT_COUNT,
        )
        .expect("exp");
        ns
    }

    fn user(id: &str) -> UnitMap {
        UnitMap::from([("userid".to_string(), id.to_string())])
    }

    #[test]
    fn build_rejects_duplicate_namespace() {
        let err = Snapshot::build(1, vec![whole("a", "t", "e1"), whole("a", "t", "e2")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateNamespace {
                namespace: "a".into()
            }
        );
    }

    #[test]
    fn build_rejects_experiment_name_shared_within_team() {
        let err = Snapshot::build(1, vec![whole("first", "t", "shared"), whole("second", "t", "shared")])
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::ExperimentNameClash {
                team_id: "t".into(),
                experiment: "shared".into(),
                first: "first".into(),
                second: "second".into(),
            }
        );

        // Reached through a second team membership.
        let mut blue = whole("blue-ns", "blue", "shared");
        blue.add_team("t");
        assert!(matches!(
            Snapshot::build(1, vec![whole("first", "t", "shared"), blue]),
            Err(ConfigError::ExperimentNameClash { .. })
        ));

        // Different teams may reuse a name.
        let snap = Snapshot::build(1, vec![whole("first", "t", "shared"), whole("other", "u", "shared")])
            .expect("build");
        assert_eq!(snap.resolve("choices", "t", &user("1")).expect("t").len(), 1);
        assert_eq!(snap.resolve("choices", "u", &user("1")).expect("u").len(), 1);
    }

    #[test]
    fn team_index_covers_multi_team_namespaces() {
        let mut shared = whole("shared", "red", "s");
        shared.add_team("blue");
        let snap = Snapshot::build(3, vec![whole("r", "red", "r1"), shared]).expect("build");
        let red: Vec<_> = snap.namespaces_for("red").map(Namespace::name).collect();
        let blue: Vec<_> = snap.namespaces_for("blue").map(Namespace::name).collect();
        assert_eq!(red, vec!["r", "shared"]);
        assert_eq!(blue, vec!["shared"]);
        assert_eq!(snap.namespaces_for("green").count(), 0);
        assert_eq!(snap.generation(), 3);
        assert!(snap.namespace("r").is_some());
    }

    #[test]
    fn resolve_aggregates_by_experiment() {
        let snap = Snapshot::build(1, vec![whole("n1", "t", "e1"), whole("n2", "t", "e2")])
            .expect("build");
        let resp = snap.resolve("choices", "t", &user("42")).expect("resolve");
        assert_eq!(resp.len(), 2);
        assert!(resp.get("e1").is_some());
        assert!(["x", "y"].contains(&resp.value("e2", "p").expect("p")));
        assert_eq!(resp.value("e2", "missing"), None);
    }

    #[test]
    fn unknown_team_gets_empty_response() {
        let snap = Snapshot::build(1, vec![whole("n1", "t", "e1")]).expect("build");
        let resp = snap.resolve("choices", "nobody", &user("1")).expect("resolve");
        assert!(resp.is_empty());
    }

    #[test]
    fn free_namespace_is_omitted() {
        let idle = Namespace::new("idle", "t", ["userid"]).expect("ns");
        let snap = Snapshot::build(1, vec![idle, whole("busy", "t", "e")]).expect("build");
        let resp = snap.resolve("choices", "t", &user("7")).expect("resolve");
        assert_eq!(resp.experiments.keys().collect::<Vec<_>>(), vec!["e"]);
    }
}
