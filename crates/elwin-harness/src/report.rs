//! Configuration summary produced by `elwin validate`.

use elwin_core::{Namespace, Value};
use serde::Serialize;

use crate::{HarnessError, OutputFormat};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigReport {
    pub namespaces: Vec<NamespaceSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespaceSummary {
    pub name: String,
    pub team_ids: Vec<String>,
    pub units: Vec<String>,
    pub free_segments: usize,
    pub experiments: Vec<ExperimentSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentSummary {
    pub name: String,
    pub segments: usize,
    pub params: Vec<ParamSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSummary {
    pub name: String,
    pub kind: &'static str,
    pub choices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f64>>,
}

impl ConfigReport {
    #[must_use]
    pub fn from_namespaces(namespaces: &[Namespace]) -> Self {
        Self {
            namespaces: namespaces.iter().map(summarize).collect(),
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String, HarnessError> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Plain => Ok(self.render_plain()),
        }
    }

    #[must_use]
    pub fn render_plain(&self) -> String {
        use std::fmt::Write as _;

        let mut out = String::new();
        writeln!(out, "configuration ok (namespaces={})", self.namespaces.len()).ok();
        for ns in &self.namespaces {
            writeln!(
                out,
                "{} teams=[{}] units=[{}] free={}",
                ns.name,
                ns.team_ids.join(","),
                ns.units.join(","),
                ns.free_segments
            )
            .ok();
            for exp in &ns.experiments {
                writeln!(out, "  {} segments={}", exp.name, exp.segments).ok();
                for param in &exp.params {
                    match &param.weights {
                        Some(weights) => writeln!(
                            out,
                            "    {} {} {:?} {:?}",
                            param.name, param.kind, param.choices, weights
                        ),
                        None => writeln!(
                            out,
                            "    {} {} {:?}",
                            param.name, param.kind, param.choices
                        ),
                    }
                    .ok();
                }
            }
        }
        out
    }
}

fn summarize(ns: &Namespace) -> NamespaceSummary {
    NamespaceSummary {
        name: ns.name().to_string(),
        team_ids: ns.team_ids().to_vec(),
        units: ns.units().to_vec(),
        free_segments: ns.segments().count(),
        experiments: ns
            .experiments()
            .iter()
            .map(|exp| ExperimentSummary {
                name: exp.name().to_string(),
                segments: exp.segments().count(),
                params: exp
                    .params()
                    .iter()
                    .map(|param| {
                        let (kind, weights) = match &param.value {
                            Value::Uniform(_) => ("uniform", None),
                            Value::Weighted(w) => ("weighted", Some(w.weights().to_vec())),
                        };
                        ParamSummary {
                            name: param.name.clone(),
                            kind,
                            choices: param.value.choices().to_vec(),
                            weights,
                        }
                    })
                    .collect(),
            })
            .collect(),
    }
}
