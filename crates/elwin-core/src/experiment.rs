//! Experiments and their parameters.

use serde::Serialize;

use crate::error::{ConfigError, ValueError};
use crate::hash::HashPipeline;
use crate::segments::SegmentSet;
use crate::value::{Uniform, Value, Weighted};

/// One treatment dimension of an experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: Value,
}

impl Param {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Param with a [`Uniform`] distribution.
    pub fn uniform<I, S>(name: impl Into<String>, choices: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        match Uniform::new(choices) {
            Ok(u) => Ok(Self::new(name, u)),
            Err(source) => Err(invalid(name, source)),
        }
    }

    /// Param with a [`Weighted`] distribution.
    pub fn weighted<I, S>(
        name: impl Into<String>,
        choices: I,
        weights: Vec<f64>,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        match Weighted::new(choices, weights) {
            Ok(w) => Ok(Self::new(name, w)),
            Err(source) => Err(invalid(name, source)),
        }
    }
}

fn invalid(param: String, source: ValueError) -> ConfigError {
    ConfigError::InvalidParam { param, source }
}

/// A resolved `(param name, value)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamValue {
    pub name: String,
    pub value: String,
}

/// An experiment and the segments it owns. Segments are fixed at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    name: String,
    params: Vec<Param>,
    segments: SegmentSet,
}

impl Experiment {
    #[must_use]
    pub fn new(name: impl Into<String>, params: Vec<Param>, segments: SegmentSet) -> Self {
        Self {
            name: name.into(),
            params,
            segments,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    #[must_use]
    pub fn segments(&self) -> &SegmentSet {
        &self.segments
    }

    /// Resolve every param. `prefix` already carries salt, namespace and
    /// units; each param draws from `prefix + experiment name + param name`.
    #[must_use]
    pub fn eval(&self, prefix: &HashPipeline) -> Vec<ParamValue> {
        let base = prefix.extended(self.name.as_bytes());
        self.params
            .iter()
            .map(|param| {
                let draw = base.extended(param.name.as_bytes()).draw();
                ParamValue {
                    name: param.name.clone(),
                    value: param.value.eval(draw).to_string(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_constructors_carry_name_into_errors() {
        let err = Param::uniform("color", Vec::<String>::new()).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidParam {
                param: "color".into(),
                source: ValueError::EmptyChoices
            }
        );
        let err = Param::weighted("size", ["s", "m"], vec![1.0]).unwrap_err();
        assert!(err.to_string().starts_with("param 'size'"));
    }

    #[test]
    fn eval_preserves_param_order() {
        let exp = Experiment::new(
            "multi",
            vec![
                Param::uniform("a", ["on", "off"]).expect("a"),
                Param::weighted("b", ["up", "down"], vec![1.0, 2.0]).expect("b"),
            ],
            SegmentSet::full(),
        );
        let prefix = HashPipeline::new("choices").extended(b"t4");
        let out = exp.eval(&prefix);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "a");
        assert_eq!(out[1].name, "b");
        assert!(["on", "off"].contains(&out[0].value.as_str()));
        assert!(["up", "down"].contains(&out[1].value.as_str()));
        assert_eq!(exp.eval(&prefix), out);
    }

    #[test]
    fn experiment_name_feeds_the_draw() {
        let params = vec![Param::uniform("p", (0..64).map(|i| i.to_string())).expect("p")];
        let one = Experiment::new("one", params.clone(), SegmentSet::full());
        let two = Experiment::new("two", params, SegmentSet::full());
        let differs = (0..32).any(|u| {
            let prefix = HashPipeline::new("s").extended(format!("user{u}").as_bytes());
            one.eval(&prefix) != two.eval(&prefix)
        });
        assert!(differs);
    }
}
