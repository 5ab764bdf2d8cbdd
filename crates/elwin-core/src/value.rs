//! Value distributions that turn a draw into one configured choice.

use crate::error::ValueError;
use crate::hash::Draw;

/// Every choice equally likely.
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    choices: Vec<String>,
}

impl Uniform {
    pub fn new<I, S>(choices: I) -> Result<Self, ValueError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let choices: Vec<String> = choices.into_iter().map(Into::into).collect();
        if choices.is_empty() {
            return Err(ValueError::EmptyChoices);
        }
        Ok(Self { choices })
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    /// `choices[draw mod N]`.
    #[must_use]
    pub fn eval(&self, draw: Draw) -> &str {
        let index = draw.uniform(0, self.choices.len() as u64) as usize;
        &self.choices[index]
    }
}

/// Choice probability proportional to its weight. Weights need not sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct Weighted {
    choices: Vec<String>,
    weights: Vec<f64>,
    total: f64,
}

impl Weighted {
    pub fn new<I, S>(choices: I, weights: Vec<f64>) -> Result<Self, ValueError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let choices: Vec<String> = choices.into_iter().map(Into::into).collect();
        if choices.is_empty() {
            return Err(ValueError::EmptyChoices);
        }
        if choices.len() != weights.len() {
            return Err(ValueError::WeightLengthMismatch {
                choices: choices.len(),
                weights: weights.len(),
            });
        }
        if let Some(&weight) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(ValueError::InvalidWeight { weight });
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return Err(ValueError::ZeroTotalWeight);
        }
        Ok(Self {
            choices,
            weights,
            total,
        })
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// First choice whose cumulative weight exceeds `x`, where `x` is the
    /// draw scaled onto `[0, total)`. Zero-weight choices are never picked.
    #[must_use]
    pub fn eval(&self, draw: Draw) -> &str {
        let x = draw.uniform_f64(0.0, self.total);
        let mut cumulative = 0.0;
        for (choice, weight) in self.choices.iter().zip(&self.weights) {
            cumulative += weight;
            if x < cumulative {
                return choice;
            }
        }
        // Float rounding can leave x == total; give it to the last reachable choice.
        self.choices
            .iter()
            .zip(&self.weights)
            .rev()
            .find(|(_, w)| **w > 0.0)
            .map_or(&self.choices[0], |(c, _)| c)
    }
}

/// Closed set of distribution kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Uniform(Uniform),
    Weighted(Weighted),
}

impl Value {
    /// Resolve a concrete choice. Pure in `draw`.
    #[must_use]
    pub fn eval(&self, draw: Draw) -> &str {
        match self {
            Self::Uniform(u) => u.eval(draw),
            Self::Weighted(w) => w.eval(draw),
        }
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        match self {
            Self::Uniform(u) => u.choices(),
            Self::Weighted(w) => w.choices(),
        }
    }
}

impl From<Uniform> for Value {
    fn from(u: Uniform) -> Self {
        Self::Uniform(u)
    }
}

impl From<Weighted> for Value {
    fn from(w: Weighted) -> Self {
        Self::Weighted(w)
    }
}
