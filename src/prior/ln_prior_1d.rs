use enum_dispatch::enum_dispatch;
use ordered_float::NotNan;
use rand::{Rng, RngCore};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

#[enum_dispatch]
pub trait LnPrior1DTrait:
    Clone + Debug + Serialize + DeserializeOwned + PartialEq + Eq + Hash
{
    /// Evaluate the natural logarithm of the prior density at x
    fn ln_prior_1d(&self, x: f64) -> f64;

    /// Draw a single value
    fn sample(&self, rng: &mut dyn RngCore) -> f64;

    /// Closed support interval
    fn support(&self) -> (f64, f64);
}

/// Natural logarithm of prior for a single model parameter
#[enum_dispatch(LnPrior1DTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum LnPrior1D {
    LogUniform(LogUniformLnPrior1D),
    Uniform(UniformLnPrior1D),
}

impl LnPrior1D {
    pub fn log_uniform(left: f64, right: f64) -> Self {
        LogUniformLnPrior1D::new(left, right).into()
    }

    pub fn uniform(left: f64, right: f64) -> Self {
        UniformLnPrior1D::new(left, right).into()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(
    into = "LogUniformLnPrior1DParameters",
    from = "LogUniformLnPrior1DParameters"
)]
pub struct LogUniformLnPrior1D {
    ln_range: std::ops::RangeInclusive<NotNan<f64>>,
    ln_prob_coeff: NotNan<f64>,
}

impl LogUniformLnPrior1D {
    pub fn new(left: f64, right: f64) -> Self {
        assert!(left < right);
        let ln_left = NotNan::new(f64::ln(left)).expect("left must be positive and finite");
        let ln_right = NotNan::new(f64::ln(right)).expect("right must be positive and finite");
        Self {
            ln_range: ln_left..=ln_right,
            ln_prob_coeff: NotNan::new(-f64::ln(ln_right.into_inner() - ln_left.into_inner()))
                .expect("right must be larger than left"),
        }
    }

    fn ln_left(&self) -> f64 {
        self.ln_range.start().into_inner()
    }

    fn ln_right(&self) -> f64 {
        self.ln_range.end().into_inner()
    }

    fn ln_prob_coeff(&self) -> f64 {
        self.ln_prob_coeff.into_inner()
    }
}

impl LnPrior1DTrait for LogUniformLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        let Ok(ln_x) = NotNan::new(f64::ln(x)) else {
            return f64::NEG_INFINITY;
        };
        if self.ln_range.contains(&ln_x) {
            self.ln_prob_coeff() - ln_x.into_inner()
        } else {
            f64::NEG_INFINITY
        }
    }

    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        let u: f64 = rng.random();
        f64::exp(self.ln_left() + u * (self.ln_right() - self.ln_left()))
    }

    fn support(&self) -> (f64, f64) {
        (self.ln_left().exp(), self.ln_right().exp())
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "LogUniformLnPrior")]
struct LogUniformLnPrior1DParameters {
    range: std::ops::RangeInclusive<f64>,
}

impl From<LogUniformLnPrior1D> for LogUniformLnPrior1DParameters {
    fn from(f: LogUniformLnPrior1D) -> Self {
        let (left, right) = f.support();
        Self { range: left..=right }
    }
}

impl From<LogUniformLnPrior1DParameters> for LogUniformLnPrior1D {
    fn from(f: LogUniformLnPrior1DParameters) -> Self {
        Self::new(*f.range.start(), *f.range.end())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(
    into = "UniformLnPrior1DParameters",
    from = "UniformLnPrior1DParameters"
)]
pub struct UniformLnPrior1D {
    range: std::ops::RangeInclusive<NotNan<f64>>,
    ln_prob: NotNan<f64>,
}

impl UniformLnPrior1D {
    pub fn new(left: f64, right: f64) -> Self {
        let left = NotNan::new(left).expect("left must be finite");
        let right = NotNan::new(right).expect("right must be finite");
        Self {
            range: left..=right,
            ln_prob: NotNan::new(-f64::ln(right.into_inner() - left.into_inner()))
                .expect("right must be larger than left"),
        }
    }

    fn left(&self) -> f64 {
        self.range.start().into_inner()
    }

    fn right(&self) -> f64 {
        self.range.end().into_inner()
    }

    fn ln_prob(&self) -> f64 {
        self.ln_prob.into_inner()
    }
}

impl LnPrior1DTrait for UniformLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        let Ok(x) = NotNan::new(x) else {
            return f64::NEG_INFINITY;
        };
        if self.range.contains(&x) {
            self.ln_prob()
        } else {
            f64::NEG_INFINITY
        }
    }

    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        let u: f64 = rng.random();
        self.left() + u * (self.right() - self.left())
    }

    fn support(&self) -> (f64, f64) {
        (self.left(), self.right())
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "UniformLnPrior")]
struct UniformLnPrior1DParameters {
    range: std::ops::RangeInclusive<f64>,
}

impl From<UniformLnPrior1D> for UniformLnPrior1DParameters {
    fn from(f: UniformLnPrior1D) -> Self {
        Self {
            range: f.left()..=f.right(),
        }
    }
}

impl From<UniformLnPrior1DParameters> for UniformLnPrior1D {
    fn from(f: UniformLnPrior1DParameters) -> Self {
        Self::new(*f.range.start(), *f.range.end())
    }
}
