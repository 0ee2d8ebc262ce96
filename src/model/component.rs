use crate::keys::Field;
use crate::rate;

use ndarray::{ArrayView1, ArrayViewMut1, Zip};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Pulse shape, every pulse of a model has exactly one
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum PulseType {
    Gaussian,
    Fred,
    FredX,
    Convolution,
}

impl PulseType {
    pub const ALL: [PulseType; 4] = [
        PulseType::Gaussian,
        PulseType::Fred,
        PulseType::FredX,
        PulseType::Convolution,
    ];

    /// Upper-case letter of the model key string
    pub fn letter(self) -> char {
        match self {
            PulseType::Gaussian => 'G',
            PulseType::Fred => 'F',
            PulseType::FredX => 'X',
            PulseType::Convolution => 'C',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.letter() == c)
    }

    pub fn fields(self) -> &'static [Field] {
        match self {
            PulseType::Gaussian => &[Field::Start, Field::Scale, Field::Sigma],
            PulseType::Fred => &[Field::Start, Field::Scale, Field::Tau, Field::Xi],
            PulseType::FredX => &[
                Field::Start,
                Field::Scale,
                Field::Tau,
                Field::Xi,
                Field::Gamma,
                Field::Nu,
            ],
            PulseType::Convolution => &[Field::Start, Field::Scale, Field::Sigma, Field::Tau],
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PulseType::Gaussian => "Gaussian pulse",
            PulseType::Fred => "FRED pulse",
            PulseType::FredX => "FRED-X pulse",
            PulseType::Convolution => "Convolution pulse",
        }
    }
}

/// Residual shape, attached to one pulse
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum ResidualType {
    SineGaussian,
    Bessel,
}

impl ResidualType {
    pub const ALL: [ResidualType; 2] = [ResidualType::SineGaussian, ResidualType::Bessel];

    /// Lower-case letter of the model key string
    pub fn letter(self) -> char {
        match self {
            ResidualType::SineGaussian => 's',
            ResidualType::Bessel => 'b',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.letter() == c)
    }

    pub fn fields(self) -> &'static [Field] {
        match self {
            ResidualType::SineGaussian => &[
                Field::SgA,
                Field::ResBegin,
                Field::SgLambda,
                Field::SgOmega,
                Field::SgPhi,
            ],
            ResidualType::Bessel => &[
                Field::BesA,
                Field::BesOmega,
                Field::BesS,
                Field::ResBegin,
                Field::BesDelta,
            ],
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ResidualType::SineGaussian => "Sine-Gaussian residual",
            ResidualType::Bessel => "Bessel residual",
        }
    }
}

/// Additive rate component: a pulse or a residual
///
/// [Component::ALL] is the canonical order used everywhere components are iterated: key
/// generation, prior construction and rate evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Component {
    Pulse(PulseType),
    Residual(ResidualType),
}

impl Component {
    pub const ALL: [Component; 6] = [
        Component::Pulse(PulseType::Gaussian),
        Component::Pulse(PulseType::Fred),
        Component::Pulse(PulseType::FredX),
        Component::Pulse(PulseType::Convolution),
        Component::Residual(ResidualType::SineGaussian),
        Component::Residual(ResidualType::Bessel),
    ];

    /// Fields in the order [Component::add_rate] expects their values
    pub fn fields(self) -> &'static [Field] {
        match self {
            Component::Pulse(p) => p.fields(),
            Component::Residual(r) => r.fields(),
        }
    }

    /// Time-location field, shifted by the time delay for the lensed image
    pub fn time_field(self) -> Field {
        match self {
            Component::Pulse(_) => Field::Start,
            Component::Residual(_) => Field::ResBegin,
        }
    }

    /// Position of [Component::time_field] in [Component::fields]
    pub fn time_field_position(self) -> usize {
        let time_field = self.time_field();
        self.fields()
            .iter()
            .position(|&f| f == time_field)
            .expect("every component has a time field")
    }

    pub fn description(self) -> &'static str {
        match self {
            Component::Pulse(p) => p.description(),
            Component::Residual(r) => r.description(),
        }
    }

    /// Add `factor` times the component rate to `out`
    ///
    /// `values` holds the parameter values in the [Component::fields] order.
    pub fn add_rate(
        self,
        times: ArrayView1<f64>,
        values: &[f64],
        factor: f64,
        out: ArrayViewMut1<f64>,
    ) {
        debug_assert_eq!(values.len(), self.fields().len());
        match self {
            Component::Pulse(PulseType::Gaussian) => {
                let &[start, scale, sigma] = values else {
                    unreachable!()
                };
                accumulate(times, out, factor, |t| {
                    rate::gaussian(t, start, scale, sigma)
                });
            }
            Component::Pulse(PulseType::Fred) => {
                let &[start, scale, tau, xi] = values else {
                    unreachable!()
                };
                accumulate(times, out, factor, |t| rate::fred(t, start, scale, tau, xi));
            }
            Component::Pulse(PulseType::FredX) => {
                let &[start, scale, tau, xi, gamma, nu] = values else {
                    unreachable!()
                };
                accumulate(times, out, factor, |t| {
                    rate::fredx(t, start, scale, tau, xi, gamma, nu)
                });
            }
            Component::Pulse(PulseType::Convolution) => {
                let &[start, scale, sigma, tau] = values else {
                    unreachable!()
                };
                rate::add_convolution_gaussian(times, start, scale, sigma, tau, factor, out);
            }
            Component::Residual(ResidualType::SineGaussian) => {
                let &[sg_a, res_begin, sg_lambda, sg_omega, sg_phi] = values else {
                    unreachable!()
                };
                accumulate(times, out, factor, |t| {
                    rate::sine_gaussian(t, res_begin, sg_a, sg_lambda, sg_omega, sg_phi)
                });
            }
            Component::Residual(ResidualType::Bessel) => {
                let &[bes_a, bes_omega, bes_s, res_begin, bes_delta] = values else {
                    unreachable!()
                };
                accumulate(times, out, factor, |t| {
                    rate::modified_bessel(t, bes_a, bes_omega, bes_s, res_begin, bes_delta)
                });
            }
        }
    }
}

#[inline]
fn accumulate<F>(times: ArrayView1<f64>, out: ArrayViewMut1<f64>, factor: f64, rate: F)
where
    F: Fn(f64) -> f64,
{
    Zip::from(out)
        .and(times)
        .for_each(|y, &t| *y += factor * rate(t));
}

impl From<PulseType> for Component {
    fn from(p: PulseType) -> Self {
        Self::Pulse(p)
    }
}

impl From<ResidualType> for Component {
    fn from(r: ResidualType) -> Self {
        Self::Residual(r)
    }
}
