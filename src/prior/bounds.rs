use crate::error::PriorError;
use crate::keys::Field;
use crate::prior::ln_prior_1d::LnPrior1D;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Bounds of the prior distributions
///
/// Amplitudes and background are in counts per bin. Pulse window bounds the `start` and
/// `res_begin` parameters, and the maximum separation of consecutive pulses. Time delay window
/// defaults to zero through the pulse window width.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PriorBounds {
    pub pulse_start: f64,
    pub pulse_end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_delay: Option<[f64; 2]>,
    #[serde(default = "PriorBounds::default_background")]
    pub background: [f64; 2],
    #[serde(default = "PriorBounds::default_magnification_ratio")]
    pub magnification_ratio: [f64; 2],
    #[serde(default = "PriorBounds::default_tau")]
    pub tau: [f64; 2],
    #[serde(default = "PriorBounds::default_xi")]
    pub xi: [f64; 2],
    #[serde(default = "PriorBounds::default_gamma")]
    pub gamma: [f64; 2],
    #[serde(default = "PriorBounds::default_nu")]
    pub nu: [f64; 2],
    #[serde(default = "PriorBounds::default_sigma")]
    pub sigma: [f64; 2],
    #[serde(default = "PriorBounds::default_scale")]
    pub scale: [f64; 2],
    #[serde(default = "PriorBounds::default_sg_amplitude")]
    pub sg_amplitude: [f64; 2],
    #[serde(default = "PriorBounds::default_sg_lambda")]
    pub sg_lambda: [f64; 2],
    #[serde(default = "PriorBounds::default_sg_omega")]
    pub sg_omega: [f64; 2],
    #[serde(default = "PriorBounds::default_bes_amplitude")]
    pub bes_amplitude: [f64; 2],
    #[serde(default = "PriorBounds::default_bes_omega")]
    pub bes_omega: [f64; 2],
    #[serde(default = "PriorBounds::default_bes_s")]
    pub bes_s: [f64; 2],
}

impl PriorBounds {
    /// Default bounds for the given pulse window
    pub fn new(pulse_start: f64, pulse_end: f64) -> Self {
        Self {
            pulse_start,
            pulse_end,
            time_delay: None,
            background: Self::default_background(),
            magnification_ratio: Self::default_magnification_ratio(),
            tau: Self::default_tau(),
            xi: Self::default_xi(),
            gamma: Self::default_gamma(),
            nu: Self::default_nu(),
            sigma: Self::default_sigma(),
            scale: Self::default_scale(),
            sg_amplitude: Self::default_sg_amplitude(),
            sg_lambda: Self::default_sg_lambda(),
            sg_omega: Self::default_sg_omega(),
            bes_amplitude: Self::default_bes_amplitude(),
            bes_omega: Self::default_bes_omega(),
            bes_s: Self::default_bes_s(),
        }
    }

    pub fn with_time_delay(mut self, lo: f64, hi: f64) -> Self {
        self.time_delay = Some([lo, hi]);
        self
    }

    #[inline]
    pub fn default_background() -> [f64; 2] {
        [1e-1, 1e3]
    }

    #[inline]
    pub fn default_magnification_ratio() -> [f64; 2] {
        [0.2, 1.4]
    }

    #[inline]
    pub fn default_tau() -> [f64; 2] {
        [1e-3, 1e3]
    }

    #[inline]
    pub fn default_xi() -> [f64; 2] {
        [1e-3, 1e3]
    }

    #[inline]
    pub fn default_gamma() -> [f64; 2] {
        [1e-1, 1e1]
    }

    #[inline]
    pub fn default_nu() -> [f64; 2] {
        [1e-1, 1e1]
    }

    #[inline]
    pub fn default_sigma() -> [f64; 2] {
        [1e-3, 1e3]
    }

    #[inline]
    pub fn default_scale() -> [f64; 2] {
        [1e0, 1e5]
    }

    #[inline]
    pub fn default_sg_amplitude() -> [f64; 2] {
        [1e0, 1e3]
    }

    #[inline]
    pub fn default_sg_lambda() -> [f64; 2] {
        [1e-3, 1e3]
    }

    #[inline]
    pub fn default_sg_omega() -> [f64; 2] {
        [1e-3, 1e4]
    }

    #[inline]
    pub fn default_bes_amplitude() -> [f64; 2] {
        [1e-1, 1e6]
    }

    #[inline]
    pub fn default_bes_omega() -> [f64; 2] {
        [1e-3, 1e3]
    }

    #[inline]
    pub fn default_bes_s() -> [f64; 2] {
        [1e-3, 1e3]
    }

    /// Width of the pulse window, the largest allowed separation of consecutive pulses
    pub fn pulse_window(&self) -> f64 {
        self.pulse_end - self.pulse_start
    }

    pub fn time_delay_bounds(&self) -> [f64; 2] {
        self.time_delay.unwrap_or([0.0, self.pulse_window()])
    }

    fn log_uniform_bounds(&self) -> [(Field, [f64; 2]); 13] {
        [
            (Field::Background, self.background),
            (Field::Scale, self.scale),
            (Field::Sigma, self.sigma),
            (Field::Tau, self.tau),
            (Field::Xi, self.xi),
            (Field::Gamma, self.gamma),
            (Field::Nu, self.nu),
            (Field::SgA, self.sg_amplitude),
            (Field::SgLambda, self.sg_lambda),
            (Field::SgOmega, self.sg_omega),
            (Field::BesA, self.bes_amplitude),
            (Field::BesOmega, self.bes_omega),
            (Field::BesS, self.bes_s),
        ]
    }

    /// Check every interval is non-empty and finite, log-uniform ones positive
    pub fn validate(&self) -> Result<(), PriorError> {
        let invalid = |field: Field, [lo, hi]: [f64; 2]| PriorError::InvalidBounds {
            field: field.name().into(),
            lo,
            hi,
        };
        let is_interval = |[lo, hi]: [f64; 2]| lo.is_finite() && hi.is_finite() && lo < hi;

        let window = [self.pulse_start, self.pulse_end];
        if !is_interval(window) {
            return Err(invalid(Field::Start, window));
        }
        for (field, bounds) in [
            (Field::TimeDelay, self.time_delay_bounds()),
            (Field::MagnificationRatio, self.magnification_ratio),
        ] {
            if !is_interval(bounds) {
                return Err(invalid(field, bounds));
            }
        }
        for (field, bounds) in self.log_uniform_bounds() {
            if !is_interval(bounds) || bounds[0] <= 0.0 {
                return Err(invalid(field, bounds));
            }
        }
        Ok(())
    }

    /// Prior distribution of a field
    ///
    /// Strictly positive scale-like quantities are log-uniform, locations and phases are uniform.
    /// Bounds must be validated with [PriorBounds::validate] first.
    pub fn prior(&self, field: Field) -> LnPrior1D {
        let log_uniform = |[lo, hi]: [f64; 2]| LnPrior1D::log_uniform(lo, hi);
        let uniform = |[lo, hi]: [f64; 2]| LnPrior1D::uniform(lo, hi);
        match field {
            Field::TimeDelay => uniform(self.time_delay_bounds()),
            Field::MagnificationRatio => uniform(self.magnification_ratio),
            Field::Start | Field::ResBegin => uniform([self.pulse_start, self.pulse_end]),
            Field::SgPhi | Field::BesDelta => uniform([-PI, PI]),
            Field::Background => log_uniform(self.background),
            Field::Scale => log_uniform(self.scale),
            Field::Sigma => log_uniform(self.sigma),
            Field::Tau => log_uniform(self.tau),
            Field::Xi => log_uniform(self.xi),
            Field::Gamma => log_uniform(self.gamma),
            Field::Nu => log_uniform(self.nu),
            Field::SgA => log_uniform(self.sg_amplitude),
            Field::SgLambda => log_uniform(self.sg_lambda),
            Field::SgOmega => log_uniform(self.sg_omega),
            Field::BesA => log_uniform(self.bes_amplitude),
            Field::BesOmega => log_uniform(self.bes_omega),
            Field::BesS => log_uniform(self.bes_s),
        }
    }
}
