use crate::channel::Channel;
use crate::data::CountSeries;
use crate::error::LikelihoodError;
use crate::keys::{Field, ParameterKey};
use crate::likelihood::LikelihoodTrait;
use crate::model::{Component, ModelDescriptor};
use crate::types::{CowArray1, ParameterMap};

use ndarray::{Array1, ArrayView1, ArrayViewMut1, Zip};
use std::cell::RefCell;
use thread_local::ThreadLocal;

/// Largest number of fields of a single component
const MAX_FIELDS: usize = 6;

/// Single pulse or residual of the model, with its parameter keys in the [Component::fields]
/// order
#[derive(Clone, Debug)]
struct RateTerm {
    component: Component,
    keys: Vec<String>,
    time_position: usize,
}

#[inline]
fn lookup(params: &ParameterMap, key: &str) -> Result<f64, LikelihoodError> {
    params
        .get(key)
        .copied()
        .ok_or_else(|| LikelihoodError::MissingParameter(key.into()))
}

/// Poisson likelihood of binned counts in a single channel
///
/// The rate is the sum of every pulse and residual of the model plus the channel background,
/// evaluated at the left bin edges. For lensed models every pulse and residual is added once
/// more, shifted by `time_delay` and multiplied by `magnification_ratio`. If any bin of the
/// summed rate is negative, the whole rate is replaced by zeros.
///
/// Parameter keys are derived once at construction from the model descriptor and the channel,
/// the same way [crate::parameter_keys] derives them.
#[derive(Debug)]
pub struct PoissonLikelihood<'a> {
    times: CowArray1<'a, f64>,
    counts: CowArray1<'a, f64>,
    ln_count_factorials: Array1<f64>,
    model: ModelDescriptor,
    channel: Channel,
    background_key: String,
    lens_keys: Option<[String; 2]>,
    terms: Vec<RateTerm>,
    buffer: ThreadLocal<RefCell<Array1<f64>>>,
    /// Assignment used by [PoissonLikelihood::log_likelihood]
    pub parameters: ParameterMap,
}

impl<'a> PoissonLikelihood<'a> {
    /// Construct likelihood from times and observed counts
    ///
    /// Input arrays could be [`ndarray::Array1`], [`ndarray::ArrayView1`] or 1-D
    /// [`ndarray::CowArray`] and must have the same length.
    pub fn new(
        times: impl Into<CowArray1<'a, f64>>,
        counts: impl Into<CowArray1<'a, f64>>,
        model: &ModelDescriptor,
        channel: Channel,
    ) -> Result<Self, LikelihoodError> {
        let times = times.into();
        let counts = counts.into();
        if times.len() != counts.len() {
            return Err(LikelihoodError::LengthMismatch {
                times: times.len(),
                counts: counts.len(),
            });
        }

        let ln_count_factorials = counts.mapv(|y| libm::lgamma(y + 1.0));
        let lens_keys = model
            .lens()
            .then(|| Field::LENS.map(|field| ParameterKey::global(field).to_string()));
        let terms = model
            .components()
            .map(|(component, pulse)| RateTerm {
                component,
                keys: component
                    .fields()
                    .iter()
                    .map(|&field| ParameterKey::pulse(field, pulse, channel).to_string())
                    .collect(),
                time_position: component.time_field_position(),
            })
            .collect();

        Ok(Self {
            times,
            counts,
            ln_count_factorials,
            model: model.clone(),
            channel,
            background_key: ParameterKey::background(channel).to_string(),
            lens_keys,
            terms,
            buffer: ThreadLocal::new(),
            parameters: ParameterMap::new(),
        })
    }

    /// Likelihood of a single channel of a count series, rate is evaluated at left bin edges
    pub fn from_series(
        series: &'a CountSeries,
        model: &ModelDescriptor,
        channel: Channel,
    ) -> Result<Self, LikelihoodError> {
        Self::new(series.bin_left(), series.counts(channel), model, channel)
    }

    pub fn model(&self) -> &ModelDescriptor {
        &self.model
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn times(&self) -> ArrayView1<'_, f64> {
        self.times.view()
    }

    pub fn counts(&self) -> ArrayView1<'_, f64> {
        self.counts.view()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn set_parameters(&mut self, parameters: ParameterMap) {
        self.parameters = parameters;
    }

    /// Every key the rate evaluation reads, lens and background first, then pulse by pulse
    pub fn required_keys(&self) -> Vec<String> {
        self.lens_keys
            .iter()
            .flatten()
            .chain(std::iter::once(&self.background_key))
            .chain(self.terms.iter().flat_map(|term| term.keys.iter()))
            .cloned()
            .collect()
    }

    /// Write the model rate into `out`, which must have the same length as times
    pub fn rate_into(
        &self,
        params: &ParameterMap,
        mut out: ArrayViewMut1<f64>,
    ) -> Result<(), LikelihoodError> {
        assert_eq!(
            out.len(),
            self.times.len(),
            "out should have the same size as times"
        );
        out.fill(0.0);

        let lens = match &self.lens_keys {
            Some([time_delay, magnification_ratio]) => Some((
                lookup(params, time_delay)?,
                lookup(params, magnification_ratio)?,
            )),
            None => None,
        };
        let background = lookup(params, &self.background_key)?;

        let mut values = [0.0; MAX_FIELDS];
        for term in &self.terms {
            let values = &mut values[..term.keys.len()];
            for (value, key) in values.iter_mut().zip(&term.keys) {
                *value = lookup(params, key)?;
            }
            term.component
                .add_rate(self.times.view(), values, 1.0, out.view_mut());
            if let Some((time_delay, magnification_ratio)) = lens {
                values[term.time_position] += time_delay;
                term.component.add_rate(
                    self.times.view(),
                    values,
                    magnification_ratio,
                    out.view_mut(),
                );
            }
        }

        out += background;

        if out.iter().any(|&x| x < 0.0) {
            out.fill(0.0);
        }
        Ok(())
    }

    /// Model rate for a parameter assignment
    pub fn rate(&self, params: &ParameterMap) -> Result<Array1<f64>, LikelihoodError> {
        let mut rate = Array1::zeros(self.times.len());
        self.rate_into(params, rate.view_mut())?;
        Ok(rate)
    }

    /// Model rate for a posterior sample, bit-identical to the rate used by the log-likelihood
    pub fn return_line_from_sample(
        &self,
        sample: &ParameterMap,
    ) -> Result<Array1<f64>, LikelihoodError> {
        self.rate(sample)
    }

    /// Poisson log-likelihood of the observed counts given a rate
    ///
    /// Negative infinity if any bin has zero rate. Fails for negative or non-finite rates.
    pub fn log_likelihood_of_rate(&self, rate: ArrayView1<f64>) -> Result<f64, LikelihoodError> {
        assert_eq!(
            rate.len(),
            self.counts.len(),
            "rate should have the same size as counts"
        );
        for (index, &value) in rate.iter().enumerate() {
            if !value.is_finite() {
                return Err(LikelihoodError::NonFiniteRate { index });
            }
            if value < 0.0 {
                return Err(LikelihoodError::NegativeRate { index, value });
            }
        }
        if rate.iter().any(|&x| x == 0.0) {
            return Ok(f64::NEG_INFINITY);
        }
        Ok(Zip::from(&rate)
            .and(&self.counts)
            .and(&self.ln_count_factorials)
            .fold(0.0, |acc, &r, &y, &ln_factorial| {
                acc - r + y * r.ln() - ln_factorial
            }))
    }

    /// Log-likelihood of a parameter assignment
    pub fn log_likelihood_of(&self, params: &ParameterMap) -> Result<f64, LikelihoodError> {
        let buffer = self
            .buffer
            .get_or(|| RefCell::new(Array1::zeros(self.times.len())));
        let mut rate = buffer.borrow_mut();
        self.rate_into(params, rate.view_mut())?;
        self.log_likelihood_of_rate(rate.view())
    }

    /// Log-likelihood of [PoissonLikelihood::parameters]
    pub fn log_likelihood(&self) -> Result<f64, LikelihoodError> {
        self.log_likelihood_of(&self.parameters)
    }
}

impl LikelihoodTrait for PoissonLikelihood<'_> {
    fn log_likelihood_of(&self, params: &ParameterMap) -> Result<f64, LikelihoodError> {
        PoissonLikelihood::log_likelihood_of(self, params)
    }

    fn required_keys(&self) -> Vec<String> {
        PoissonLikelihood::required_keys(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::keys::parameter_key_strings;
    use crate::prior::{PriorBounds, PriorSet};
    use crate::rate;

    use approx::assert_relative_eq;
    use light_curve_pulse_test_util::{SIMULATED_FRED_BURST, simulated_fred_parameters};
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rayon::prelude::*;

    fn params(pairs: &[(&str, f64)]) -> ParameterMap {
        pairs.iter().map(|&(k, v)| (k.to_string(), v)).collect()
    }

    fn likelihood(model: &str, channel: Channel) -> PoissonLikelihood<'static> {
        let t = Array1::linspace(0.0, 10.0, 101);
        let counts = Array1::from_elem(t.len(), 3.0);
        PoissonLikelihood::new(t, counts, &ModelDescriptor::decode(model).unwrap(), channel)
            .unwrap()
    }

    #[test]
    fn gaussian_rate() {
        let lik = likelihood("G", Channel::A);
        let p = params(&[
            ("background_a", 1.5),
            ("start_1_a", 4.0),
            ("scale_1_a", 5.0),
            ("sigma_1_a", 2.0),
        ]);
        let desired = rate::gaussian_pulse(lik.times(), 4.0, 5.0, 2.0) + 1.5;
        assert_relative_eq!(lik.rate(&p).unwrap(), desired, max_relative = 1e-15);
    }

    #[test]
    fn every_generated_key_is_read() {
        let mut rng = StdRng::seed_from_u64(0);
        for model in ["F", "GsFbXCL", "XbXsFF"] {
            for channel in Channel::ALL {
                let descriptor = ModelDescriptor::decode(model).unwrap();
                let lik = likelihood(model, channel);
                let priors =
                    PriorSet::build(&descriptor, channel, &PriorBounds::new(0.0, 10.0)).unwrap();
                let p = priors.sample(&mut rng).unwrap();
                lik.rate(&p).unwrap();
                for key in parameter_key_strings(&descriptor, channel) {
                    let mut incomplete = p.clone();
                    incomplete.remove(&key);
                    assert_eq!(
                        lik.rate(&incomplete),
                        Err(LikelihoodError::MissingParameter(key))
                    );
                }
            }
        }
    }

    #[test]
    fn rate_is_non_negative() {
        let mut rng = StdRng::seed_from_u64(1);
        let descriptor = ModelDescriptor::decode("FsGbXs").unwrap();
        let lik = likelihood("FsGbXs", Channel::B);
        let priors = PriorSet::build(&descriptor, Channel::B, &PriorBounds::new(0.0, 10.0))
            .unwrap();
        for p in priors.sample_n(&mut rng, 200).unwrap() {
            let rate = lik.rate(&p).unwrap();
            assert!(rate.iter().all(|&x| x >= 0.0));
        }
    }

    #[test]
    fn negative_bin_zeroes_whole_rate() {
        let lik = likelihood("Gs", Channel::A);
        let p = params(&[
            ("background_a", 1.0),
            ("start_1_a", 5.0),
            ("scale_1_a", 1.0),
            ("sigma_1_a", 1.0),
            ("sg_A_1_a", 100.0),
            ("res_begin_1_a", 5.0),
            ("sg_lambda_1_a", 1.0),
            ("sg_omega_1_a", 3.0),
            ("sg_phi_1_a", 0.0),
        ]);
        let rate = lik.rate(&p).unwrap();
        assert!(rate.iter().all(|&x| x == 0.0));
        assert_eq!(lik.log_likelihood_of(&p), Ok(f64::NEG_INFINITY));
    }

    #[test]
    fn zero_rate_is_impossible() {
        let lik = likelihood("", Channel::C);
        let p = params(&[("background_c", 0.0)]);
        assert_eq!(lik.log_likelihood_of(&p), Ok(f64::NEG_INFINITY));
    }

    #[test]
    fn poisson_log_likelihood() {
        let t = array![0.0, 1.0, 2.0, 3.0];
        let counts = array![0.0, 1.0, 4.0, 2.0];
        let model = ModelDescriptor::decode("F").unwrap();
        let mut lik = PoissonLikelihood::new(t.view(), counts.view(), &model, Channel::D).unwrap();
        lik.set_parameters(params(&[
            ("background_d", 0.5),
            ("start_1_d", 0.5),
            ("scale_1_d", 4.0),
            ("tau_1_d", 1.0),
            ("xi_1_d", 1.0),
        ]));
        let rate = rate::fred_pulse(t.view(), 0.5, 4.0, 1.0, 1.0) + 0.5;
        let desired: f64 = rate
            .iter()
            .zip(&counts)
            .map(|(&r, &y)| -r + y * r.ln() - libm::lgamma(y + 1.0))
            .sum();
        assert_relative_eq!(lik.log_likelihood().unwrap(), desired, max_relative = 1e-12);
    }

    #[test]
    fn line_is_bit_identical() {
        let mut rng = StdRng::seed_from_u64(2);
        let descriptor = ModelDescriptor::decode("XCsL").unwrap();
        let lik = likelihood("XCsL", Channel::A);
        let priors =
            PriorSet::build(&descriptor, Channel::A, &PriorBounds::new(0.0, 10.0)).unwrap();
        for p in priors.sample_n(&mut rng, 10).unwrap() {
            let line = lik.return_line_from_sample(&p).unwrap();
            let from_line = lik.log_likelihood_of_rate(line.view()).unwrap();
            let direct = lik.log_likelihood_of(&p).unwrap();
            assert_eq!(from_line.to_bits(), direct.to_bits());
            // buffer reuse
            let again = lik.log_likelihood_of(&p).unwrap();
            assert_eq!(again.to_bits(), direct.to_bits());
        }
    }

    #[test]
    fn lens_duplicates_pulse() {
        let pulse = [
            ("start_1_a", 2.0),
            ("scale_1_a", 50.0),
            ("tau_1_a", 1.5),
            ("xi_1_a", 0.7),
        ];
        let mut unlensed = params(&pulse);
        unlensed.insert("background_a".into(), 0.0);
        let mut lensed = unlensed.clone();
        lensed.insert("time_delay".into(), 0.0);
        lensed.insert("magnification_ratio".into(), 1.0);

        let single = likelihood("F", Channel::A).rate(&unlensed).unwrap();
        let double = likelihood("FL", Channel::A).rate(&lensed).unwrap();
        assert_eq!(double, 2.0 * &single);
    }

    #[test]
    fn lens_shifts_and_scales() {
        let lik = likelihood("GsL", Channel::B);
        let p = params(&[
            ("time_delay", 3.0),
            ("magnification_ratio", 0.5),
            ("background_b", 10.0),
            ("start_1_b", 2.0),
            ("scale_1_b", 20.0),
            ("sigma_1_b", 0.5),
            ("sg_A_1_b", 1.0),
            ("res_begin_1_b", 2.5),
            ("sg_lambda_1_b", 0.3),
            ("sg_omega_1_b", 2.0),
            ("sg_phi_1_b", 0.1),
        ]);
        let t = lik.times();
        let desired = rate::gaussian_pulse(t, 2.0, 20.0, 0.5)
            + 0.5 * rate::gaussian_pulse(t, 5.0, 20.0, 0.5)
            + rate::sine_gaussian_residual(t, 2.5, 1.0, 0.3, 2.0, 0.1)
            + 0.5 * rate::sine_gaussian_residual(t, 5.5, 1.0, 0.3, 2.0, 0.1)
            + 10.0;
        assert_relative_eq!(lik.rate(&p).unwrap(), desired, max_relative = 1e-12);
    }

    #[test]
    fn errors() {
        let t = array![0.0, 1.0, 2.0];
        let model = ModelDescriptor::decode("G").unwrap();
        assert_eq!(
            PoissonLikelihood::new(t.view(), array![1.0, 2.0].view(), &model, Channel::A)
                .unwrap_err(),
            LikelihoodError::LengthMismatch {
                times: 3,
                counts: 2
            }
        );

        let lik = likelihood("G", Channel::A);
        let p = params(&[
            ("background_a", 1.0),
            ("start_1_a", 4.0),
            ("scale_1_a", f64::NAN),
            ("sigma_1_a", 2.0),
        ]);
        assert_eq!(
            lik.log_likelihood_of(&p),
            Err(LikelihoodError::NonFiniteRate { index: 0 })
        );
        assert_eq!(
            lik.log_likelihood_of_rate(Array1::from_elem(lik.len(), -1.0).view()),
            Err(LikelihoodError::NegativeRate {
                index: 0,
                value: -1.0
            })
        );
        assert_eq!(
            lik.log_likelihood(),
            Err(LikelihoodError::MissingParameter("background_a".into()))
        );
    }

    #[test]
    fn missing_keys_reported_in_required_order() {
        for model in ["G", "FsX", "LC", "GbFL"] {
            let lik = likelihood(model, Channel::B);
            let keys = lik.required_keys();
            assert_eq!(
                lik.log_likelihood_of(&params(&[])),
                Err(LikelihoodError::MissingParameter(keys[0].clone()))
            );
            let mut p: ParameterMap = keys.iter().map(|key| (key.clone(), 1.0)).collect();
            for key in &keys {
                let value = p.remove(key).unwrap();
                assert_eq!(
                    lik.rate(&p),
                    Err(LikelihoodError::MissingParameter(key.clone()))
                );
                p.insert(key.clone(), value);
            }
        }
        let lik = likelihood("G", Channel::A);
        let p = params(&[
            ("start_1_a", 4.0),
            ("scale_1_a", 5.0),
            ("sigma_1_a", 2.0),
        ]);
        assert_eq!(
            lik.log_likelihood_of(&p),
            Err(LikelihoodError::MissingParameter("background_a".into()))
        );
    }

    #[test]
    fn parallel_evaluation_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(3);
        let descriptor = ModelDescriptor::decode("FFbX").unwrap();
        let lik = likelihood("FFbX", Channel::D);
        let priors =
            PriorSet::build(&descriptor, Channel::D, &PriorBounds::new(0.0, 10.0)).unwrap();
        let samples = priors.sample_n(&mut rng, 64).unwrap();
        let sequential: Vec<_> = samples
            .iter()
            .map(|p| lik.log_likelihood_of(p).unwrap().to_bits())
            .collect();
        let parallel: Vec<_> = samples
            .par_iter()
            .map(|p| lik.log_likelihood_of(p).unwrap().to_bits())
            .collect();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn max_fields_is_enough() {
        for component in Component::ALL {
            assert!(component.fields().len() <= MAX_FIELDS);
        }
    }

    #[test]
    fn simulated_burst_prefers_true_parameters() {
        let (bin_left, _, counts) = &*SIMULATED_FRED_BURST;
        let model = ModelDescriptor::decode("F").unwrap();
        for channel in Channel::ALL {
            let lik = PoissonLikelihood::new(
                bin_left.view(),
                counts.column(channel.index()),
                &model,
                channel,
            )
            .unwrap();
            let truth = simulated_fred_parameters(channel.index());
            let ln_truth = lik.log_likelihood_of(&truth).unwrap();

            let mut shifted = truth.clone();
            *shifted.get_mut(&format!("start_1_{channel}")).unwrap() += 0.5;
            assert!(ln_truth > lik.log_likelihood_of(&shifted).unwrap());

            let mut scaled = truth;
            *scaled.get_mut(&format!("scale_1_{channel}")).unwrap() *= 2.0;
            assert!(ln_truth > lik.log_likelihood_of(&scaled).unwrap());
        }
    }
}
