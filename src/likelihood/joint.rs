use crate::channel::Channel;
use crate::data::CountSeries;
use crate::error::LikelihoodError;
use crate::likelihood::{LikelihoodTrait, PoissonLikelihood};
use crate::model::ModelDescriptor;
use crate::types::ParameterMap;

use itertools::Itertools;

/// Sum of single-channel likelihoods sharing one parameter assignment
///
/// Channel-specific keys never collide, lens keys are shared. Pairs with
/// [crate::PriorSet::build_multi].
#[derive(Debug)]
pub struct JointLikelihood<'a> {
    likelihoods: Vec<PoissonLikelihood<'a>>,
}

impl<'a> JointLikelihood<'a> {
    pub fn new(likelihoods: Vec<PoissonLikelihood<'a>>) -> Result<Self, LikelihoodError> {
        if likelihoods.is_empty() {
            return Err(LikelihoodError::NoChannels);
        }
        Ok(Self { likelihoods })
    }

    pub fn from_series(
        series: &'a CountSeries,
        model: &ModelDescriptor,
        channels: &[Channel],
    ) -> Result<Self, LikelihoodError> {
        let likelihoods = channels
            .iter()
            .map(|&channel| PoissonLikelihood::from_series(series, model, channel))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(likelihoods)
    }

    pub fn likelihoods(&self) -> &[PoissonLikelihood<'a>] {
        &self.likelihoods
    }

    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.likelihoods.iter().map(PoissonLikelihood::channel)
    }

    pub fn log_likelihood_of(&self, params: &ParameterMap) -> Result<f64, LikelihoodError> {
        self.likelihoods
            .iter()
            .map(|likelihood| likelihood.log_likelihood_of(params))
            .sum()
    }

    /// Unique keys of all channels, in channel order
    pub fn required_keys(&self) -> Vec<String> {
        self.likelihoods
            .iter()
            .flat_map(PoissonLikelihood::required_keys)
            .unique()
            .collect()
    }
}

impl LikelihoodTrait for JointLikelihood<'_> {
    fn log_likelihood_of(&self, params: &ParameterMap) -> Result<f64, LikelihoodError> {
        JointLikelihood::log_likelihood_of(self, params)
    }

    fn required_keys(&self) -> Vec<String> {
        JointLikelihood::required_keys(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::prior::{PriorBounds, PriorSet};

    use approx::assert_relative_eq;
    use ndarray::Array2;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn series() -> CountSeries {
        let n = 64;
        let left = ndarray::Array1::linspace(0.0, 6.3, n);
        let right = &left + 0.1;
        let counts = Array2::from_shape_fn((n, 4), |(i, j)| ((i * 7 + j * 3) % 11) as f64);
        CountSeries::new(left, right, counts)
    }

    #[test]
    fn sum_of_channels() {
        let series = series();
        let model = ModelDescriptor::decode("FsXL").unwrap();
        let channels = [Channel::A, Channel::B, Channel::D];
        let joint = JointLikelihood::from_series(&series, &model, &channels).unwrap();
        let priors =
            PriorSet::build_multi(&model, &channels, &PriorBounds::new(0.0, 6.4)).unwrap();

        let mut rng = StdRng::seed_from_u64(0);
        let params = priors.sample(&mut rng).unwrap();
        let desired: f64 = channels
            .iter()
            .map(|&channel| {
                PoissonLikelihood::from_series(&series, &model, channel)
                    .unwrap()
                    .log_likelihood_of(&params)
                    .unwrap()
            })
            .sum();
        assert_relative_eq!(
            joint.log_likelihood_of(&params).unwrap(),
            desired,
            max_relative = 1e-12
        );
    }

    #[test]
    fn keys_match_multi_channel_priors() {
        let series = series();
        let model = ModelDescriptor::decode("GbFCL").unwrap();
        let channels = [Channel::C, Channel::A];
        let joint = JointLikelihood::from_series(&series, &model, &channels).unwrap();
        let priors =
            PriorSet::build_multi(&model, &channels, &PriorBounds::new(0.0, 6.4)).unwrap();
        let required = joint.required_keys();
        let required_set: HashSet<&str> = required.iter().map(String::as_str).collect();
        assert_eq!(required_set.len(), required.len());
        assert_eq!(required_set, priors.keys().collect::<HashSet<_>>());
    }

    #[test]
    fn no_channels() {
        assert_eq!(
            JointLikelihood::new(vec![]).unwrap_err(),
            LikelihoodError::NoChannels
        );
    }
}
