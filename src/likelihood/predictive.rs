use crate::error::LikelihoodError;
use crate::likelihood::PoissonLikelihood;
use crate::prior::PriorSet;
use crate::sorted_array::SortedArray;
use crate::types::ParameterMap;

use ndarray::{Array1, Array2, Axis};

/// Posterior-predictive rate lines of a single channel
///
/// Every posterior sample gives a model line, [PosteriorPredictive::median] is their per-bin
/// median and [PosteriorPredictive::residuals] is observed counts minus the median.
#[derive(Clone, Debug)]
pub struct PosteriorPredictive {
    lines: Array2<f64>,
    median: Array1<f64>,
    residuals: Array1<f64>,
}

impl PosteriorPredictive {
    /// Evaluate model lines of posterior samples, derived constraint keys are ignored
    pub fn from_samples(
        likelihood: &PoissonLikelihood<'_>,
        samples: &[ParameterMap],
    ) -> Result<Self, LikelihoodError> {
        if samples.is_empty() {
            return Err(LikelihoodError::EmptyPosterior);
        }
        let mut lines = Array2::zeros((samples.len(), likelihood.len()));
        for (sample, line) in samples.iter().zip(lines.rows_mut()) {
            likelihood.rate_into(&PriorSet::strip_constraints(sample), line)?;
        }
        let median: Array1<f64> = lines
            .axis_iter(Axis(1))
            .map(|bin| SortedArray::from(bin).median())
            .collect();
        let residuals = &likelihood.counts() - &median;
        Ok(Self {
            lines,
            median,
            residuals,
        })
    }

    /// Model lines, a row per sample
    pub fn lines(&self) -> &Array2<f64> {
        &self.lines
    }

    pub fn median(&self) -> &Array1<f64> {
        &self.median
    }

    pub fn residuals(&self) -> &Array1<f64> {
        &self.residuals
    }

    /// Per-bin quantile of the model lines
    pub fn quantile(&self, q: f64) -> Array1<f64> {
        self.lines
            .axis_iter(Axis(1))
            .map(|bin| SortedArray::from(bin).ppf(q))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::channel::Channel;
    use crate::model::ModelDescriptor;

    use approx::assert_relative_eq;
    use ndarray::array;

    fn sample(background: f64, scale: f64) -> ParameterMap {
        [
            ("background_a", background),
            ("start_1_a", 1.0),
            ("scale_1_a", scale),
            ("sigma_1_a", 1.0),
            ("constraint_2_a", 0.5),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    #[test]
    fn median_and_residuals() {
        let t = array![0.0, 1.0, 2.0];
        let counts = array![3.0, 10.0, 4.0];
        let model = ModelDescriptor::decode("G").unwrap();
        let lik = PoissonLikelihood::new(t.view(), counts.view(), &model, Channel::A).unwrap();
        let samples = [sample(1.0, 4.0), sample(3.0, 8.0), sample(2.0, 6.0)];
        let predictive = PosteriorPredictive::from_samples(&lik, &samples).unwrap();

        let median_line = lik.return_line_from_sample(&sample(2.0, 6.0)).unwrap();
        assert_eq!(predictive.lines().nrows(), 3);
        assert_relative_eq!(predictive.median(), &median_line, max_relative = 1e-12);
        assert_relative_eq!(
            predictive.residuals(),
            &(&counts - &median_line),
            max_relative = 1e-12
        );
        assert_relative_eq!(predictive.quantile(0.5), median_line, max_relative = 1e-12);
    }

    #[test]
    fn empty_posterior() {
        let model = ModelDescriptor::decode("G").unwrap();
        let t = array![0.0];
        let counts = array![1.0];
        let lik = PoissonLikelihood::new(t.view(), counts.view(), &model, Channel::A).unwrap();
        assert!(matches!(
            PosteriorPredictive::from_samples(&lik, &[]),
            Err(LikelihoodError::EmptyPosterior)
        ));
    }
}
