use crate::error::{PriorError, SamplerError};
use crate::likelihood::LikelihoodTrait;
use crate::prior::{LnPrior1D, LnPrior1DTrait, PriorSet};
use crate::types::ParameterMap;

use emcee::{EnsembleSampler, Guess, Prob};
use rand::RngCore;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Likelihood and priors over a positional parameter vector
///
/// Positions follow the [PriorSet::keys] order.
pub struct Posterior<'p, L> {
    likelihood: &'p L,
    priors: &'p PriorSet,
    keys: Vec<String>,
}

impl<'p, L> Posterior<'p, L>
where
    L: LikelihoodTrait,
{
    /// Fails if the likelihood reads a key having no prior
    pub fn new(likelihood: &'p L, priors: &'p PriorSet) -> Result<Self, SamplerError> {
        let keys: Vec<String> = priors.keys().map(String::from).collect();
        if let Some(key) = likelihood
            .required_keys()
            .into_iter()
            .find(|key| !keys.contains(key))
        {
            return Err(PriorError::UnknownPrior(key).into());
        }
        Ok(Self {
            likelihood,
            priors,
            keys,
        })
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn parameters(&self, values: &[f64]) -> ParameterMap {
        assert_eq!(
            values.len(),
            self.keys.len(),
            "values must have the same length as keys"
        );
        self.keys.iter().cloned().zip(values.to_vec()).collect()
    }

    pub fn ln_prior(&self, values: &[f64]) -> f64 {
        self.priors.ln_prior_values(values)
    }

    /// Log-likelihood, negative infinity for parameters the likelihood rejects
    pub fn ln_likelihood(&self, values: &[f64]) -> f64 {
        match self.likelihood.log_likelihood_of(&self.parameters(values)) {
            Ok(ln_like) => ln_like,
            Err(error) => {
                log::debug!("rejecting proposal: {error}");
                f64::NEG_INFINITY
            }
        }
    }

    pub fn ln_posterior(&self, values: &[f64]) -> f64 {
        let ln_prior = self.ln_prior(values);
        if ln_prior.is_finite() {
            ln_prior + self.ln_likelihood(values)
        } else {
            f64::NEG_INFINITY
        }
    }
}

/// Narrow a prior draw to `f32`, stepping back inside the prior support if rounding left it
fn narrow_within_prior(value: f64, prior: &LnPrior1D) -> f32 {
    let (left, right) = prior.support();
    let up = value < 0.5 * (left + right);
    let mut x = value as f32;
    for _ in 0..4 {
        if prior.ln_prior_1d(f64::from(x)).is_finite() {
            break;
        }
        x = next_f32(x, up);
    }
    x
}

fn next_f32(x: f32, up: bool) -> f32 {
    if x == 0.0 {
        let tiny = f32::from_bits(1);
        return if up { tiny } else { -tiny };
    }
    // Larger bit pattern means larger magnitude
    if (x > 0.0) == up {
        f32::from_bits(x.to_bits() + 1)
    } else {
        f32::from_bits(x.to_bits() - 1)
    }
}

fn guess_values(guess: &Guess) -> Vec<f64> {
    guess.values.iter().map(|&x| x as f64).collect()
}

impl<L> Prob for Posterior<'_, L>
where
    L: LikelihoodTrait,
{
    fn lnlike(&self, params: &Guess) -> f32 {
        self.ln_likelihood(&guess_values(params)) as f32
    }

    fn lnprior(&self, params: &Guess) -> f32 {
        self.ln_prior(&guess_values(params)) as f32
    }
}

/// Result of [McmcSampler::run]
#[derive(Clone, Debug)]
pub struct McmcResult {
    /// Maximum posterior sample
    pub best: ParameterMap,
    pub best_ln_posterior: f64,
    /// Walker positions of every iteration, iteration by iteration
    pub chain: Vec<ParameterMap>,
}

/// Affine-invariant ensemble MCMC run over a [Posterior]
///
/// Walkers start from independent prior draws. The sampler is run for `niterations` steps and
/// the sample having the maximum posterior is reported together with the full chain.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename = "Mcmc")]
pub struct McmcSampler {
    pub nwalkers: u32,
    pub niterations: u32,
}

impl McmcSampler {
    pub fn new(nwalkers: u32, niterations: u32) -> Self {
        Self {
            nwalkers,
            niterations,
        }
    }

    #[inline]
    pub fn default_nwalkers() -> u32 {
        64
    }

    #[inline]
    pub fn default_niterations() -> u32 {
        128
    }

    pub fn run<L>(
        &self,
        posterior: &Posterior<'_, L>,
        rng: &mut dyn RngCore,
    ) -> Result<McmcResult, SamplerError>
    where
        L: LikelihoodTrait,
    {
        let nwalkers = self.nwalkers as usize;
        let ndim = posterior.keys().len();

        let initial_guesses = (0..nwalkers)
            .map(|_| {
                let values = posterior.priors.sample_values(rng)?;
                let values: Vec<f32> = values
                    .into_iter()
                    .zip(posterior.priors.entries())
                    .map(|(x, entry)| narrow_within_prior(x, &entry.prior))
                    .collect();
                Ok(Guess::new(&values))
            })
            .collect::<Result<Vec<_>, SamplerError>>()?;

        let mut sampler = EnsembleSampler::new(nwalkers, ndim, posterior)
            .map_err(|error| SamplerError::Emcee(error.to_string()))?;
        sampler.seed(&[]);

        let mut best_values = vec![];
        let mut best_ln_posterior = f32::NEG_INFINITY;
        let mut chain = Vec::with_capacity(nwalkers * self.niterations as usize);
        sampler
            .sample(&initial_guesses, self.niterations as usize, |step| {
                for (position, &ln_prob) in step.pos.iter().zip(step.lnprob.iter()) {
                    let values = guess_values(position);
                    if ln_prob > best_ln_posterior {
                        best_values.clone_from(&values);
                        best_ln_posterior = ln_prob;
                    }
                    chain.push(posterior.parameters(&values));
                }
            })
            .map_err(|error| SamplerError::Emcee(error.to_string()))?;

        if !best_ln_posterior.is_finite() {
            log::warn!(
                "MCMC run of {nwalkers} walkers and {} iterations found no sample with finite posterior",
                self.niterations
            );
            return Err(SamplerError::NoFiniteSample);
        }
        log::debug!("MCMC best log-posterior {best_ln_posterior}");
        Ok(McmcResult {
            best: posterior.parameters(&best_values),
            best_ln_posterior: best_ln_posterior as f64,
            chain,
        })
    }
}

impl Default for McmcSampler {
    fn default() -> Self {
        Self::new(Self::default_nwalkers(), Self::default_niterations())
    }
}
